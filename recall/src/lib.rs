//! # Recall
//!
//! Scoped call recording and order verification for test doubles.
//!
//! Recall captures the method calls your code under test makes on mock
//! targets, then checks them against an expected sequence declared inside a
//! recording window — either as a strict total order across all targets, or
//! as an unordered per-target multiset. It does not fabricate mock objects
//! or intercept calls itself; it is the recording and verification engine a
//! mock layer plugs into, and the [`Target`] handle is the seam between the
//! two.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use recall::{QueryContext, arg};
//!
//! fn main() -> recall::Result {
//!     let ctx = QueryContext::new();
//!     let service = ctx.target("service");
//!
//!     // The code under test drives the mock.
//!     service.call("connect", [arg("db://primary")]);
//!     service.call("fetch", [arg(42)]);
//!
//!     // Declare the expected sequence; a mismatch returns SequenceNotFound
//!     // with a rendering of both sequences.
//!     ctx.received_in_order(|| {
//!         service.call("connect", [arg("db://primary")]);
//!         service.call("fetch", [arg(42)]);
//!     })
//! }
//! ```
//!
//! ## Core Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`QueryContext`] | Creates targets and manages the recording window |
//! | [`Target`] | Handle to one mock object; records calls and registers expectations |
//! | [`CallArg`] | One argument: a concrete value ([`arg`]) or a matcher placeholder ([`matching`], [`any_arg`]) |
//! | [`ArgMatcher`] | Dual-mode argument matcher (silent probe / failing commit) |
//! | [`Query`] | The expectation trace; run `verify_exact_order` / `verify_any_order` on it |
//! | [`Failure`] | Structured assertion failure recognized by the matcher bridge |
//! | [`SequenceReport`] | Diagnostics carried by a verification failure |
//! | [`SeqNo`] / [`SequenceSource`] | Global total order over recorded calls |
//!
//! ## Recording Windows
//!
//! [`QueryContext::run_in_scope`] installs an exclusive window, runs the
//! expectation-declaring callback, and always tears the window down on the
//! way out. While the window is active, calls made on this context's targets
//! register [`CallSpec`]s instead of being recorded. The suspend-aware
//! [`QueryContext::run_in_scope_async`] keeps the window attached to the
//! same logical flow across `.await` points — the window lives in the
//! context the flow carries, not in a thread-local, so sibling flows holding
//! their own contexts never see it. [`QueryContext::enter_scope`] is the
//! idempotent enter/exit form: re-entering an active window returns a no-op
//! guard and only the original guard closes it.
//!
//! ## Matchers
//!
//! Expectation arguments are either literal values, matched by equality, or
//! placeholders carrying an assertion:
//!
//! ```ignore
//! ctx.received_in_order(|| {
//!     service.call("fetch", [matching(|id: &i32| {
//!         Failure::expect(*id > 0, format!("expected a positive id, got {id}"))
//!     })]);
//! })?;
//! ```
//!
//! Candidate calls are probed silently — an assertion failure rejects the
//! candidate without surfacing. Only the final commit-mode comparison lets
//! the failure text through, embedded in the [`SequenceReport`]. An error
//! that is not a [`Failure`] is a broken matcher and propagates unchanged as
//! [`Error::Matcher`].
//!
//! ## Features
//!
//! - **`serde`** - serialization support for sequence numbers, target ids,
//!   and verification reports

mod arg;
mod call;
mod call_spec;
mod context;
mod error;
mod failure;
mod matcher;
mod query;
mod report;
mod seq;
mod target;
mod target_id;
mod verify;

pub use arg::{CallArg, arg};
pub use call::{Call, CallKind};
pub use call_spec::CallSpec;
pub use context::{QueryContext, ScopeGuard};
pub use error::Error;
pub use failure::Failure;
pub use matcher::{ArgMatcher, AssertError, any_arg, matching};
pub use query::Query;
pub use report::{SequenceReport, VerifyMode};
pub use seq::{SeqNo, SequenceSource};
pub use target::Target;
pub use target_id::TargetId;

/// Convenience alias for `Result<T, recall::Error>`.
pub type Result<T = ()> = std::result::Result<T, Error>;
