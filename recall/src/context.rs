use std::{
    fmt,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::{CallSpec, Error, Query, Result, SequenceSource, Target, TargetId};

/// Shared state behind a [`QueryContext`] and the targets it created.
pub(crate) struct ContextInner {
    sequence: SequenceSource,
    /// The recording window: `Some` while a scope is active.
    active: Mutex<Option<Query>>,
}

impl ContextInner {
    pub(crate) fn lock_active(&self) -> MutexGuard<'_, Option<Query>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_window(&self) -> Option<Query> {
        let taken = self.lock_active().take();
        if taken.is_some() {
            tracing::debug!("recording window closed");
        }
        taken
    }
}

/// The engine context: creates targets, manages the recording window, and
/// funnels expectation registrations into the active trace.
///
/// Cheap to clone; clones share state. Use one context per logical flow: the
/// window follows the flow across suspension points because the flow itself
/// carries the context, and sibling flows holding their own contexts are
/// unaffected. Sharing a single context across unrelated concurrent flows
/// can interfere and is not supported — at most one recording window exists
/// per context at a time.
///
/// # Example
///
/// ```ignore
/// let ctx = QueryContext::new();
/// let service = ctx.target("service");
///
/// service.call("connect", [arg(1)]);
/// service.call("fetch", [arg(2)]);
///
/// ctx.received_in_order(|| {
///     service.call("connect", [arg(1)]);
///     service.call("fetch", [arg(2)]);
/// })?;
/// ```
#[derive(Clone)]
pub struct QueryContext {
    inner: Arc<ContextInner>,
}

impl QueryContext {
    /// A fresh context drawing sequence numbers from the process-wide
    /// counter.
    pub fn new() -> Self {
        Self::with_sequence(SequenceSource::global())
    }

    /// A context with an injected sequence source, for tests that want an
    /// isolated counter.
    pub fn with_sequence(sequence: SequenceSource) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                sequence,
                active: Mutex::new(None),
            }),
        }
    }

    /// Creates a mock target wired to this context.
    pub fn target(&self, name: &str) -> Target {
        Target::new(
            TargetId::new(name),
            self.inner.sequence.clone(),
            Arc::downgrade(&self.inner),
        )
    }

    /// Returns true while a recording window is active.
    pub fn is_querying(&self) -> bool {
        self.inner.lock_active().is_some()
    }

    /// Registers a specification in the active window.
    ///
    /// This is the funnel a collaborating mock layer uses when it builds
    /// specifications itself; [`Target::call`] goes through the same path.
    ///
    /// # Errors
    ///
    /// [`Error::NotRecording`] if no window is active.
    pub fn add_to_query(&self, spec: CallSpec) -> Result<()> {
        match self.inner.lock_active().as_mut() {
            Some(query) => {
                query.add(spec);
                Ok(())
            }
            None => Err(Error::NotRecording),
        }
    }

    /// Enters the recording scope, idempotently.
    ///
    /// If no window is active, installs one and returns the owning guard;
    /// dropping it (or calling [`ScopeGuard::finish`]) closes the window. If
    /// a window is already active, returns a no-op guard — releasing it does
    /// nothing, and only the original guard tears the window down.
    pub fn enter_scope(&self) -> ScopeGuard {
        let mut active = self.inner.lock_active();
        if active.is_some() {
            tracing::trace!("recording window already active; enter is a no-op");
            ScopeGuard {
                inner: Arc::clone(&self.inner),
                owns: false,
            }
        } else {
            *active = Some(Query::new());
            tracing::debug!("recording window opened");
            ScopeGuard {
                inner: Arc::clone(&self.inner),
                owns: true,
            }
        }
    }

    /// Runs `calls` under an exclusive recording window and returns the
    /// finalized trace.
    ///
    /// The window is always torn down on the way out, including when the
    /// callback panics.
    ///
    /// # Errors
    ///
    /// [`Error::NestedQuery`] if a window is already active.
    pub fn run_in_scope(&self, calls: impl FnOnce()) -> Result<Query> {
        self.open_exclusive()?;
        let window = CloseOnDrop {
            inner: &*self.inner,
            armed: true,
        };
        calls();
        Ok(window.finish())
    }

    /// Suspend-aware form of [`run_in_scope`](Self::run_in_scope): awaits
    /// `calls` to full resolution under the window. Registrations made after
    /// a suspension point still land in the same trace, because the window
    /// lives in this context, not in any thread-local. If the returned
    /// future is dropped mid-await, the window is torn down with it.
    ///
    /// # Errors
    ///
    /// [`Error::NestedQuery`] if a window is already active.
    pub async fn run_in_scope_async<F>(&self, calls: F) -> Result<Query>
    where
        F: Future<Output = ()>,
    {
        self.open_exclusive()?;
        let window = CloseOnDrop {
            inner: &*self.inner,
            armed: true,
        };
        calls.await;
        Ok(window.finish())
    }

    /// Declares an expected call sequence and verifies it in exact order.
    ///
    /// Shorthand for [`run_in_scope`](Self::run_in_scope) followed by
    /// [`Query::verify_exact_order`].
    pub fn received_in_order(&self, calls: impl FnOnce()) -> Result<()> {
        self.run_in_scope(calls)?.verify_exact_order()
    }

    /// Declares an expected call multiset and verifies it per target,
    /// ignoring the relative order of expectations.
    ///
    /// Shorthand for [`run_in_scope`](Self::run_in_scope) followed by
    /// [`Query::verify_any_order`].
    pub fn received_in_any_order(&self, calls: impl FnOnce()) -> Result<()> {
        self.run_in_scope(calls)?.verify_any_order()
    }

    /// Suspend-aware form of [`received_in_order`](Self::received_in_order).
    pub async fn received_in_order_async<F>(&self, calls: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        self.run_in_scope_async(calls).await?.verify_exact_order()
    }

    /// Suspend-aware form of
    /// [`received_in_any_order`](Self::received_in_any_order).
    pub async fn received_in_any_order_async<F>(&self, calls: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        self.run_in_scope_async(calls).await?.verify_any_order()
    }

    fn open_exclusive(&self) -> Result<()> {
        let mut active = self.inner.lock_active();
        if active.is_some() {
            return Err(Error::NestedQuery);
        }
        *active = Some(Query::new());
        tracing::debug!("recording window opened");
        Ok(())
    }
}

impl Default for QueryContext {
    fn default() -> Self {
        QueryContext::new()
    }
}

impl fmt::Debug for QueryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryContext")
            .field("querying", &self.is_querying())
            .finish_non_exhaustive()
    }
}

/// Scoped handle to the recording window, returned by
/// [`QueryContext::enter_scope`].
///
/// Dropping the guard closes the window only if this guard opened it; a
/// guard handed out while a window was already active is a no-op.
#[must_use = "the recording window closes when the guard is dropped"]
pub struct ScopeGuard {
    inner: Arc<ContextInner>,
    owns: bool,
}

impl ScopeGuard {
    /// Returns true if this guard opened the window and owns its teardown.
    pub fn owns_window(&self) -> bool {
        self.owns
    }

    /// Closes the window and returns the finalized trace.
    ///
    /// Returns `None` for a non-owning (re-entrant) guard — the original
    /// scope keeps both the window and the trace.
    pub fn finish(mut self) -> Option<Query> {
        if !self.owns {
            return None;
        }
        self.owns = false;
        self.inner.take_window()
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if self.owns {
            self.inner.take_window();
        }
    }
}

impl fmt::Debug for ScopeGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeGuard")
            .field("owns", &self.owns)
            .finish_non_exhaustive()
    }
}

/// Closes the window on drop unless disarmed; keeps `run_in_scope` panic and
/// cancellation safe.
struct CloseOnDrop<'a> {
    inner: &'a ContextInner,
    armed: bool,
}

impl CloseOnDrop<'_> {
    fn finish(mut self) -> Query {
        self.armed = false;
        self.inner.take_window().unwrap_or_default()
    }
}

impl Drop for CloseOnDrop<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.inner.take_window();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arg;

    #[test]
    fn run_in_scope_returns_the_registered_trace() {
        let ctx = QueryContext::new();
        let repo = ctx.target("repo");

        let query = ctx
            .run_in_scope(|| {
                repo.call("store", [arg(1)]);
                repo.call("load", [arg(2)]);
            })
            .unwrap();

        assert_eq!(query.len(), 2);
        assert!(!ctx.is_querying());
    }

    #[test]
    fn run_in_scope_rejects_nesting() {
        let ctx = QueryContext::new();
        let guard = ctx.enter_scope();

        let err = ctx.run_in_scope(|| {}).unwrap_err();
        assert_eq!(err, Error::NestedQuery);

        drop(guard);
        assert!(ctx.run_in_scope(|| {}).is_ok());
    }

    #[test]
    fn registration_outside_a_window_is_an_error() {
        let ctx = QueryContext::new();
        let repo = ctx.target("repo");
        let spec = CallSpec::new(repo, "store", Vec::new());

        assert_eq!(ctx.add_to_query(spec).unwrap_err(), Error::NotRecording);
    }

    #[test]
    fn entering_an_active_scope_is_a_no_op() {
        let ctx = QueryContext::new();
        let outer = ctx.enter_scope();
        assert!(outer.owns_window());

        let inner = ctx.enter_scope();
        assert!(!inner.owns_window());

        // Disposing the inner handle must not close the outer window.
        drop(inner);
        assert!(ctx.is_querying());

        // Nor may finishing a fresh re-entrant guard yield the trace.
        assert!(ctx.enter_scope().finish().is_none());
        assert!(ctx.is_querying());

        drop(outer);
        assert!(!ctx.is_querying());
    }

    #[test]
    fn finish_returns_the_trace_for_the_owning_guard() {
        let ctx = QueryContext::new();
        let repo = ctx.target("repo");

        let guard = ctx.enter_scope();
        repo.call("store", [arg(1)]);
        let query = guard.finish().unwrap();

        assert_eq!(query.len(), 1);
        assert!(!ctx.is_querying());
    }

    #[test]
    fn window_is_torn_down_when_the_callback_panics() {
        let ctx = QueryContext::new();
        let panicked = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = ctx.run_in_scope(|| panic!("callback failed"));
        }));

        assert!(panicked.is_err());
        assert!(!ctx.is_querying());
        // A fresh scope opens normally afterwards.
        assert!(ctx.run_in_scope(|| {}).is_ok());
    }

    #[tokio::test]
    async fn window_follows_the_flow_across_suspension_points() {
        let ctx = QueryContext::new();
        let repo = ctx.target("repo");

        let query = ctx
            .run_in_scope_async(async {
                repo.call("store", [arg(1)]);
                tokio::task::yield_now().await;
                repo.call("load", [arg(2)]);
            })
            .await
            .unwrap();

        let methods: Vec<&str> = query.specs().iter().map(|s| s.method()).collect();
        assert_eq!(methods, ["store", "load"]);
    }

    #[tokio::test]
    async fn sibling_flows_with_their_own_contexts_do_not_interfere() {
        let first = tokio::spawn(async {
            let ctx = QueryContext::new();
            let repo = ctx.target("repo");
            ctx.run_in_scope_async(async {
                repo.call("store", [arg(1)]);
                tokio::task::yield_now().await;
                repo.call("store", [arg(2)]);
            })
            .await
            .unwrap()
        });
        let second = tokio::spawn(async {
            let ctx = QueryContext::new();
            let mailer = ctx.target("mailer");
            ctx.run_in_scope_async(async {
                tokio::task::yield_now().await;
                mailer.call("send", [arg(String::from("hi"))]);
            })
            .await
            .unwrap()
        });

        let (first, second) = (first.await.unwrap(), second.await.unwrap());
        assert_eq!(first.len(), 2);
        assert!(first.specs().iter().all(|s| s.method() == "store"));
        assert_eq!(second.len(), 1);
        assert_eq!(second.specs()[0].method(), "send");
    }

    #[tokio::test]
    async fn dropping_the_scoped_future_tears_the_window_down() {
        let ctx = QueryContext::new();
        let never_resolves = ctx.run_in_scope_async(std::future::pending::<()>());

        let timed_out =
            tokio::time::timeout(std::time::Duration::from_millis(10), never_resolves).await;

        assert!(timed_out.is_err());
        assert!(!ctx.is_querying());
    }
}
