use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use crate::{Call, CallArg, CallKind, CallSpec, SequenceSource, TargetId, context::ContextInner};

/// Handle to one mock object.
///
/// A `Target` is what the proxy layer drives on behalf of a substitute
/// object. Outside a recording window, [`call`](Self::call) appends to the
/// target's chronological received history, stamped with the next global
/// sequence number. Inside a window, the same expression registers a call
/// specification in the active trace instead: literal arguments become
/// equality matchers and placeholder arguments (from
/// [`matching`](crate::matching) / [`any_arg`](crate::any_arg)) contribute
/// their matcher.
///
/// Clones share the same identity and history and compare equal.
///
/// # Example
///
/// ```ignore
/// let ctx = QueryContext::new();
/// let repo = ctx.target("repo");
///
/// repo.call("store", [arg(7)]);          // recorded
/// ctx.received_in_order(|| {
///     repo.call("store", [arg(7)]);      // expected
/// })?;
/// ```
#[derive(Clone)]
pub struct Target {
    id: TargetId,
    sequence: SequenceSource,
    calls: Arc<Mutex<Vec<Call>>>,
    context: Weak<ContextInner>,
}

impl Target {
    pub(crate) fn new(id: TargetId, sequence: SequenceSource, context: Weak<ContextInner>) -> Self {
        Self {
            id,
            sequence,
            calls: Arc::new(Mutex::new(Vec::new())),
            context,
        }
    }

    /// This target's identity.
    #[inline]
    pub fn id(&self) -> &TargetId {
        &self.id
    }

    /// Invoke a method as the proxy layer would: records a call, or
    /// registers an expectation while the owning context is recording.
    pub fn call(&self, method: &str, args: impl IntoIterator<Item = CallArg>) {
        self.invoke(method, CallKind::Method, args.into_iter().collect());
    }

    /// A property-getter-style access. Getter calls are kept in the received
    /// history but are not considered part of a query: inside a recording
    /// window they register nothing, and order verification skips them.
    pub fn get(&self, property: &str) {
        self.invoke(property, CallKind::Getter, Vec::new());
    }

    fn invoke(&self, method: &str, kind: CallKind, args: Vec<CallArg>) {
        if let Some(inner) = self.context.upgrade() {
            let mut active = inner.lock_active();
            if let Some(query) = active.as_mut() {
                if kind == CallKind::Getter {
                    tracing::trace!(target_name = %self.id, property = method, "getter ignored while recording");
                    return;
                }
                let matchers = args.into_iter().map(CallArg::into_matcher).collect();
                tracing::trace!(target_name = %self.id, method, "expectation registered");
                query.add(CallSpec::new(self.clone(), method, matchers));
                return;
            }
        }

        let call = Call::new(self.id.clone(), method, kind, args, self.sequence.next());
        tracing::trace!(target_name = %self.id, method, seq = call.seq().value(), "call recorded");
        self.lock_calls().push(call);
    }

    /// The chronological history of calls this target received.
    pub fn received_calls(&self) -> Vec<Call> {
        self.lock_calls().clone()
    }

    /// Number of calls this target received.
    pub fn received_count(&self) -> usize {
        self.lock_calls().len()
    }

    /// Clears the received history, resetting the target for the next test
    /// phase. Registered expectations are unaffected.
    pub fn clear_received(&self) {
        self.lock_calls().clear();
    }

    fn lock_calls(&self) -> MutexGuard<'_, Vec<Call>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PartialEq for Target {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Target {}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("id", &self.id)
            .field("received", &self.received_count())
            .finish_non_exhaustive()
    }
}
