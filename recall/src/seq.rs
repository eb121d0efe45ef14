use std::{
    fmt,
    sync::{
        Arc, OnceLock,
        atomic::{AtomicU64, Ordering},
    },
};

/// Position of a recorded call in the global total order.
///
/// Sequence numbers are assigned at record time, never reused, and strictly
/// increase regardless of which target produced the call. Merging the call
/// histories of several targets by `SeqNo` therefore reconstructs the real
/// interleaving, which is what order verification depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeqNo(u64);

impl SeqNo {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for SeqNo {
    fn from(value: u64) -> Self {
        SeqNo(value)
    }
}

impl From<SeqNo> for u64 {
    fn from(value: SeqNo) -> Self {
        value.0
    }
}

impl fmt::Display for SeqNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Issues strictly increasing sequence numbers for intercepted calls.
///
/// Cheap to clone; clones share the same counter. [`SequenceSource::global`]
/// returns a handle to the process-wide counter, which every
/// [`QueryContext`](crate::QueryContext) uses by default so that calls from
/// unrelated contexts still land in one total order. Use
/// [`SequenceSource::isolated`] in tests that want a private counter.
#[derive(Debug, Clone)]
pub struct SequenceSource {
    next: Arc<AtomicU64>,
}

impl SequenceSource {
    /// Handle to the process-wide sequence counter.
    pub fn global() -> Self {
        static GLOBAL: OnceLock<SequenceSource> = OnceLock::new();
        GLOBAL.get_or_init(SequenceSource::isolated).clone()
    }

    /// A fresh counter starting at zero, independent of the global one.
    pub fn isolated() -> Self {
        Self {
            next: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Issue the next sequence number.
    pub fn next(&self) -> SeqNo {
        SeqNo(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SequenceSource {
    fn default() -> Self {
        SequenceSource::global()
    }
}
