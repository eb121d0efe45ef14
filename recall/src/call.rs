use std::{fmt, sync::Arc};

use crate::{CallArg, SeqNo, TargetId};

/// How an invocation was made on a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    /// An ordinary method call.
    Method,
    /// A property-getter-style access. Kept in the received history but
    /// excluded from order verification.
    Getter,
}

/// One recorded invocation on a target.
///
/// Immutable once recorded. The sequence number is assigned at interception
/// time from the owning context's [`SequenceSource`](crate::SequenceSource),
/// so calls from different targets interleave by time, not by target.
#[derive(Debug, Clone)]
pub struct Call {
    target: TargetId,
    method: Arc<str>,
    kind: CallKind,
    args: Vec<CallArg>,
    seq: SeqNo,
}

impl Call {
    pub(crate) fn new(
        target: TargetId,
        method: &str,
        kind: CallKind,
        args: Vec<CallArg>,
        seq: SeqNo,
    ) -> Self {
        Self {
            target,
            method: Arc::from(method),
            kind,
            args,
            seq,
        }
    }

    /// The target this call was made on.
    #[inline]
    pub fn target(&self) -> &TargetId {
        &self.target
    }

    /// The invoked method's name.
    #[inline]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// How the invocation was made.
    #[inline]
    pub fn kind(&self) -> CallKind {
        self.kind
    }

    /// Returns true for a property-getter-style access.
    #[inline]
    pub fn is_getter(&self) -> bool {
        self.kind == CallKind::Getter
    }

    /// The observed argument values, in parameter order.
    #[inline]
    pub fn args(&self) -> &[CallArg] {
        &self.args
    }

    /// Position of this call in the global total order.
    #[inline]
    pub fn seq(&self) -> SeqNo {
        self.seq
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            CallKind::Getter => write!(f, "{}.{}", self.target, self.method),
            CallKind::Method => {
                write!(f, "{}.{}(", self.target, self.method)?;
                for (i, arg) in self.args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}
