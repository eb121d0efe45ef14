use std::{fmt, hash::Hash, sync::Arc};

use uuid::Uuid;

/// Identity of one mock target.
///
/// Carries a debug name for diagnostics plus a unique id assigned at
/// creation. Equality and hashing use only the unique id, so two targets
/// that happen to share a name remain distinct: matching a call against a
/// specification requires the exact target instance, not a name.
///
/// `TargetId` is cheap to clone and safe to serialize.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetId {
    name: Arc<str>,
    uid: u128,
}

impl TargetId {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            uid: Uuid::new_v4().as_u128(),
        }
    }

    /// Returns the debug name of this target.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for TargetId {
    fn eq(&self, other: &Self) -> bool {
        self.uid == other.uid
    }
}

impl Eq for TargetId {}

impl Hash for TargetId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.uid.hash(state);
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_compare_equal() {
        let id = TargetId::new("repo");
        assert_eq!(id, id.clone());
    }

    #[test]
    fn same_name_is_still_a_distinct_target() {
        let a = TargetId::new("repo");
        let b = TargetId::new("repo");
        assert_ne!(a, b);
        assert_eq!(a.name(), b.name());
    }

    #[test]
    fn displays_the_name() {
        let id = TargetId::new("mailer");
        assert_eq!(id.to_string(), "mailer");
    }

    #[test]
    fn hashes_by_uid_not_name() {
        use std::collections::HashSet;
        let a = TargetId::new("repo");
        let b = TargetId::new("repo");
        let set: HashSet<TargetId> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 2);
    }
}
