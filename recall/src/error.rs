use std::sync::Arc;

use crate::{Failure, SequenceReport};

/// The single error type for all recall operations.
///
/// Every fallible recall API returns `recall::Result<T>` (alias for
/// `Result<T, recall::Error>`), so callers only need to handle one error
/// type. All expectation mismatches surface as
/// [`SequenceNotFound`](Self::SequenceNotFound); a broken matcher surfaces
/// as [`Matcher`](Self::Matcher) and is never converted into a mismatch.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Expectation registration was attempted with no active recording
    /// window.
    #[error("Not currently recording a query.")]
    NotRecording,

    /// An exclusive scope entry was attempted while a window is already
    /// active.
    #[error("Cannot run nested queries.")]
    NestedQuery,

    /// Order verification failed. The report carries the expected trace, the
    /// actual calls, and any embedded matcher failure text.
    #[error("Call sequence not found.{0}")]
    SequenceNotFound(Box<SequenceReport>),

    /// A matcher assertion reported a structured failure during commit-mode
    /// matching.
    #[error("Matcher assertion failed: {0}")]
    MatcherFailure(#[source] Failure),

    /// A matcher raised something other than a structured failure. Never
    /// treated as a non-match; propagates unchanged in both probe and commit
    /// mode.
    #[error("Matcher raised an unexpected error: {0}")]
    Matcher(#[source] Arc<dyn std::error::Error + Send + Sync>),
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NotRecording, Self::NotRecording) => true,
            (Self::NestedQuery, Self::NestedQuery) => true,
            (Self::SequenceNotFound(a), Self::SequenceNotFound(b)) => a == b,
            (Self::MatcherFailure(a), Self::MatcherFailure(b)) => a == b,
            (Self::Matcher(a), Self::Matcher(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_scope_errors() {
        assert_eq!(Error::NotRecording.to_string(), "Not currently recording a query.");
        assert_eq!(Error::NestedQuery.to_string(), "Cannot run nested queries.");
    }

    #[test]
    fn sequence_not_found_renders_the_report() {
        let report = SequenceReport::exact(
            vec!["repo.store(1)".into()],
            vec!["repo.load(2)".into()],
            None,
        );
        let rendered = Error::SequenceNotFound(Box::new(report)).to_string();

        assert!(rendered.starts_with("Call sequence not found."));
        assert!(rendered.contains("repo.store(1)"));
        assert!(rendered.contains("repo.load(2)"));
    }

    #[test]
    fn matcher_failures_compare_by_message() {
        let a = Error::MatcherFailure(Failure::new("expected 1"));
        let b = Error::MatcherFailure(Failure::new("expected 1"));
        let c = Error::MatcherFailure(Failure::new("expected 2"));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn unexpected_matcher_errors_compare_by_identity() {
        let raised: Arc<dyn std::error::Error + Send + Sync> =
            Arc::new(std::io::Error::other("backend unavailable"));
        let a = Error::Matcher(Arc::clone(&raised));
        let b = Error::Matcher(raised);
        assert_eq!(a, b);

        let other = Error::Matcher(Arc::new(std::io::Error::other("backend unavailable")));
        assert_ne!(a, other);
    }
}
