use std::fmt;

const GETTER_NOTE: &str =
    "*** Note: calls to property getters are not considered part of the query. ***";

/// Which verification algorithm produced a [`SequenceReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VerifyMode {
    Exact,
    AnyOrder,
}

/// Diagnostic payload carried by
/// [`Error::SequenceNotFound`](crate::Error::SequenceNotFound).
///
/// Holds human-readable renderings of the expected trace and the relevant
/// actual calls, plus the failure text of the matcher assertion that caused
/// the mismatch, when there was one. `Display` renders the full multi-line
/// diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SequenceReport {
    mode: VerifyMode,
    expected: Vec<String>,
    actual: Vec<String>,
    unmatched: Option<String>,
    matcher_failure: Option<String>,
}

impl SequenceReport {
    pub(crate) fn exact(
        expected: Vec<String>,
        actual: Vec<String>,
        matcher_failure: Option<String>,
    ) -> Self {
        Self {
            mode: VerifyMode::Exact,
            expected,
            actual,
            unmatched: None,
            matcher_failure,
        }
    }

    pub(crate) fn any_order(
        expected: Vec<String>,
        unmatched: String,
        remaining: Vec<String>,
        matcher_failure: Option<String>,
    ) -> Self {
        Self {
            mode: VerifyMode::AnyOrder,
            expected,
            actual: remaining,
            unmatched: Some(unmatched),
            matcher_failure,
        }
    }

    /// The algorithm that produced this report.
    pub fn mode(&self) -> VerifyMode {
        self.mode
    }

    /// Renderings of the full expected trace, in registration order.
    pub fn expected(&self) -> &[String] {
        &self.expected
    }

    /// Renderings of the actual calls: the merged sequence for exact-order
    /// reports, the failing target's remaining unmatched calls for any-order
    /// reports.
    pub fn actual(&self) -> &[String] {
        &self.actual
    }

    /// The specification no remaining call matched (any-order reports only).
    pub fn unmatched(&self) -> Option<&str> {
        self.unmatched.as_deref()
    }

    /// Failure text of the matcher assertion that caused the mismatch.
    pub fn matcher_failure(&self) -> Option<&str> {
        self.matcher_failure.as_deref()
    }
}

impl fmt::Display for SequenceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        match self.mode {
            VerifyMode::Exact => {
                section(f, "Expected to receive these calls in order:", &self.expected)?;
                write!(f, "\n\n")?;
                section(
                    f,
                    "Actually received calls to target instances in this order:",
                    &self.actual,
                )?;
            }
            VerifyMode::AnyOrder => {
                if let Some(unmatched) = &self.unmatched {
                    section(f, "No received call matches:", std::slice::from_ref(unmatched))?;
                    write!(f, "\n\n")?;
                }
                section(
                    f,
                    "Declared expectations (any order per target):",
                    &self.expected,
                )?;
                write!(f, "\n\n")?;
                section(
                    f,
                    "Remaining unmatched calls on that target:",
                    &self.actual,
                )?;
            }
        }
        write!(f, "\n\n{GETTER_NOTE}")?;
        if let Some(failure) = &self.matcher_failure {
            write!(f, "\n\nMatcher assertion said:\n{failure}")?;
        }
        Ok(())
    }
}

fn section(f: &mut fmt::Formatter<'_>, title: &str, items: &[String]) -> fmt::Result {
    write!(f, "{title}")?;
    if items.is_empty() {
        return write!(f, "\n    (none)");
    }
    for item in items {
        write!(f, "\n    {item}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_both_sequences_and_the_getter_note() {
        let report = SequenceReport::exact(
            vec!["repo.store(1)".into(), "repo.store(2)".into()],
            vec!["repo.store(2)".into(), "repo.store(1)".into()],
            None,
        );
        let rendered = report.to_string();

        assert!(rendered.contains("Expected to receive these calls in order:"));
        assert!(rendered.contains("    repo.store(1)"));
        assert!(
            rendered.contains("Actually received calls to target instances in this order:")
        );
        assert!(rendered.contains(GETTER_NOTE));
        assert!(!rendered.contains("Matcher assertion said:"));
    }

    #[test]
    fn appends_the_matcher_failure_text_when_present() {
        let report = SequenceReport::exact(
            vec!["repo.store(match<i32>)".into()],
            vec!["repo.store(2)".into()],
            Some("expected 1, got 2".into()),
        );
        let rendered = report.to_string();

        assert!(rendered.contains("Matcher assertion said:\nexpected 1, got 2"));
    }

    #[test]
    fn renders_the_any_order_shape() {
        let report = SequenceReport::any_order(
            vec!["f.f(1)".into(), "f.f(2)".into()],
            "f.f(2)".into(),
            vec!["f.f(1)".into()],
            None,
        );
        let rendered = report.to_string();

        assert!(rendered.contains("No received call matches:\n    f.f(2)"));
        assert!(rendered.contains("Declared expectations (any order per target):"));
        assert!(rendered.contains("Remaining unmatched calls on that target:\n    f.f(1)"));
        assert_eq!(report.mode(), VerifyMode::AnyOrder);
    }

    #[test]
    fn renders_empty_sections_as_none() {
        let report = SequenceReport::exact(vec!["repo.store(1)".into()], Vec::new(), None);
        assert!(report.to_string().contains("this order:\n    (none)"));
    }
}
