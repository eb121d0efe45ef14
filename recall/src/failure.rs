/// Structured assertion failure raised by a matcher assertion.
///
/// This is the one error kind the engine recognizes as an *intentional*
/// mismatch. Probe-mode evaluation captures it silently; commit-mode
/// evaluation lets it escape so the verifier can embed the message in its
/// diagnostics. Any other error type returned by an assertion is treated as
/// an unexpected matcher error and propagates unchanged in both modes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct Failure {
    message: String,
}

impl Failure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns `Err(Failure)` carrying `message` unless `condition` holds.
    ///
    /// Convenience for writing assertion bodies:
    ///
    /// ```ignore
    /// matching(|s: &String| Failure::expect(s.contains("yo"), format!("{s:?} lacks \"yo\"")))
    /// ```
    pub fn expect(condition: bool, message: impl Into<String>) -> Result<(), Failure> {
        if condition {
            Ok(())
        } else {
            Err(Failure::new(message))
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
