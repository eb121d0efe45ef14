use std::{fmt, sync::Arc};

use crate::{
    ArgMatcher, Call, Error, Target,
    matcher::Verdict,
};

/// An expected call: a target, a method, and one matcher per parameter.
///
/// Built once when the expectation is declared inside a recording window and
/// never mutated afterward. Its position in the resulting
/// [`Query`](crate::Query) reflects registration order, not the order in
/// which matching calls occur.
#[derive(Debug, Clone)]
pub struct CallSpec {
    target: Target,
    method: Arc<str>,
    matchers: Vec<ArgMatcher>,
}

impl CallSpec {
    /// Builds a specification addressing `target`.
    ///
    /// Normally done for you by [`Target::call`] inside a recording window;
    /// exposed so a collaborating mock layer can register specifications
    /// directly via [`QueryContext::add_to_query`](crate::QueryContext::add_to_query).
    pub fn new(target: Target, method: &str, matchers: Vec<ArgMatcher>) -> Self {
        Self {
            target,
            method: Arc::from(method),
            matchers,
        }
    }

    /// The target this specification addresses.
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// The expected method name.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The per-parameter matchers, in parameter order.
    pub fn matchers(&self) -> &[ArgMatcher] {
        &self.matchers
    }

    /// Commit-mode check: `Ok(true)` on a full match, `Ok(false)` on a plain
    /// mismatch (wrong target, method, arity, or a silent matcher
    /// rejection). A structured assertion failure escapes as
    /// [`Error::MatcherFailure`]; an unexpected matcher error as
    /// [`Error::Matcher`].
    pub fn is_satisfied_by(&self, call: &Call) -> crate::Result<bool> {
        if !self.shape_matches(call) {
            return Ok(false);
        }
        for (matcher, arg) in self.matchers.iter().zip(call.args()) {
            match matcher.probe(arg)? {
                Verdict::Match => {}
                Verdict::Mismatch(Some(failure)) => return Err(Error::MatcherFailure(failure)),
                Verdict::Mismatch(None) => return Ok(false),
            }
        }
        Ok(true)
    }

    /// Probe-mode check: never surfaces assertion failures, but retains the
    /// last captured failure text for diagnostics.
    pub(crate) fn probe(&self, call: &Call) -> crate::Result<Verdict> {
        if !self.shape_matches(call) {
            return Ok(Verdict::Mismatch(None));
        }
        for (matcher, arg) in self.matchers.iter().zip(call.args()) {
            match matcher.probe(arg)? {
                Verdict::Match => {}
                mismatch @ Verdict::Mismatch(_) => return Ok(mismatch),
            }
        }
        Ok(Verdict::Match)
    }

    fn shape_matches(&self, call: &Call) -> bool {
        !call.is_getter()
            && *self.target.id() == *call.target()
            && *self.method == *call.method()
            && self.matchers.len() == call.args().len()
    }
}

impl fmt::Display for CallSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}(", self.target.id(), self.method)?;
        for (i, matcher) in self.matchers.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", matcher.description())?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Failure, QueryContext, arg, matching};

    fn spec_for(target: &Target, method: &str, matchers: Vec<ArgMatcher>) -> CallSpec {
        CallSpec::new(target.clone(), method, matchers)
    }

    #[test]
    fn satisfied_by_a_matching_call() {
        let ctx = QueryContext::new();
        let repo = ctx.target("repo");
        repo.call("store", [arg(7)]);

        let spec = spec_for(&repo, "store", vec![ArgMatcher::equals(7)]);
        let calls = repo.received_calls();
        assert!(spec.is_satisfied_by(&calls[0]).unwrap());
    }

    #[test]
    fn rejects_other_methods_and_arities() {
        let ctx = QueryContext::new();
        let repo = ctx.target("repo");
        repo.call("store", [arg(7)]);
        repo.call("store", [arg(7), arg(8)]);
        let calls = repo.received_calls();

        let other_method = spec_for(&repo, "load", vec![ArgMatcher::equals(7)]);
        assert!(!other_method.is_satisfied_by(&calls[0]).unwrap());

        let unary = spec_for(&repo, "store", vec![ArgMatcher::equals(7)]);
        assert!(!unary.is_satisfied_by(&calls[1]).unwrap());
    }

    #[test]
    fn rejects_calls_on_a_different_target() {
        let ctx = QueryContext::new();
        let repo = ctx.target("repo");
        let twin = ctx.target("repo");
        twin.call("store", [arg(7)]);

        let spec = spec_for(&repo, "store", vec![ArgMatcher::equals(7)]);
        assert!(!spec.is_satisfied_by(&twin.received_calls()[0]).unwrap());
    }

    #[test]
    fn commit_mode_surfaces_assertion_failures() {
        let ctx = QueryContext::new();
        let repo = ctx.target("repo");
        repo.call("store", [arg(String::from("djir"))]);

        let spec = CallSpec::new(
            repo.clone(),
            "store",
            vec![
                matching(|s: &String| {
                    Failure::expect(s.contains("yo"), format!("{s:?} does not contain \"yo\""))
                })
                .into_matcher(),
            ],
        );

        let err = spec.is_satisfied_by(&repo.received_calls()[0]).unwrap_err();
        assert!(matches!(err, Error::MatcherFailure(_)));
    }

    #[test]
    fn probe_mode_keeps_the_failure_text() {
        let ctx = QueryContext::new();
        let repo = ctx.target("repo");
        repo.call("store", [arg(String::from("djir"))]);

        let spec = CallSpec::new(
            repo.clone(),
            "store",
            vec![
                matching(|s: &String| {
                    Failure::expect(s.contains("yo"), format!("{s:?} does not contain \"yo\""))
                })
                .into_matcher(),
            ],
        );

        match spec.probe(&repo.received_calls()[0]).unwrap() {
            Verdict::Mismatch(Some(failure)) => {
                assert_eq!(failure.message(), "\"djir\" does not contain \"yo\"");
            }
            other => panic!("expected a captured failure, got {other:?}"),
        }
    }

    #[test]
    fn getter_calls_never_satisfy_a_specification() {
        let ctx = QueryContext::new();
        let repo = ctx.target("repo");
        repo.get("len");

        let spec = spec_for(&repo, "len", Vec::new());
        assert!(!spec.is_satisfied_by(&repo.received_calls()[0]).unwrap());
    }

    #[test]
    fn renders_target_method_and_matcher_descriptions() {
        let ctx = QueryContext::new();
        let repo = ctx.target("repo");
        let spec = spec_for(
            &repo,
            "store",
            vec![ArgMatcher::equals(7), ArgMatcher::any::<String>()],
        );
        assert_eq!(spec.to_string(), "repo.store(7, any String)");
    }
}
