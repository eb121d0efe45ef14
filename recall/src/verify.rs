//! Order verification over a finalized [`Query`].
//!
//! Two algorithms share the same diagnostics: exact order aligns the merged,
//! sequence-ordered call history of every referenced target against the
//! trace position by position in commit mode; any-order consumes, per
//! target, the first remaining call that probes as a match for each
//! specification in registration order. Property-getter calls are excluded
//! from both.

use std::{collections::HashSet, fmt};

use crate::{
    Call, CallSpec, Error, Failure, Query, Result, Target, matcher::Verdict,
    report::SequenceReport,
};

impl Query {
    /// Checks that the referenced targets received exactly this sequence of
    /// calls, merged across targets by global sequence number.
    ///
    /// Length policy: fewer actual calls than specifications fails; surplus
    /// actual calls beyond the last specification are ignored.
    ///
    /// # Errors
    ///
    /// [`Error::SequenceNotFound`] on any mismatch, with the expected and
    /// actual sequences (and any matcher failure text) in its report;
    /// [`Error::Matcher`] if a matcher raised an unexpected error.
    pub fn verify_exact_order(&self) -> Result<()> {
        let actual = self.merged_calls();
        if actual.len() < self.len() {
            return Err(exact_not_found(self, &actual, None));
        }

        for (spec, call) in self.specs().iter().zip(&actual) {
            match spec.is_satisfied_by(call) {
                Ok(true) => {}
                Ok(false) => return Err(exact_not_found(self, &actual, None)),
                Err(Error::MatcherFailure(failure)) => {
                    return Err(exact_not_found(self, &actual, Some(failure)));
                }
                Err(other) => return Err(other),
            }
        }

        tracing::debug!(
            specs = self.len(),
            calls = actual.len(),
            "exact call order verified"
        );
        Ok(())
    }

    /// Checks that every specification is satisfied by a distinct call on
    /// its target, regardless of order.
    ///
    /// Specifications are processed per target in registration order; each
    /// consumes the first remaining call of that target that fully matches,
    /// so one call never satisfies two specifications. Candidates are probed
    /// silently — failure text from a rejected candidate is discarded, and
    /// only the last captured text is kept for the no-candidate diagnostic.
    ///
    /// # Errors
    ///
    /// [`Error::SequenceNotFound`] when a specification has no remaining
    /// matching call; [`Error::Matcher`] if a matcher raised an unexpected
    /// error.
    pub fn verify_any_order(&self) -> Result<()> {
        for (target, group) in self.specs_by_target() {
            let mut remaining: Vec<Call> = target
                .received_calls()
                .into_iter()
                .filter(|call| !call.is_getter())
                .collect();

            for spec in group {
                let mut last_failure = None;
                let mut matched = None;
                for (index, call) in remaining.iter().enumerate() {
                    match spec.probe(call)? {
                        Verdict::Match => {
                            matched = Some(index);
                            break;
                        }
                        Verdict::Mismatch(failure) => {
                            if failure.is_some() {
                                last_failure = failure;
                            }
                        }
                    }
                }
                match matched {
                    Some(index) => {
                        remaining.remove(index);
                    }
                    None => {
                        return Err(any_order_not_found(self, spec, &remaining, last_failure));
                    }
                }
            }
        }

        tracing::debug!(specs = self.len(), "call multiset verified per target");
        Ok(())
    }

    /// All targets referenced anywhere in the trace, in first-appearance
    /// order, each exactly once.
    fn distinct_targets(&self) -> Vec<&Target> {
        let mut seen = HashSet::new();
        self.specs()
            .iter()
            .map(CallSpec::target)
            .filter(|target| seen.insert(target.id().clone()))
            .collect()
    }

    /// The referenced targets' non-getter histories, merged into one
    /// sequence ordered by global sequence number.
    fn merged_calls(&self) -> Vec<Call> {
        let mut calls: Vec<Call> = self
            .distinct_targets()
            .into_iter()
            .flat_map(Target::received_calls)
            .filter(|call| !call.is_getter())
            .collect();
        calls.sort_by_key(Call::seq);
        calls
    }

    /// Specifications grouped by target, preserving registration order both
    /// across groups and within each group.
    fn specs_by_target(&self) -> Vec<(&Target, Vec<&CallSpec>)> {
        let mut groups: Vec<(&Target, Vec<&CallSpec>)> = Vec::new();
        for spec in self.specs() {
            match groups.iter_mut().find(|(t, _)| **t == *spec.target()) {
                Some((_, group)) => group.push(spec),
                None => groups.push((spec.target(), vec![spec])),
            }
        }
        groups
    }
}

fn exact_not_found(query: &Query, actual: &[Call], failure: Option<Failure>) -> Error {
    Error::SequenceNotFound(Box::new(SequenceReport::exact(
        render(query.specs()),
        render(actual),
        failure.map(|f| f.message().to_string()),
    )))
}

fn any_order_not_found(
    query: &Query,
    unmatched: &CallSpec,
    remaining: &[Call],
    failure: Option<Failure>,
) -> Error {
    Error::SequenceNotFound(Box::new(SequenceReport::any_order(
        render(query.specs()),
        unmatched.to_string(),
        render(remaining),
        failure.map(|f| f.message().to_string()),
    )))
}

fn render<T: fmt::Display>(items: &[T]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}
