use std::{
    any::{Any, TypeId},
    fmt,
    sync::Arc,
};

use crate::{CallArg, Error, Failure, arg::EqFn};

/// Boxed error type returned by matcher assertions.
///
/// Assertions signal an intentional mismatch by returning a
/// [`Failure`] (directly or boxed); any other error type is treated as an
/// unexpected matcher error and propagates unchanged.
pub type AssertError = Box<dyn std::error::Error + Send + Sync>;

type MatchFn = Arc<dyn Fn(&(dyn Any + Send + Sync)) -> crate::Result<Verdict> + Send + Sync>;

/// Outcome of evaluating one argument against a matcher.
#[derive(Debug)]
pub(crate) enum Verdict {
    Match,
    /// Non-match; carries the failure text when the assertion reported one.
    Mismatch(Option<Failure>),
}

/// A matcher for one call argument, evaluated in two modes.
///
/// *Probe* mode ([`try_match`](Self::try_match)) evaluates silently: an
/// assertion failure is captured and the candidate is simply rejected.
/// *Commit* mode ([`assert_match`](Self::assert_match)) lets the failure
/// escape so its message reaches the caller. Both modes check the declared
/// parameter type first — an argument of the wrong type is a non-match and
/// the assertion is never invoked.
///
/// # Example
///
/// ```ignore
/// use recall::{ArgMatcher, Failure};
///
/// // Equality
/// let m = ArgMatcher::equals(String::from("a"));
///
/// // Plain predicate
/// let m = ArgMatcher::satisfies("an even number", |n: &i32| n % 2 == 0);
///
/// // Assertion-style, with a failure message for diagnostics
/// let m = ArgMatcher::asserts("contains \"yo\"", |s: &String| {
///     Failure::expect(s.contains("yo"), format!("{s:?} does not contain \"yo\""))
/// });
///
/// // Wildcard
/// let m = ArgMatcher::any::<u64>();
/// ```
#[derive(Clone)]
pub struct ArgMatcher {
    for_type: TypeId,
    type_name: &'static str,
    description: Arc<str>,
    matcher: MatchFn,
}

/// Registers an assertion-style matcher and returns the placeholder argument
/// to use in the mock call expression.
///
/// ```ignore
/// ctx.received_in_order(|| {
///     mock.call("compare_to", [matching(|s: &String| {
///         Failure::expect(s == "a", format!("expected \"a\", got {s}"))
///     })]);
/// })?;
/// ```
pub fn matching<T, E, F>(assertion: F) -> CallArg
where
    T: Any + Send + Sync,
    E: Into<AssertError>,
    F: Fn(&T) -> Result<(), E> + Send + Sync + 'static,
{
    CallArg::placeholder(ArgMatcher::asserts(
        format!("match<{}>", short_type_name::<T>()),
        assertion,
    ))
}

/// Returns a placeholder argument that accepts any value of type `T`.
pub fn any_arg<T: Any + Send + Sync>() -> CallArg {
    CallArg::placeholder(ArgMatcher::any::<T>())
}

impl ArgMatcher {
    /// Wraps an assertion routine into a dual-mode matcher.
    ///
    /// The assertion returns `Ok(())` for a match and `Err` otherwise; an
    /// error that downcasts to [`Failure`] is an intentional mismatch whose
    /// message is kept for diagnostics, anything else is an unexpected
    /// matcher error.
    pub fn asserts<T, E, F>(description: impl Into<String>, assertion: F) -> Self
    where
        T: Any + Send + Sync,
        E: Into<AssertError>,
        F: Fn(&T) -> Result<(), E> + Send + Sync + 'static,
    {
        let matcher: MatchFn = Arc::new(move |value| {
            let Some(value) = value.downcast_ref::<T>() else {
                return Ok(Verdict::Mismatch(None));
            };
            match assertion(value) {
                Ok(()) => Ok(Verdict::Match),
                Err(raised) => {
                    let raised: AssertError = raised.into();
                    match raised.downcast::<Failure>() {
                        Ok(failure) => Ok(Verdict::Mismatch(Some(*failure))),
                        Err(other) => Err(Error::Matcher(Arc::from(other))),
                    }
                }
            }
        });
        Self::from_parts(TypeId::of::<T>(), std::any::type_name::<T>(), description, matcher)
    }

    /// Wraps a plain predicate. Rejections carry no failure text.
    pub fn satisfies<T, F>(description: impl Into<String>, predicate: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let matcher: MatchFn = Arc::new(move |value| {
            Ok(match value.downcast_ref::<T>() {
                Some(value) if predicate(value) => Verdict::Match,
                _ => Verdict::Mismatch(None),
            })
        });
        Self::from_parts(TypeId::of::<T>(), std::any::type_name::<T>(), description, matcher)
    }

    /// Matches by equality with `expected`.
    pub fn equals<T>(expected: T) -> Self
    where
        T: Any + PartialEq + fmt::Debug + Send + Sync,
    {
        let description = format!("{expected:?}");
        Self::satisfies(description, move |value: &T| *value == expected)
    }

    /// Matches any value of type `T`.
    pub fn any<T: Any + Send + Sync>() -> Self {
        Self::satisfies(format!("any {}", short_type_name::<T>()), |_: &T| true)
    }

    /// Equality matcher derived from a literal argument in an expectation.
    pub(crate) fn from_value(
        for_type: TypeId,
        type_name: &'static str,
        rendered: Arc<str>,
        eq: EqFn,
    ) -> Self {
        let matcher: MatchFn = Arc::new(move |value| {
            Ok(if eq(value) {
                Verdict::Match
            } else {
                Verdict::Mismatch(None)
            })
        });
        Self {
            for_type,
            type_name,
            description: rendered,
            matcher,
        }
    }

    fn from_parts(
        for_type: TypeId,
        type_name: &'static str,
        description: impl Into<String>,
        matcher: MatchFn,
    ) -> Self {
        Self {
            for_type,
            type_name,
            description: Arc::from(description.into().as_str()),
            matcher,
        }
    }

    /// Probe mode: evaluates silently and reports pass/fail.
    ///
    /// Assertion failures never surface here. An unexpected matcher error
    /// (anything that is not a [`Failure`]) still returns `Err` — it is a
    /// broken matcher, not a non-match.
    pub fn try_match(&self, arg: &CallArg) -> crate::Result<bool> {
        Ok(matches!(self.evaluate(arg)?, Verdict::Match))
    }

    /// Commit mode: a structured assertion failure escapes as
    /// [`Error::MatcherFailure`]; a plain non-match (wrong type or silent
    /// predicate rejection) is reported the same way with a synthesized
    /// message.
    pub fn assert_match(&self, arg: &CallArg) -> crate::Result<()> {
        match self.evaluate(arg)? {
            Verdict::Match => Ok(()),
            Verdict::Mismatch(Some(failure)) => Err(Error::MatcherFailure(failure)),
            Verdict::Mismatch(None) => Err(Error::MatcherFailure(Failure::new(format!(
                "expected an argument matching {}",
                self.description
            )))),
        }
    }

    /// Probe mode, retaining the captured failure text for diagnostics.
    pub(crate) fn probe(&self, arg: &CallArg) -> crate::Result<Verdict> {
        self.evaluate(arg)
    }

    fn evaluate(&self, arg: &CallArg) -> crate::Result<Verdict> {
        match arg.value_of_type(self.for_type) {
            Some(value) => (self.matcher)(value),
            // Wrong type or placeholder: non-match, assertion not invoked.
            None => Ok(Verdict::Mismatch(None)),
        }
    }

    /// Human-readable description used in mismatch reports.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Name of the declared parameter type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for ArgMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgMatcher")
            .field("for_type", &self.type_name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

fn short_type_name<T>() -> &'static str {
    let name = std::any::type_name::<T>();
    name.rsplit("::").next().unwrap_or(name)
}
