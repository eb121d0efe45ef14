use std::{any::Any, fmt, sync::Arc};

use crate::matcher::ArgMatcher;

pub(crate) type EqFn = Arc<dyn Fn(&(dyn Any + Send + Sync)) -> bool + Send + Sync>;

#[derive(Clone)]
enum ArgRepr {
    Value {
        value: Arc<dyn Any + Send + Sync>,
        type_name: &'static str,
        rendered: Arc<str>,
        eq: EqFn,
    },
    Placeholder(ArgMatcher),
}

/// One argument of a call.
///
/// Either a concrete value (as observed on a recorded call, or as a literal
/// in an expectation, where it turns into an equality matcher) or a matcher
/// placeholder produced by [`matching`](crate::matching) /
/// [`any_arg`](crate::any_arg) for use inside a mock call expression.
///
/// Matching is typed: a matcher declared for `String` does not accept a
/// `&str` argument. Use the same concrete type on both the recording and the
/// expectation side — `arg("x")` stores `&'static str`, `arg(String::from("x"))`
/// stores `String`.
#[derive(Clone)]
pub struct CallArg {
    repr: ArgRepr,
}

/// Wraps a concrete value as a call argument.
///
/// Shorthand for [`CallArg::of`]; reads well inline:
///
/// ```ignore
/// mock.call("fetch", [arg(42), arg(String::from("primary"))]);
/// ```
pub fn arg<T>(value: T) -> CallArg
where
    T: Any + PartialEq + fmt::Debug + Send + Sync,
{
    CallArg::of(value)
}

impl CallArg {
    /// Wraps a concrete value, capturing its rendering and equality so the
    /// value can later be compared and reported without knowing its type.
    pub fn of<T>(value: T) -> Self
    where
        T: Any + PartialEq + fmt::Debug + Send + Sync,
    {
        let rendered: Arc<str> = Arc::from(format!("{value:?}").as_str());
        let value: Arc<T> = Arc::new(value);
        let eq: EqFn = {
            let expected = Arc::clone(&value);
            Arc::new(move |other: &(dyn Any + Send + Sync)| {
                other.downcast_ref::<T>() == Some(&*expected)
            })
        };
        Self {
            repr: ArgRepr::Value {
                value,
                type_name: std::any::type_name::<T>(),
                rendered,
                eq,
            },
        }
    }

    pub(crate) fn placeholder(matcher: ArgMatcher) -> Self {
        Self {
            repr: ArgRepr::Placeholder(matcher),
        }
    }

    /// Returns true if this argument is a matcher placeholder rather than a
    /// concrete value.
    pub fn is_placeholder(&self) -> bool {
        matches!(self.repr, ArgRepr::Placeholder(_))
    }

    /// Typed access to a concrete argument value.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match &self.repr {
            ArgRepr::Value { value, .. } => value.downcast_ref::<T>(),
            ArgRepr::Placeholder(_) => None,
        }
    }

    /// The concrete value, if present and of the requested type id.
    pub(crate) fn value_of_type(
        &self,
        ty: std::any::TypeId,
    ) -> Option<&(dyn Any + Send + Sync)> {
        match &self.repr {
            ArgRepr::Value { value, .. } if (**value).type_id() == ty => Some(&**value),
            _ => None,
        }
    }

    /// Converts this argument into the matcher used when it appears in an
    /// expectation: placeholders contribute their matcher, concrete values
    /// become equality matchers.
    pub(crate) fn into_matcher(self) -> ArgMatcher {
        match self.repr {
            ArgRepr::Placeholder(matcher) => matcher,
            ArgRepr::Value {
                value,
                type_name,
                rendered,
                eq,
            } => ArgMatcher::from_value((*value).type_id(), type_name, rendered, eq),
        }
    }
}

impl fmt::Display for CallArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            ArgRepr::Value { rendered, .. } => write!(f, "{rendered}"),
            ArgRepr::Placeholder(matcher) => write!(f, "{}", matcher.description()),
        }
    }
}

impl fmt::Debug for CallArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            ArgRepr::Value {
                type_name,
                rendered,
                ..
            } => f
                .debug_struct("CallArg")
                .field("type", type_name)
                .field("value", rendered)
                .finish(),
            ArgRepr::Placeholder(matcher) => f
                .debug_struct("CallArg")
                .field("matcher", &matcher.description())
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_the_debug_form_of_the_value() {
        assert_eq!(arg(5).to_string(), "5");
        assert_eq!(arg(String::from("a")).to_string(), "\"a\"");
    }

    #[test]
    fn downcasts_to_the_concrete_type() {
        let wrapped = arg(42u32);
        assert_eq!(wrapped.downcast_ref::<u32>(), Some(&42));
        assert_eq!(wrapped.downcast_ref::<i32>(), None);
    }

    #[test]
    fn literal_becomes_an_equality_matcher() {
        let matcher = arg(7i64).into_matcher();
        assert!(matcher.try_match(&arg(7i64)).unwrap());
        assert!(!matcher.try_match(&arg(8i64)).unwrap());
    }

    #[test]
    fn equality_across_types_is_a_non_match() {
        let matcher = arg(7i64).into_matcher();
        assert!(!matcher.try_match(&arg(7i32)).unwrap());
    }
}
