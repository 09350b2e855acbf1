//! Function values.
//!
//! Hooks, auto-bound methods, statics, and type checkers are all [`Callable`]s.
//! Composition never wraps a function in a closure that needs the runtime;
//! it builds `Chained`/`Sequenced`/`Merged` pairs that the runtime walks at
//! invocation time, so a composed class stays plain data.

use crate::component::Component;
use crate::error::{RuntimeError, RuntimeResult};
use crate::instance::InstanceId;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Receiver-less function: statics, validators, default-props factories.
pub type FreeFn = dyn Fn(&[Value]) -> RuntimeResult<Value> + Send + Sync;

/// Method invoked with a receiving component instance.
pub type MethodFn = dyn Fn(&mut Component<'_>, &[Value]) -> RuntimeResult<Value> + Send + Sync;

#[derive(Clone)]
pub enum Callable {
    Free(Arc<FreeFn>),
    Method(Arc<MethodFn>),
    /// A method permanently bound to one instance (auto-binding).
    Bound(InstanceId, Arc<Callable>),
    /// Invokes both in order and discards their results.
    Chained(Arc<(Callable, Callable)>),
    /// Invokes both in order and returns the second result.
    Sequenced(Arc<(Callable, Callable)>),
    /// Invokes both and shallow-merges their object results.
    Merged(Arc<(Callable, Callable)>),
}

impl Callable {
    pub fn free<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> RuntimeResult<Value> + Send + Sync + 'static,
    {
        Callable::Free(Arc::new(f))
    }

    pub fn method<F>(f: F) -> Self
    where
        F: Fn(&mut Component<'_>, &[Value]) -> RuntimeResult<Value> + Send + Sync + 'static,
    {
        Callable::Method(Arc::new(f))
    }

    /// Type checker with the `(values, name, component, location)` calling
    /// convention. Return `Some(message)` to report a mismatch.
    pub fn validator<F>(f: F) -> Self
    where
        F: Fn(&crate::value::Map, &str, &str, &str) -> Option<String> + Send + Sync + 'static,
    {
        Callable::free(move |args| {
            let values = args
                .first()
                .and_then(Value::as_object)
                .unwrap_or(&crate::value::EMPTY_MAP);
            let name = args.get(1).and_then(Value::as_str).unwrap_or_default();
            let component = args.get(2).and_then(Value::as_str).unwrap_or_default();
            let location = args.get(3).and_then(Value::as_str).unwrap_or_default();
            Ok(f(values, name, component, location).map_or(Value::Undefined, Value::String))
        })
    }

    pub fn chain(first: Callable, second: Callable) -> Self {
        Callable::Chained(Arc::new((first, second)))
    }

    pub fn sequence(first: Callable, second: Callable) -> Self {
        Callable::Sequenced(Arc::new((first, second)))
    }

    pub fn merge(first: Callable, second: Callable) -> Self {
        Callable::Merged(Arc::new((first, second)))
    }

    pub fn bind(&self, instance: InstanceId) -> Self {
        match self {
            // Rebinding keeps the original receiver.
            Callable::Bound(..) => self.clone(),
            other => Callable::Bound(instance, Arc::new(other.clone())),
        }
    }

    /// True when invoking this callable needs a receiving instance.
    pub fn needs_receiver(&self) -> bool {
        match self {
            Callable::Free(_) | Callable::Bound(..) => false,
            Callable::Method(_) => true,
            Callable::Chained(pair) | Callable::Sequenced(pair) | Callable::Merged(pair) => {
                pair.0.needs_receiver() || pair.1.needs_receiver()
            }
        }
    }

    /// Invokes a callable that does not need the runtime: free functions and
    /// compositions of them.
    pub fn call_detached(&self, args: &[Value]) -> RuntimeResult<Value> {
        match self {
            Callable::Free(f) => f(args),
            Callable::Method(_) | Callable::Bound(..) => Err(RuntimeError::MissingReceiver),
            Callable::Chained(pair) => {
                pair.0.call_detached(args)?;
                pair.1.call_detached(args)?;
                Ok(Value::Undefined)
            }
            Callable::Sequenced(pair) => {
                pair.0.call_detached(args)?;
                pair.1.call_detached(args)
            }
            Callable::Merged(pair) => {
                let first = pair.0.call_detached(args)?;
                let second = pair.1.call_detached(args)?;
                merge_results(first, second)
            }
        }
    }
}

/// Shallow-merges two hook results. A nullish side yields the other side;
/// otherwise both must be objects with disjoint keys.
pub fn merge_results(first: Value, second: Value) -> RuntimeResult<Value> {
    match (first, second) {
        (first, second) if first.is_nullish() => Ok(second),
        (first, second) if second.is_nullish() => Ok(first),
        (Value::Object(mut merged), Value::Object(other)) => {
            for (key, value) in other {
                if merged.contains_key(&key) {
                    return Err(RuntimeError::MergeKeyCollision { key });
                }
                merged.insert(key, value);
            }
            Ok(Value::Object(merged))
        }
        (Value::Object(_), other) | (other, _) => Err(RuntimeError::MergeNonObject {
            found: other.type_name(),
        }),
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Free(_) => write!(f, "[function]"),
            Callable::Method(_) => write!(f, "[method]"),
            Callable::Bound(instance, inner) => write!(f, "[bound {:?} to {}]", inner, instance),
            Callable::Chained(pair) => write!(f, "[chained {:?}, {:?}]", pair.0, pair.1),
            Callable::Sequenced(pair) => write!(f, "[sequenced {:?}, {:?}]", pair.0, pair.1),
            Callable::Merged(pair) => write!(f, "[merged {:?}, {:?}]", pair.0, pair.1),
        }
    }
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Callable::Free(a), Callable::Free(b)) => Arc::ptr_eq(a, b),
            (Callable::Method(a), Callable::Method(b)) => Arc::ptr_eq(a, b),
            (Callable::Bound(ia, a), Callable::Bound(ib, b)) => ia == ib && a == b,
            (Callable::Chained(a), Callable::Chained(b))
            | (Callable::Sequenced(a), Callable::Sequenced(b))
            | (Callable::Merged(a), Callable::Merged(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}
