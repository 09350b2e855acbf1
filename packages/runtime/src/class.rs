use crate::callable::Callable;
use crate::element::Element;
use crate::error::{RuntimeError, RuntimeResult};
use crate::value::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Declared type checkers: name -> validator
pub type TypeDecls = BTreeMap<String, Callable>;

pub const DEFAULT_DISPLAY_NAME: &str = "CompositeComponent";

/// Composed component type.
///
/// Produced once by the composer and immutable afterwards; instances only
/// ever read from it. Clones share the same definition and compare equal
/// only to clones of themselves.
#[derive(Clone)]
pub struct ComponentClass {
    inner: Arc<ClassDef>,
}

#[derive(Default)]
pub(crate) struct ClassDef {
    pub(crate) display_name: Option<String>,
    pub(crate) prototype: BTreeMap<String, Value>,
    pub(crate) autobind: BTreeSet<String>,
    pub(crate) prop_types: Option<TypeDecls>,
    pub(crate) context_types: Option<TypeDecls>,
    pub(crate) child_context_types: Option<TypeDecls>,
    pub(crate) default_props: Option<Map>,
    pub(crate) statics: BTreeMap<String, Value>,
}

impl ComponentClass {
    pub(crate) fn from_def(def: ClassDef) -> Self {
        Self {
            inner: Arc::new(def),
        }
    }

    pub fn display_name(&self) -> &str {
        self.inner
            .display_name
            .as_deref()
            .unwrap_or(DEFAULT_DISPLAY_NAME)
    }

    /// Element of this class with the given raw props
    pub fn element(&self, props: Map) -> Element {
        Element::composite(self, props)
    }

    pub fn member(&self, name: &str) -> Option<&Value> {
        self.inner.prototype.get(name)
    }

    /// Function member by name (hooks, methods)
    pub fn hook(&self, name: &str) -> Option<&Callable> {
        self.member(name).and_then(Value::as_callable)
    }

    pub fn has_hook(&self, name: &str) -> bool {
        self.hook(name).is_some()
    }

    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.inner.prototype.keys().map(String::as_str)
    }

    /// Methods rebound to each instance at mount
    pub fn autobind_names(&self) -> impl Iterator<Item = &str> {
        self.inner.autobind.iter().map(String::as_str)
    }

    pub fn is_autobound(&self, name: &str) -> bool {
        self.inner.autobind.contains(name)
    }

    pub fn default_props(&self) -> Option<&Map> {
        self.inner.default_props.as_ref()
    }

    pub fn prop_types(&self) -> Option<&TypeDecls> {
        self.inner.prop_types.as_ref()
    }

    pub fn context_types(&self) -> Option<&TypeDecls> {
        self.inner.context_types.as_ref()
    }

    pub fn child_context_types(&self) -> Option<&TypeDecls> {
        self.inner.child_context_types.as_ref()
    }

    pub fn static_member(&self, name: &str) -> Option<&Value> {
        self.inner.statics.get(name)
    }

    pub fn static_names(&self) -> impl Iterator<Item = &str> {
        self.inner.statics.keys().map(String::as_str)
    }

    /// Invokes a static function. Statics have no receiving instance.
    pub fn call_static(&self, name: &str, args: &[Value]) -> RuntimeResult<Value> {
        match self.static_member(name) {
            Some(Value::Function(callable)) => callable.call_detached(args),
            _ => Err(RuntimeError::NotCallable {
                component: self.display_name().to_string(),
                name: name.to_string(),
            }),
        }
    }

    pub fn ptr_eq(a: &ComponentClass, b: &ComponentClass) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

impl PartialEq for ComponentClass {
    fn eq(&self, other: &Self) -> bool {
        ComponentClass::ptr_eq(self, other)
    }
}

impl fmt::Debug for ComponentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentClass")
            .field("display_name", &self.display_name())
            .field("members", &self.inner.prototype.keys().collect::<Vec<_>>())
            .field("autobind", &self.inner.autobind)
            .finish()
    }
}
