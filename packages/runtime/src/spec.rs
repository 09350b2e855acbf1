//! Class specifications and the interface policy table.
//!
//! A [`ClassSpec`] is a bag of named members plus a handful of reserved keys
//! (mixins, statics, type declarations, display name). Mixins are themselves
//! specifications and follow the same override policy.

use crate::callable::Callable;
use crate::class::ComponentClass;
use crate::component::Component;
use crate::element::Element;
use crate::error::RuntimeResult;
use crate::value::{Map, Value};
use std::sync::Arc;

/// Lifecycle hook names
pub mod hooks {
    pub const GET_DEFAULT_PROPS: &str = "getDefaultProps";
    pub const GET_INITIAL_STATE: &str = "getInitialState";
    pub const GET_CHILD_CONTEXT: &str = "getChildContext";
    pub const RENDER: &str = "render";
    pub const COMPONENT_WILL_MOUNT: &str = "componentWillMount";
    pub const COMPONENT_DID_MOUNT: &str = "componentDidMount";
    pub const COMPONENT_WILL_RECEIVE_PROPS: &str = "componentWillReceiveProps";
    pub const SHOULD_COMPONENT_UPDATE: &str = "shouldComponentUpdate";
    pub const COMPONENT_WILL_UPDATE: &str = "componentWillUpdate";
    pub const COMPONENT_DID_UPDATE: &str = "componentDidUpdate";
    pub const COMPONENT_WILL_UNMOUNT: &str = "componentWillUnmount";
    pub const UPDATE_COMPONENT: &str = "updateComponent";
}

/// How a member name may be (re)defined across a specification and its mixins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecPolicy {
    /// At most one definition across specification and mixins
    DefineOnce,
    /// Every definition runs, mixins first, results discarded
    DefineMany,
    /// Every definition runs and object results are merged without collisions
    DefineManyMerged,
    /// May replace the base implementation
    OverrideBase,
}

/// Interface hooks and their policies
pub const INTERFACE: &[(&str, SpecPolicy)] = &[
    (hooks::GET_DEFAULT_PROPS, SpecPolicy::DefineManyMerged),
    (hooks::GET_INITIAL_STATE, SpecPolicy::DefineManyMerged),
    (hooks::GET_CHILD_CONTEXT, SpecPolicy::DefineManyMerged),
    (hooks::RENDER, SpecPolicy::DefineOnce),
    (hooks::COMPONENT_WILL_MOUNT, SpecPolicy::DefineMany),
    (hooks::COMPONENT_DID_MOUNT, SpecPolicy::DefineMany),
    (hooks::COMPONENT_WILL_RECEIVE_PROPS, SpecPolicy::DefineMany),
    (hooks::SHOULD_COMPONENT_UPDATE, SpecPolicy::DefineOnce),
    (hooks::COMPONENT_WILL_UPDATE, SpecPolicy::DefineMany),
    (hooks::COMPONENT_DID_UPDATE, SpecPolicy::DefineMany),
    (hooks::COMPONENT_WILL_UNMOUNT, SpecPolicy::DefineMany),
    (hooks::UPDATE_COMPONENT, SpecPolicy::OverrideBase),
];

/// Methods implemented by the runtime itself
pub const BASE_METHODS: &[&str] = &[
    "mountComponent",
    "unmountComponent",
    "receiveComponent",
    "performUpdateIfNecessary",
    hooks::UPDATE_COMPONENT,
    "setState",
    "replaceState",
    "forceUpdate",
    "isMounted",
];

/// Keys with dedicated composition handlers
pub const RESERVED_KEYS: &[&str] = &[
    "displayName",
    "mixins",
    "statics",
    "propTypes",
    "contextTypes",
    "childContextTypes",
];

pub fn interface_policy(name: &str) -> Option<SpecPolicy> {
    INTERFACE
        .iter()
        .find(|(hook, _)| *hook == name)
        .map(|(_, policy)| *policy)
}

pub fn is_base_method(name: &str) -> bool {
    BASE_METHODS.contains(&name)
}

pub fn is_reserved_key(name: &str) -> bool {
    RESERVED_KEYS.contains(&name)
}

/// Something offered as a mixin.
///
/// Only specifications can be mixed in; classes and elements are accepted here
/// so composition can reject them with a precise error.
#[derive(Debug, Clone)]
pub enum Mixin {
    Spec(Arc<ClassSpec>),
    Class(ComponentClass),
    Element(Element),
}

impl From<ClassSpec> for Mixin {
    fn from(spec: ClassSpec) -> Self {
        Mixin::Spec(Arc::new(spec))
    }
}

impl From<Arc<ClassSpec>> for Mixin {
    fn from(spec: Arc<ClassSpec>) -> Self {
        Mixin::Spec(spec)
    }
}

impl From<ComponentClass> for Mixin {
    fn from(class: ComponentClass) -> Self {
        Mixin::Class(class)
    }
}

impl From<Element> for Mixin {
    fn from(element: Element) -> Self {
        Mixin::Element(element)
    }
}

/// Named member of a specification
#[derive(Debug, Clone)]
pub struct SpecMember {
    pub name: String,
    pub value: Value,
    /// Cleared for functions that must keep their call-site receiver
    pub bindable: bool,
}

/// A class specification (also used for mixins)
#[derive(Debug, Clone, Default)]
pub struct ClassSpec {
    pub(crate) display_name: Option<String>,
    pub(crate) mixins: Vec<Mixin>,
    pub(crate) statics: Vec<(String, Value)>,
    pub(crate) prop_types: Vec<(String, Value)>,
    pub(crate) context_types: Vec<(String, Value)>,
    pub(crate) child_context_types: Vec<(String, Value)>,
    pub(crate) members: Vec<SpecMember>,
}

impl ClassSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(display_name: impl Into<String>) -> Self {
        Self::new().display_name(display_name)
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn mixin(mut self, mixin: impl Into<Mixin>) -> Self {
        self.mixins.push(mixin.into());
        self
    }

    pub fn statics(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.statics.push((name.into(), value.into()));
        self
    }

    pub fn static_fn<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Value]) -> RuntimeResult<Value> + Send + Sync + 'static,
    {
        self.statics(name, Callable::free(f))
    }

    /// Declares a prop type checker. Anything but a function is rejected at
    /// composition time.
    pub fn prop_type(mut self, name: impl Into<String>, checker: impl Into<Value>) -> Self {
        self.prop_types.push((name.into(), checker.into()));
        self
    }

    pub fn context_type(mut self, name: impl Into<String>, checker: impl Into<Value>) -> Self {
        self.context_types.push((name.into(), checker.into()));
        self
    }

    pub fn child_context_type(mut self, name: impl Into<String>, checker: impl Into<Value>) -> Self {
        self.child_context_types.push((name.into(), checker.into()));
        self
    }

    /// Adds a plain data or function member.
    pub fn member(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.members.push(SpecMember {
            name: name.into(),
            value: value.into(),
            bindable: true,
        });
        self
    }

    /// Adds a method. Methods outside the interface are auto-bound at mount.
    pub fn method<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut Component<'_>, &[Value]) -> RuntimeResult<Value> + Send + Sync + 'static,
    {
        self.member(name, Callable::method(f))
    }

    /// Adds a method that is never auto-bound.
    pub fn unbound_method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut Component<'_>, &[Value]) -> RuntimeResult<Value> + Send + Sync + 'static,
    {
        self.members.push(SpecMember {
            name: name.into(),
            value: Value::Function(Callable::method(f)),
            bindable: false,
        });
        self
    }

    pub fn render<F>(self, f: F) -> Self
    where
        F: Fn(&mut Component<'_>) -> RuntimeResult<Element> + Send + Sync + 'static,
    {
        self.method(hooks::RENDER, move |this, _| f(this).map(Value::Element))
    }

    /// `getInitialState`; `None` leaves state null.
    pub fn initial_state<F>(self, f: F) -> Self
    where
        F: Fn(&mut Component<'_>) -> RuntimeResult<Option<Map>> + Send + Sync + 'static,
    {
        self.method(hooks::GET_INITIAL_STATE, move |this, _| f(this).map(Value::from))
    }

    /// `getDefaultProps`; evaluated once when the class is composed.
    pub fn default_props<F>(self, f: F) -> Self
    where
        F: Fn() -> Map + Send + Sync + 'static,
    {
        self.member(
            hooks::GET_DEFAULT_PROPS,
            Callable::free(move |_| Ok(Value::Object(f()))),
        )
    }

    pub fn child_context<F>(self, f: F) -> Self
    where
        F: Fn(&mut Component<'_>) -> RuntimeResult<Map> + Send + Sync + 'static,
    {
        self.method(hooks::GET_CHILD_CONTEXT, move |this, _| f(this).map(Value::Object))
    }

    pub fn will_mount<F>(self, f: F) -> Self
    where
        F: Fn(&mut Component<'_>) -> RuntimeResult<()> + Send + Sync + 'static,
    {
        self.method(hooks::COMPONENT_WILL_MOUNT, move |this, _| {
            f(this).map(|_| Value::Undefined)
        })
    }

    pub fn did_mount<F>(self, f: F) -> Self
    where
        F: Fn(&mut Component<'_>) -> RuntimeResult<()> + Send + Sync + 'static,
    {
        self.method(hooks::COMPONENT_DID_MOUNT, move |this, _| {
            f(this).map(|_| Value::Undefined)
        })
    }

    /// `componentWillReceiveProps(nextProps, nextContext)`
    pub fn will_receive_props<F>(self, f: F) -> Self
    where
        F: Fn(&mut Component<'_>, &Map, Option<&Map>) -> RuntimeResult<()>
            + Send
            + Sync
            + 'static,
    {
        self.method(hooks::COMPONENT_WILL_RECEIVE_PROPS, move |this, args| {
            let next_props = map_arg(args, 0).unwrap_or_default();
            let next_context = map_arg(args, 1);
            f(this, &next_props, next_context.as_ref()).map(|_| Value::Undefined)
        })
    }

    /// `shouldComponentUpdate(nextProps, nextState, nextContext)`
    pub fn should_update<F>(self, f: F) -> Self
    where
        F: Fn(&mut Component<'_>, &Map, Option<&Map>, Option<&Map>) -> RuntimeResult<bool>
            + Send
            + Sync
            + 'static,
    {
        self.method(hooks::SHOULD_COMPONENT_UPDATE, move |this, args| {
            let (props, state, context) = transition_args(args);
            f(this, &props, state.as_ref(), context.as_ref()).map(Value::Boolean)
        })
    }

    /// `componentWillUpdate(nextProps, nextState, nextContext)`
    pub fn will_update<F>(self, f: F) -> Self
    where
        F: Fn(&mut Component<'_>, &Map, Option<&Map>, Option<&Map>) -> RuntimeResult<()>
            + Send
            + Sync
            + 'static,
    {
        self.method(hooks::COMPONENT_WILL_UPDATE, move |this, args| {
            let (props, state, context) = transition_args(args);
            f(this, &props, state.as_ref(), context.as_ref()).map(|_| Value::Undefined)
        })
    }

    /// `componentDidUpdate(prevProps, prevState, prevContext)`
    pub fn did_update<F>(self, f: F) -> Self
    where
        F: Fn(&mut Component<'_>, &Map, Option<&Map>, Option<&Map>) -> RuntimeResult<()>
            + Send
            + Sync
            + 'static,
    {
        self.method(hooks::COMPONENT_DID_UPDATE, move |this, args| {
            let (props, state, context) = transition_args(args);
            f(this, &props, state.as_ref(), context.as_ref()).map(|_| Value::Undefined)
        })
    }

    pub fn will_unmount<F>(self, f: F) -> Self
    where
        F: Fn(&mut Component<'_>) -> RuntimeResult<()> + Send + Sync + 'static,
    {
        self.method(hooks::COMPONENT_WILL_UNMOUNT, move |this, _| {
            f(this).map(|_| Value::Undefined)
        })
    }

    /// Replaces the base render-and-reconcile routine. Receives the element
    /// the instance was previously rendered from.
    pub fn update_component<F>(self, f: F) -> Self
    where
        F: Fn(&mut Component<'_>, &Element) -> RuntimeResult<()> + Send + Sync + 'static,
    {
        self.method(hooks::UPDATE_COMPONENT, move |this, args| {
            let result = match args.first() {
                Some(Value::Element(previous)) => f(this, previous),
                _ => Err(crate::error::RuntimeError::hook(
                    "updateComponent expects the previous element",
                )),
            };
            result.map(|_| Value::Undefined)
        })
    }
}

fn map_arg(args: &[Value], index: usize) -> Option<Map> {
    args.get(index).and_then(Value::as_object).cloned()
}

fn transition_args(args: &[Value]) -> (Map, Option<Map>, Option<Map>) {
    (
        map_arg(args, 0).unwrap_or_default(),
        map_arg(args, 1),
        map_arg(args, 2),
    )
}
