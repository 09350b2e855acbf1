use crate::callable::Callable;
use crate::element::Element;
use crate::error::RuntimeResult;
use crate::instance::{InstanceId, LifecyclePhase, Node};
use crate::runtime::Runtime;
use crate::value::{Map, Value, EMPTY_MAP};

/// Receiver handle passed to hooks and methods.
///
/// Borrows the runtime for the duration of a single call, so a hook can read
/// its own props, state, and context and stage updates without holding on to
/// the instance.
pub struct Component<'rt> {
    rt: &'rt mut Runtime,
    id: InstanceId,
}

impl<'rt> Component<'rt> {
    pub(crate) fn new(rt: &'rt mut Runtime, id: InstanceId) -> Self {
        Self { rt, id }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    fn node(&self) -> Option<&Node> {
        self.rt.node(self.id)
    }

    pub fn display_name(&self) -> String {
        self.node()
            .map(|node| node.element().type_name())
            .unwrap_or_default()
    }

    pub fn props(&self) -> &Map {
        self.node()
            .and_then(Node::as_composite)
            .map_or(&EMPTY_MAP, |instance| &instance.props)
    }

    /// Single prop, `Undefined` when absent
    pub fn prop(&self, name: &str) -> Value {
        self.props().get(name).cloned().unwrap_or_default()
    }

    pub fn state(&self) -> Option<&Map> {
        self.node()
            .and_then(Node::as_composite)
            .and_then(|instance| instance.state.as_ref())
    }

    pub fn state_value(&self, name: &str) -> Value {
        self.state()
            .and_then(|state| state.get(name))
            .cloned()
            .unwrap_or_default()
    }

    /// Masked context; `None` when the class declares no context types
    pub fn context(&self) -> Option<&Map> {
        self.node()
            .and_then(Node::as_composite)
            .and_then(|instance| instance.context.as_ref())
    }

    pub fn context_value(&self, name: &str) -> Value {
        self.context()
            .and_then(|context| context.get(name))
            .cloned()
            .unwrap_or_default()
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.node()
            .and_then(Node::as_composite)
            .map(|instance| instance.phase)
            .unwrap_or_default()
    }

    pub fn is_mounted(&self) -> bool {
        self.rt.is_mounted(self.id)
    }

    pub fn owner(&self) -> Option<InstanceId> {
        self.rt.owner(self.id)
    }

    pub fn rendered_child(&self) -> Option<InstanceId> {
        self.rt.rendered_child(self.id)
    }

    pub fn set_state(&mut self, partial: Map) -> RuntimeResult<()> {
        self.rt.set_state(self.id, partial)
    }

    /// `setState` with a callback run once the update has been applied
    pub fn set_state_then(&mut self, partial: Map, callback: Callable) -> RuntimeResult<()> {
        self.rt.set_state_with(self.id, partial, callback)
    }

    pub fn replace_state(&mut self, state: Option<Map>) -> RuntimeResult<()> {
        self.rt.replace_state(self.id, state)
    }

    pub fn force_update(&mut self) -> RuntimeResult<()> {
        self.rt.force_update(self.id)
    }

    /// Call one of this instance's function members
    pub fn call(&mut self, name: &str, args: &[Value]) -> RuntimeResult<Value> {
        self.rt.call_method(self.id, name, args)
    }

    /// Member as seen through this instance (auto-bound methods come back
    /// bound to it)
    pub fn method(&self, name: &str) -> Value {
        self.rt.method(self.id, name).unwrap_or_default()
    }

    /// Raw class member without binding
    pub fn member(&self, name: &str) -> Option<Value> {
        self.node()
            .and_then(Node::as_composite)
            .and_then(|instance| instance.class.member(name).cloned())
    }

    /// Invoke a function value, such as a callback passed down through props
    pub fn invoke(&mut self, value: &Value, args: &[Value]) -> RuntimeResult<Value> {
        self.rt.call_value(value, args)
    }

    /// Base render-and-reconcile routine. Overrides of `updateComponent` call
    /// this to keep the default behavior.
    pub fn update_rendered_child(&mut self) -> RuntimeResult<()> {
        self.rt.update_rendered_child(self.id)
    }

    /// Element this instance is currently rendered from
    pub fn element(&self) -> Option<&Element> {
        self.node().map(Node::element)
    }

    /// Underlying runtime, for driving other instances from a hook
    pub fn runtime(&mut self) -> &mut Runtime {
        &mut *self.rt
    }
}
