//! Composite lifecycle state machine.
//!
//! ```text
//!   idle ──mount──▶ mounting ──render──▶ idle
//!   idle ──(pending element)──▶ receivingProps ──▶ receivingState ──▶ idle
//!   idle ──(pending state/context/force)──────────▶ receivingState ──▶ idle
//!   mounted ──▶ unmounting ──▶ (removed)
//! ```
//!
//! State mutations are legal while mounting (they are folded in before the
//! first render) and while mounted and idle or receiving props. They are
//! rejected while receiving state, while unmounting, and while any render is
//! on the stack.

use crate::callable::Callable;
use crate::class::ComponentClass;
use crate::element::Element;
use crate::error::{RuntimeError, RuntimeResult};
use crate::instance::{InstanceId, LifecyclePhase, MountState};
use crate::runtime::Runtime;
use crate::scheduler::Ready;
use crate::spec::hooks;
use crate::vdom::VNode;
use crate::value::{Map, Value};
use tracing::{debug, warn};

/// What a state-mutating call asks for
enum StateChange {
    Merge(Map),
    Replace(Option<Map>),
    Force,
}

/// Values a transition is heading towards
struct NextValues {
    element: Element,
    props: Map,
    state: Option<Map>,
    context: Option<Map>,
    ambient: Map,
}

impl Runtime {
    // ------------------------------------------------------------------
    // Mount
    // ------------------------------------------------------------------

    /// Mount a composite already placed in the arena. Returns the output of
    /// its rendered subtree.
    pub(crate) fn mount_composite(&mut self, id: InstanceId) -> RuntimeResult<VNode> {
        let (class, raw_props, ambient) = {
            let instance = self.composite_mut(id)?;
            instance.mount_state = MountState::Mounted;
            instance.phase = LifecyclePhase::Mounting;
            (
                instance.class.clone(),
                instance.element.props.clone(),
                instance.ambient_context.clone(),
            )
        };
        debug!(instance = %id, component = class.display_name(), "Mounting composite");

        let context = self.mask_context(&class, &ambient);
        let props = self.process_props(&class, &raw_props);
        {
            let instance = self.composite_mut(id)?;
            instance.context = context;
            instance.props = props;
            instance.bound_methods = class
                .autobind_names()
                .filter_map(|name| class.hook(name).map(|method| (name.to_string(), method.bind(id))))
                .collect();
        }

        let initial_state = match self.call_hook(id, hooks::GET_INITIAL_STATE, &[])? {
            None => None,
            Some(Value::Object(state)) => Some(state),
            Some(Value::Null) => None,
            Some(other) => {
                return Err(RuntimeError::InvalidInitialState {
                    component: class.display_name().to_string(),
                    found: other.type_name(),
                })
            }
        };
        {
            let instance = self.composite_mut(id)?;
            instance.state = initial_state;
            instance.pending_state = None;
            instance.pending_force_update = false;
        }

        if class.has_hook(hooks::COMPONENT_WILL_MOUNT) {
            self.call_hook(id, hooks::COMPONENT_WILL_MOUNT, &[])?;
            // State staged in componentWillMount applies without a re-render.
            let instance = self.composite_mut(id)?;
            if let Some(pending) = instance.pending_state.take() {
                instance.state = pending;
            }
            // The first render below satisfies any force staged so far.
            instance.pending_force_update = false;
        }

        let (child, child_context) = self.render_validated(id)?;

        let (node_id, depth) = {
            let instance = self.composite_mut(id)?;
            instance.phase = LifecyclePhase::Idle;
            (instance.node_id.clone(), instance.mount_depth)
        };

        let (child_id, output) = self.mount_node(child, node_id, depth + 1, &child_context)?;

        let (callbacks, staged_late) = {
            let instance = self.composite_mut(id)?;
            instance.rendered_child = Some(child_id);
            (
                std::mem::take(&mut instance.pending_callbacks),
                instance.has_pending_update(),
            )
        };

        // Changes staged after componentWillMount (from getChildContext) missed
        // the first render and go through a regular update.
        if staged_late {
            debug!(instance = %id, "Scheduling update staged during mount");
            self.enqueue_update(id, None)?;
        }

        if class.has_hook(hooks::COMPONENT_DID_MOUNT) {
            self.on_ready(Ready::DidMount(id))?;
        }
        for callback in callbacks {
            self.on_ready(Ready::Callback { id, callback })?;
        }

        Ok(output)
    }

    // ------------------------------------------------------------------
    // State mutation
    // ------------------------------------------------------------------

    /// Merge partial state into the pending state and schedule an update
    pub fn set_state(&mut self, id: InstanceId, partial: Map) -> RuntimeResult<()> {
        self.stage(id, "setState", StateChange::Merge(partial), None)
    }

    /// [`Runtime::set_state`] with a callback run after the update is applied
    pub fn set_state_with(
        &mut self,
        id: InstanceId,
        partial: Map,
        callback: Callable,
    ) -> RuntimeResult<()> {
        self.stage(id, "setState", StateChange::Merge(partial), Some(callback))
    }

    /// Replace the pending state wholesale (`None` is a null state)
    pub fn replace_state(&mut self, id: InstanceId, state: Option<Map>) -> RuntimeResult<()> {
        self.stage(id, "replaceState", StateChange::Replace(state), None)
    }

    pub fn replace_state_with(
        &mut self,
        id: InstanceId,
        state: Option<Map>,
        callback: Callable,
    ) -> RuntimeResult<()> {
        self.stage(id, "replaceState", StateChange::Replace(state), Some(callback))
    }

    /// Schedule a re-render that bypasses `shouldComponentUpdate`
    pub fn force_update(&mut self, id: InstanceId) -> RuntimeResult<()> {
        self.stage(id, "forceUpdate", StateChange::Force, None)
    }

    pub fn force_update_with(&mut self, id: InstanceId, callback: Callable) -> RuntimeResult<()> {
        self.stage(id, "forceUpdate", StateChange::Force, Some(callback))
    }

    fn check_mutation(&self, id: InstanceId, method: &'static str) -> RuntimeResult<()> {
        let instance = self
            .nodes
            .get(&id)
            .ok_or(RuntimeError::NotMounted { method, instance: id })?
            .as_composite()
            .ok_or(RuntimeError::NotComposite { instance: id })?;

        if let Some(rendering) = self.current_owner {
            let rendering = self
                .node(rendering)
                .map(|node| node.element().type_name())
                .unwrap_or_else(|| rendering.to_string());
            return Err(RuntimeError::UpdateDuringRender { method, rendering });
        }

        let component = || instance.class.display_name().to_string();
        match instance.phase {
            LifecyclePhase::Mounting => Ok(()),
            LifecyclePhase::ReceivingState => Err(RuntimeError::UpdateDuringStateTransition {
                method,
                component: component(),
            }),
            LifecyclePhase::Unmounting => Err(RuntimeError::UpdateWhileUnmounting {
                method,
                component: component(),
            }),
            _ if instance.mount_state != MountState::Mounted => {
                Err(RuntimeError::NotMounted { method, instance: id })
            }
            _ => Ok(()),
        }
    }

    fn stage(
        &mut self,
        id: InstanceId,
        method: &'static str,
        change: StateChange,
        callback: Option<Callable>,
    ) -> RuntimeResult<()> {
        self.check_mutation(id, method)?;

        let instance = self.composite_mut(id)?;
        match change {
            StateChange::Merge(partial) => {
                let mut next = match instance.pending_state.take() {
                    Some(pending) => pending.unwrap_or_default(),
                    None => instance.state.clone().unwrap_or_default(),
                };
                next.extend(partial);
                instance.pending_state = Some(Some(next));
            }
            StateChange::Replace(state) => instance.pending_state = Some(state),
            StateChange::Force => instance.pending_force_update = true,
        }

        if instance.phase == LifecyclePhase::Mounting {
            // Folded in before the first render; callbacks wait for didMount.
            instance.pending_callbacks.extend(callback);
            return Ok(());
        }

        self.enqueue_update(id, callback)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Run the update transition if anything is pending, inside its own
    /// batch and transaction
    pub fn perform_update_if_necessary(&mut self, id: InstanceId) -> RuntimeResult<()> {
        self.batched_updates(|rt| rt.perform_transaction(|rt| rt.update_if_necessary(id)))
    }

    pub(crate) fn update_if_necessary(&mut self, id: InstanceId) -> RuntimeResult<()> {
        let instance = self.composite(id)?;
        if matches!(
            instance.phase,
            LifecyclePhase::Mounting | LifecyclePhase::ReceivingProps
        ) || !instance.has_pending_update()
        {
            return Ok(());
        }

        let result = self.transition(id);

        if let Ok(instance) = self.composite_mut(id) {
            if instance.phase != LifecyclePhase::Unmounting {
                instance.phase = LifecyclePhase::Idle;
            }
        }
        result
    }

    fn transition(&mut self, id: InstanceId) -> RuntimeResult<()> {
        let (class, pending_element, pending_context, element, props, context, ambient) = {
            let instance = self.composite_mut(id)?;
            (
                instance.class.clone(),
                instance.pending_element.take(),
                instance.pending_context.take(),
                instance.element.clone(),
                instance.props.clone(),
                instance.context.clone(),
                instance.ambient_context.clone(),
            )
        };

        let (next_context, next_ambient) = match pending_context {
            Some(next_ambient) => (self.mask_context(&class, &next_ambient), next_ambient),
            None => (context, ambient),
        };

        let (next_element, next_props) = match pending_element {
            Some(next_element) => {
                let next_props = self.process_props(&class, &next_element.props);
                self.composite_mut(id)?.phase = LifecyclePhase::ReceivingProps;
                if class.has_hook(hooks::COMPONENT_WILL_RECEIVE_PROPS) {
                    self.call_hook(
                        id,
                        hooks::COMPONENT_WILL_RECEIVE_PROPS,
                        &[
                            Value::Object(next_props.clone()),
                            Value::from(next_context.clone()),
                        ],
                    )?;
                }
                (next_element, next_props)
            }
            None => (element, props),
        };

        let (next_state, forced) = {
            let instance = self.composite_mut(id)?;
            instance.phase = LifecyclePhase::ReceivingState;
            let next_state = match instance.pending_state.take() {
                Some(pending) => pending,
                None => instance.state.clone(),
            };
            (next_state, instance.pending_force_update)
        };

        let should_update = forced
            || match self.call_hook(
                id,
                hooks::SHOULD_COMPONENT_UPDATE,
                &[
                    Value::Object(next_props.clone()),
                    Value::from_state(next_state.as_ref()),
                    Value::from(next_context.clone()),
                ],
            )? {
                None => true,
                Some(Value::Undefined) => {
                    warn!(
                        component = class.display_name(),
                        "shouldComponentUpdate() returned undefined instead of a boolean"
                    );
                    false
                }
                Some(decision) => decision.is_truthy(),
            };

        let next = NextValues {
            element: next_element,
            props: next_props,
            state: next_state,
            context: next_context,
            ambient: next_ambient,
        };

        if should_update {
            self.composite_mut(id)?.pending_force_update = false;
            self.perform_component_update(id, &class, next)
        } else {
            debug!(instance = %id, component = class.display_name(), "Update skipped by shouldComponentUpdate");
            // Commit without re-rendering; child context is left as it was.
            let instance = self.composite_mut(id)?;
            instance.owner = next.element.owner;
            instance.element = next.element;
            instance.props = next.props;
            instance.state = next.state;
            instance.context = next.context;
            instance.ambient_context = next.ambient;
            Ok(())
        }
    }

    fn perform_component_update(
        &mut self,
        id: InstanceId,
        class: &ComponentClass,
        next: NextValues,
    ) -> RuntimeResult<()> {
        debug!(instance = %id, component = class.display_name(), "Updating composite");

        if class.has_hook(hooks::COMPONENT_WILL_UPDATE) {
            self.call_hook(
                id,
                hooks::COMPONENT_WILL_UPDATE,
                &[
                    Value::Object(next.props.clone()),
                    Value::from_state(next.state.as_ref()),
                    Value::from(next.context.clone()),
                ],
            )?;
        }

        let (prev_element, prev_props, prev_state, prev_context) = {
            let instance = self.composite_mut(id)?;
            instance.owner = next.element.owner;
            instance.ambient_context = next.ambient;
            (
                std::mem::replace(&mut instance.element, next.element),
                std::mem::replace(&mut instance.props, next.props),
                std::mem::replace(&mut instance.state, next.state),
                std::mem::replace(&mut instance.context, next.context),
            )
        };

        if class.has_hook(hooks::UPDATE_COMPONENT) {
            self.call_hook(id, hooks::UPDATE_COMPONENT, &[Value::Element(prev_element)])?;
        } else {
            self.update_rendered_child(id)?;
        }

        if class.has_hook(hooks::COMPONENT_DID_UPDATE) {
            self.on_ready(Ready::DidUpdate {
                id,
                prev_props,
                prev_state,
                prev_context,
            })?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Unmount
    // ------------------------------------------------------------------

    pub(crate) fn unmount_composite(&mut self, id: InstanceId) -> RuntimeResult<()> {
        let class = {
            let instance = self.composite_mut(id)?;
            instance.phase = LifecyclePhase::Unmounting;
            instance.class.clone()
        };
        debug!(instance = %id, component = class.display_name(), "Unmounting composite");

        if class.has_hook(hooks::COMPONENT_WILL_UNMOUNT) {
            self.call_hook(id, hooks::COMPONENT_WILL_UNMOUNT, &[])?;
        }

        let child = self.composite_mut(id)?.rendered_child.take();
        if let Some(child) = child {
            self.unmount_node(child)?;
        }

        if let Some(mut node) = self.nodes.remove(&id) {
            if let Some(instance) = node.as_composite_mut() {
                instance.mount_state = MountState::Unmounted;
                instance.bound_methods.clear();
                instance.pending_callbacks.clear();
            }
        }
        Ok(())
    }
}
