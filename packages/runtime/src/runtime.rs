//! Instance arena and the public instance protocol.
//!
//! A [`Runtime`] owns every live instance, keyed by [`InstanceId`]. Rendered
//! children are exclusively owned ids; owners are lookup-only ids. All driving
//! happens through `&mut Runtime`: roots are mounted, updated, and unmounted
//! here, state changes are staged here, and hooks receive a [`Component`]
//! handle that borrows the runtime for the duration of the call.
//!
//! The lifecycle, data pipeline, scheduler, and reconciler live in their own
//! modules as further `impl Runtime` blocks.

use crate::backend::{MarkupBackend, MemoryBackend};
use crate::callable::{merge_results, Callable};
use crate::component::Component;
use crate::element::Element;
use crate::error::{RuntimeError, RuntimeResult};
use crate::instance::{CompositeInstance, InstanceId, LifecyclePhase, Node};
use crate::options::RuntimeOptions;
use crate::reconciler::should_update_component;
use crate::scheduler::{Transaction, UpdateQueue};
use crate::validator::{Diagnostics, ValidationWarning};
use crate::value::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, instrument};

/// Mounted root and the ambient context it was mounted with
#[derive(Debug, Clone)]
pub(crate) struct RootEntry {
    pub(crate) instance: InstanceId,
    pub(crate) context: Map,
}

pub struct Runtime {
    pub(crate) nodes: HashMap<InstanceId, Node>,
    next_instance: u64,
    next_root: u64,
    pub(crate) roots: BTreeMap<String, RootEntry>,
    pub(crate) queue: UpdateQueue,
    pub(crate) transactions: Vec<Transaction>,
    pub(crate) backend: Box<dyn MarkupBackend>,
    pub(crate) options: RuntimeOptions,
    pub(crate) diagnostics: Diagnostics,
    /// Instance whose render is on the stack, if any
    pub(crate) current_owner: Option<InstanceId>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    /// Runtime with default options and an in-memory backend
    pub fn new() -> Self {
        Self::with_options(RuntimeOptions::default())
    }

    pub fn with_options(options: RuntimeOptions) -> Self {
        Self::with_backend(Box::new(MemoryBackend::new()), options)
    }

    pub fn with_backend(backend: Box<dyn MarkupBackend>, options: RuntimeOptions) -> Self {
        Self {
            nodes: HashMap::new(),
            next_instance: 0,
            next_root: 0,
            roots: BTreeMap::new(),
            queue: UpdateQueue::default(),
            transactions: Vec::new(),
            backend,
            diagnostics: Diagnostics::new(options.collect_warnings),
            options,
            current_owner: None,
        }
    }

    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    // ------------------------------------------------------------------
    // Roots
    // ------------------------------------------------------------------

    /// Mount an element as a new root with an empty ambient context
    pub fn mount_root(&mut self, element: Element) -> RuntimeResult<InstanceId> {
        self.mount_root_with_context(element, Map::new())
    }

    /// Mount an element as a new root. `context` is the ambient context the
    /// whole tree is rendered under.
    #[instrument(skip(self, element, context), fields(element = %element.type_name()))]
    pub fn mount_root_with_context(
        &mut self,
        element: Element,
        context: Map,
    ) -> RuntimeResult<InstanceId> {
        let root_id = format!(".{}", self.next_root);
        self.next_root += 1;

        let mount_id = root_id.clone();
        let mount_context = context.clone();
        let instance = self.batched_updates(move |rt| {
            rt.perform_transaction(move |rt| {
                let (instance, output) = rt.mount_node(element, mount_id.clone(), 0, &mount_context)?;
                rt.backend.insert_root(&mount_id, output);
                rt.roots.insert(
                    mount_id,
                    RootEntry {
                        instance,
                        context: mount_context,
                    },
                );
                Ok(instance)
            })
        })?;

        info!(root = %root_id, instance = %instance, "Mounted root");
        Ok(instance)
    }

    /// Render a new element into an existing root. A compatible element
    /// updates the root in place; anything else replaces it. Returns the
    /// (possibly new) root instance.
    #[instrument(skip(self, element), fields(element = %element.type_name()))]
    pub fn update_root(&mut self, root: InstanceId, element: Element) -> RuntimeResult<InstanceId> {
        let (root_id, entry) = self.root_entry(root)?;
        let previous = self.node(root).map(|node| node.element().clone());

        self.batched_updates(move |rt| {
            rt.perform_transaction(move |rt| match previous {
                Some(previous) if should_update_component(&previous, &element) => {
                    debug!(root = %root_id, "Updating root in place");
                    rt.receive_node(root, element, entry.context)?;
                    Ok(root)
                }
                _ => {
                    debug!(root = %root_id, "Replacing root");
                    rt.unmount_node(root)?;
                    rt.roots.remove(&root_id);
                    let (instance, output) = rt.mount_node(element, root_id.clone(), 0, &entry.context)?;
                    rt.backend.replace_output_at_id(&root_id, output);
                    rt.roots.insert(
                        root_id,
                        RootEntry {
                            instance,
                            context: entry.context,
                        },
                    );
                    Ok(instance)
                }
            })
        })
    }

    /// Tear down a root and everything it rendered
    #[instrument(skip(self))]
    pub fn unmount_root(&mut self, root: InstanceId) -> RuntimeResult<()> {
        let (root_id, _) = self.root_entry(root)?;

        self.unmount_node(root)?;
        self.roots.remove(&root_id);
        self.backend.remove_root(&root_id);

        info!(root = %root_id, instance = %root, "Unmounted root");
        Ok(())
    }

    /// Instance mounted at a root id such as `.0`
    pub fn root(&self, root_id: &str) -> Option<InstanceId> {
        self.roots.get(root_id).map(|entry| entry.instance)
    }

    pub fn root_ids(&self) -> impl Iterator<Item = &str> {
        self.roots.keys().map(String::as_str)
    }

    fn root_entry(&self, instance: InstanceId) -> RuntimeResult<(String, RootEntry)> {
        self.roots
            .iter()
            .find(|(_, entry)| entry.instance == instance)
            .map(|(id, entry)| (id.clone(), entry.clone()))
            .ok_or(RuntimeError::NotRoot { instance })
    }

    /// Hand a new element and ambient context to a mounted instance and run
    /// its update transition. The element must be of the same type and key as
    /// the one the instance was mounted from.
    pub fn receive_component(
        &mut self,
        instance: InstanceId,
        element: Element,
        context: Map,
    ) -> RuntimeResult<()> {
        let current = self
            .node(instance)
            .ok_or(RuntimeError::UnknownInstance { instance })?
            .element();
        if !should_update_component(current, &element) {
            return Err(RuntimeError::IncompatibleElement {
                instance,
                current: current.type_name(),
                next: element.type_name(),
            });
        }

        self.batched_updates(move |rt| {
            rt.perform_transaction(move |rt| rt.receive_node(instance, element, context))
        })
    }

    // ------------------------------------------------------------------
    // Arena
    // ------------------------------------------------------------------

    pub(crate) fn allocate_id(&mut self) -> InstanceId {
        let id = InstanceId(self.next_instance);
        self.next_instance += 1;
        id
    }

    pub fn node(&self, instance: InstanceId) -> Option<&Node> {
        self.nodes.get(&instance)
    }

    /// Number of live instances
    pub fn instance_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn composite(&self, instance: InstanceId) -> RuntimeResult<&CompositeInstance> {
        self.nodes
            .get(&instance)
            .ok_or(RuntimeError::UnknownInstance { instance })?
            .as_composite()
            .ok_or(RuntimeError::NotComposite { instance })
    }

    pub(crate) fn composite_mut(
        &mut self,
        instance: InstanceId,
    ) -> RuntimeResult<&mut CompositeInstance> {
        self.nodes
            .get_mut(&instance)
            .ok_or(RuntimeError::UnknownInstance { instance })?
            .as_composite_mut()
            .ok_or(RuntimeError::NotComposite { instance })
    }

    pub fn props(&self, instance: InstanceId) -> RuntimeResult<&Map> {
        Ok(&self.composite(instance)?.props)
    }

    pub fn state(&self, instance: InstanceId) -> RuntimeResult<Option<&Map>> {
        Ok(self.composite(instance)?.state.as_ref())
    }

    pub fn context(&self, instance: InstanceId) -> RuntimeResult<Option<&Map>> {
        Ok(self.composite(instance)?.context.as_ref())
    }

    pub fn phase(&self, instance: InstanceId) -> RuntimeResult<LifecyclePhase> {
        Ok(self.composite(instance)?.phase)
    }

    pub fn rendered_child(&self, instance: InstanceId) -> Option<InstanceId> {
        self.composite(instance).ok()?.rendered_child
    }

    pub fn owner(&self, instance: InstanceId) -> Option<InstanceId> {
        self.node(instance)?.owner()
    }

    pub fn is_mounted(&self, instance: InstanceId) -> bool {
        self.node(instance).is_some_and(Node::is_mounted)
    }

    // ------------------------------------------------------------------
    // Invocation
    // ------------------------------------------------------------------

    /// Invoke a callable. Unbound methods run against `receiver`; bound
    /// methods always run against the instance they were bound to.
    pub(crate) fn invoke(
        &mut self,
        callable: &Callable,
        receiver: Option<InstanceId>,
        args: &[Value],
    ) -> RuntimeResult<Value> {
        match callable {
            Callable::Free(f) => f(args),
            Callable::Method(f) => {
                let id = receiver.ok_or(RuntimeError::MissingReceiver)?;
                let mut component = Component::new(self, id);
                f(&mut component, args)
            }
            Callable::Bound(id, inner) => self.invoke(inner, Some(*id), args),
            Callable::Chained(pair) => {
                self.invoke(&pair.0, receiver, args)?;
                self.invoke(&pair.1, receiver, args)?;
                Ok(Value::Undefined)
            }
            Callable::Sequenced(pair) => {
                self.invoke(&pair.0, receiver, args)?;
                self.invoke(&pair.1, receiver, args)
            }
            Callable::Merged(pair) => {
                let first = self.invoke(&pair.0, receiver, args)?;
                let second = self.invoke(&pair.1, receiver, args)?;
                merge_results(first, second)
            }
        }
    }

    /// Run a class hook against an instance. `Ok(None)` when the class does
    /// not implement it.
    pub(crate) fn call_hook(
        &mut self,
        instance: InstanceId,
        name: &str,
        args: &[Value],
    ) -> RuntimeResult<Option<Value>> {
        let hook = self.composite(instance)?.class.hook(name).cloned();
        match hook {
            Some(hook) => self.invoke(&hook, Some(instance), args).map(Some),
            None => Ok(None),
        }
    }

    /// Member as seen through an instance: auto-bound methods come back bound
    /// to it, everything else as declared on the class.
    pub fn method(&self, instance: InstanceId, name: &str) -> RuntimeResult<Value> {
        let composite = self.composite(instance)?;
        if let Some(bound) = composite.bound_methods.get(name) {
            return Ok(Value::Function(bound.clone()));
        }
        Ok(composite.class.member(name).cloned().unwrap_or_default())
    }

    /// Call a function member with the instance as receiver
    pub fn call_method(
        &mut self,
        instance: InstanceId,
        name: &str,
        args: &[Value],
    ) -> RuntimeResult<Value> {
        match self.method(instance, name)? {
            Value::Function(callable) => self.invoke(&callable, Some(instance), args),
            _ => Err(RuntimeError::NotCallable {
                component: self.composite(instance)?.class.display_name().to_string(),
                name: name.to_string(),
            }),
        }
    }

    /// Call a function value with no receiver of its own. Bound methods still
    /// reach the instance they were bound to.
    pub fn call_value(&mut self, value: &Value, args: &[Value]) -> RuntimeResult<Value> {
        match value {
            Value::Function(callable) => self.invoke(callable, None, args),
            other => Err(RuntimeError::NotCallable {
                component: "value".to_string(),
                name: other.type_name().to_string(),
            }),
        }
    }

    // ------------------------------------------------------------------
    // Diagnostics and backend access
    // ------------------------------------------------------------------

    pub fn warnings(&self) -> &[ValidationWarning] {
        self.diagnostics.warnings()
    }

    pub fn take_warnings(&mut self) -> Vec<ValidationWarning> {
        self.diagnostics.take()
    }

    pub fn backend(&self) -> &dyn MarkupBackend {
        self.backend.as_ref()
    }

    /// Downcast the backend to its concrete type
    pub fn backend_as<T: 'static>(&self) -> Option<&T> {
        self.backend.as_any().downcast_ref::<T>()
    }
}
