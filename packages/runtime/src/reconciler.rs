//! Render and reconcile.
//!
//! After every render, the previously rendered child is either updated in
//! place (same type, same key) or torn down and replaced by a freshly mounted
//! instance at the same node id. Primitive leaves are handed to the markup
//! backend as they are; there is no diffing below them.

use crate::class::ComponentClass;
use crate::element::{Element, ElementType};
use crate::error::{RuntimeError, RuntimeResult};
use crate::instance::{instantiate, InstanceId, Node};
use crate::runtime::Runtime;
use crate::spec::hooks;
use crate::vdom::VNode;
use crate::value::{Map, Value};
use tracing::debug;

/// Whether `next` can update the instance rendered from `prev` in place:
/// same class identity (or same primitive tag) and same key.
pub fn should_update_component(prev: &Element, next: &Element) -> bool {
    let same_type = match (&prev.kind, &next.kind) {
        (ElementType::Composite(a), ElementType::Composite(b)) => ComponentClass::ptr_eq(a, b),
        (ElementType::Primitive(a), ElementType::Primitive(b)) => a == b,
        _ => false,
    };
    same_type && prev.key == next.key
}

impl Runtime {
    /// Render a composite and check the result. Returns the rendered element
    /// and the context its subtree is rendered under.
    pub(crate) fn render_validated(&mut self, id: InstanceId) -> RuntimeResult<(Element, Map)> {
        let (class, ambient) = {
            let instance = self.composite(id)?;
            (instance.class.clone(), instance.ambient_context.clone())
        };
        let component = class.display_name().to_string();

        let child_context = self.process_child_context(id, &class, &ambient)?;

        let render = class
            .hook(hooks::RENDER)
            .cloned()
            .ok_or_else(|| RuntimeError::MissingRender {
                component: component.clone(),
            })?;

        let previous_owner = self.current_owner.replace(id);
        let rendered = self.invoke(&render, Some(id), &[]);
        self.current_owner = previous_owner;

        match rendered? {
            Value::Element(element) if element.owner.is_none() => {
                Ok((element.with_owner(id), child_context))
            }
            Value::Element(element) => Ok((element, child_context)),
            other => Err(RuntimeError::InvalidRenderResult {
                component,
                found: other.type_name(),
            }),
        }
    }

    /// Base `updateComponent`: render again and reconcile the result against
    /// the current child
    pub(crate) fn update_rendered_child(&mut self, id: InstanceId) -> RuntimeResult<()> {
        let (previous_child, node_id, depth) = {
            let instance = self.composite(id)?;
            (
                instance.rendered_child,
                instance.node_id.clone(),
                instance.mount_depth,
            )
        };
        let previous_element = previous_child
            .and_then(|child| self.node(child))
            .map(|node| node.element().clone());

        let (next, child_context) = self.render_validated(id)?;

        if let (Some(child), Some(previous)) = (previous_child, previous_element) {
            if should_update_component(&previous, &next) {
                debug!(instance = %id, child = %child, "Reconcile: updating child in place");
                return self.receive_node(child, next, child_context);
            }

            debug!(
                instance = %id,
                from = %previous.type_name(),
                to = %next.type_name(),
                "Reconcile: replacing child"
            );
            self.composite_mut(id)?.rendered_child = None;
            self.unmount_node(child)?;
        }

        let (child, output) = self.mount_node(next, node_id.clone(), depth + 1, &child_context)?;
        self.composite_mut(id)?.rendered_child = Some(child);
        self.backend.replace_output_at_id(&node_id, output);
        Ok(())
    }

    /// Instantiate an element into the arena and mount it. A failed mount
    /// leaves nothing behind.
    pub(crate) fn mount_node(
        &mut self,
        element: Element,
        node_id: String,
        depth: usize,
        ambient: &Map,
    ) -> RuntimeResult<(InstanceId, VNode)> {
        let id = self.allocate_id();
        let node = instantiate(element, node_id, depth, ambient);
        let composite = matches!(node, Node::Composite(_));
        self.nodes.insert(id, node);

        let mounted = if composite {
            self.mount_composite(id)
        } else {
            self.mount_primitive(id)
        };

        match mounted {
            Ok(output) => Ok((id, output)),
            Err(e) => {
                self.discard(id);
                Err(e)
            }
        }
    }

    fn mount_primitive(&mut self, id: InstanceId) -> RuntimeResult<VNode> {
        let node = self
            .nodes
            .get(&id)
            .ok_or(RuntimeError::UnknownInstance { instance: id })?;
        let (element, node_id, depth) = (
            node.element().clone(),
            node.node_id().to_string(),
            node.mount_depth(),
        );
        Ok(self.backend.mount(&node_id, &element, depth))
    }

    /// Hand a new element and ambient context to a mounted instance
    pub(crate) fn receive_node(
        &mut self,
        id: InstanceId,
        next: Element,
        context: Map,
    ) -> RuntimeResult<()> {
        match self.nodes.get_mut(&id) {
            Some(Node::Primitive(primitive)) => {
                let previous = std::mem::replace(&mut primitive.element, next.clone());
                let node_id = primitive.node_id.clone();
                self.backend.update(&node_id, &previous, &next);
                Ok(())
            }
            Some(Node::Composite(instance)) => {
                instance.pending_element = Some(next);
                instance.pending_context = Some(context);
                self.update_if_necessary(id)
            }
            None => Err(RuntimeError::UnknownInstance { instance: id }),
        }
    }

    pub(crate) fn unmount_node(&mut self, id: InstanceId) -> RuntimeResult<()> {
        match self.nodes.get(&id) {
            Some(Node::Composite(_)) => self.unmount_composite(id),
            Some(Node::Primitive(primitive)) => {
                let node_id = primitive.node_id.clone();
                self.nodes.remove(&id);
                self.backend.unmount(&node_id);
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Drop a subtree from the arena without running any hooks
    fn discard(&mut self, id: InstanceId) {
        if let Some(Node::Composite(instance)) = self.nodes.remove(&id) {
            if let Some(child) = instance.rendered_child {
                self.discard(child);
            }
        }
    }
}
