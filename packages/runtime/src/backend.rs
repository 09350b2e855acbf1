//! Markup backend seam.
//!
//! The runtime never builds markup itself: primitive leaves are handed to a
//! [`MarkupBackend`], and the reconciler tells it when an output must be
//! replaced wholesale. [`MemoryBackend`] keeps outputs as [`VNode`] trees and
//! logs every operation.

use crate::element::Element;
use crate::vdom::VNode;
use serde::Serialize;
use std::any::Any;
use std::collections::BTreeMap;

pub trait MarkupBackend {
    /// Produce the output for a primitive element mounted at `node_id`
    fn mount(&mut self, node_id: &str, element: &Element, depth: usize) -> VNode;

    /// Apply new props to a mounted primitive
    fn update(&mut self, node_id: &str, previous: &Element, next: &Element);

    /// Forget a primitive that is being torn down
    fn unmount(&mut self, node_id: &str);

    /// Swap the output at `node_id` for a freshly mounted one
    fn replace_output_at_id(&mut self, node_id: &str, output: VNode);

    /// Attach the output of a new root
    fn insert_root(&mut self, root_id: &str, output: VNode);

    /// Detach a root's output
    fn remove_root(&mut self, root_id: &str);

    fn as_any(&self) -> &dyn Any;
}

/// Operation recorded by [`MemoryBackend`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum BackendOp {
    Mount { node_id: String, tag: String, depth: usize },
    Update { node_id: String },
    Unmount { node_id: String },
    Replace { node_id: String },
    InsertRoot { root_id: String },
    RemoveRoot { root_id: String },
}

/// In-memory backend
#[derive(Debug, Default)]
pub struct MemoryBackend {
    outputs: BTreeMap<String, VNode>,
    ops: Vec<BackendOp>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output(&self, node_id: &str) -> Option<&VNode> {
        self.outputs.get(node_id)
    }

    pub fn ops(&self) -> &[BackendOp] {
        &self.ops
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    /// Number of replace operations recorded so far
    pub fn replace_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, BackendOp::Replace { .. }))
            .count()
    }

    /// All attached outputs keyed by node id
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.outputs).unwrap_or(serde_json::Value::Null)
    }
}

impl MarkupBackend for MemoryBackend {
    fn mount(&mut self, node_id: &str, element: &Element, depth: usize) -> VNode {
        self.ops.push(BackendOp::Mount {
            node_id: node_id.to_string(),
            tag: element.type_name(),
            depth,
        });
        VNode::from_primitive(node_id, element)
    }

    fn update(&mut self, node_id: &str, _previous: &Element, next: &Element) {
        self.ops.push(BackendOp::Update {
            node_id: node_id.to_string(),
        });
        if self.outputs.contains_key(node_id) {
            self.outputs
                .insert(node_id.to_string(), VNode::from_primitive(node_id, next));
        }
    }

    fn unmount(&mut self, node_id: &str) {
        self.ops.push(BackendOp::Unmount {
            node_id: node_id.to_string(),
        });
    }

    fn replace_output_at_id(&mut self, node_id: &str, output: VNode) {
        self.ops.push(BackendOp::Replace {
            node_id: node_id.to_string(),
        });
        self.outputs.insert(node_id.to_string(), output);
    }

    fn insert_root(&mut self, root_id: &str, output: VNode) {
        self.ops.push(BackendOp::InsertRoot {
            root_id: root_id.to_string(),
        });
        self.outputs.insert(root_id.to_string(), output);
    }

    fn remove_root(&mut self, root_id: &str) {
        self.ops.push(BackendOp::RemoveRoot {
            root_id: root_id.to_string(),
        });
        self.outputs.remove(root_id);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
