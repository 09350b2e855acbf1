use crate::element::{Element, ElementType};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rendered output produced by the markup backend for a primitive node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VNode {
    /// Primitive element
    Element {
        tag: String,
        attributes: BTreeMap<String, String>,
        children: Vec<VNode>,
        /// Node id the backend addresses this output by
        node_id: String,
    },

    /// Text node
    Text { content: String },
}

impl VNode {
    pub fn element(tag: impl Into<String>, node_id: impl Into<String>) -> Self {
        VNode::Element {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
            node_id: node_id.into(),
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        VNode::Text {
            content: content.into(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let VNode::Element {
            ref mut attributes, ..
        } = self
        {
            attributes.insert(key.into(), value.into());
        }
        self
    }

    pub fn with_child(mut self, child: VNode) -> Self {
        if let VNode::Element {
            ref mut children, ..
        } = self
        {
            children.push(child);
        }
        self
    }

    /// Builds the output for a primitive element.
    ///
    /// Scalar props become attributes; a scalar or array `children` prop
    /// becomes text children. Functions, elements, and nullish values are
    /// not representable and are skipped.
    pub fn from_primitive(node_id: &str, element: &Element) -> Self {
        let tag = match &element.kind {
            ElementType::Primitive(tag) => tag.clone(),
            ElementType::Composite(class) => class.display_name().to_string(),
        };
        let mut node = VNode::element(tag, node_id);

        for (name, value) in &element.props {
            if name == "children" {
                let texts: Vec<&Value> = match value {
                    Value::Array(items) => items.iter().collect(),
                    other => vec![other],
                };
                for text in texts.into_iter().filter(|v| is_scalar(v)) {
                    node = node.with_child(VNode::text(text.to_display_string()));
                }
            } else if is_scalar(value) {
                node = node.with_attr(name.clone(), value.to_display_string());
            }
        }

        node
    }

    pub fn node_id(&self) -> Option<&str> {
        match self {
            VNode::Element { node_id, .. } => Some(node_id),
            VNode::Text { .. } => None,
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            VNode::Element { tag, .. } => Some(tag),
            VNode::Text { .. } => None,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        match self {
            VNode::Element { attributes, .. } => attributes.get(name).map(String::as_str),
            VNode::Text { .. } => None,
        }
    }

    /// Concatenated text content of this node and its descendants
    pub fn text_content(&self) -> String {
        match self {
            VNode::Text { content } => content.clone(),
            VNode::Element { children, .. } => {
                children.iter().map(VNode::text_content).collect()
            }
        }
    }
}

fn is_scalar(value: &Value) -> bool {
    matches!(
        value,
        Value::Boolean(_) | Value::Number(_) | Value::String(_)
    )
}
