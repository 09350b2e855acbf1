use crate::class::ComponentClass;
use crate::instance::InstanceId;
use crate::value::{Map, Value};

/// What an element asks to instantiate
#[derive(Debug, Clone, PartialEq)]
pub enum ElementType {
    /// A composed component class (compared by identity)
    Composite(ComponentClass),
    /// A primitive leaf handled entirely by the markup backend
    Primitive(String),
}

/// Immutable description of a node: a type plus its raw input data.
///
/// Elements are cheap values used to request instantiation or an update; the
/// live instance is a separate thing owned by the runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub kind: ElementType,
    pub props: Map,
    pub key: Option<String>,
    /// Instance whose render produced this element. Lookup only.
    pub owner: Option<InstanceId>,
}

impl Element {
    pub fn new(kind: ElementType, props: Map) -> Self {
        Self {
            kind,
            props,
            key: None,
            owner: None,
        }
    }

    pub fn composite(class: &ComponentClass, props: Map) -> Self {
        Self::new(ElementType::Composite(class.clone()), props)
    }

    pub fn primitive(tag: impl Into<String>, props: Map) -> Self {
        Self::new(ElementType::Primitive(tag.into()), props)
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_prop(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }

    pub fn with_owner(mut self, owner: InstanceId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.kind, ElementType::Composite(_))
    }

    pub fn class(&self) -> Option<&ComponentClass> {
        match &self.kind {
            ElementType::Composite(class) => Some(class),
            ElementType::Primitive(_) => None,
        }
    }

    /// Display name of the composite class or the primitive tag
    pub fn type_name(&self) -> String {
        match &self.kind {
            ElementType::Composite(class) => class.display_name().to_string(),
            ElementType::Primitive(tag) => tag.clone(),
        }
    }
}
