use crate::callable::Callable;
use crate::class::ComponentClass;
use crate::element::Element;
use crate::value::Map;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Arena handle of a live instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Composite lifecycle phase. `Idle` means no transition is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LifecyclePhase {
    #[default]
    Idle,
    Mounting,
    ReceivingProps,
    ReceivingState,
    Unmounting,
}

/// Coarse mounted status tracked alongside the lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MountState {
    #[default]
    Unmounted,
    Mounted,
}

/// Live composite component
#[derive(Debug)]
pub struct CompositeInstance {
    pub(crate) class: ComponentClass,
    pub(crate) element: Element,
    pub(crate) node_id: String,
    pub(crate) mount_depth: usize,
    pub(crate) mount_state: MountState,
    pub(crate) phase: LifecyclePhase,

    pub(crate) props: Map,
    /// `None` is a null state
    pub(crate) state: Option<Map>,
    /// `None` when the class declares no context types
    pub(crate) context: Option<Map>,
    /// Unmasked context this instance was rendered under
    pub(crate) ambient_context: Map,

    /// Pending props and owner, carried by the next element
    pub(crate) pending_element: Option<Element>,
    pub(crate) pending_state: Option<Option<Map>>,
    pub(crate) pending_context: Option<Map>,
    pub(crate) pending_force_update: bool,
    pub(crate) pending_callbacks: Vec<Callable>,

    /// Lookup-only back reference to the instance that rendered this one
    pub(crate) owner: Option<InstanceId>,
    /// Exclusively owned rendered child
    pub(crate) rendered_child: Option<InstanceId>,
    pub(crate) bound_methods: BTreeMap<String, Callable>,
}

impl CompositeInstance {
    fn new(class: ComponentClass, element: Element, node_id: String, mount_depth: usize, ambient: Map) -> Self {
        Self {
            class,
            owner: element.owner,
            element,
            node_id,
            mount_depth,
            mount_state: MountState::Unmounted,
            phase: LifecyclePhase::Idle,
            props: Map::new(),
            state: None,
            context: None,
            ambient_context: ambient,
            pending_element: None,
            pending_state: None,
            pending_context: None,
            pending_force_update: false,
            pending_callbacks: Vec::new(),
            rendered_child: None,
            bound_methods: BTreeMap::new(),
        }
    }

    pub fn class(&self) -> &ComponentClass {
        &self.class
    }

    pub fn props(&self) -> &Map {
        &self.props
    }

    pub fn state(&self) -> Option<&Map> {
        self.state.as_ref()
    }

    pub fn context(&self) -> Option<&Map> {
        self.context.as_ref()
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    pub fn mount_state(&self) -> MountState {
        self.mount_state
    }

    pub fn rendered_child(&self) -> Option<InstanceId> {
        self.rendered_child
    }

    /// Any of the four update triggers is staged
    pub fn has_pending_update(&self) -> bool {
        self.pending_element.is_some()
            || self.pending_state.is_some()
            || self.pending_context.is_some()
            || self.pending_force_update
    }
}

/// Live primitive leaf; its output belongs to the markup backend
#[derive(Debug)]
pub struct PrimitiveInstance {
    pub(crate) element: Element,
    pub(crate) node_id: String,
    pub(crate) mount_depth: usize,
}

/// Arena entry
#[derive(Debug)]
pub enum Node {
    Composite(CompositeInstance),
    Primitive(PrimitiveInstance),
}

impl Node {
    pub fn element(&self) -> &Element {
        match self {
            Node::Composite(c) => &c.element,
            Node::Primitive(p) => &p.element,
        }
    }

    pub fn node_id(&self) -> &str {
        match self {
            Node::Composite(c) => &c.node_id,
            Node::Primitive(p) => &p.node_id,
        }
    }

    pub fn mount_depth(&self) -> usize {
        match self {
            Node::Composite(c) => c.mount_depth,
            Node::Primitive(p) => p.mount_depth,
        }
    }

    pub fn owner(&self) -> Option<InstanceId> {
        match self {
            Node::Composite(c) => c.owner,
            Node::Primitive(p) => p.element.owner,
        }
    }

    pub fn as_composite(&self) -> Option<&CompositeInstance> {
        match self {
            Node::Composite(c) => Some(c),
            Node::Primitive(_) => None,
        }
    }

    pub fn as_composite_mut(&mut self) -> Option<&mut CompositeInstance> {
        match self {
            Node::Composite(c) => Some(c),
            Node::Primitive(_) => None,
        }
    }

    pub fn is_mounted(&self) -> bool {
        match self {
            Node::Composite(c) => c.mount_state == MountState::Mounted,
            Node::Primitive(_) => true,
        }
    }
}

/// Turns an element into an unmounted instance of the matching kind
pub fn instantiate(element: Element, node_id: String, mount_depth: usize, ambient: &Map) -> Node {
    match element.class().cloned() {
        Some(class) => Node::Composite(CompositeInstance::new(
            class,
            element,
            node_id,
            mount_depth,
            ambient.clone(),
        )),
        None => Node::Primitive(PrimitiveInstance {
            element,
            node_id,
            mount_depth,
        }),
    }
}
