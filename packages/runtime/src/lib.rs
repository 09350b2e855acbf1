//! Composite component runtime.
//!
//! Class specifications are composed once into immutable [`ComponentClass`]es
//! (mixins merged under a per-member override policy). A [`Runtime`] then
//! mounts elements of those classes into an instance arena, drives their
//! lifecycle through batched state updates, and reconciles each render against
//! the previously rendered child. Primitive leaves are handed to a
//! [`MarkupBackend`].
//!
//! ```rust,ignore
//! let counter = create_class(
//!     &ClassSpec::named("Counter")
//!         .initial_state(|_| Ok(Some(object(json!({ "count": 0 })))))
//!         .render(|this| {
//!             Ok(Element::primitive("span", Map::new())
//!                 .with_prop("children", this.state_value("count")))
//!         }),
//! )?;
//!
//! let mut runtime = Runtime::new();
//! let root = runtime.mount_root(counter.element(Map::new()))?;
//! runtime.set_state(root, object(json!({ "count": 1 })))?;
//! ```

pub mod backend;
pub mod callable;
pub mod class;
pub mod component;
pub mod composer;
pub mod element;
pub mod error;
pub mod instance;
mod lifecycle;
pub mod options;
mod pipeline;
pub mod reconciler;
pub mod registry;
pub mod runtime;
mod scheduler;
pub mod spec;
pub mod validator;
pub mod value;
pub mod vdom;

#[cfg(test)]
mod tests_support;

#[cfg(test)]
mod tests_composition;


#[cfg(test)]
mod tests_pipeline;



pub use backend::{BackendOp, MarkupBackend, MemoryBackend};
pub use callable::Callable;
pub use class::ComponentClass;
pub use component::Component;
pub use composer::{create_class, Composer};
pub use element::{Element, ElementType};
pub use error::{ComposeError, ComposeResult, RuntimeError, RuntimeResult};
pub use instance::{InstanceId, LifecyclePhase, MountState, Node};
pub use options::{OptionsError, RuntimeOptions};
pub use reconciler::should_update_component;
pub use registry::{inject_mixin, injected_mixins, reset_injected_mixins, MixinRegistry};
pub use runtime::Runtime;
pub use spec::{hooks, ClassSpec, Mixin, SpecPolicy};
pub use validator::{TypeLocation, ValidationLevel, ValidationWarning};
pub use value::{object, Map, Value};
pub use vdom::VNode;
