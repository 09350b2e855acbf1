use crate::instance::InstanceId;
use crate::validator::TypeLocation;
use thiserror::Error;

pub type ComposeResult<T> = Result<T, ComposeError>;
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors raised while composing a class specification. All of them are
/// programmer errors surfaced at definition time.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComposeError {
    #[error("{component}: `{name}` is defined more than once. This conflict may be due to a mixin.")]
    DuplicateDefinition { component: String, name: String },

    #[error("{component}: `{name}` is a base lifecycle method and cannot be overridden")]
    BaseMethodOverride { component: String, name: String },

    #[error("{component}: `{name}` is a reserved specification key and cannot be defined as a member")]
    ReservedMember { component: String, name: String },

    #[error("{component}: {location} type `{name}` is invalid; it must be a function, got {found}")]
    InvalidTypeChecker {
        component: String,
        location: TypeLocation,
        name: String,
        found: &'static str,
    },

    #[error("{component}: lifecycle hook `{name}` must be a function, got {found}")]
    HookNotCallable {
        component: String,
        name: String,
        found: &'static str,
    },

    #[error("{component}: class specification must implement a `render` method")]
    MissingRender { component: String },

    #[error("{component}: cannot use component class `{mixin}` as a mixin; use a plain specification instead")]
    MixinIsClass { component: String, mixin: String },

    #[error("{component}: cannot use a component element of type `{mixin}` as a mixin")]
    MixinIsElement { component: String, mixin: String },

    #[error("{component}: static `{name}` is defined more than once and cannot be chained because both definitions are not functions")]
    StaticRedefinition { component: String, name: String },

    #[error("{component}: reserved property `{name}` cannot be defined on statics")]
    ReservedStatic { component: String, name: String },

    #[error("{component}.getDefaultProps(): {message}")]
    DefaultProps { component: String, message: String },
}

/// Errors raised while driving instances. Lifecycle-guard and render-contract
/// violations are fatal and abort the in-flight transition.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("{method}(...): can only update a mounted or mounting component (instance {instance})")]
    NotMounted {
        method: &'static str,
        instance: InstanceId,
    },

    #[error("{method}(...): {component} cannot update during an existing state transition; this could cause an infinite loop")]
    UpdateDuringStateTransition {
        method: &'static str,
        component: String,
    },

    #[error("{method}(...): {component} cannot update while unmounting")]
    UpdateWhileUnmounting {
        method: &'static str,
        component: String,
    },

    #[error("{method}(...): cannot update while `{rendering}` is rendering; render must be a pure function of props and state")]
    UpdateDuringRender {
        method: &'static str,
        rendering: String,
    },

    #[error("{component}.getInitialState(): must return an object or null, got {found}")]
    InvalidInitialState {
        component: String,
        found: &'static str,
    },

    #[error("{component}.render(): a valid component element must be returned, got {found}")]
    InvalidRenderResult {
        component: String,
        found: &'static str,
    },

    #[error("{component}: no `render` method is defined")]
    MissingRender { component: String },

    #[error("{component}.getChildContext(): childContextTypes must be defined in order to use getChildContext()")]
    MissingChildContextTypes { component: String },

    #[error("{component}.getChildContext(): key \"{key}\" is not defined in childContextTypes")]
    UndeclaredChildContextKey { component: String, key: String },

    #[error("{component}.getChildContext(): must return an object, got {found}")]
    InvalidChildContext {
        component: String,
        found: &'static str,
    },

    #[error("merged hook results both define key `{key}`")]
    MergeKeyCollision { key: String },

    #[error("merged hook results must be objects, got {found}")]
    MergeNonObject { found: &'static str },

    #[error("method invoked without a receiving component instance")]
    MissingReceiver,

    #[error("`{name}` is not a callable member of {component}")]
    NotCallable { component: String, name: String },

    #[error("instance {instance} does not exist or has been unmounted")]
    UnknownInstance { instance: InstanceId },

    #[error("instance {instance} ({current}) cannot receive a `{next}` element with a different type or key")]
    IncompatibleElement {
        instance: InstanceId,
        current: String,
        next: String,
    },

    #[error("instance {instance} is not a composite component")]
    NotComposite { instance: InstanceId },

    #[error("instance {instance} is not a mounted root")]
    NotRoot { instance: InstanceId },

    #[error("no open transaction to defer work for instance {instance}")]
    NoTransaction { instance: InstanceId },

    #[error("update flush exceeded {passes} passes; a component keeps scheduling updates")]
    UpdateLoop { passes: usize },

    /// Raised by user hook code.
    #[error("{0}")]
    Hook(String),
}

impl RuntimeError {
    pub fn hook(message: impl Into<String>) -> Self {
        RuntimeError::Hook(message.into())
    }
}
