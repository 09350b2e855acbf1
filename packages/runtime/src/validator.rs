/// Advisory diagnostics produced by prop, context, and child-context type checkers
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Where a checked value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TypeLocation {
    Prop,
    Context,
    ChildContext,
}

impl TypeLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeLocation::Prop => "prop",
            TypeLocation::Context => "context",
            TypeLocation::ChildContext => "child context",
        }
    }
}

impl fmt::Display for TypeLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation warning level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValidationLevel {
    /// Checker reported a mismatch
    Warning,
    /// Checker itself failed
    Error,
}

/// Validation warning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub level: ValidationLevel,
    pub message: String,
    pub component: Option<String>,
    pub location: Option<TypeLocation>,
}

impl ValidationWarning {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: ValidationLevel::Warning,
            message: message.into(),
            component: None,
            location: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: ValidationLevel::Error,
            message: message.into(),
            component: None,
            location: None,
        }
    }

    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    pub fn at(mut self, location: TypeLocation) -> Self {
        self.location = Some(location);
        self
    }
}

/// Collector for advisory warnings
#[derive(Debug, Default)]
pub struct Diagnostics {
    /// Whether warnings are retained after being logged
    collect: bool,
    warnings: Vec<ValidationWarning>,
}

impl Diagnostics {
    pub fn new(collect: bool) -> Self {
        Self {
            collect,
            warnings: Vec::new(),
        }
    }

    /// Log a warning and keep it if collection is enabled. A warning equal to
    /// one already kept (same component, location and message) is only logged.
    pub fn report(&mut self, warning: ValidationWarning) {
        warn!(
            level = ?warning.level,
            component = warning.component.as_deref().unwrap_or("<unknown>"),
            location = warning.location.map(|l| l.as_str()).unwrap_or("-"),
            "{}",
            warning.message
        );

        if self.collect && !self.warnings.contains(&warning) {
            self.warnings.push(warning);
        }
    }

    pub fn warnings(&self) -> &[ValidationWarning] {
        &self.warnings
    }

    pub fn take(&mut self) -> Vec<ValidationWarning> {
        std::mem::take(&mut self.warnings)
    }
}
