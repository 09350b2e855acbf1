//! Mixin injection.
//!
//! Injected mixins are applied ahead of every specification a composer
//! handles. [`MixinRegistry`] is an explicit value for callers that want
//! isolation; the process-wide registry backs [`crate::create_class`] and must
//! be reset explicitly between independent runs.

use crate::spec::Mixin;
use std::sync::{OnceLock, RwLock};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct MixinRegistry {
    mixins: Vec<Mixin>,
}

impl MixinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inject(&mut self, mixin: impl Into<Mixin>) {
        self.mixins.push(mixin.into());
    }

    pub fn mixins(&self) -> &[Mixin] {
        &self.mixins
    }

    pub fn len(&self) -> usize {
        self.mixins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mixins.is_empty()
    }

    pub fn reset(&mut self) {
        self.mixins.clear();
    }
}

fn global() -> &'static RwLock<MixinRegistry> {
    static GLOBAL: OnceLock<RwLock<MixinRegistry>> = OnceLock::new();
    GLOBAL.get_or_init(|| RwLock::new(MixinRegistry::new()))
}

/// Inject a mixin into every class composed afterwards through the
/// process-wide registry
pub fn inject_mixin(mixin: impl Into<Mixin>) {
    let mut registry = global().write().unwrap_or_else(|poisoned| poisoned.into_inner());
    registry.inject(mixin);
    debug!(injected = registry.len(), "Injected mixin");
}

/// Snapshot of the process-wide injected mixins
pub fn injected_mixins() -> Vec<Mixin> {
    global()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .mixins()
        .to_vec()
}

/// Remove every process-wide injected mixin
pub fn reset_injected_mixins() {
    global()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .reset();
}
