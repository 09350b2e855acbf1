/// Shared fixtures for the in-crate test modules
use crate::*;
use std::sync::{Arc, Mutex};

/// Ordered record of hook calls, shareable across hook closures
#[derive(Clone, Default)]
pub(crate) struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub(crate) fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub(crate) fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }

    pub(crate) fn count(&self, entry: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|e| *e == entry).count()
    }
}

/// Primitive element with text content
pub(crate) fn text(tag: &str, content: impl Into<Value>) -> Element {
    Element::primitive(tag, Map::new()).with_prop("children", content)
}

pub(crate) fn compose(spec: ClassSpec) -> ComponentClass {
    Composer::new().compose(&spec).expect("Failed to compose class")
}

pub(crate) fn dev_runtime() -> Runtime {
    Runtime::with_options(RuntimeOptions::development())
}
