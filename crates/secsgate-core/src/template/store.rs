//! Template storage capability.
//!
//! The gateway ships a filesystem store; this module holds the trait and an
//! in-memory implementation for embedders and tests.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::{Result, SecsGateError};
use crate::template::Template;

/// Named template lookup.
pub trait TemplateStore: Send + Sync {
    /// All template names, sorted.
    fn list_names(&self) -> Result<Vec<String>>;
    /// Load one template; `NotFound` when the name does not resolve.
    fn load(&self, name: &str) -> Result<Template>;
}

/// Map-backed store.
#[derive(Default)]
pub struct MemoryTemplateStore {
    templates: RwLock<BTreeMap<String, Template>>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, name: impl Into<String>, template: Template) {
        if let Ok(mut g) = self.templates.write() {
            g.insert(name.into(), template);
        }
    }
}

impl TemplateStore for MemoryTemplateStore {
    fn list_names(&self) -> Result<Vec<String>> {
        let g = self
            .templates
            .read()
            .map_err(|_| SecsGateError::Internal("template store lock poisoned".into()))?;
        Ok(g.keys().cloned().collect())
    }

    fn load(&self, name: &str) -> Result<Template> {
        let g = self
            .templates
            .read()
            .map_err(|_| SecsGateError::Internal("template store lock poisoned".into()))?;
        g.get(name)
            .cloned()
            .ok_or_else(|| SecsGateError::NotFound(format!("template {name}")))
    }
}
