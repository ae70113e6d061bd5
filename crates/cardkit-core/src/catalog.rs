//! Table of constructible app modules.
//!
//! Discovery and construction are separate: the registry scan only reads
//! manifests, and a module is turned into an instance here, by path, when
//! the user first selects it.

use std::collections::HashMap;

use cardkit_types::error::{CardkitError, Result};

use crate::app::App;

/// Builds a fresh instance of one app module.
pub type AppFactory = Box<dyn Fn() -> Result<Box<dyn App>>>;

/// Module path -> constructor.
#[derive(Default)]
pub struct AppCatalog {
    factories: HashMap<String, AppFactory>,
}

impl AppCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor under a module path such as
    /// `demo/keyboard_demo`. Replaces any existing entry.
    pub fn register<F>(&mut self, module_path: &str, factory: F)
    where
        F: Fn() -> Result<Box<dyn App>> + 'static,
    {
        if self
            .factories
            .insert(module_path.to_string(), Box::new(factory))
            .is_some()
        {
            log::debug!("[catalog] replaced factory for {module_path}");
        }
    }

    /// Construct a new instance of `module_path`.
    pub fn import(&self, module_path: &str) -> Result<Box<dyn App>> {
        let factory = self
            .factories
            .get(module_path)
            .ok_or_else(|| CardkitError::load(module_path, "no such module"))?;
        factory().map_err(|e| match e {
            CardkitError::Load { .. } => e,
            other => CardkitError::load(module_path, other.to_string()),
        })
    }

    pub fn contains(&self, module_path: &str) -> bool {
        self.factories.contains_key(module_path)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Registered module paths, sorted.
    pub fn module_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }
}

impl std::fmt::Debug for AppCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppCatalog")
            .field("modules", &self.module_paths())
            .finish()
    }
}
