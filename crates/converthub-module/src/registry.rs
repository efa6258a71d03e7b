//! Module registry keyed by label.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::error::ModuleError;
use crate::module::{Module, ModuleInfo};

/// Registry of all conversion modules, keyed by their unique label.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    /// Module label → module.
    modules: RwLock<HashMap<String, Arc<Module>>>,
}

impl ModuleRegistry {
    /// Creates a new empty module registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a module. A second module with the same label is rejected.
    pub async fn register(&self, module: Module) -> Result<Arc<Module>, ModuleError> {
        let label = module.label().to_string();
        let mut modules = self.modules.write().await;

        if modules.contains_key(&label) {
            return Err(ModuleError::DuplicateModule { label });
        }

        info!(
            module = %label,
            module_id = %module.id(),
            return_mode = ?module.return_mode(),
            "Registering module"
        );

        let module = Arc::new(module);
        modules.insert(label, Arc::clone(&module));
        Ok(module)
    }

    /// Gets a module by label.
    pub async fn get(&self, label: &str) -> Option<Arc<Module>> {
        let modules = self.modules.read().await;
        modules.get(label).cloned()
    }

    /// Whether this exact module instance is registered here.
    pub async fn contains(&self, module: &Arc<Module>) -> bool {
        let modules = self.modules.read().await;
        modules
            .get(module.label())
            .is_some_and(|registered| Arc::ptr_eq(registered, module))
    }

    /// Lists all registered modules, sorted by label.
    pub async fn list(&self) -> Vec<ModuleInfo> {
        let modules = self.modules.read().await;
        let mut infos: Vec<ModuleInfo> = modules.values().map(|m| m.info()).collect();
        infos.sort_by(|a, b| a.label.cmp(&b.label));
        infos
    }

    /// Returns module count.
    pub async fn count(&self) -> usize {
        let modules = self.modules.read().await;
        modules.len()
    }
}
