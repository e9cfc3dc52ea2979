//! Registry of service controls.
//!
//! One registry is built at startup and handed to everything that needs to
//! look up a service: the dispatch layer, the admin commands, the CLI.

use std::collections::BTreeMap;
use std::ops::ControlFlow;
use std::sync::{Arc, PoisonError, RwLock};

use groupctl_store::TableStore;

use crate::config::{ControlConfig, StoreConfig};
use crate::control::{Control, ControlOptions};
use crate::error::{ControlError, Result};

/// Maps service names to their controls. All controls share one store.
#[derive(Debug)]
pub struct Registry {
    store: Arc<TableStore>,
    controls: RwLock<BTreeMap<String, Arc<Control>>>,
}

impl Registry {
    pub fn new(store: Arc<TableStore>) -> Self {
        Self {
            store,
            controls: RwLock::new(BTreeMap::new()),
        }
    }

    /// Open the configured database file.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let store = TableStore::open(&config.path)?;
        Ok(Self::new(Arc::new(store)))
    }

    /// Registry over an in-memory database (for testing).
    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(Arc::new(TableStore::open_in_memory()?)))
    }

    pub fn store(&self) -> &Arc<TableStore> {
        &self.store
    }

    /// Register a service and create its table.
    ///
    /// A service without its table cannot answer checks, so callers should
    /// treat an error here as fatal.
    pub fn register(
        &self,
        service: impl Into<String>,
        options: ControlOptions,
    ) -> Result<Arc<Control>> {
        let service = service.into();
        let mut controls = self
            .controls
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if controls.contains_key(&service) {
            return Err(ControlError::AlreadyRegistered(service));
        }
        let control = Arc::new(Control::new(
            service.clone(),
            options,
            Arc::clone(&self.store),
        )?);
        controls.insert(service.clone(), Arc::clone(&control));
        tracing::info!(service = %service, "registered service");
        Ok(control)
    }

    /// Register every service listed in the configuration.
    pub fn register_all(&self, config: &ControlConfig) -> Result<Vec<Arc<Control>>> {
        config
            .services
            .iter()
            .map(|(service, options)| self.register(service.as_str(), options.clone()))
            .collect()
    }

    pub fn lookup(&self, service: &str) -> Option<Arc<Control>> {
        self.controls
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(service)
            .cloned()
    }

    /// Visit every control until the visitor breaks.
    ///
    /// The visitor runs on a snapshot taken under the read lock, so it may
    /// call back into the registry.
    pub fn for_each<F>(&self, mut visitor: F)
    where
        F: FnMut(&str, &Arc<Control>) -> ControlFlow<()>,
    {
        let snapshot: Vec<(String, Arc<Control>)> = self
            .controls
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, control)| (name.clone(), Arc::clone(control)))
            .collect();
        for (name, control) in &snapshot {
            if visitor(name, control).is_break() {
                return;
            }
        }
    }

    /// Registered service names.
    pub fn services(&self) -> Vec<String> {
        self.controls
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.controls
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
