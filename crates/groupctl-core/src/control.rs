//! Per-service control.
//!
//! A [`Control`] owns one service table and answers, per chat group, whether
//! the service may run. Groups move through three states:
//!
//! ```text
//! Unconfigured --first check--> Enabled | Disabled   (per disable_on_default)
//! Enabled  <--enable / disable-->  Disabled
//! ```
//!
//! Checks share the control's lock; enable, disable and the first-contact
//! write take it exclusively, so writes on one service are totally ordered.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use groupctl_store::{Condition, StoreError, TableStore};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::gate::{DegradedPolicy, Gate, GroupScoped, GroupState};
use crate::model::GroupConfig;

/// Options recognized by a control.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControlOptions {
    /// Fallback state written on first contact with a group
    pub disable_on_default: bool,
    /// Static usage text
    pub help: String,
    /// Answer used when the store fails during a check
    pub on_store_error: DegradedPolicy,
}

impl ControlOptions {
    pub fn with_help(help: impl Into<String>) -> Self {
        Self {
            help: help.into(),
            ..Self::default()
        }
    }

    pub fn disabled_by_default(mut self) -> Self {
        self.disable_on_default = true;
        self
    }
}

#[derive(Debug)]
pub struct Control {
    service: String,
    options: ControlOptions,
    store: Arc<TableStore>,
    lock: RwLock<()>,
}

impl Control {
    /// Create the control and its backing table.
    pub(crate) fn new(
        service: String,
        options: ControlOptions,
        store: Arc<TableStore>,
    ) -> Result<Self> {
        store.create::<GroupConfig>(&service)?;
        Ok(Self {
            service,
            options,
            store,
            lock: RwLock::new(()),
        })
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn options(&self) -> &ControlOptions {
        &self.options
    }

    /// Usage text, if any was configured.
    pub fn help(&self) -> Option<&str> {
        if self.options.help.is_empty() {
            None
        } else {
            Some(&self.options.help)
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ()> {
        self.lock.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ()> {
        self.lock.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lookup(&self, gid: i64) -> std::result::Result<Option<GroupConfig>, StoreError> {
        self.store.find(&self.service, &Condition::eq("gid", gid))
    }

    /// Let the service run in `gid`.
    pub fn enable(&self, gid: i64) -> Result<()> {
        self.set(GroupConfig::enabled(gid))
    }

    /// Stop the service from running in `gid`.
    pub fn disable(&self, gid: i64) -> Result<()> {
        self.set(GroupConfig::disabled(gid))
    }

    fn set(&self, row: GroupConfig) -> Result<()> {
        let _guard = self.write();
        self.store.upsert(&self.service, &row)?;
        tracing::debug!(service = %self.service, gid = row.gid, disable = row.disable, "stored group config");
        Ok(())
    }

    /// Forget the stored state of `gid`. Returns whether a row existed.
    pub fn reset(&self, gid: i64) -> Result<bool> {
        let _guard = self.write();
        let removed = self
            .store
            .delete(&self.service, &Condition::eq("gid", gid))?;
        Ok(removed > 0)
    }

    /// Stored state of `gid`, without materializing a default.
    pub fn state(&self, gid: i64) -> Result<GroupState> {
        let _guard = self.read();
        Ok(self
            .lookup(gid)?
            .map_or(GroupState::Unconfigured, |row| row.state()))
    }

    /// Number of groups with a stored state.
    pub fn configured_groups(&self) -> Result<usize> {
        let _guard = self.read();
        Ok(self.store.count(&self.service)?)
    }

    /// Decide whether the service may run in `gid`.
    ///
    /// An unconfigured group gets its default row written on the spot. Store
    /// failures are logged and answered according to `on_store_error`.
    pub fn check(&self, gid: i64) -> Gate {
        {
            let _guard = self.read();
            match self.lookup(gid) {
                Ok(Some(row)) => return row.gate(),
                Ok(None) => {}
                Err(e) => return self.degraded(gid, e),
            }
        }
        self.materialize_default(gid)
    }

    fn materialize_default(&self, gid: i64) -> Gate {
        let _guard = self.write();

        // Another caller may have written the row between the two locks.
        match self.lookup(gid) {
            Ok(Some(row)) => return row.gate(),
            Ok(None) => {}
            Err(e) => return self.degraded(gid, e),
        }

        let row = GroupConfig::initial(gid, self.options.disable_on_default);
        match self.store.upsert(&self.service, &row) {
            Ok(()) => {
                tracing::debug!(service = %self.service, gid, disable = row.disable, "materialized default group config");
                row.gate()
            }
            Err(e) => self.degraded(gid, e),
        }
    }

    fn degraded(&self, gid: i64, err: StoreError) -> Gate {
        tracing::error!(service = %self.service, gid, "[control] {}", err);
        Gate::Degraded {
            allowed: self
                .options
                .on_store_error
                .allows(self.options.disable_on_default),
            reason: err.to_string(),
        }
    }

    /// Gating predicate for the dispatch layer.
    pub fn handler<E>(self: &Arc<Self>) -> impl Fn(&E) -> bool + Send + Sync + 'static
    where
        E: GroupScoped + 'static,
    {
        let control = Arc::clone(self);
        move |event: &E| control.check(event.group_id()).permits()
    }
}
