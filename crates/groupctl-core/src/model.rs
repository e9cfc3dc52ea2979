//! Row stored in every service table.

use groupctl_store::record;

use crate::gate::{Gate, GroupState};

record! {
    /// Enable/disable flag of one group for one service.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct GroupConfig {
        /// Chat group identifier
        #[column = "gid"]
        pub gid: i64,
        /// 0 = enabled, 1 = disabled
        #[column = "disable"]
        pub disable: i64,
    }
}

impl GroupConfig {
    pub fn enabled(gid: i64) -> Self {
        Self { gid, disable: 0 }
    }

    pub fn disabled(gid: i64) -> Self {
        Self { gid, disable: 1 }
    }

    /// Default row for a group seen for the first time.
    pub fn initial(gid: i64, disable_on_default: bool) -> Self {
        if disable_on_default {
            Self::disabled(gid)
        } else {
            Self::enabled(gid)
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.disable != 0
    }

    pub fn state(&self) -> GroupState {
        if self.is_disabled() {
            GroupState::Disabled
        } else {
            GroupState::Enabled
        }
    }

    pub fn gate(&self) -> Gate {
        Gate::from(!self.is_disabled())
    }
}
