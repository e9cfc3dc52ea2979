//! Gating decisions and per-group state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stored state of one (service, group) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupState {
    /// No row yet; the first gating check decides.
    Unconfigured,
    Enabled,
    Disabled,
}

impl fmt::Display for GroupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GroupState::Unconfigured => "unconfigured",
            GroupState::Enabled => "enabled",
            GroupState::Disabled => "disabled",
        };
        f.write_str(s)
    }
}

/// Outcome of a gating check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    Allowed,
    Blocked,
    /// The store failed; `allowed` is the answer picked by the control's
    /// [`DegradedPolicy`].
    Degraded { allowed: bool, reason: String },
}

impl Gate {
    pub fn permits(&self) -> bool {
        match self {
            Gate::Allowed => true,
            Gate::Blocked => false,
            Gate::Degraded { allowed, .. } => *allowed,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Gate::Degraded { .. })
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gate::Allowed => f.write_str("allowed"),
            Gate::Blocked => f.write_str("blocked"),
            Gate::Degraded { allowed, reason } => {
                let answer = if *allowed { "allowed" } else { "blocked" };
                write!(f, "{answer} (store unavailable: {reason})")
            }
        }
    }
}

impl From<bool> for Gate {
    fn from(allowed: bool) -> Self {
        if allowed {
            Gate::Allowed
        } else {
            Gate::Blocked
        }
    }
}

/// What a gating check answers when the store is unavailable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradedPolicy {
    /// Answer as if the group were freshly configured with the default.
    #[default]
    FallBackToDefault,
    /// Always block.
    FailClosed,
    /// Always allow.
    FailOpen,
}

impl DegradedPolicy {
    pub fn allows(&self, disable_on_default: bool) -> bool {
        match self {
            DegradedPolicy::FallBackToDefault => !disable_on_default,
            DegradedPolicy::FailClosed => false,
            DegradedPolicy::FailOpen => true,
        }
    }
}

/// An inbound event scoped to a chat group.
///
/// Implemented by the dispatch layer's event type so the gating predicate can
/// find the group it targets.
pub trait GroupScoped {
    fn group_id(&self) -> i64;
}

impl GroupScoped for i64 {
    fn group_id(&self) -> i64 {
        *self
    }
}
