//! groupctl-core: per-service, per-group enable/disable control
//!
//! - **Control**: one per service; stores a flag per chat group and answers
//!   gating checks (Unconfigured → Enabled | Disabled on first contact)
//! - **Registry**: service name → control, built once at startup
//! - **Admin**: enable / disable / usage / service list commands
//! - **Config**: TOML configuration for the store, logging and services
//!
//! ```
//! use groupctl_core::{ControlOptions, Gate, GroupState, Registry};
//!
//! let registry = Registry::in_memory().unwrap();
//! let weather = registry
//!     .register("weather", ControlOptions::with_help("weather forecast"))
//!     .unwrap();
//!
//! assert_eq!(weather.check(12345), Gate::Allowed);
//! assert_eq!(weather.state(12345).unwrap(), GroupState::Enabled);
//!
//! weather.disable(12345).unwrap();
//! assert_eq!(weather.check(12345), Gate::Blocked);
//! ```

pub mod admin;
pub mod config;
pub mod control;
pub mod error;
pub mod gate;
pub mod logging;
pub mod model;
pub mod registry;

pub use admin::{Admin, AdminCommand, CommandContext};
pub use config::{ConfigLayer, ControlConfig, LoggingConfig, StoreConfig};
pub use control::{Control, ControlOptions};
pub use error::{ConfigError, ControlError, Result};
pub use gate::{DegradedPolicy, Gate, GroupScoped, GroupState};
pub use model::GroupConfig;
pub use registry::Registry;
