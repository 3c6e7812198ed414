//! Live System Configuration Store
//!
//! This crate reads and updates the flat `KEY=VALUE` files that live-system
//! installer and boot scripts use to hand settings to each other.
//!
//! # Overview
//!
//! - [`value`]: Scalar and array values and their on-disk encoding
//! - [`file`]: Line model that keeps comments and layout intact on rewrite
//! - [`store`]: Selective load, single-value lookup and in-place save
//! - [`error`]: Error taxonomy
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use liveconf_config::{ConfigStore, ConfigValue, Entries, KeySelector};
//!
//! let store = ConfigStore::new("/etc/live/config.conf");
//!
//! // Missing keys are simply absent from the result
//! let entries = store.load(&["USER_NAME", "LIVE_SERVICES"]).unwrap();
//! println!("{:?}", entries.get("USER_NAME"));
//!
//! // Missing files and keys read as an empty string
//! println!("host: {}", store.load_value("HOSTNAME"));
//!
//! let mut update = Entries::new();
//! update.insert("HOSTNAME".to_string(), ConfigValue::scalar("live"));
//! update.insert("LIVE_SERVICES".to_string(), ConfigValue::array(["ssh", "cron"]));
//! store.save(&update, &KeySelector::keys(["HOSTNAME", "LIVE_SERVICES"])).unwrap();
//! ```
//!
//! # File Format
//!
//! ```text
//! # comment line (ignored)
//! USER_NAME="user"
//! LIVE_SERVICES=("ssh" "network manager")
//!
//! HOSTNAME="appended later"
//! ```

pub mod error;
pub mod file;
pub mod store;
pub mod value;

pub use error::{ConfigError, Result};
pub use file::{is_valid_key, ConfigFile, Line, SetOutcome};
pub use store::{ConfigStore, Entries, KeySelector, SaveMode};
pub use value::ConfigValue;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        ConfigError, ConfigStore, ConfigValue, Entries, KeySelector, Result, SaveMode,
    };
}
