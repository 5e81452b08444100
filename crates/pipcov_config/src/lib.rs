//! Parsing and validation of `pipcov.toml` run configuration files.
//!
//! Every section is optional; a missing file yields [`PipcovConfig::default`].
//! The binaries convert the parsed values into explicit search and relocation
//! budgets before handing them to the core, which never reads configuration
//! itself.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, load_optional_config, CONFIG_FILE_NAME};
pub use types::*;
