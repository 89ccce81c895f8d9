//! Configuration Module
//!
//! Data structures and loading for task runner configuration files.
//!
//! # Structure
//!
//! - [`model`]: Core data structures (Config, Group, Step, Settings)
//! - [`parser`]: YAML loading, home directory expansion, YAML dumping

pub mod model;
pub mod parser;

pub use model::{Config, Group, Logging, Settings, Step};
pub use parser::{load_config, parse_config, to_yaml, ConfigError, DEFAULT_CONFIG_PATH};
