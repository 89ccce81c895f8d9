//! Keepup - Declarative Task Runner
//!
//! Runs named groups of shell commands in ordered steps. Groups listed in
//! the same step run concurrently; steps run one after another. A group can
//! reuse the output of a group from an earlier step through
//! `{{ output.<group> }}` placeholders in its parameters.
//!
//! # Architecture
//!
//! The library is organized into three main modules:
//!
//! - [`config`]: Data structures and YAML loading for configurations
//! - [`execution`]: Step scheduler, group runner and output store
//! - [`logging`]: Log backend setup from configuration settings
//!
//! # Example
//!
//! ```rust,no_run
//! use keepup::config::load_config;
//! use keepup::execution::Engine;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Load a configuration from YAML
//!     let config = load_config("keepup.yml")?;
//!
//!     // Execute every step
//!     let mut engine = Engine::new(config);
//!     engine.run()?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod execution;
pub mod logging;

// Re-export commonly used types
pub use config::{load_config, Config, Group, Step};
pub use execution::engine::{Engine, EngineError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "keepup";

/// Commit hash baked in at build time, empty when not provided.
pub const GIT_SHA: &str = match option_env!("KEEPUP_GIT_SHA") {
    Some(sha) => sha,
    None => "",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_app_name() {
        assert_eq!(APP_NAME, "keepup");
    }

    #[test]
    fn test_module_exports_group() {
        let group = Group::new("test", "echo").with_param("test");
        assert_eq!(group.name, "test");
        assert_eq!(group.command, "echo");
    }

    #[test]
    fn test_module_exports_config() {
        let config = Config::from_parts(vec![], vec![Step::new(["a"])]);
        assert!(config.groups.is_empty());
        assert_eq!(config.execution.len(), 1);
    }

    #[test]
    fn test_version_format() {
        let parts: Vec<&str> = VERSION.split('.').collect();
        assert!(parts.len() >= 2, "Version should have at least major.minor");
        for part in parts {
            assert!(part.parse::<u32>().is_ok(), "Version components should be numeric");
        }
    }
}
