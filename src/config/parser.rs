//! Configuration Parser
//!
//! Handles loading configuration files from disk and decoding YAML into
//! the [`Config`] model. Paths starting with `~/` are resolved against the
//! user's home directory.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use once_cell::sync::Lazy;
use thiserror::Error;

use super::model::Config;

/// Application name used for the default configuration location.
const APP_DIR: &str = "keepup";

/// Default configuration path: `~/.config/keepup/keepup.yml`.
///
/// Falls back to a relative `.config/keepup/keepup.yml` when no home
/// directory is known.
pub static DEFAULT_CONFIG_PATH: Lazy<PathBuf> = Lazy::new(|| {
    home_dir()
        .unwrap_or_default()
        .join(".config")
        .join(APP_DIR)
        .join(format!("{}.yml", APP_DIR))
});

/// Errors raised while loading or dumping configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot determine home dir")]
    HomeDir,

    #[error("cannot read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid yaml format: {0}")]
    Parse(#[source] serde_yaml::Error),

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[source] serde_yaml::Error),
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
}

/// Resolves a leading `~/` against the home directory.
pub fn expand_home(path: &Path) -> Result<PathBuf, ConfigError> {
    match path.strip_prefix("~") {
        Ok(rest) => Ok(home_dir().ok_or(ConfigError::HomeDir)?.join(rest)),
        Err(_) => Ok(path.to_path_buf()),
    }
}

/// Decodes a configuration from YAML text.
///
/// An empty document (or one holding only comments) yields the default
/// configuration.
///
/// # Example
///
/// ```
/// use keepup::config::parse_config;
///
/// let config = parse_config("groups:\n  - name: hello\n    command: echo\n").unwrap();
/// assert_eq!(config.groups[0].name, "hello");
/// ```
pub fn parse_config(yaml: &str) -> Result<Config, ConfigError> {
    if yaml.trim().is_empty() {
        return Ok(Config::default());
    }

    let config: Option<Config> = serde_yaml::from_str(yaml).map_err(ConfigError::Parse)?;
    Ok(config.unwrap_or_default())
}

/// Loads a configuration from a YAML file.
///
/// # Arguments
///
/// * `path` - Path to the configuration file, `~/` is expanded
///
/// # Returns
///
/// * `Ok(Config)` - Successfully decoded configuration
/// * `Err` - Read or parse error
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = expand_home(path.as_ref())?;
    info!("Loading configuration from: {}", path.display());

    let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;

    debug!("YAML content loaded ({} bytes)", content.len());

    let config = parse_config(&content)?;

    info!(
        "Parsed {} groups, {} execution steps",
        config.groups.len(),
        config.execution.len()
    );

    Ok(config)
}

/// Renders a configuration back to YAML.
pub fn to_yaml(config: &Config) -> Result<String, ConfigError> {
    serde_yaml::to_string(config).map_err(ConfigError::Serialize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    const VALID_YAML: &str = r#"
version: 1

settings:
  logging:
    level: trace
    pretty: true # human-readable logs

env:
  KEY: "value"

groups:
  - name: program1
    description: "This runs program 1"
    command: "echo $WHATEVER"
    params: ["--flag1", "value1"]

execution:
  - group: ["program1"] # these run concurrently
"#;

    #[test]
    fn test_parse_config_valid_yaml() {
        let config = parse_config(VALID_YAML).unwrap();

        assert_eq!(config.version, 1);
        assert_eq!(config.settings.logging.level, "trace");
        assert!(config.settings.logging.pretty);
        assert_eq!(config.groups[0].name, "program1");
        assert_eq!(config.groups[0].params, vec!["--flag1", "value1"]);
        assert_eq!(
            config.groups[0].description.as_deref(),
            Some("This runs program 1")
        );
        assert_eq!(config.env.get("KEY").map(String::as_str), Some("value"));
        assert_eq!(config.execution[0].group, vec!["program1"]);
    }

    #[test]
    fn test_parse_config_invalid_yaml() {
        let result = parse_config("invalid_yaml: [");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_parse_config_empty() {
        let config = parse_config("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.version, 0);
        assert!(config.groups.is_empty());
        assert!(config.execution.is_empty());
        assert!(config.env.is_empty());
    }

    #[test]
    fn test_parse_config_comments_only() {
        let config = parse_config("# nothing configured yet\n").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_parse_config_ignores_unknown_settings() {
        let yaml = "settings:\n  working-dir: /tmp\n  max-concurrency: 2\n";
        let config = parse_config(yaml).unwrap();
        assert_eq!(config.settings.working_dir, Some(PathBuf::from("/tmp")));
    }

    #[test]
    fn test_load_config_valid_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.yaml");
        std::fs::write(&path, VALID_YAML).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.version, 1);
        assert_eq!(config.groups.len(), 1);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config("/nonexistent/path/keepup.yml");
        match result {
            Err(ConfigError::Read { path, .. }) => {
                assert_eq!(path, PathBuf::from("/nonexistent/path/keepup.yml"));
            }
            other => panic!("expected read error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_config_invalid_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("bad.yaml");
        std::fs::write(&path, "invalid_yaml: [").unwrap();

        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_load_config_empty_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("empty.yaml");
        std::fs::write(&path, "").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_expand_home_plain_path() {
        let path = expand_home(Path::new("/etc/keepup.yml")).unwrap();
        assert_eq!(path, PathBuf::from("/etc/keepup.yml"));

        let relative = expand_home(Path::new("configs/~/x.yml")).unwrap();
        assert_eq!(relative, PathBuf::from("configs/~/x.yml"));
    }

    #[test]
    fn test_expand_home_tilde() {
        let Some(home) = home_dir() else {
            return;
        };
        let path = expand_home(Path::new("~/config-test.yaml")).unwrap();
        assert_eq!(path, home.join("config-test.yaml"));
    }

    #[test]
    fn test_default_config_path() {
        let path = DEFAULT_CONFIG_PATH.as_path();
        assert!(path.ends_with(".config/keepup/keepup.yml"));
    }

    #[test]
    fn test_to_yaml_round_trip() {
        let config = parse_config(VALID_YAML).unwrap();
        let yaml = to_yaml(&config).unwrap();
        assert!(yaml.contains("program1"));

        let reparsed = parse_config(&yaml).unwrap();
        assert_eq!(reparsed, config);
    }
}
