//! Configuration Data Model
//!
//! Core data structures describing groups, execution steps and settings.
//!
//! # Example YAML Format
//!
//! ```yaml
//! version: 1
//!
//! settings:
//!   logging:
//!     level: info
//!     pretty: true
//!   working-dir: /tmp
//!
//! env:
//!   GREETING: "hello"
//!
//! groups:
//!   - name: fetch
//!     description: "Fetch the current revision"
//!     command: git
//!     params: ["rev-parse", "HEAD"]
//!
//!   - name: report
//!     command: echo
//!     params: ["$GREETING", "{{ output.fetch }}"]
//!     env:
//!       GREETING: "revision"
//!
//! execution:
//!   - group: ["fetch"]
//!   - group: ["report"]
//! ```

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;

/// Complete task runner configuration.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Configuration schema version
    pub version: i64,

    /// Runtime settings (logging, working directory)
    pub settings: Settings,

    /// Named command groups
    pub groups: Vec<Group>,

    /// Ordered execution plan
    pub execution: Vec<Step>,

    /// Global environment overrides applied to every group
    pub env: HashMap<String, String>,
}

/// Logging preferences.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Logging {
    /// Level name (trace, debug, info, warn, error). Empty means default.
    pub level: String,

    /// Human-readable output instead of JSON lines
    pub pretty: bool,
}

/// Runtime settings.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub logging: Logging,

    /// Directory every group process starts in
    #[serde(rename = "working-dir", skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,

    /// Log resolved commands instead of executing them
    #[serde(rename = "dry-run", skip_serializing_if = "std::ops::Not::not")]
    pub dry_run: bool,
}

/// A named unit of work: one shell command with parameters.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Group {
    /// Unique group name, also the key for its captured output
    pub name: String,

    /// Program or command text
    #[serde(default)]
    pub command: String,

    /// Arguments appended to the command. May contain `{{ output.<group> }}`
    #[serde(deserialize_with = "single_or_vec", default)]
    pub params: Vec<String>,

    /// Shell override (defaults to `$SHELL`, then `/bin/sh`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Reserved. Parsed but not acted upon by the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Group-scoped environment overrides
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
}

/// A set of group names that run concurrently.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Step {
    #[serde(deserialize_with = "single_or_vec", default)]
    pub group: Vec<String>,
}

/// Deserializes either a single string or array of strings into Vec<String>
fn single_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let val = Value::deserialize(deserializer)?;
    match val {
        Value::Null => Ok(Vec::new()),
        Value::String(s) => Ok(vec![s]),
        Value::Array(arr) => arr
            .into_iter()
            .map(|v| match v {
                Value::String(s) => Ok(s),
                Value::Number(n) => Ok(n.to_string()),
                Value::Bool(b) => Ok(b.to_string()),
                _ => Err(de::Error::custom("Expected string in array")),
            })
            .collect(),
        _ => Err(de::Error::custom("Expected string or array of strings")),
    }
}

impl Group {
    /// Creates a group running `command` with no parameters.
    ///
    /// # Example
    ///
    /// ```
    /// use keepup::config::Group;
    ///
    /// let group = Group::new("greet", "echo")
    ///     .with_params(["Hello", "World"])
    ///     .with_env("LANG", "C");
    /// assert_eq!(group.params.len(), 2);
    /// ```
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            ..Self::default()
        }
    }

    /// Appends a single parameter.
    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.params.push(param.into());
        self
    }

    /// Replaces the parameter list.
    pub fn with_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the shell used to run the command line.
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = Some(shell.into());
        self
    }

    /// Adds a group-scoped environment variable.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

impl Step {
    /// Creates a step running the given groups concurrently.
    pub fn new<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            group: groups.into_iter().map(Into::into).collect(),
        }
    }
}

impl Config {
    /// Creates a config from groups and steps with default settings.
    pub fn from_parts(groups: Vec<Group>, execution: Vec<Step>) -> Self {
        Self {
            groups,
            execution,
            ..Self::default()
        }
    }

    /// Looks up a group definition by name.
    pub fn get_group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Restricts the execution plan to a single group.
    ///
    /// Returns an error if the group is not defined.
    pub fn restrict_to_group(&mut self, name: &str) -> Result<(), String> {
        if self.get_group(name).is_none() {
            return Err(format!("group {:?} not found in config", name));
        }
        self.execution = vec![Step::new([name])];
        Ok(())
    }
}
