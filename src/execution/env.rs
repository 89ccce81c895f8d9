//! Environment Layering
//!
//! Each group process sees the tool's own environment overlaid with the
//! configuration-global `env`, then the group's `env`.

use std::collections::HashMap;
use std::ffi::OsString;

/// Merges environment layers from lowest to highest priority.
///
/// The base layer is kept as raw OS strings so inherited variables that are
/// not valid UTF-8 pass through untouched. Later layers override earlier
/// ones key by key.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use std::ffi::{OsStr, OsString};
/// use keepup::execution::env::merge_envs;
///
/// let base = HashMap::from([(OsString::from("K"), OsString::from("base"))]);
/// let global = HashMap::from([("K".to_string(), "g".to_string())]);
/// let scoped = HashMap::from([("K".to_string(), "s".to_string())]);
///
/// let merged = merge_envs(&base, &[&global, &scoped]);
/// assert_eq!(merged[OsStr::new("K")], "s");
/// ```
pub fn merge_envs(
    base: &HashMap<OsString, OsString>,
    overrides: &[&HashMap<String, String>],
) -> HashMap<OsString, OsString> {
    let mut merged = base.clone();
    for layer in overrides {
        merged.extend(
            layer
                .iter()
                .map(|(k, v)| (OsString::from(k), OsString::from(v))),
        );
    }
    merged
}

/// Snapshot of the current process environment.
pub fn process_env() -> HashMap<OsString, OsString> {
    std::env::vars_os().collect()
}
