//! Captured Output Store and Parameter Expansion
//!
//! Groups that finish successfully record their combined stdout/stderr
//! here. Later groups reference it from their parameters with
//! `{{ output.<group> }}` placeholders.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Opening token of an output placeholder.
const PLACEHOLDER_PREFIX: &str = "{{ output.";

/// Closing token of an output placeholder.
const PLACEHOLDER_SUFFIX: &str = " }}";

/// Run-scoped map from group name to captured output.
///
/// Safe to share between the worker threads of a step: each group writes
/// its own key once while siblings may read at any time.
#[derive(Debug, Default)]
pub struct OutputStore {
    entries: RwLock<HashMap<String, String>>,
}

impl OutputStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the output of a group.
    pub fn set(&self, group: impl Into<String>, text: impl Into<String>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(group.into(), text.into());
    }

    /// Returns the stored output for a group, if any.
    pub fn get(&self, group: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(group)
            .cloned()
    }

    /// Checks whether a group has stored output.
    pub fn contains(&self, group: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(group)
    }

    /// Copies the current contents.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Replaces `{{ output.<group> }}` placeholders with stored output.
///
/// Substituted text is trimmed of surrounding whitespace. Placeholders
/// naming a group without stored output are left as-is. Substituted text
/// is never scanned again.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use keepup::execution::output::expand_params;
///
/// let mut outputs = HashMap::new();
/// outputs.insert("fetch".to_string(), "World\n".to_string());
///
/// assert_eq!(expand_params("Hello {{ output.fetch }}", &outputs), "Hello World");
/// assert_eq!(expand_params("{{ output.other }}", &outputs), "{{ output.other }}");
/// ```
pub fn expand_params(param: &str, outputs: &HashMap<String, String>) -> String {
    let mut expanded = String::with_capacity(param.len());
    let mut rest = param;

    while let Some(start) = rest.find(PLACEHOLDER_PREFIX) {
        expanded.push_str(&rest[..start]);
        let after_prefix = &rest[start + PLACEHOLDER_PREFIX.len()..];

        let resolved = after_prefix.find(PLACEHOLDER_SUFFIX).and_then(|end| {
            let name = &after_prefix[..end];
            outputs
                .get(name)
                .map(|text| (text.trim(), end + PLACEHOLDER_SUFFIX.len()))
        });

        match resolved {
            Some((text, consumed)) => {
                expanded.push_str(text);
                rest = &after_prefix[consumed..];
            }
            None => {
                // Unknown group: keep the prefix and resume scanning after it
                expanded.push_str(PLACEHOLDER_PREFIX);
                rest = after_prefix;
            }
        }
    }

    expanded.push_str(rest);
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn outputs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_store_set_and_get() {
        let store = OutputStore::new();
        assert!(store.is_empty());

        store.set("group1", "Hello\n");
        assert_eq!(store.get("group1").as_deref(), Some("Hello\n"));
        assert!(store.contains("group1"));
        assert!(!store.contains("group2"));
        assert_eq!(store.get("group2"), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_snapshot_is_detached() {
        let store = OutputStore::new();
        store.set("a", "1");

        let snapshot = store.snapshot();
        store.set("b", "2");

        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_store_concurrent_writers() {
        let store = Arc::new(OutputStore::new());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    store.set(format!("group{}", i), format!("out{}", i));
                    let _ = store.snapshot();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 16);
        assert_eq!(store.get("group7").as_deref(), Some("out7"));
    }

    #[test]
    fn test_expand_trims_output() {
        let map = outputs(&[("A", "  World\n")]);
        assert_eq!(expand_params("{{ output.A }}", &map), "World");
    }

    #[test]
    fn test_expand_no_placeholders_is_identity() {
        let map = outputs(&[("A", "x")]);
        let text = "--flag value {{ notoutput.A }} {output.A}";
        assert_eq!(expand_params(text, &map), text);
        assert_eq!(expand_params("", &map), "");
    }

    #[test]
    fn test_expand_is_idempotent_for_unchanged_store() {
        let map = outputs(&[("A", "x")]);
        let text = "pre {{ output.A }} {{ output.B }} post";
        let first = expand_params(text, &map);
        let second = expand_params(text, &map);
        assert_eq!(first, "pre x {{ output.B }} post");
        assert_eq!(first, second);
    }

    #[test]
    fn test_expand_missing_group_passes_through() {
        let map = HashMap::new();
        assert_eq!(
            expand_params("value={{ output.missing }}", &map),
            "value={{ output.missing }}"
        );
    }

    #[test]
    fn test_expand_multiple_placeholders() {
        let map = outputs(&[("A", "1\n"), ("B", "2\n")]);
        assert_eq!(
            expand_params("{{ output.A }}+{{ output.B }}={{ output.A }}{{ output.B }}", &map),
            "1+2=12"
        );
    }

    #[test]
    fn test_expand_does_not_rescan_substituted_text() {
        let map = outputs(&[("A", "{{ output.B }}"), ("B", "deep")]);
        assert_eq!(expand_params("{{ output.A }}", &map), "{{ output.B }}");
    }

    #[test]
    fn test_expand_requires_exact_spacing() {
        let map = outputs(&[("A", "x")]);
        assert_eq!(expand_params("{{output.A}}", &map), "{{output.A}}");
        assert_eq!(expand_params("{{ output.A}}", &map), "{{ output.A}}");
        assert_eq!(expand_params("{{  output.A }}", &map), "{{  output.A }}");
    }

    #[test]
    fn test_expand_unterminated_placeholder() {
        let map = outputs(&[("A", "x")]);
        assert_eq!(expand_params("{{ output.A", &map), "{{ output.A");
    }

    #[test]
    fn test_expand_nested_prefix_resolves_inner() {
        let map = outputs(&[("A", "x")]);
        assert_eq!(
            expand_params("{{ output.{{ output.A }}", &map),
            "{{ output.x"
        );
    }

    #[test]
    fn test_expand_group_names_with_punctuation() {
        let map = outputs(&[("build-all_v2.0", "ok")]);
        assert_eq!(expand_params("{{ output.build-all_v2.0 }}", &map), "ok");
    }
}
