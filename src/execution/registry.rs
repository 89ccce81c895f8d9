//! Group Registry
//!
//! Name-indexed view of the configured groups, built once per engine.

use std::collections::HashMap;

use crate::config::Group;

/// Read-only lookup table from group name to definition.
#[derive(Debug, Clone, Default)]
pub struct GroupRegistry {
    groups: HashMap<String, Group>,
}

impl GroupRegistry {
    /// Indexes groups by name. A later definition replaces an earlier one
    /// with the same name.
    pub fn build(groups: &[Group]) -> Self {
        Self {
            groups: groups
                .iter()
                .map(|g| (g.name.clone(), g.clone()))
                .collect(),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let registry = GroupRegistry::build(&[Group::new("a", "echo"), Group::new("b", "ls")]);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.lookup("b").map(|g| g.command.as_str()), Some("ls"));
        assert!(registry.lookup("c").is_none());
    }

    #[test]
    fn test_duplicate_names_last_wins() {
        let registry = GroupRegistry::build(&[Group::new("a", "first"), Group::new("a", "second")]);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("a").unwrap().command, "second");
    }

    #[test]
    fn test_empty() {
        assert!(GroupRegistry::build(&[]).is_empty());
    }
}
