//! Project registry
//!
//! Static mapping from human-readable project names to DPC project
//! identifiers. Built at deployment time and read-only at runtime.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Opaque DPC project identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Project name to identifier lookup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectRegistry {
    projects: HashMap<String, ProjectId>,
}

impl ProjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a registry from a JSON object of `name -> id`
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Adds a project, replacing any previous identifier for the same name
    pub fn with_project(mut self, name: impl Into<String>, id: impl Into<String>) -> Self {
        self.projects.insert(name.into(), ProjectId::new(id));
        self
    }

    /// Resolves a project name, `None` if it is not registered
    pub fn resolve(&self, name: &str) -> Option<&ProjectId> {
        self.projects.get(name)
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_and_unknown() {
        let registry = ProjectRegistry::new()
            .with_project("My first project", "c28506c2-66eb-4acb-9427-9665a461da71");

        assert_eq!(
            registry.resolve("My first project").map(ProjectId::as_str),
            Some("c28506c2-66eb-4acb-9427-9665a461da71")
        );
        assert!(registry.resolve("my first project").is_none());
        assert!(registry.resolve("Other").is_none());
    }

    #[test]
    fn test_from_json() {
        let registry = ProjectRegistry::from_json(r#"{"a": "id-a", "b": "id-b"}"#).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.resolve("b"), Some(&ProjectId::new("id-b")));
    }

    #[test]
    fn test_from_json_rejects_non_string_ids() {
        assert!(ProjectRegistry::from_json(r#"{"a": 1}"#).is_err());
    }
}
