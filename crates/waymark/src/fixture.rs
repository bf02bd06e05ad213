//! Fixture documents.
//!
//! Static JSON payloads (lookup tables, canned response bodies) stored beside
//! the environment configuration and loaded by name from inside scenarios.

use crate::result::{WaymarkError, WaymarkResult};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Read-only store of JSON fixture documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureStore {
    root: PathBuf,
}

impl FixtureStore {
    /// Create a store rooted at `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory fixtures are read from
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a fixture; `.json` is appended when the name has no extension
    #[must_use]
    pub fn path_for(&self, name: &str) -> PathBuf {
        let path = self.root.join(name);
        if path.extension().is_some() {
            path
        } else {
            path.with_extension("json")
        }
    }

    /// Whether a fixture exists
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_file()
    }

    /// Load a fixture as raw JSON
    pub fn load(&self, name: &str) -> WaymarkResult<serde_json::Value> {
        self.load_as(name)
    }

    /// Load a fixture into a typed value
    pub fn load_as<T: DeserializeOwned>(&self, name: &str) -> WaymarkResult<T> {
        let path = self.path_for(name);
        if !path.is_file() {
            return Err(WaymarkError::FixtureNotFound {
                name: name.to_string(),
            });
        }
        let text = std::fs::read_to_string(&path)?;
        tracing::debug!(fixture = name, path = %path.display(), "loaded fixture");
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Deserialize)]
    struct TestData {
        months: Vec<String>,
    }

    #[test]
    fn test_path_for_appends_json() {
        let store = FixtureStore::new("fx");
        assert_eq!(store.path_for("test-data"), PathBuf::from("fx/test-data.json"));
        assert_eq!(store.path_for("body.json"), PathBuf::from("fx/body.json"));
    }

    #[test]
    fn test_load_typed() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("test-data.json"),
            r#"{"months": ["January", "February"]}"#,
        )
        .unwrap();

        let store = FixtureStore::new(dir.path());
        let data: TestData = store.load_as("test-data").unwrap();
        assert_eq!(data.months[1], "February");
        assert!(store.exists("test-data.json"));
    }

    #[test]
    fn test_missing_fixture() {
        let dir = TempDir::new().unwrap();
        let store = FixtureStore::new(dir.path());
        let err = store.load("nope").unwrap_err();
        assert!(matches!(err, WaymarkError::FixtureNotFound { .. }));
    }
}
