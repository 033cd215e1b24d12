//! The `satpkgr.json` manifest.
//!
//! Both the project manifest and the manifest shipped inside every installed
//! package use this model. The document is held as a JSON object in file
//! order; only `dependencies` and `cosmos.launcher` are interpreted, every
//! other key is carried through a rewrite as-is.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::path::Path;

use crate::runtime::Runtime;

const DEPENDENCIES: &str = "dependencies";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct Manifest {
    fields: Map<String, Value>,
}

impl Manifest {
    /// The placeholder manifest written by `satpkgr init`.
    pub fn template() -> Self {
        let value = json!({
            "name": "username/package_name",
            "description": "what your package does",
            "version": "0.0.1",
            "author": "your name",
            "cosmos": { "launcher": "your_app_launcher.rb" },
            "cfs": {},
            "dependencies": {},
        });
        match value {
            Value::Object(fields) => Manifest { fields },
            _ => Manifest::default(),
        }
    }

    /// Load a manifest. An empty file is an empty manifest.
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let content = runtime.read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Manifest::default());
        }
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))
    }

    /// Write the manifest back as pretty-printed JSON, replacing the file.
    #[tracing::instrument(skip(self, runtime))]
    pub fn save<R: Runtime>(&self, runtime: &R, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        runtime
            .write(path, content.as_bytes())
            .with_context(|| format!("Failed to save manifest to {:?}", path))
    }

    /// A top-level value, if present.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    fn dependencies(&self) -> Option<&Map<String, Value>> {
        self.fields.get(DEPENDENCIES)?.as_object()
    }

    /// Dependency keys in file order.
    pub fn dependency_names(&self) -> Vec<String> {
        self.dependencies()
            .map(|deps| deps.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn has_dependency(&self, name: &str) -> bool {
        self.dependencies()
            .is_some_and(|deps| deps.contains_key(name))
    }

    /// Record `name -> git_ref`, creating the dependency map if it is missing.
    pub fn set_dependency(&mut self, name: &str, git_ref: &str) -> Result<()> {
        let deps = self
            .fields
            .entry(DEPENDENCIES)
            .or_insert_with(|| Value::Object(Map::new()));
        match deps.as_object_mut() {
            Some(deps) => {
                deps.insert(name.to_string(), Value::String(git_ref.to_string()));
                Ok(())
            }
            None => bail!("\"{}\" is not an object", DEPENDENCIES),
        }
    }

    /// Remove a dependency, keeping the order of the others.
    pub fn remove_dependency(&mut self, name: &str) -> bool {
        self.fields
            .get_mut(DEPENDENCIES)
            .and_then(Value::as_object_mut)
            .is_some_and(|deps| deps.shift_remove(name).is_some())
    }

    /// The `cosmos.launcher` entry, when it is a string.
    pub fn launcher(&self) -> Option<&str> {
        self.fields.get("cosmos")?.get("launcher")?.as_str()
    }
}
