//! The COSMOS launcher configuration (`launcher.txt`).
//!
//! The file's grammar belongs to the COSMOS launcher. This module only appends
//! `TOOL` lines and drops lines by substring match.

use anyhow::{Context, Result};
use log::info;
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

pub struct LauncherRegistry<'a, R: Runtime> {
    runtime: &'a R,
    path: PathBuf,
}

impl<'a, R: Runtime> LauncherRegistry<'a, R> {
    pub fn new(runtime: &'a R, path: PathBuf) -> Self {
        Self { runtime, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Format one launcher entry.
    pub fn tool_line(name: &str, launch_path: &str) -> String {
        format!("TOOL \"{}\" \"LAUNCH {}\"", name, launch_path)
    }

    /// Append a `TOOL` line on a new line at the end of the file.
    #[tracing::instrument(skip(self))]
    pub fn register(&self, name: &str, launch_path: &str) -> Result<()> {
        let line = format!("\n{}", Self::tool_line(name, launch_path));
        self.runtime
            .append(&self.path, line.as_bytes())
            .with_context(|| format!("Failed to register {} in {:?}", name, self.path))
    }

    /// Rewrite the file without the lines containing `fragment`.
    ///
    /// The rewrite goes to `<file>_temp` and is renamed over the original,
    /// whether or not anything matched. Returns the removed lines.
    #[tracing::instrument(skip(self))]
    pub fn unregister(&self, fragment: &str) -> Result<Vec<String>> {
        let content = self.runtime.read_to_string(&self.path)?;

        let mut kept = String::with_capacity(content.len());
        let mut removed = Vec::new();
        for line in content.lines() {
            if line.contains(fragment) {
                info!("Removing {}", line);
                removed.push(line.to_string());
            } else {
                kept.push_str(line);
                kept.push('\n');
            }
        }

        let temp_path = self.temp_path();
        self.runtime.write(&temp_path, kept.as_bytes())?;
        self.runtime
            .rename(&temp_path, &self.path)
            .with_context(|| format!("Failed to replace {:?}", self.path))?;

        Ok(removed)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push("_temp");
        PathBuf::from(name)
    }
}
