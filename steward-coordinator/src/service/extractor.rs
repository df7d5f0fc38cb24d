//! Container file extraction
//!
//! Copies files out of workload containers with the container runtime CLI
//! available inside the coordinator container.

use anyhow::Context;
use std::path::Path;
use std::process::Command;
use tracing::{debug, error, info};

use crate::error::{CoordinatorError, Result};

/// Copies files out of containers through `<runtime> cp`
#[derive(Debug, Clone)]
pub struct FileExtractor {
    runtime: String,
}

impl FileExtractor {
    pub fn new(runtime: impl Into<String>) -> Self {
        Self {
            runtime: runtime.into(),
        }
    }

    /// Checks that the container runtime CLI is installed and responding
    pub fn check_available(&self) -> anyhow::Result<()> {
        let output = Command::new(&self.runtime)
            .arg("--version")
            .output()
            .with_context(|| {
                format!(
                    "Failed to execute '{} --version'. Is it installed?",
                    self.runtime
                )
            })?;

        if !output.status.success() {
            anyhow::bail!("Container runtime {} is not working correctly", self.runtime);
        }

        let version = String::from_utf8_lossy(&output.stdout);
        info!("Container runtime is available: {}", version.trim());

        Ok(())
    }

    /// Copies `path` from `container` to `dst` on the local filesystem.
    ///
    /// Blocks until the runtime exits. A single attempt is made.
    pub fn copy_from_container(&self, container: &str, path: &str, dst: &Path) -> Result<()> {
        let source = format!("{}:{}", container, path);
        debug!("Copying {} to {}", source, dst.display());

        let output = Command::new(&self.runtime)
            .arg("cp")
            .arg(&source)
            .arg(dst)
            .output()
            .map_err(|e| self.copy_error(container, path, String::new(), e.to_string()))?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        let combined = combined.trim().to_string();

        if !output.status.success() {
            return Err(self.copy_error(container, path, combined, output.status.to_string()));
        }

        if !combined.is_empty() {
            debug!("{} cp output: {}", self.runtime, combined);
        }
        Ok(())
    }

    fn copy_error(&self, container: &str, path: &str, output: String, reason: String) -> CoordinatorError {
        error!("Copy {}:{} failed: {} ({})", container, path, reason, output);
        CoordinatorError::Copy {
            container: container.to_string(),
            path: path.to_string(),
            output,
            reason,
        }
    }
}
