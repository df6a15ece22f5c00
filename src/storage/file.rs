//! Deployment files on disk
//!
//! Deployments are described in JSON or YAML; the format is chosen by file
//! extension. Writes go through a temp file and an atomic rename so a
//! crashed save never leaves a half-written deployment behind.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::domain::Deployment;

/// Supported on-disk formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Yaml,
}

impl FileFormat {
    /// Determines the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(FileFormat::Json),
            Some("yaml") | Some("yml") => Ok(FileFormat::Yaml),
            other => bail!(
                "Unsupported deployment file extension {:?} for {}: expected .json, .yaml or .yml",
                other.unwrap_or(""),
                path.display()
            ),
        }
    }
}

/// A deployment description file
pub struct DeploymentFile {
    path: PathBuf,
    format: FileFormat,
}

impl DeploymentFile {
    /// Opens a handle to the given path, inferring the format
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let format = FileFormat::from_path(&path)?;
        Ok(Self { path, format })
    }

    /// Returns the path of the file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the inferred format
    pub fn format(&self) -> FileFormat {
        self.format
    }

    /// Reads and parses the deployment
    pub fn load(&self) -> Result<Deployment> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read deployment file: {}", self.path.display()))?;

        let deployment = match self.format {
            FileFormat::Json => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON: {}", self.path.display()))?,
            FileFormat::Yaml => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML: {}", self.path.display()))?,
        };
        Ok(deployment)
    }

    /// Serializes and writes the deployment atomically
    pub fn save(&self, deployment: &Deployment) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
        }

        let content = match self.format {
            FileFormat::Json => {
                let mut s = serde_json::to_string_pretty(deployment)
                    .context("Failed to serialize deployment")?;
                s.push('\n');
                s
            }
            FileFormat::Yaml => {
                serde_yaml::to_string(deployment).context("Failed to serialize deployment")?
            }
        };

        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, content)
            .with_context(|| format!("Failed to write temp file: {}", temp_path.display()))?;

        fs::rename(&temp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                self.path.display()
            )
        })?;

        Ok(())
    }
}
