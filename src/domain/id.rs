//! Identifiers for deployments and stages
//!
//! ID Format:
//! - Deployment IDs: `d-{7-char-hash}` (e.g., `d-7f2b4c1`)
//! - Stage IDs: author-provided names (e.g., `stage-1`, `K8S_CANARY_ROLLOUT`)
//!
//! Deployment hashes are derived from application name + trigger timestamp,
//! so the same application deployed at different times gets different IDs.
//! Stage IDs are validated, not generated: they come from the pipeline
//! definition and must be unique within one deployment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("Invalid deployment ID format: expected 'd-{{7-char-hash}}', got '{0}'")]
    InvalidDeploymentId(String),

    #[error("Invalid stage ID '{0}': must be non-empty ASCII alphanumerics, '-', '_' or '.'")]
    InvalidStageId(String),
}

/// Generates a 7-character hash from application name and timestamp
fn generate_hash(application: &str, timestamp: DateTime<Utc>) -> String {
    let input = format!(
        "{}{}",
        application,
        timestamp.timestamp_nanos_opt().unwrap_or(0)
    );
    let hash = blake3::hash(input.as_bytes());
    let hex = hash.to_hex();
    hex[..7].to_string()
}

/// Deployment ID in the format `d-{7-char-hash}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeploymentId {
    hash: String,
}

impl DeploymentId {
    /// Creates a new deployment ID from application name and trigger timestamp
    pub fn new(application: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            hash: generate_hash(application, timestamp),
        }
    }

    /// Returns the hash portion of the ID
    pub fn hash(&self) -> &str {
        &self.hash
    }
}

impl fmt::Display for DeploymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d-{}", self.hash)
    }
}

impl FromStr for DeploymentId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if !s.starts_with("d-") {
            return Err(IdError::InvalidDeploymentId(s.to_string()));
        }

        let hash = &s[2..];
        if hash.len() != 7 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(IdError::InvalidDeploymentId(s.to_string()));
        }

        Ok(Self {
            hash: hash.to_string(),
        })
    }
}

impl TryFrom<String> for DeploymentId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DeploymentId> for String {
    fn from(id: DeploymentId) -> Self {
        id.to_string()
    }
}

/// Stage ID - an author-provided name, unique within one deployment
///
/// Stage IDs reference each other through `requires` lists, so they must be
/// stable under serialization: plain strings, no surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StageId(String);

impl StageId {
    /// Returns the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StageId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(IdError::InvalidStageId(s.to_string()));
        }

        let valid = s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(IdError::InvalidStageId(s.to_string()));
        }

        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for StageId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StageId> for String {
    fn from(id: StageId) -> Self {
        id.0
    }
}
