//! Extraction report
//!
//! Artifact extraction and cleanup of the build-scoped stores succeed or
//! fail separately. A report always carries the extracted artifacts; the
//! cleanup outcome says whether the build's stores still need removing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::artifact::{Artifact, BuildArtifacts};

use super::error::{CleanupStep, ExtractError};

/// Outcome of tearing down the build-scoped resources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CleanupStatus {
    Completed,
    /// Cleanup stopped at `step`; later steps were not attempted
    Failed { step: CleanupStep, reason: String },
}

impl CleanupStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, CleanupStatus::Completed)
    }
}

/// Result of one extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub build_id: String,
    pub collection_id: String,
    #[serde(flatten)]
    pub artifacts: BuildArtifacts,
    pub cleanup: CleanupStatus,
    pub completed_at: DateTime<Utc>,
}

impl ExtractionReport {
    pub fn dependencies(&self) -> &[Artifact] {
        &self.artifacts.dependencies
    }

    pub fn outputs(&self) -> &[Artifact] {
        &self.artifacts.outputs
    }

    /// Strict view: a failed cleanup is an error and the artifacts are dropped
    pub fn into_result(self) -> Result<BuildArtifacts, ExtractError> {
        match self.cleanup {
            CleanupStatus::Completed => Ok(self.artifacts),
            CleanupStatus::Failed { step, reason } => Err(ExtractError::Cleanup {
                build_id: self.build_id,
                step,
                reason,
            }),
        }
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
