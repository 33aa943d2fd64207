//! Artifact metadata reported to the build orchestrator
//!
//! One `Artifact` is produced per tracked transfer whose path is a real
//! artifact. Repository metadata and checksum side files produce nothing.

use serde::{Deserialize, Serialize};

use repocap_coords::ArtifactPathInfo;
use repocap_protocol::TrackedContentEntry;

/// Kind of repository an artifact lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepositoryType {
    Maven,
}

/// How the build related to an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArtifactStatus {
    /// Consumed as a dependency
    BinaryImported,
    /// Produced as build output
    BinaryBuilt,
}

/// Metadata for one artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Artifact {
    /// Canonical coordinate, `group:artifact:type:version[:classifier]`
    pub identifier: String,
    /// SHA-256 of the content
    pub checksum: String,
    pub filename: String,
    /// URL the content can be retrieved from
    pub deploy_url: String,
    pub repo_type: RepositoryType,
    pub status: ArtifactStatus,
}

impl Artifact {
    /// Build metadata for a tracked entry.
    ///
    /// Returns `None` when the entry's path is not an artifact.
    pub fn from_entry(
        entry: &TrackedContentEntry,
        deploy_url: String,
        status: ArtifactStatus,
    ) -> Option<Self> {
        let info = ArtifactPathInfo::parse(&entry.path)?;
        Some(Self {
            identifier: info.artifact_ref().identifier(),
            checksum: entry.sha256.clone().unwrap_or_default(),
            filename: info.file_name,
            deploy_url,
            repo_type: RepositoryType::Maven,
            status,
        })
    }

    /// Metadata for a dependency the build downloaded
    pub fn imported(entry: &TrackedContentEntry, deploy_url: String) -> Option<Self> {
        Self::from_entry(entry, deploy_url, ArtifactStatus::BinaryImported)
    }

    /// Metadata for an output the build uploaded
    pub fn built(entry: &TrackedContentEntry, deploy_url: String) -> Option<Self> {
        Self::from_entry(entry, deploy_url, ArtifactStatus::BinaryBuilt)
    }
}

/// Dependencies and outputs of one build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildArtifacts {
    pub dependencies: Vec<Artifact>,
    pub outputs: Vec<Artifact>,
}

impl BuildArtifacts {
    pub fn new(dependencies: Vec<Artifact>, outputs: Vec<Artifact>) -> Self {
        Self {
            dependencies,
            outputs,
        }
    }
}
