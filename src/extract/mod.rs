//! Build result extraction
//!
//! A build runs against three stores named after its id: `remote:{id}`
//! proxies upstream content, `hosted:{id}` receives uploads and
//! `group:{id}` aggregates them. The repository manager tracks every
//! transfer made through the group. Once the build has finished,
//! [`BuildRepository::extract_build_artifacts`] turns that tracking report
//! into artifact metadata, promotes captured dependencies into the
//! shared-imports store, and removes the build-scoped resources.

mod error;
mod promote;
mod report;

pub use error::{CleanupStep, ExtractError, RollbackWarning};
pub use report::{CleanupStatus, ExtractionReport};

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use repocap_protocol::{PromoteRequest, StoreKey, TrackedContent};

use crate::artifact::{Artifact, BuildArtifacts, RepositoryType};
use crate::client::{ClientError, RepositoryClient};
use crate::connection::RepositoryConnectionInfo;

/// Store names and promotion switches the extractor needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Hosted store captured dependencies are promoted into
    pub shared_imports: String,
    /// Hosted store of released content, never re-promoted
    pub shared_releases: String,
    /// Promote `hosted:{build}` into `hosted:{collection}` after a build
    pub promote_build_output: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            shared_imports: "shared-imports".to_string(),
            shared_releases: "shared-releases".to_string(),
            promote_build_output: false,
        }
    }
}

impl StoreSettings {
    pub fn shared_imports_key(&self) -> StoreKey {
        StoreKey::hosted(self.shared_imports.as_str())
    }

    pub fn shared_releases_key(&self) -> StoreKey {
        StoreKey::hosted(self.shared_releases.as_str())
    }

    /// Whether content in `key` already lives in a shared store
    pub fn is_shared(&self, key: &StoreKey) -> bool {
        *key == self.shared_imports_key() || *key == self.shared_releases_key()
    }
}

/// The repository resources of one build
pub struct BuildRepository {
    client: RepositoryClient,
    build_id: String,
    collection_id: String,
    stores: StoreSettings,
    connection_info: RepositoryConnectionInfo,
}

impl BuildRepository {
    pub fn new(
        client: RepositoryClient,
        build_id: impl Into<String>,
        collection_id: impl Into<String>,
        stores: StoreSettings,
    ) -> Self {
        let build_id = build_id.into();
        let connection_info = RepositoryConnectionInfo::new(
            client.content_url(&StoreKey::group(build_id.as_str()), ""),
            client.content_url(&StoreKey::hosted(build_id.as_str()), ""),
        );
        Self {
            client,
            build_id,
            collection_id: collection_id.into(),
            stores,
            connection_info,
        }
    }

    pub fn id(&self) -> &str {
        &self.build_id
    }

    pub fn collection_id(&self) -> &str {
        &self.collection_id
    }

    pub fn repository_type(&self) -> RepositoryType {
        RepositoryType::Maven
    }

    pub fn connection_info(&self) -> &RepositoryConnectionInfo {
        &self.connection_info
    }

    pub fn store_settings(&self) -> &StoreSettings {
        &self.stores
    }

    pub(crate) fn client(&self) -> &RepositoryClient {
        &self.client
    }

    fn group_key(&self) -> StoreKey {
        StoreKey::group(self.build_id.as_str())
    }

    fn remote_key(&self) -> StoreKey {
        StoreKey::remote(self.build_id.as_str())
    }

    fn hosted_key(&self) -> StoreKey {
        StoreKey::hosted(self.build_id.as_str())
    }

    /// Collect the build's dependencies and outputs, promote the
    /// dependencies and tear down the build's stores.
    ///
    /// A failed report fetch or promotion is returned as an error. Cleanup
    /// failures are reported in [`ExtractionReport::cleanup`] so the
    /// extracted artifacts are not lost; use
    /// [`ExtractionReport::into_result`] to treat them as errors.
    pub fn extract_build_artifacts(&self) -> Result<ExtractionReport, ExtractError> {
        info!(
            op = "extract.start",
            build_id = %self.build_id,
            collection_id = %self.collection_id,
            "Extracting build artifacts"
        );

        let report = self
            .client
            .get_tracking_report(&self.build_id, &self.group_key())
            .map_err(|source| ExtractError::ReportFetch {
                build_id: self.build_id.clone(),
                source,
            })?;

        let outputs = self.process_uploads(&report)?;
        let dependencies = self.process_downloads(&report)?;
        let artifacts = BuildArtifacts::new(dependencies, outputs);

        let cleanup = match self.cleanup() {
            Ok(()) => CleanupStatus::Completed,
            Err((step, e)) => {
                error!(
                    op = "extract.cleanup.failed",
                    build_id = %self.build_id,
                    step = %step,
                    error = %e,
                    "Failed to clean up build repositories"
                );
                CleanupStatus::Failed {
                    step,
                    reason: e.to_string(),
                }
            }
        };

        info!(
            op = "extract.finish",
            build_id = %self.build_id,
            dependencies = artifacts.dependencies.len(),
            outputs = artifacts.outputs.len(),
            cleanup_completed = cleanup.is_completed(),
            "Extraction finished"
        );

        Ok(ExtractionReport {
            build_id: self.build_id.clone(),
            collection_id: self.collection_id.clone(),
            artifacts,
            cleanup,
            completed_at: Utc::now(),
        })
    }

    /// Build dependency metadata and promote the downloaded paths that do
    /// not already live in a shared store.
    pub fn process_downloads(&self, report: &TrackedContent) -> Result<Vec<Artifact>, ExtractError> {
        let downloads = report.distinct_downloads();
        if downloads.is_empty() {
            return Ok(Vec::new());
        }

        let mut to_promote: BTreeMap<StoreKey, BTreeSet<String>> = BTreeMap::new();
        let mut artifacts = Vec::new();

        for entry in downloads {
            if self.stores.is_shared(&entry.store_key) {
                debug!(
                    op = "extract.download.shared",
                    store = %entry.store_key,
                    path = %entry.path,
                    "Already in a shared store"
                );
            } else {
                to_promote
                    .entry(entry.store_key.clone())
                    .or_default()
                    .insert(entry.path.clone());
            }

            let deploy_url = self.client.content_url(&entry.store_key, &entry.path);
            match Artifact::imported(entry, deploy_url) {
                Some(artifact) => artifacts.push(artifact),
                None => debug!(
                    op = "extract.download.metadata",
                    path = %entry.path,
                    "Skipping non-artifact path"
                ),
            }
        }

        let target = self.stores.shared_imports_key();
        for (source, paths) in to_promote {
            let request = PromoteRequest::paths(source, target.clone(), paths);
            self.do_promote(&request)?;
        }

        Ok(artifacts)
    }

    /// Build output metadata for the uploaded paths
    pub fn process_uploads(&self, report: &TrackedContent) -> Result<Vec<Artifact>, ExtractError> {
        let uploads = report.distinct_uploads();
        if uploads.is_empty() {
            return Ok(Vec::new());
        }

        if self.stores.promote_build_output {
            let request = PromoteRequest::all(
                self.hosted_key(),
                StoreKey::hosted(self.collection_id.as_str()),
            );
            self.do_promote(&request)?;
        }

        let mut artifacts = Vec::new();
        for entry in uploads {
            let deploy_url = entry.local_url.clone().unwrap_or_default();
            match Artifact::built(entry, deploy_url) {
                Some(artifact) => artifacts.push(artifact),
                None => debug!(
                    op = "extract.upload.metadata",
                    path = %entry.path,
                    "Skipping non-artifact path"
                ),
            }
        }
        Ok(artifacts)
    }

    /// Rerun cleanup after an extraction that reported a cleanup failure
    pub fn retry_cleanup(&self) -> Result<(), ExtractError> {
        info!(op = "extract.cleanup.retry", build_id = %self.build_id, "Retrying cleanup");
        self.cleanup().map_err(|(step, e)| ExtractError::Cleanup {
            build_id: self.build_id.clone(),
            step,
            reason: e.to_string(),
        })
    }

    /// Clear tracking, then delete the group, then the remote store
    fn cleanup(&self) -> Result<(), (CleanupStep, ClientError)> {
        let group = self.group_key();
        self.client
            .clear_tracking_record(&self.build_id, &group)
            .map_err(|e| (CleanupStep::ClearTrackingRecord, e))?;
        self.client
            .delete_store(&group)
            .map_err(|e| (CleanupStep::DeleteGroup, e))?;
        self.client
            .delete_store(&self.remote_key())
            .map_err(|e| (CleanupStep::DeleteRemote, e))?;
        debug!(op = "extract.cleanup", build_id = %self.build_id, "Build repositories removed");
        Ok(())
    }
}
