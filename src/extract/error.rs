//! Extraction errors

use serde::{Deserialize, Serialize};
use std::fmt;

use repocap_protocol::PromoteRequest;

use crate::client::ClientError;

/// Cleanup steps, in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupStep {
    ClearTrackingRecord,
    DeleteGroup,
    DeleteRemote,
}

impl fmt::Display for CleanupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CleanupStep::ClearTrackingRecord => "clearing tracking record",
            CleanupStep::DeleteGroup => "deleting group store",
            CleanupStep::DeleteRemote => "deleting remote store",
        };
        f.write_str(s)
    }
}

/// Rollback failure reported alongside a failed promotion.
///
/// Displays as an addendum to the promotion message, or nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollbackWarning(pub Option<String>);

impl fmt::Display for RollbackWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(reason) => write!(
                f,
                "\nROLLBACK WARNING: Promotion rollback also failed! Reason given: {}",
                reason
            ),
            None => Ok(()),
        }
    }
}

/// Errors surfaced by build artifact extraction
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Failed to retrieve tracking report for: {build_id}. Reason: {source}")]
    ReportFetch {
        build_id: String,
        source: ClientError,
    },

    #[error("Failed to promote: {request} (build {build_id}). Reason: {source}")]
    PromotionTransport {
        build_id: String,
        request: PromoteRequest,
        source: ClientError,
    },

    #[error("Failed to promote: {request} (build {build_id}). Reason given was: {reason}{rollback_warning}")]
    Promotion {
        build_id: String,
        request: PromoteRequest,
        reason: String,
        rollback_warning: RollbackWarning,
    },

    #[error("Rollback failed for promotion of: {request} (build {build_id}). Reason: {source}")]
    RollbackFailed {
        build_id: String,
        request: PromoteRequest,
        /// Error the promotion itself reported before rollback was attempted
        promotion_error: String,
        source: ClientError,
    },

    #[error("Failed to clean up build repositories / tracking information for: {build_id}. Reason: {step} failed: {reason}")]
    Cleanup {
        build_id: String,
        step: CleanupStep,
        reason: String,
    },
}

impl ExtractError {
    pub fn build_id(&self) -> &str {
        match self {
            ExtractError::ReportFetch { build_id, .. }
            | ExtractError::PromotionTransport { build_id, .. }
            | ExtractError::Promotion { build_id, .. }
            | ExtractError::RollbackFailed { build_id, .. }
            | ExtractError::Cleanup { build_id, .. } => build_id,
        }
    }

    /// Exit code for the CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            ExtractError::ReportFetch { .. } => 20,
            ExtractError::PromotionTransport { .. } => 30,
            ExtractError::Promotion { .. } => 30,
            ExtractError::RollbackFailed { .. } => 31,
            ExtractError::Cleanup { .. } => 40,
        }
    }
}
