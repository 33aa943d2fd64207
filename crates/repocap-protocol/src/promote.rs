//! Promotion messages.
//!
//! A promotion copies paths from one store into another on the repository
//! manager. The result echoes the request and reports which paths moved.
//! A result carrying an error is handed back to the rollback endpoint as-is.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::store::StoreKey;

/// Request to promote content between two stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoteRequest {
    pub source: StoreKey,
    pub target: StoreKey,

    /// Paths to promote. `None` promotes everything in the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paths: Option<BTreeSet<String>>,

    /// Remove promoted paths from the source
    #[serde(default)]
    pub purge_source: bool,
}

impl PromoteRequest {
    /// Promote everything from `source` to `target`
    pub fn all(source: StoreKey, target: StoreKey) -> Self {
        Self {
            source,
            target,
            paths: None,
            purge_source: false,
        }
    }

    /// Promote an explicit set of paths
    pub fn paths(source: StoreKey, target: StoreKey, paths: BTreeSet<String>) -> Self {
        Self {
            source,
            target,
            paths: Some(paths),
            purge_source: false,
        }
    }
}

impl fmt::Display for PromoteRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)?;
        match &self.paths {
            Some(paths) if paths.len() == 1 => write!(f, " (1 path)"),
            Some(paths) => write!(f, " ({} paths)", paths.len()),
            None => write!(f, " (all paths)"),
        }
    }
}

/// Outcome of a promotion or rollback call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoteResult {
    pub request: PromoteRequest,

    #[serde(default)]
    pub pending_paths: BTreeSet<String>,

    #[serde(default)]
    pub completed_paths: BTreeSet<String>,

    /// Business-rule failure reported by the repository manager
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PromoteResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
