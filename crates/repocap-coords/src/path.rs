//! Repository-layout path parser.

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::reference::ArtifactRef;
use crate::{METADATA_FILE_PREFIX, SIDE_FILE_SUFFIXES, SNAPSHOT_SUFFIX};

/// Timestamp and build number of a deployed snapshot: `yyyyMMdd.HHmmss-N`.
fn snapshot_stamp_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{8}\.\d{6}-\d+").expect("snapshot stamp pattern"))
}

/// What follows the version in a file name: optional `-classifier`, then `.type`.
fn file_tail_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:-([^.]+))?\.(.+)$").expect("file tail pattern"))
}

/// Coordinates recovered from an artifact path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPathInfo {
    pub group_id: String,
    pub artifact_id: String,
    /// Version as it appears in the file name (timestamped for deployed snapshots)
    pub version: String,
    pub classifier: Option<String>,
    /// File extension after the version/classifier, e.g. `jar` or `tar.gz`
    pub artifact_type: String,
    pub file_name: String,
    pub full_path: String,
    pub is_snapshot: bool,
}

impl ArtifactPathInfo {
    /// Parse a repository-relative path.
    ///
    /// Returns `None` for anything that is not an artifact file.
    pub fn parse(path: &str) -> Option<Self> {
        let trimmed = path.trim_start_matches('/');
        let segments: Vec<&str> = trimmed.split('/').collect();
        if segments.len() < 4 || segments.iter().any(|s| s.is_empty()) {
            return None;
        }

        let n = segments.len();
        let file_name = segments[n - 1];
        let version_dir = segments[n - 2];
        let artifact_id = segments[n - 3];
        let group_id = segments[..n - 3].join(".");

        if is_side_file(file_name) {
            return None;
        }

        let rest = file_name.strip_prefix(artifact_id)?.strip_prefix('-')?;
        let (version, tail, is_snapshot) = split_version(version_dir, rest)?;

        let caps = file_tail_re().captures(tail)?;
        let classifier = caps.get(1).map(|m| m.as_str().to_string());
        let artifact_type = caps.get(2)?.as_str().to_string();

        Some(Self {
            group_id,
            artifact_id: artifact_id.to_string(),
            version,
            classifier,
            artifact_type,
            file_name: file_name.to_string(),
            full_path: trimmed.to_string(),
            is_snapshot,
        })
    }

    /// Coordinates of this artifact
    pub fn artifact_ref(&self) -> ArtifactRef {
        ArtifactRef {
            group_id: self.group_id.clone(),
            artifact_id: self.artifact_id.clone(),
            version: self.version.clone(),
            artifact_type: self.artifact_type.clone(),
            classifier: self.classifier.clone(),
            optional: false,
        }
    }
}

fn is_side_file(file_name: &str) -> bool {
    file_name.starts_with(METADATA_FILE_PREFIX)
        || SIDE_FILE_SUFFIXES.iter().any(|s| file_name.ends_with(s))
}

/// Split `rest` (file name minus `artifactId-`) into version and tail.
fn split_version<'a>(version_dir: &str, rest: &'a str) -> Option<(String, &'a str, bool)> {
    if let Some(tail) = rest.strip_prefix(version_dir) {
        let is_snapshot = version_dir.ends_with(SNAPSHOT_SUFFIX);
        return Some((version_dir.to_string(), tail, is_snapshot));
    }

    // Deployed snapshots replace SNAPSHOT with a timestamp in the file name.
    let base = version_dir.strip_suffix(SNAPSHOT_SUFFIX)?;
    let stamped = rest.strip_prefix(base)?.strip_prefix('-')?;
    let stamp = snapshot_stamp_re().find(stamped)?.as_str();
    Some((format!("{}-{}", base, stamp), &stamped[stamp.len()..], true))
}
