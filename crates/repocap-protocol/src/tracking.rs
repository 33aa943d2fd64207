//! Content tracking reports.
//!
//! The repository manager records every file a build pulls through or pushes
//! into its group store. A report is scoped to one tracking id and is
//! immutable once fetched.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::store::StoreKey;

/// One tracked file transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedContentEntry {
    /// Store the content was served from (downloads) or stored into (uploads)
    pub store_key: StoreKey,

    /// Repository-relative path
    pub path: String,

    /// URL of the content on the repository manager itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_url: Option<String>,

    /// Upstream URL, for content proxied from a remote
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md5: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl TrackedContentEntry {
    /// Create an entry with only the store and path set
    pub fn new(store_key: StoreKey, path: impl Into<String>) -> Self {
        Self {
            store_key,
            path: path.into(),
            local_url: None,
            origin_url: None,
            md5: None,
            sha1: None,
            sha256: None,
        }
    }

    pub fn with_sha256(mut self, sha256: impl Into<String>) -> Self {
        self.sha256 = Some(sha256.into());
        self
    }

    pub fn with_local_url(mut self, url: impl Into<String>) -> Self {
        self.local_url = Some(url.into());
        self
    }
}

/// Tracking report for one build.
///
/// Either collection may be missing from the payload; callers treat a
/// missing collection the same as an empty one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedContent {
    /// Store the report was recorded against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<StoreKey>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploads: Option<Vec<TrackedContentEntry>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloads: Option<Vec<TrackedContentEntry>>,
}

impl TrackedContent {
    /// Downloads, or an empty slice when the report carries none
    pub fn downloads(&self) -> &[TrackedContentEntry] {
        self.downloads.as_deref().unwrap_or(&[])
    }

    /// Uploads, or an empty slice when the report carries none
    pub fn uploads(&self) -> &[TrackedContentEntry] {
        self.uploads.as_deref().unwrap_or(&[])
    }

    /// Downloads with recurring `(store, path)` entries dropped, first kept
    pub fn distinct_downloads(&self) -> Vec<&TrackedContentEntry> {
        distinct(self.downloads())
    }

    /// Uploads with recurring `(store, path)` entries dropped, first kept
    pub fn distinct_uploads(&self) -> Vec<&TrackedContentEntry> {
        distinct(self.uploads())
    }
}

fn distinct(entries: &[TrackedContentEntry]) -> Vec<&TrackedContentEntry> {
    let mut seen = HashSet::new();
    entries
        .iter()
        .filter(|e| seen.insert((&e.store_key, e.path.as_str())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_parsing() {
        let json = r#"{
            "key": "group:build-42",
            "downloads": [
                {
                    "storeKey": "remote:build-42",
                    "path": "org/example/lib/1.0/lib-1.0.jar",
                    "originUrl": "https://repo1.maven.org/maven2/org/example/lib/1.0/lib-1.0.jar",
                    "sha256": "abc123"
                }
            ]
        }"#;

        let report: TrackedContent = serde_json::from_str(json).unwrap();
        assert_eq!(report.key, Some(StoreKey::group("build-42")));
        assert!(report.uploads.is_none());
        assert!(report.uploads().is_empty());

        let downloads = report.downloads();
        assert_eq!(downloads.len(), 1);
        assert_eq!(downloads[0].store_key, StoreKey::remote("build-42"));
        assert_eq!(downloads[0].sha256.as_deref(), Some("abc123"));
        assert!(downloads[0].local_url.is_none());
    }

    #[test]
    fn test_empty_object_is_empty_report() {
        let report: TrackedContent = serde_json::from_str("{}").unwrap();
        assert_eq!(report, TrackedContent::default());
        assert!(report.downloads().is_empty());
    }

    #[test]
    fn test_entry_serializes_camel_case() {
        let entry = TrackedContentEntry::new(StoreKey::hosted("build-1"), "a/b/1/b-1.pom")
            .with_local_url("http://rm/api/hosted/build-1/a/b/1/b-1.pom");
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["storeKey"], "hosted:build-1");
        assert_eq!(value["localUrl"], "http://rm/api/hosted/build-1/a/b/1/b-1.pom");
        assert!(value.get("sha256").is_none());
    }

    #[test]
    fn test_recurring_entries_collapse() {
        let jar = TrackedContentEntry::new(StoreKey::remote("build-1"), "g/a/1/a-1.jar").with_sha256("01");
        let same_path_other_store = TrackedContentEntry::new(StoreKey::remote("central"), "g/a/1/a-1.jar");
        let report = TrackedContent {
            key: None,
            uploads: None,
            downloads: Some(vec![jar.clone(), same_path_other_store.clone(), jar.clone()]),
        };

        let distinct = report.distinct_downloads();
        assert_eq!(distinct, vec![&jar, &same_path_other_store]);
        assert!(report.distinct_uploads().is_empty());
    }
}
