//! Mock Repository Manager Implementation
//!
//! In-process stand-in for the repository manager REST API. Stores hold
//! path -> checksum maps; promotion copies paths between them and reports
//! conflicts the way the real service does, so rollback has something to
//! undo.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};

use percent_encoding::percent_decode_str;

use repocap_protocol::{PromoteRequest, PromoteResult, StoreKey, TrackedContent, TrackedContentEntry};

use crate::client::api::{ApiOperation, ApiRequest, ApiResponse};
use crate::client::transport::TransportError;

use super::failure::{FailureConfig, FailureInjector, FailureKind};
use super::state::{MockState, RecordedCall};

/// Configurable mock repository manager for testing
#[derive(Clone, Default)]
pub struct MockRepositoryManager {
    state: Arc<Mutex<MockState>>,
    failures: Arc<Mutex<FailureInjector>>,
}

impl MockRepositoryManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn failures(&self) -> MutexGuard<'_, FailureInjector> {
        self.failures.lock().unwrap_or_else(|e| e.into_inner())
    }

    // === Public API for test configuration ===

    pub fn create_store(&self, key: StoreKey) {
        self.state().create_store(key);
    }

    pub fn has_store(&self, key: &StoreKey) -> bool {
        self.state().has_store(key)
    }

    /// Put content into a store, creating the store if needed
    pub fn put_content(&self, key: StoreKey, path: &str, sha256: &str) {
        self.state().put_content(key, path.to_string(), sha256.to_string());
    }

    /// Checksum of `path` in `key`, if present
    pub fn content(&self, key: &StoreKey, path: &str) -> Option<String> {
        self.state().store(key).and_then(|s| s.get(path).cloned())
    }

    /// Paths held by a store, sorted
    pub fn store_paths(&self, key: &StoreKey) -> Vec<String> {
        self.state()
            .store(key)
            .map(|s| s.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Record a download in the build's tracking report and put its content
    /// into the store it was served from
    pub fn track_download(&self, build_id: &str, entry: TrackedContentEntry) {
        let mut state = self.state();
        state.put_content(
            entry.store_key.clone(),
            entry.path.clone(),
            entry.sha256.clone().unwrap_or_default(),
        );
        let record = state.tracking_record_mut(build_id, &StoreKey::group(build_id));
        record.downloads.get_or_insert_with(Vec::new).push(entry);
    }

    /// Record an upload in the build's tracking report and put its content
    /// into the store it was deployed to
    pub fn track_upload(&self, build_id: &str, entry: TrackedContentEntry) {
        let mut state = self.state();
        state.put_content(
            entry.store_key.clone(),
            entry.path.clone(),
            entry.sha256.clone().unwrap_or_default(),
        );
        let record = state.tracking_record_mut(build_id, &StoreKey::group(build_id));
        record.uploads.get_or_insert_with(Vec::new).push(entry);
    }

    /// Replace the tracking report recorded for `build_id`
    pub fn set_tracking_report(&self, build_id: &str, report: TrackedContent) {
        self.state()
            .set_tracking_record(build_id, StoreKey::group(build_id), report);
    }

    pub fn has_tracking_record(&self, build_id: &str) -> bool {
        self.state()
            .tracking_record(build_id, &StoreKey::group(build_id))
            .is_some()
    }

    /// Create the group and remote stores a build runs against
    pub fn create_build_stores(&self, build_id: &str) {
        let mut state = self.state();
        state.create_store(StoreKey::group(build_id));
        state.create_store(StoreKey::remote(build_id));
        state.tracking_record_mut(build_id, &StoreKey::group(build_id));
    }

    pub fn inject_failure(&self, op: ApiOperation, config: FailureConfig) {
        self.failures().inject(op, config);
    }

    /// Every call received, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state().calls().to_vec()
    }

    /// Operations received, in order
    pub fn ops(&self) -> Vec<ApiOperation> {
        self.state().calls().iter().map(|c| c.op).collect()
    }

    /// Promotion requests received, in order
    pub fn promotions(&self) -> Vec<PromoteRequest> {
        self.state().promotions().to_vec()
    }

    /// Rollback requests received, in order
    pub fn rollbacks(&self) -> Vec<PromoteResult> {
        self.state().rollbacks().to_vec()
    }

    // === Request handling ===

    /// Handle a request (in-process library mode)
    pub fn handle_request(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        self.state()
            .record_call(request.op, &request.path, request.body.clone());

        let logical = match self.failures().check(request.op) {
            Some(FailureKind::Transport(message)) => {
                return Err(TransportError::ConnectionFailed(message));
            }
            Some(FailureKind::Status { status, message }) => {
                return Ok(ApiResponse::status(status, message));
            }
            Some(FailureKind::Logical(message)) => Some(message),
            None => None,
        };

        let response = match request.op {
            ApiOperation::GetTrackingReport => self.handle_get_report(request),
            ApiOperation::ClearTrackingRecord => self.handle_clear_record(request),
            ApiOperation::DeleteStore => self.handle_delete_store(request),
            ApiOperation::Promote => self.handle_promote(request, logical),
            ApiOperation::Rollback => self.handle_rollback(request, logical),
        };
        Ok(response)
    }

    fn handle_get_report(&self, request: &ApiRequest) -> ApiResponse {
        let Some((tracking_id, key)) = parse_tracking_path(&request.path, "report") else {
            return ApiResponse::status(400, format!("Malformed path: {}", request.path));
        };
        match self.state().tracking_record(&tracking_id, &key) {
            Some(report) => match serde_json::to_value(report) {
                Ok(body) => ApiResponse::ok(body),
                Err(e) => ApiResponse::status(500, e.to_string()),
            },
            None => ApiResponse::not_found(format!("No tracking record for {} in {}", tracking_id, key)),
        }
    }

    fn handle_clear_record(&self, request: &ApiRequest) -> ApiResponse {
        let Some((tracking_id, key)) = parse_tracking_path(&request.path, "record") else {
            return ApiResponse::status(400, format!("Malformed path: {}", request.path));
        };
        if self.state().clear_tracking_record(&tracking_id, &key) {
            ApiResponse::no_content()
        } else {
            ApiResponse::not_found(format!("No tracking record for {} in {}", tracking_id, key))
        }
    }

    fn handle_delete_store(&self, request: &ApiRequest) -> ApiResponse {
        let Some(key) = parse_store_path(&request.path) else {
            return ApiResponse::status(400, format!("Malformed path: {}", request.path));
        };
        if self.state().delete_store(&key) {
            ApiResponse::no_content()
        } else {
            ApiResponse::not_found(format!("No such store: {}", key))
        }
    }

    fn handle_promote(&self, request: &ApiRequest, logical: Option<String>) -> ApiResponse {
        let promote: PromoteRequest = match request.body.clone().map(serde_json::from_value) {
            Some(Ok(req)) => req,
            Some(Err(e)) => return ApiResponse::status(400, format!("Invalid promote request: {}", e)),
            None => return ApiResponse::status(400, "Missing promote request body"),
        };

        let mut state = self.state();
        state.record_promotion(promote.clone());

        let mut result = PromoteResult {
            request: promote.clone(),
            pending_paths: BTreeSet::new(),
            completed_paths: BTreeSet::new(),
            error: None,
        };

        let Some(source) = state.store(&promote.source).cloned() else {
            result.error = Some(format!("No such source store: {}", promote.source));
            return encode(&result);
        };
        if !state.has_store(&promote.target) {
            result.error = Some(format!("No such target store: {}", promote.target));
            return encode(&result);
        }

        let requested: BTreeSet<String> = match &promote.paths {
            Some(paths) => paths.clone(),
            None => source.keys().cloned().collect(),
        };

        let mut conflicts = Vec::new();
        let mut missing = Vec::new();
        for path in requested {
            let Some(sha) = source.get(&path) else {
                missing.push(path.clone());
                result.pending_paths.insert(path);
                continue;
            };
            let existing = state.store(&promote.target).and_then(|t| t.get(&path).cloned());
            match existing {
                Some(ref current) if current == sha => {}
                Some(_) => {
                    conflicts.push(path.clone());
                    result.pending_paths.insert(path);
                }
                None => {
                    state.put_content(promote.target.clone(), path.clone(), sha.clone());
                    if promote.purge_source {
                        if let Some(src) = state.store_mut(&promote.source) {
                            src.remove(&path);
                        }
                    }
                    result.completed_paths.insert(path);
                }
            }
        }

        let mut errors = Vec::new();
        if !conflicts.is_empty() {
            errors.push(format!("Conflicting paths in {}: {}", promote.target, conflicts.join(", ")));
        }
        if !missing.is_empty() {
            errors.push(format!("Paths missing from {}: {}", promote.source, missing.join(", ")));
        }
        errors.extend(logical);
        if !errors.is_empty() {
            result.error = Some(errors.join("; "));
        }

        encode(&result)
    }

    fn handle_rollback(&self, request: &ApiRequest, logical: Option<String>) -> ApiResponse {
        let previous: PromoteResult = match request.body.clone().map(serde_json::from_value) {
            Some(Ok(res)) => res,
            Some(Err(e)) => return ApiResponse::status(400, format!("Invalid promote result: {}", e)),
            None => return ApiResponse::status(400, "Missing promote result body"),
        };

        let mut state = self.state();
        state.record_rollback(previous.clone());

        if let Some(message) = logical {
            return encode(&PromoteResult {
                error: Some(message),
                ..previous
            });
        }

        let target = previous.request.target.clone();
        let source = previous.request.source.clone();
        for path in &previous.completed_paths {
            let removed = state.store_mut(&target).and_then(|t| t.remove(path));
            if previous.request.purge_source {
                if let Some(sha) = removed {
                    state.put_content(source.clone(), path.clone(), sha);
                }
            }
        }

        encode(&PromoteResult {
            request: previous.request,
            pending_paths: previous.completed_paths,
            completed_paths: BTreeSet::new(),
            error: None,
        })
    }
}

fn encode(result: &PromoteResult) -> ApiResponse {
    match serde_json::to_value(result) {
        Ok(body) => ApiResponse::ok(body),
        Err(e) => ApiResponse::status(500, e.to_string()),
    }
}

/// `folo/admin/{id}/{kind}/{type}/{name}`
fn parse_tracking_path(path: &str, kind: &str) -> Option<(String, StoreKey)> {
    let segments: Vec<&str> = path.split('/').collect();
    match segments.as_slice() {
        ["folo", "admin", id, k, store_type, name] if *k == kind => {
            let key = StoreKey::new(store_type.parse().ok()?, decode(name)?);
            Some((decode(id)?, key))
        }
        _ => None,
    }
}

/// `admin/{type}/{name}`
fn parse_store_path(path: &str) -> Option<StoreKey> {
    let segments: Vec<&str> = path.split('/').collect();
    match segments.as_slice() {
        ["admin", store_type, name] => Some(StoreKey::new(store_type.parse().ok()?, decode(name)?)),
        _ => None,
    }
}

fn decode(segment: &str) -> Option<String> {
    percent_decode_str(segment).decode_utf8().ok().map(|s| s.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::api::{routes, Method};

    fn request(op: ApiOperation, method: Method, path: String, body: Option<serde_json::Value>) -> ApiRequest {
        ApiRequest {
            op,
            request_id: "req-test".to_string(),
            method,
            path,
            body,
        }
    }

    fn promote(manager: &MockRepositoryManager, req: &PromoteRequest) -> PromoteResult {
        let response = manager
            .handle_request(&request(
                ApiOperation::Promote,
                Method::Post,
                routes::PROMOTE.to_string(),
                Some(serde_json::to_value(req).unwrap()),
            ))
            .unwrap();
        serde_json::from_value(response.body.unwrap()).unwrap()
    }

    fn paths(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_paths() {
        let key = StoreKey::group("b1");
        assert_eq!(
            parse_tracking_path(&routes::tracking_report("b1", &key), "report"),
            Some(("b1".to_string(), key.clone()))
        );
        assert!(parse_tracking_path(&routes::tracking_record("b1", &key), "report").is_none());
        assert_eq!(parse_store_path("admin/remote/b1"), Some(StoreKey::remote("b1")));
        assert!(parse_store_path("admin/mirror/b1").is_none());
    }

    #[test]
    fn test_parse_paths_decode_escaped_names() {
        let key = StoreKey::group("build 7?x");
        assert_eq!(
            parse_tracking_path(&routes::tracking_record("build 7?x", &key), "record"),
            Some(("build 7?x".to_string(), key.clone()))
        );
        assert_eq!(
            parse_store_path(&routes::store(&StoreKey::remote("a/b#c"))),
            Some(StoreKey::remote("a/b#c"))
        );
    }

    #[test]
    fn test_promote_copies_paths() {
        let manager = MockRepositoryManager::new();
        manager.put_content(StoreKey::remote("b1"), "a/b/1/b-1.jar", "aa");
        manager.create_store(StoreKey::hosted("shared-imports"));

        let result = promote(
            &manager,
            &PromoteRequest::paths(StoreKey::remote("b1"), StoreKey::hosted("shared-imports"), paths(&["a/b/1/b-1.jar"])),
        );

        assert!(result.is_success());
        assert_eq!(result.completed_paths, paths(&["a/b/1/b-1.jar"]));
        assert_eq!(manager.content(&StoreKey::hosted("shared-imports"), "a/b/1/b-1.jar").as_deref(), Some("aa"));
        assert_eq!(manager.content(&StoreKey::remote("b1"), "a/b/1/b-1.jar").as_deref(), Some("aa"));
    }

    #[test]
    fn test_promote_identical_content_is_not_a_conflict() {
        let manager = MockRepositoryManager::new();
        manager.put_content(StoreKey::remote("b1"), "a/b/1/b-1.jar", "aa");
        manager.put_content(StoreKey::hosted("shared-imports"), "a/b/1/b-1.jar", "aa");

        let result = promote(
            &manager,
            &PromoteRequest::paths(StoreKey::remote("b1"), StoreKey::hosted("shared-imports"), paths(&["a/b/1/b-1.jar"])),
        );
        assert!(result.is_success());
        assert!(result.completed_paths.is_empty());
    }

    #[test]
    fn test_promote_conflict_then_rollback() {
        let manager = MockRepositoryManager::new();
        manager.put_content(StoreKey::remote("b1"), "a/b/1/b-1.jar", "aa");
        manager.put_content(StoreKey::remote("b1"), "a/b/1/b-1.pom", "bb");
        manager.put_content(StoreKey::hosted("shared-imports"), "a/b/1/b-1.pom", "different");

        let result = promote(&manager, &PromoteRequest::all(StoreKey::remote("b1"), StoreKey::hosted("shared-imports")));
        assert!(!result.is_success());
        assert!(result.error.as_deref().unwrap().contains("Conflicting paths"));
        assert_eq!(result.completed_paths, paths(&["a/b/1/b-1.jar"]));
        assert_eq!(result.pending_paths, paths(&["a/b/1/b-1.pom"]));

        let response = manager
            .handle_request(&request(
                ApiOperation::Rollback,
                Method::Post,
                routes::ROLLBACK.to_string(),
                Some(serde_json::to_value(&result).unwrap()),
            ))
            .unwrap();
        let rolled: PromoteResult = serde_json::from_value(response.body.unwrap()).unwrap();
        assert!(rolled.is_success());
        assert!(manager.content(&StoreKey::hosted("shared-imports"), "a/b/1/b-1.jar").is_none());
        assert_eq!(
            manager.content(&StoreKey::hosted("shared-imports"), "a/b/1/b-1.pom").as_deref(),
            Some("different")
        );
    }

    #[test]
    fn test_promote_to_missing_target_reports_error() {
        let manager = MockRepositoryManager::new();
        manager.put_content(StoreKey::remote("b1"), "a/b/1/b-1.jar", "aa");

        let result = promote(&manager, &PromoteRequest::all(StoreKey::remote("b1"), StoreKey::hosted("nowhere")));
        assert_eq!(result.error.as_deref(), Some("No such target store: hosted:nowhere"));
    }

    #[test]
    fn test_injected_transport_failure_is_still_recorded() {
        let manager = MockRepositoryManager::new();
        manager.inject_failure(ApiOperation::DeleteStore, FailureConfig::transport("refused"));

        let result = manager.handle_request(&request(
            ApiOperation::DeleteStore,
            Method::Delete,
            "admin/group/b1".to_string(),
            None,
        ));
        assert!(matches!(result, Err(TransportError::ConnectionFailed(_))));
        assert_eq!(manager.ops(), vec![ApiOperation::DeleteStore]);
    }
}
