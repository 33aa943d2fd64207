//! Repository Manager Client
//!
//! Typed operations over the repository manager REST API: content
//! tracking, store deletion, promotion and rollback. Content URLs are
//! computed locally from the base URL.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use repocap_protocol::{PromoteRequest, PromoteResult, StoreKey, TrackedContent};

use super::api::{routes, ApiOperation, ApiRequest, ApiResponse, Method};
use super::transport::{Transport, TransportError};

/// Client errors
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("{op} returned HTTP {status}: {message}")]
    Status {
        op: &'static str,
        status: u16,
        message: String,
    },

    #[error("Not found: {path}")]
    NotFound { path: String },

    #[error("Invalid response to {op}: {message}")]
    InvalidResponse { op: &'static str, message: String },
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Repository manager client
#[derive(Clone)]
pub struct RepositoryClient {
    transport: Arc<dyn Transport>,
    base_url: Url,
}

impl RepositoryClient {
    /// Create a client; `base_url` must end with `/`
    pub fn new(transport: Arc<dyn Transport>, base_url: Url) -> Self {
        Self { transport, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn next_request_id() -> String {
        format!("req-{}", ulid::Ulid::new().to_string().to_lowercase())
    }

    fn call(
        &self,
        op: ApiOperation,
        method: Method,
        path: String,
        body: Option<Value>,
    ) -> ClientResult<ApiResponse> {
        let request = ApiRequest {
            op,
            request_id: Self::next_request_id(),
            method,
            path,
            body,
        };
        debug!(
            op = "client.request",
            api_op = op.as_str(),
            request_id = %request.request_id,
            path = %request.path,
            "Calling repository manager"
        );
        let response = self.transport.execute(&request)?;
        debug!(
            op = "client.response",
            api_op = op.as_str(),
            request_id = %request.request_id,
            status = response.status,
            "Repository manager responded"
        );

        if response.is_success() {
            return Ok(response);
        }
        if response.is_not_found() {
            return Err(ClientError::NotFound { path: request.path });
        }
        Err(ClientError::Status {
            op: op.as_str(),
            status: response.status,
            message: response
                .error_message()
                .unwrap_or_else(|| "no error details".to_string()),
        })
    }

    fn decode<T: DeserializeOwned>(op: ApiOperation, response: ApiResponse) -> ClientResult<T> {
        let body = response.body.ok_or_else(|| ClientError::InvalidResponse {
            op: op.as_str(),
            message: "missing response body".to_string(),
        })?;
        serde_json::from_value(body).map_err(|e| ClientError::InvalidResponse {
            op: op.as_str(),
            message: e.to_string(),
        })
    }

    /// Treat a missing resource as already removed
    fn tolerate_missing(result: ClientResult<ApiResponse>) -> ClientResult<()> {
        match result {
            Ok(_) => Ok(()),
            Err(ClientError::NotFound { path }) => {
                debug!(op = "client.already_gone", path = %path, "Resource already absent");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    // === Tracking ===

    /// Fetch the tracking report recorded under `tracking_id` for `key`
    pub fn get_tracking_report(&self, tracking_id: &str, key: &StoreKey) -> ClientResult<TrackedContent> {
        let op = ApiOperation::GetTrackingReport;
        let response = self.call(op, Method::Get, routes::tracking_report(tracking_id, key), None)?;
        Self::decode(op, response)
    }

    /// Clear the tracking record. Clearing a missing record succeeds.
    pub fn clear_tracking_record(&self, tracking_id: &str, key: &StoreKey) -> ClientResult<()> {
        Self::tolerate_missing(self.call(
            ApiOperation::ClearTrackingRecord,
            Method::Delete,
            routes::tracking_record(tracking_id, key),
            None,
        ))
    }

    // === Stores ===

    /// Delete a store definition. Deleting a missing store succeeds.
    pub fn delete_store(&self, key: &StoreKey) -> ClientResult<()> {
        Self::tolerate_missing(self.call(
            ApiOperation::DeleteStore,
            Method::Delete,
            routes::store(key),
            None,
        ))
    }

    // === Content ===

    /// URL at which `path` is served from the store `key`
    pub fn content_url(&self, key: &StoreKey, path: &str) -> String {
        format!("{}{}", self.base_url, routes::content(key, path))
    }

    // === Promotion ===

    /// Issue a promotion. A result with `error` set is still `Ok`.
    pub fn promote(&self, request: &PromoteRequest) -> ClientResult<PromoteResult> {
        let op = ApiOperation::Promote;
        let body = serde_json::to_value(request).map_err(TransportError::from)?;
        let response = self.call(op, Method::Post, routes::PROMOTE.to_string(), Some(body))?;
        Self::decode(op, response)
    }

    /// Roll back a promotion using the result it produced
    pub fn rollback(&self, result: &PromoteResult) -> ClientResult<PromoteResult> {
        let op = ApiOperation::Rollback;
        let body = serde_json::to_value(result).map_err(TransportError::from)?;
        let response = self.call(op, Method::Post, routes::ROLLBACK.to_string(), Some(body))?;
        Self::decode(op, response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::transport::MockTransport;
    use crate::mock::{FailureConfig, MockRepositoryManager};
    use repocap_protocol::TrackedContentEntry;
    use std::collections::BTreeSet;

    fn client_for(manager: MockRepositoryManager) -> RepositoryClient {
        let transport = Arc::new(MockTransport::with_manager(manager));
        RepositoryClient::new(transport, Url::parse("http://indy.local/api/").unwrap())
    }

    #[test]
    fn test_content_url() {
        let client = client_for(MockRepositoryManager::new());
        assert_eq!(
            client.content_url(&StoreKey::remote("build-42"), "org/example/lib/1.0/lib-1.0.jar"),
            "http://indy.local/api/remote/build-42/org/example/lib/1.0/lib-1.0.jar"
        );
    }

    #[test]
    fn test_request_ids_are_unique() {
        assert_ne!(RepositoryClient::next_request_id(), RepositoryClient::next_request_id());
        assert!(RepositoryClient::next_request_id().starts_with("req-"));
    }

    #[test]
    fn test_get_tracking_report() {
        let manager = MockRepositoryManager::new();
        manager.track_download(
            "build-1",
            TrackedContentEntry::new(StoreKey::remote("build-1"), "a/b/1/b-1.jar").with_sha256("aa"),
        );
        let client = client_for(manager);

        let report = client
            .get_tracking_report("build-1", &StoreKey::group("build-1"))
            .unwrap();
        assert_eq!(report.downloads().len(), 1);
        assert!(report.uploads().is_empty());
    }

    #[test]
    fn test_missing_tracking_report_is_not_found() {
        let client = client_for(MockRepositoryManager::new());
        let err = client
            .get_tracking_report("nope", &StoreKey::group("nope"))
            .unwrap_err();
        assert!(matches!(err, ClientError::NotFound { .. }));
    }

    #[test]
    fn test_delete_missing_store_succeeds() {
        let client = client_for(MockRepositoryManager::new());
        assert!(client.delete_store(&StoreKey::remote("ghost")).is_ok());
        assert!(client
            .clear_tracking_record("ghost", &StoreKey::group("ghost"))
            .is_ok());
    }

    #[test]
    fn test_server_error_maps_to_status() {
        let manager = MockRepositoryManager::new();
        manager.inject_failure(ApiOperation::DeleteStore, FailureConfig::status(503, "maintenance"));
        let client = client_for(manager);

        match client.delete_store(&StoreKey::group("build-1")) {
            Err(ClientError::Status { op, status, message }) => {
                assert_eq!(op, "delete_store");
                assert_eq!(status, 503);
                assert_eq!(message, "maintenance");
            }
            other => panic!("Expected Status error, got {:?}", other),
        }
    }

    #[test]
    fn test_transport_failure_propagates() {
        let manager = MockRepositoryManager::new();
        manager.inject_failure(ApiOperation::Promote, FailureConfig::transport("connection reset"));
        let client = client_for(manager);

        let req = PromoteRequest::paths(
            StoreKey::remote("build-1"),
            StoreKey::hosted("shared-imports"),
            BTreeSet::new(),
        );
        let err = client.promote(&req).unwrap_err();
        assert!(matches!(err, ClientError::Transport(TransportError::ConnectionFailed(_))));
        assert!(err.to_string().contains("connection reset"));
    }
}
