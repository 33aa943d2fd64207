//! REST request/response envelope
//!
//! Every call the client makes is described as an `ApiRequest` before it
//! reaches a transport, so the HTTP binding and the in-process mock see
//! exactly the same thing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use repocap_protocol::StoreKey;

/// Repository manager operations used by this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiOperation {
    /// Fetch the content tracking report for a build
    GetTrackingReport,
    /// Drop the tracking record for a build
    ClearTrackingRecord,
    /// Delete a store definition
    DeleteStore,
    /// Promote paths between stores
    Promote,
    /// Undo a failed promotion
    Rollback,
}

impl ApiOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiOperation::GetTrackingReport => "get_tracking_report",
            ApiOperation::ClearTrackingRecord => "clear_tracking_record",
            ApiOperation::DeleteStore => "delete_store",
            ApiOperation::Promote => "promote",
            ApiOperation::Rollback => "rollback",
        }
    }
}

/// HTTP method of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Delete,
}

/// One REST call against the repository manager
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiRequest {
    pub op: ApiOperation,

    /// Unique per request, sent as `X-Request-Id`
    pub request_id: String,

    pub method: Method,

    /// Path relative to the API base URL, without a leading slash
    pub path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

/// Response to an `ApiRequest`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: u16,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl ApiResponse {
    pub fn ok(body: Value) -> Self {
        Self {
            status: 200,
            body: Some(body),
        }
    }

    pub fn no_content() -> Self {
        Self {
            status: 204,
            body: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::status(404, message)
    }

    /// Error response carrying `{"error": message}`
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: Some(serde_json::json!({ "error": message.into() })),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// Error message from the body, if the server sent one
    pub fn error_message(&self) -> Option<String> {
        let body = self.body.as_ref()?;
        match body {
            Value::String(s) => Some(s.clone()),
            _ => body.get("error").and_then(|v| v.as_str()).map(String::from),
        }
    }
}

/// REST routes, relative to the API base URL.
///
/// Every segment taken from a store key, build id or artifact path is
/// percent-encoded, so `/`, `?`, `#` and spaces inside it cannot change
/// the route.
pub mod routes {
    use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

    use super::StoreKey;

    pub const PROMOTE: &str = "promotion/promote";
    pub const ROLLBACK: &str = "promotion/rollback";

    /// Characters escaped inside a single path segment
    const SEGMENT: &AsciiSet = &CONTROLS
        .add(b' ')
        .add(b'"')
        .add(b'#')
        .add(b'%')
        .add(b'/')
        .add(b'<')
        .add(b'>')
        .add(b'?')
        .add(b'`')
        .add(b'{')
        .add(b'}');

    pub fn segment(raw: &str) -> String {
        utf8_percent_encode(raw, SEGMENT).to_string()
    }

    pub fn tracking_report(tracking_id: &str, key: &StoreKey) -> String {
        format!(
            "folo/admin/{}/report/{}/{}",
            segment(tracking_id),
            key.store_type,
            segment(&key.name)
        )
    }

    pub fn tracking_record(tracking_id: &str, key: &StoreKey) -> String {
        format!(
            "folo/admin/{}/record/{}/{}",
            segment(tracking_id),
            key.store_type,
            segment(&key.name)
        )
    }

    pub fn store(key: &StoreKey) -> String {
        format!("admin/{}/{}", key.store_type, segment(&key.name))
    }

    /// Content route; `path` keeps its `/` separators, each part is encoded
    pub fn content(key: &StoreKey, path: &str) -> String {
        let path: Vec<String> = path.trim_start_matches('/').split('/').map(segment).collect();
        format!("{}/{}/{}", key.store_type, segment(&key.name), path.join("/"))
    }
}
