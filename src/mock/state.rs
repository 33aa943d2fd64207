//! Mock Repository Manager State
//!
//! Stores with their content, tracking records, and a log of every call
//! received.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde_json::Value;

use repocap_protocol::{PromoteRequest, PromoteResult, StoreKey, TrackedContent};

use crate::client::api::ApiOperation;

/// Content of one store: path -> sha256
pub type StoreContent = BTreeMap<String, String>;

/// A call received by the mock, in arrival order
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub op: ApiOperation,
    pub path: String,
    pub body: Option<Value>,
    pub received_at: DateTime<Utc>,
}

/// Mutable state of the mock repository manager
#[derive(Debug, Default)]
pub struct MockState {
    stores: BTreeMap<StoreKey, StoreContent>,
    tracking: HashMap<(String, StoreKey), TrackedContent>,
    calls: Vec<RecordedCall>,
    promotions: Vec<PromoteRequest>,
    rollbacks: Vec<PromoteResult>,
}

impl MockState {
    pub fn new() -> Self {
        Self::default()
    }

    // === Stores ===

    pub fn create_store(&mut self, key: StoreKey) {
        self.stores.entry(key).or_default();
    }

    pub fn has_store(&self, key: &StoreKey) -> bool {
        self.stores.contains_key(key)
    }

    /// Remove a store; returns false if it did not exist
    pub fn delete_store(&mut self, key: &StoreKey) -> bool {
        self.stores.remove(key).is_some()
    }

    pub fn store(&self, key: &StoreKey) -> Option<&StoreContent> {
        self.stores.get(key)
    }

    pub fn store_mut(&mut self, key: &StoreKey) -> Option<&mut StoreContent> {
        self.stores.get_mut(key)
    }

    /// Put content into a store, creating the store if needed
    pub fn put_content(&mut self, key: StoreKey, path: String, sha256: String) {
        self.stores.entry(key).or_default().insert(path, sha256);
    }

    // === Tracking ===

    pub fn tracking_record(&self, tracking_id: &str, key: &StoreKey) -> Option<&TrackedContent> {
        self.tracking.get(&(tracking_id.to_string(), key.clone()))
    }

    pub fn tracking_record_mut(&mut self, tracking_id: &str, key: &StoreKey) -> &mut TrackedContent {
        self.tracking
            .entry((tracking_id.to_string(), key.clone()))
            .or_insert_with(|| TrackedContent {
                key: Some(key.clone()),
                uploads: None,
                downloads: None,
            })
    }

    pub fn set_tracking_record(&mut self, tracking_id: &str, key: StoreKey, report: TrackedContent) {
        self.tracking.insert((tracking_id.to_string(), key), report);
    }

    /// Remove a tracking record; returns false if it did not exist
    pub fn clear_tracking_record(&mut self, tracking_id: &str, key: &StoreKey) -> bool {
        self.tracking
            .remove(&(tracking_id.to_string(), key.clone()))
            .is_some()
    }

    // === Call log ===

    pub fn record_call(&mut self, op: ApiOperation, path: &str, body: Option<Value>) {
        self.calls.push(RecordedCall {
            op,
            path: path.to_string(),
            body,
            received_at: Utc::now(),
        });
    }

    pub fn calls(&self) -> &[RecordedCall] {
        &self.calls
    }

    pub fn record_promotion(&mut self, request: PromoteRequest) {
        self.promotions.push(request);
    }

    pub fn promotions(&self) -> &[PromoteRequest] {
        &self.promotions
    }

    pub fn record_rollback(&mut self, result: PromoteResult) {
        self.rollbacks.push(result);
    }

    pub fn rollbacks(&self) -> &[PromoteResult] {
        &self.rollbacks
    }
}
