//! Failure Injection for the Mock Repository Manager
//!
//! Supports configurable failures per operation for testing error paths.

use std::collections::HashMap;

use crate::client::api::ApiOperation;

/// What an injected failure looks like to the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The call never reaches the server
    Transport(String),
    /// The server answers with an HTTP error status
    Status { status: u16, message: String },
    /// Promote/rollback completes but reports an error in its result
    Logical(String),
}

/// Failure configuration for an operation
#[derive(Debug, Clone)]
pub struct FailureConfig {
    pub kind: FailureKind,
    /// Number of times to fail before succeeding (None = always fail)
    pub fail_count: Option<u32>,
}

impl FailureConfig {
    /// Fail at the transport level
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transport(message.into()),
            fail_count: None,
        }
    }

    /// Answer with an HTTP error status
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Status {
                status,
                message: message.into(),
            },
            fail_count: None,
        }
    }

    /// Report a business-rule error inside a promotion result
    pub fn logical(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Logical(message.into()),
            fail_count: None,
        }
    }

    /// Set the number of times to fail before succeeding
    pub fn with_fail_count(mut self, count: u32) -> Self {
        self.fail_count = Some(count);
        self
    }
}

/// Failure injector for the mock repository manager
#[derive(Debug, Default)]
pub struct FailureInjector {
    configs: HashMap<ApiOperation, FailureConfig>,
    call_counts: HashMap<ApiOperation, u32>,
}

impl FailureInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject a failure for an operation, resetting its call count
    pub fn inject(&mut self, op: ApiOperation, config: FailureConfig) {
        self.configs.insert(op, config);
        self.call_counts.insert(op, 0);
    }

    pub fn clear(&mut self) {
        self.configs.clear();
        self.call_counts.clear();
    }

    pub fn clear_op(&mut self, op: ApiOperation) {
        self.configs.remove(&op);
        self.call_counts.remove(&op);
    }

    /// Returns the failure to apply to this call, if any
    pub fn check(&mut self, op: ApiOperation) -> Option<FailureKind> {
        let config = self.configs.get(&op)?;
        let count = self.call_counts.entry(op).or_insert(0);
        *count += 1;

        if let Some(limit) = config.fail_count {
            if *count > limit {
                return None;
            }
        }
        Some(config.kind.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_failure_by_default() {
        let mut injector = FailureInjector::new();
        assert!(injector.check(ApiOperation::Promote).is_none());
    }

    #[test]
    fn test_failure_applies_only_to_its_operation() {
        let mut injector = FailureInjector::new();
        injector.inject(ApiOperation::Rollback, FailureConfig::logical("rollback refused"));

        assert!(injector.check(ApiOperation::Promote).is_none());
        assert_eq!(
            injector.check(ApiOperation::Rollback),
            Some(FailureKind::Logical("rollback refused".to_string()))
        );
    }

    #[test]
    fn test_fail_count() {
        let mut injector = FailureInjector::new();
        injector.inject(
            ApiOperation::DeleteStore,
            FailureConfig::status(500, "busy").with_fail_count(1),
        );

        assert!(injector.check(ApiOperation::DeleteStore).is_some());
        assert!(injector.check(ApiOperation::DeleteStore).is_none());
    }

    #[test]
    fn test_clear_op() {
        let mut injector = FailureInjector::new();
        injector.inject(ApiOperation::GetTrackingReport, FailureConfig::transport("down"));
        injector.clear_op(ApiOperation::GetTrackingReport);
        assert!(injector.check(ApiOperation::GetTrackingReport).is_none());
    }
}
