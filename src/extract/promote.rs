//! Promotion with rollback
//!
//! A promotion moves through `issued -> applied | failed`. A failed
//! promotion is rolled back using the result the repository manager
//! returned, which ends in `rolled-back` or `rollback-failed`. Every path
//! other than `applied` surfaces as an [`ExtractError`].

use tracing::{info, warn};

use repocap_protocol::PromoteRequest;

use super::error::{ExtractError, RollbackWarning};
use super::BuildRepository;

impl BuildRepository {
    /// Issue one promotion and roll it back if the manager reports an error
    pub fn do_promote(&self, request: &PromoteRequest) -> Result<(), ExtractError> {
        info!(
            op = "extract.promote",
            build_id = %self.id(),
            request = %request,
            "Promoting"
        );

        let result = self
            .client()
            .promote(request)
            .map_err(|source| ExtractError::PromotionTransport {
                build_id: self.id().to_string(),
                request: request.clone(),
                source,
            })?;

        let reason = match &result.error {
            None => return Ok(()),
            Some(reason) => reason.clone(),
        };

        warn!(
            op = "extract.promote.failed",
            build_id = %self.id(),
            request = %request,
            reason = %reason,
            "Promotion reported an error, rolling back"
        );

        let rollback = self
            .client()
            .rollback(&result)
            .map_err(|source| {
                warn!(
                    op = "extract.rollback.unreachable",
                    build_id = %self.id(),
                    request = %request,
                    error = %source,
                    "Rollback request failed"
                );
                ExtractError::RollbackFailed {
                    build_id: self.id().to_string(),
                    request: request.clone(),
                    promotion_error: reason.clone(),
                    source,
                }
            })?;

        if let Some(rollback_reason) = &rollback.error {
            warn!(
                op = "extract.rollback.failed",
                build_id = %self.id(),
                request = %request,
                reason = %rollback_reason,
                "Rollback reported an error"
            );
        }

        Err(ExtractError::Promotion {
            build_id: self.id().to_string(),
            request: request.clone(),
            reason,
            rollback_warning: RollbackWarning(rollback.error),
        })
    }
}
