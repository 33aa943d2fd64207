//! Mock Repository Manager
//!
//! In-process implementation of the repository manager operations this
//! crate calls, with failure injection for testing error paths.
//!
//! # Operations
//!
//! - `get_tracking_report`: Return the recorded report, 404 when absent
//! - `clear_tracking_record`: Drop a tracking record
//! - `delete_store`: Drop a store and its content
//! - `promote`: Copy paths between stores, reporting conflicts
//! - `rollback`: Remove the paths a promotion completed

mod failure;
mod manager;
mod state;

pub use failure::{FailureConfig, FailureInjector, FailureKind};
pub use manager::MockRepositoryManager;
pub use state::{MockState, RecordedCall, StoreContent};
