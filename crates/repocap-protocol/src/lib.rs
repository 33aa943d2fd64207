//! Repository manager wire types.
//!
//! Store identities, content tracking reports and promotion messages as the
//! repository manager exchanges them over its REST API.

pub mod promote;
pub mod store;
pub mod tracking;

pub use promote::{PromoteRequest, PromoteResult};
pub use store::{StoreKey, StoreKeyError, StoreType};
pub use tracking::{TrackedContent, TrackedContentEntry};
