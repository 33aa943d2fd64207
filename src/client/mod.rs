//! Repository Manager Client
//!
//! Typed client for the remote repository manager and the transports it
//! runs over.

pub mod api;
pub mod repository;
pub mod transport;

pub use api::{ApiOperation, ApiRequest, ApiResponse, Method};
pub use repository::{ClientError, ClientResult, RepositoryClient};
pub use transport::{HttpConfig, HttpTransport, MockTransport, Transport, TransportError};
