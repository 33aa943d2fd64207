//! repocap - build repository capture and promotion
//!
//! Talks to a Maven repository manager on behalf of a build orchestrator.
//! After a build, reads what the build downloaded and uploaded through its
//! build-scoped stores, reports those as artifact metadata, promotes the
//! downloaded dependencies into a shared store and removes the build's
//! stores.

pub mod artifact;
pub mod client;
pub mod config;
pub mod connection;
pub mod extract;
pub mod mock;

pub use artifact::{Artifact, ArtifactStatus, BuildArtifacts, RepositoryType};
pub use client::{HttpTransport, MockTransport, RepositoryClient, Transport};
pub use config::{EffectiveConfig, Settings};
pub use connection::RepositoryConnectionInfo;
pub use extract::{BuildRepository, CleanupStatus, ExtractError, ExtractionReport, StoreSettings};
