//! Connection details handed to a build

use serde::{Deserialize, Serialize};

/// URLs a build resolves dependencies from and deploys outputs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConnectionInfo {
    /// Content URL of the build's group store
    pub dependency_url: String,
    /// Content URL of the build's hosted store
    pub deploy_url: String,
}

impl RepositoryConnectionInfo {
    pub fn new(dependency_url: impl Into<String>, deploy_url: impl Into<String>) -> Self {
        Self {
            dependency_url: dependency_url.into(),
            deploy_url: deploy_url.into(),
        }
    }
}
