//! Built-in defaults (layer 1)

use serde_json::{json, Value};

/// Default configuration values
#[derive(Debug, Clone)]
pub struct BuiltinDefaults {
    pub base_url: String,
    pub request_timeout_seconds: u64,
    pub shared_imports: String,
    pub shared_releases: String,
    pub promote_build_output: bool,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api/".to_string(),
            request_timeout_seconds: 60,
            shared_imports: "shared-imports".to_string(),
            shared_releases: "shared-releases".to_string(),
            promote_build_output: false,
        }
    }
}

impl BuiltinDefaults {
    /// Layer value in the same shape as the TOML file
    pub fn to_value(&self) -> Value {
        json!({
            "repository_manager": {
                "base_url": self.base_url,
                "request_timeout_seconds": self.request_timeout_seconds
            },
            "stores": {
                "shared_imports": self.shared_imports,
                "shared_releases": self.shared_releases
            },
            "promotion": {
                "promote_build_output": self.promote_build_output
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_value() {
        let value = BuiltinDefaults::default().to_value();

        assert_eq!(value["repository_manager"]["request_timeout_seconds"], 60);
        assert_eq!(value["stores"]["shared_imports"], "shared-imports");
        assert_eq!(value["stores"]["shared_releases"], "shared-releases");
        assert_eq!(value["promotion"]["promote_build_output"], false);
        assert!(value["repository_manager"].get("auth_token").is_none());
    }
}
