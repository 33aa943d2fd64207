//! Artifact coordinates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fully qualified reference to one artifact file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub artifact_type: String,
    pub classifier: Option<String>,
    pub optional: bool,
}

impl ArtifactRef {
    /// Canonical identifier: `group:artifact:type:version[:classifier]`
    pub fn identifier(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.group_id, self.artifact_id, self.artifact_type, self.version
        )?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{}", classifier)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::ArtifactPathInfo;

    #[test]
    fn test_identifier_without_classifier() {
        let aref = ArtifactPathInfo::parse("org/example/lib/1.0/lib-1.0.jar")
            .unwrap()
            .artifact_ref();
        assert_eq!(aref.identifier(), "org.example:lib:jar:1.0");
        assert!(!aref.optional);
    }

    #[test]
    fn test_identifier_with_classifier() {
        let aref = ArtifactPathInfo::parse("org/example/lib/1.0/lib-1.0-javadoc.jar")
            .unwrap()
            .artifact_ref();
        assert_eq!(aref.identifier(), "org.example:lib:jar:1.0:javadoc");
    }

    #[test]
    fn test_serializes_fields() {
        let aref = ArtifactPathInfo::parse("org/example/lib/1.0/lib-1.0.pom")
            .unwrap()
            .artifact_ref();
        let value = serde_json::to_value(&aref).unwrap();
        assert_eq!(value["group_id"], "org.example");
        assert_eq!(value["artifact_type"], "pom");
        assert!(value["classifier"].is_null());
    }
}
