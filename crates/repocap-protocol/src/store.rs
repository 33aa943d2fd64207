//! Store identities.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Kind of repository endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreType {
    /// Proxy of an upstream repository.
    Remote,
    /// Writable repository.
    Hosted,
    /// Virtual aggregate of other stores.
    Group,
}

impl StoreType {
    /// Returns the path segment used by the repository manager
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreType::Remote => "remote",
            StoreType::Hosted => "hosted",
            StoreType::Group => "group",
        }
    }
}

impl fmt::Display for StoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreType {
    type Err = StoreKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "remote" => Ok(StoreType::Remote),
            "hosted" => Ok(StoreType::Hosted),
            "group" => Ok(StoreType::Group),
            other => Err(StoreKeyError::UnknownType(other.to_string())),
        }
    }
}

/// Errors parsing a `type:name` store key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreKeyError {
    #[error("store key '{0}' is not of the form type:name")]
    MissingSeparator(String),

    #[error("unknown store type '{0}'")]
    UnknownType(String),

    #[error("store key '{0}' has an empty name")]
    EmptyName(String),
}

/// A (type, name) pair identifying one store.
///
/// Serialized as the string `type:name`, e.g. `remote:build-42`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreKey {
    pub store_type: StoreType,
    pub name: String,
}

impl StoreKey {
    pub fn new(store_type: StoreType, name: impl Into<String>) -> Self {
        Self {
            store_type,
            name: name.into(),
        }
    }

    pub fn remote(name: impl Into<String>) -> Self {
        Self::new(StoreType::Remote, name)
    }

    pub fn hosted(name: impl Into<String>) -> Self {
        Self::new(StoreType::Hosted, name)
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(StoreType::Group, name)
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.store_type, self.name)
    }
}

impl FromStr for StoreKey {
    type Err = StoreKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (store_type, name) = s
            .split_once(':')
            .ok_or_else(|| StoreKeyError::MissingSeparator(s.to_string()))?;
        if name.is_empty() {
            return Err(StoreKeyError::EmptyName(s.to_string()));
        }
        Ok(Self::new(store_type.parse()?, name))
    }
}

impl Serialize for StoreKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StoreKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
