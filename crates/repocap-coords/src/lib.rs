//! Maven repository-layout paths and artifact coordinates.
//!
//! Turns a repository-relative path such as
//! `org/example/lib/1.0/lib-1.0.jar` into structured coordinates, and
//! renders the canonical `group:artifact:type:version[:classifier]`
//! identifier. Paths that are not artifacts (repository metadata,
//! checksum and signature side files) do not parse.

mod path;
mod reference;

pub use path::ArtifactPathInfo;
pub use reference::ArtifactRef;

/// Suffixes of side files stored next to an artifact.
const SIDE_FILE_SUFFIXES: &[&str] = &[".md5", ".sha1", ".sha256", ".sha512", ".asc"];

/// Prefix of repository metadata files.
const METADATA_FILE_PREFIX: &str = "maven-metadata";

/// Version directory suffix for snapshot versions.
const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";
