//! Canonical resource URIs
//!
//! Folders, configuration files and queried resources are all addressed by a
//! `ResourceUri`. Two URIs that name the same location always produce the same
//! canonical string, which is what the resolver registry keys on.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use url::Url;

/// Errors that can occur while building a `ResourceUri`
#[derive(Error, Debug)]
pub enum ResourceUriError {
    #[error("Invalid resource URI: {0}")]
    Parse(#[from] url::ParseError),

    #[error("Path is not absolute: {0}")]
    NotAbsolute(String),

    #[error("URI has no hierarchical path: {0}")]
    NotHierarchical(String),
}

/// A canonical, hierarchical resource URI (usually `file://`)
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceUri {
    url: Url,
}

impl ResourceUri {
    /// Parse a URI string, or an absolute filesystem path
    pub fn parse(input: &str) -> Result<Self, ResourceUriError> {
        if input.starts_with('/') {
            return Self::from_path(input);
        }
        let url = Url::parse(input)?;
        if url.cannot_be_a_base() {
            return Err(ResourceUriError::NotHierarchical(input.to_string()));
        }
        Ok(Self::canonical(url))
    }

    /// Build a `file://` URI from an absolute path
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ResourceUriError> {
        let path = path.as_ref();
        let url = Url::from_file_path(path)
            .map_err(|_| ResourceUriError::NotAbsolute(path.display().to_string()))?;
        Ok(Self::canonical(url))
    }

    fn canonical(mut url: Url) -> Self {
        let path = url.path();
        if path.len() > 1 && path.ends_with('/') {
            let trimmed = path.trim_end_matches('/').to_string();
            let trimmed = if trimmed.is_empty() { "/".to_string() } else { trimmed };
            url.set_path(&trimmed);
        }
        url.set_fragment(None);
        Self { url }
    }

    /// The canonical string form
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Non-empty path segments, still percent-encoded
    pub fn path_segments(&self) -> Vec<&str> {
        self.url
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).collect())
            .unwrap_or_default()
    }

    /// Number of path segments below the root
    pub fn depth(&self) -> usize {
        self.path_segments().len()
    }

    /// Last path segment, if any
    pub fn file_name(&self) -> Option<&str> {
        self.path_segments().last().copied()
    }

    /// Append a single path segment
    pub fn join(&self, segment: &str) -> Self {
        let mut url = self.url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(segment);
        }
        Self { url }
    }

    /// Whether `other` is this URI or lies somewhere below it
    pub fn encloses(&self, other: &ResourceUri) -> bool {
        if self.url.scheme() != other.url.scheme()
            || self.url.host_str() != other.url.host_str()
            || self.url.port() != other.url.port()
        {
            return false;
        }
        let own = self.path_segments();
        let theirs = other.path_segments();
        own.len() <= theirs.len() && own.iter().zip(theirs.iter()).all(|(a, b)| a == b)
    }
}

impl fmt::Display for ResourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for ResourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceUri({})", self.as_str())
    }
}

impl FromStr for ResourceUri {
    type Err = ResourceUriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ResourceUri {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ResourceUri {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_and_uri_forms_are_equal() {
        let from_path = ResourceUri::parse("/root/a").unwrap();
        let from_uri = ResourceUri::parse("file:///root/a").unwrap();
        assert_eq!(from_path, from_uri);
        assert_eq!(from_path.as_str(), "file:///root/a");
    }

    #[test]
    fn test_trailing_slash_is_dropped() {
        let uri = ResourceUri::parse("file:///root/a/").unwrap();
        assert_eq!(uri.as_str(), "file:///root/a");

        let root = ResourceUri::parse("file:///").unwrap();
        assert_eq!(root.depth(), 0);
        assert_eq!(root.file_name(), None);
    }

    #[test]
    fn test_join() {
        let folder = ResourceUri::parse("/root/a").unwrap();
        let file = folder.join(".vscode").join("settings.json");
        assert_eq!(file.as_str(), "file:///root/a/.vscode/settings.json");
        assert_eq!(file.file_name(), Some("settings.json"));
        assert_eq!(file.depth(), folder.depth() + 2);
        assert!(folder.encloses(&file));
    }

    #[test]
    fn test_encloses() {
        let folder = ResourceUri::parse("/root/a").unwrap();
        assert!(folder.encloses(&folder));
        assert!(folder.encloses(&ResourceUri::parse("/root/a/src/main.rs").unwrap()));
        assert!(!folder.encloses(&ResourceUri::parse("/root/ab/main.rs").unwrap()));
        assert!(!folder.encloses(&ResourceUri::parse("/root").unwrap()));
        assert!(!folder.encloses(&ResourceUri::parse("untitled:/root/a/x").unwrap()));
    }

    #[test]
    fn test_rejects_relative_and_opaque() {
        assert!(matches!(
            ResourceUri::parse("mailto:someone@example.com"),
            Err(ResourceUriError::NotHierarchical(_))
        ));
        assert!(ResourceUri::parse("relative/path").is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let uri = ResourceUri::parse("/root/a").unwrap();
        let json = serde_json::to_string(&uri).unwrap();
        assert_eq!(json, "\"file:///root/a\"");
        let back: ResourceUri = serde_json::from_str(&json).unwrap();
        assert_eq!(back, uri);
    }
}
