//! Workspace folder descriptor

use serde::{Deserialize, Serialize};

use super::uri::ResourceUri;

/// A root folder registered in the current workspace session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkspaceFolder {
    /// Canonical folder URI
    pub uri: ResourceUri,
    /// Display name (defaults to the last path segment)
    pub name: String,
}

impl WorkspaceFolder {
    pub fn new(uri: ResourceUri) -> Self {
        let name = uri
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| uri.to_string());
        Self { uri, name }
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Whether the resource lies inside this folder
    pub fn contains(&self, resource: &ResourceUri) -> bool {
        self.uri.encloses(resource)
    }
}
