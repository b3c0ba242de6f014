//! Folder configuration resolver trait

use std::sync::Arc;

use async_trait::async_trait;

use crate::types::{
    ConfigLocation, Listener, PreferenceChangeEvent, PreferenceMap, PreferenceValue, ResolvedValue,
    ResourceUri, Subscription, WorkspaceFolder,
};

/// Resolver for one configuration file of one workspace folder
///
/// Each instance backs exactly one (folder, config-directory, config-file)
/// location. Loading, parsing, watching and persisting the file are the
/// implementation's business; the registry only consumes this interface.
///
/// Implementations:
/// - `MemoryFolderResolver`: In-memory, for tests and embedders
/// - Host adapters: a JSON file watcher, an editor document model, etc.
#[async_trait]
pub trait FolderConfigResolver: Send + Sync {
    /// The location this resolver backs
    fn location(&self) -> &ConfigLocation;

    /// URI of the backing configuration file
    fn config_uri(&self) -> &ResourceUri;

    /// Completes once the file has been loaded (or failed to load)
    async fn ready(&self) -> FolderConfigResult<()>;

    /// The configuration file governing `resource`, if this resolver applies to it
    fn config_uri_for(&self, resource: &ResourceUri) -> Option<ResourceUri>;

    /// Every key/value pair the file currently defines
    fn all_preferences(&self) -> PreferenceMap;

    /// Look up one key for `resource`
    fn resolve_value(&self, key: &str, resource: &ResourceUri) -> ResolvedValue {
        match self.config_uri_for(resource) {
            Some(config_uri) => match self.all_preferences().get(key) {
                Some(value) => ResolvedValue::new(value.clone(), config_uri),
                None => ResolvedValue::empty(),
            },
            None => ResolvedValue::empty(),
        }
    }

    /// Write (or, with `None`, remove) a key
    ///
    /// `Ok(false)` means the resolver declined the write; errors are reserved
    /// for writes that were attempted and failed.
    async fn write_value(
        &self,
        key: &str,
        value: Option<PreferenceValue>,
        resource: &ResourceUri,
    ) -> FolderConfigResult<bool>;

    /// Register a listener for change deltas of the backing file
    fn on_did_change(&self, listener: Listener<PreferenceChangeEvent>) -> Subscription;

    /// Release watchers and caches
    fn dispose(&self);
}

/// Factory creating one resolver per configuration location
///
/// Construction cannot fail; failures surface through `ready()`.
pub type ResolverFactory =
    Box<dyn Fn(&WorkspaceFolder, &ConfigLocation) -> Arc<dyn FolderConfigResolver> + Send + Sync>;

/// Errors that can occur during folder configuration operations
#[derive(Debug, thiserror::Error)]
pub enum FolderConfigError {
    #[error("Configuration not ready: {0}")]
    NotReady(String),

    #[error("Failed to write {key} to {config_uri}: {message}")]
    WriteFailed {
        config_uri: ResourceUri,
        key: String,
        message: String,
    },

    #[error("Resolver disposed: {0}")]
    Disposed(ResourceUri),

    /// Reading or persisting the backing file failed
    ///
    /// Not produced by the in-memory resolver; file-backed resolvers supplied
    /// by embedders convert their `std::io::Error`s with `?`.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file is not valid JSON, for file-backed resolvers
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other resolver-specific failure
    #[error("Configuration error: {0}")]
    Other(String),
}

impl FolderConfigError {
    pub fn write_failed(config_uri: &ResourceUri, key: &str, message: impl Into<String>) -> Self {
        Self::WriteFailed {
            config_uri: config_uri.clone(),
            key: key.to_string(),
            message: message.into(),
        }
    }
}

pub type FolderConfigResult<T> = Result<T, FolderConfigError>;
