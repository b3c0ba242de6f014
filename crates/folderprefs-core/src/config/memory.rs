//! In-memory folder configuration resolver

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use super::traits::{FolderConfigError, FolderConfigResolver, FolderConfigResult, ResolverFactory};
use crate::types::{
    ConfigLocation, Emitter, Listener, PreferenceChangeEvent, PreferenceMap, PreferenceValue,
    ResourceUri, Subscription, WorkspaceFolder,
};

#[derive(Debug, Default)]
struct MemoryState {
    /// Whether the backing "file" exists
    loaded: bool,
    values: PreferenceMap,
}

/// In-memory folder configuration resolver
///
/// Behaves like a resolver over a file that may or may not exist: until it is
/// seeded or written, `config_uri_for` reports nothing and the resolver does
/// not govern any resource.
///
/// # Example
///
/// ```
/// use folderprefs_core::config::{FolderConfigResolver, MemoryFolderResolver};
/// use folderprefs_core::types::{ConfigDirectory, ConfigFile, ConfigLocation, ResourceUri, WorkspaceFolder};
/// use serde_json::json;
///
/// let folder = WorkspaceFolder::new(ResourceUri::parse("/root/a").unwrap());
/// let location = ConfigLocation::new(folder.uri.clone(), ConfigDirectory::Primary, ConfigFile::Settings);
/// let resolver = MemoryFolderResolver::new(folder, location)
///     .with_values(json!({"editor.tabSize": 2}).as_object().cloned().unwrap());
///
/// let resource = ResourceUri::parse("/root/a/src/main.rs").unwrap();
/// assert_eq!(resolver.resolve_value("editor.tabSize", &resource).value, Some(json!(2)));
/// ```
pub struct MemoryFolderResolver {
    folder: WorkspaceFolder,
    location: ConfigLocation,
    config_uri: ResourceUri,
    state: RwLock<MemoryState>,
    emitter: Emitter<PreferenceChangeEvent>,
    ready_error: Option<String>,
    write_error: Option<String>,
    read_only: bool,
    disposed: AtomicBool,
    dispose_calls: AtomicUsize,
    write_attempts: AtomicUsize,
}

impl MemoryFolderResolver {
    /// Create a resolver whose backing file does not exist yet
    pub fn new(folder: WorkspaceFolder, location: ConfigLocation) -> Self {
        let config_uri = location.config_uri();
        Self {
            folder,
            location,
            config_uri,
            state: RwLock::new(MemoryState::default()),
            emitter: Emitter::new(),
            ready_error: None,
            write_error: None,
            read_only: false,
            disposed: AtomicBool::new(false),
            dispose_calls: AtomicUsize::new(0),
            write_attempts: AtomicUsize::new(0),
        }
    }

    /// Start out loaded with the given values
    pub fn with_values(self, values: PreferenceMap) -> Self {
        *self.state.write() = MemoryState { loaded: true, values };
        self
    }

    /// Make `ready()` fail with the given message
    pub fn failing_ready(mut self, message: impl Into<String>) -> Self {
        self.ready_error = Some(message.into());
        self
    }

    /// Make every write fail with the given message
    pub fn failing_writes(mut self, message: impl Into<String>) -> Self {
        self.write_error = Some(message.into());
        self
    }

    /// Decline every write
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Replace the file contents as if edited externally
    pub fn set_values(&self, values: PreferenceMap) {
        let event = {
            let mut state = self.state.write();
            let event = PreferenceChangeEvent::diff(self.config_uri.clone(), &state.values, &values);
            state.loaded = true;
            state.values = values;
            event
        };
        if !event.is_empty() {
            self.emitter.fire(&event);
        }
    }

    /// Remove the backing file as if deleted externally
    pub fn unload(&self) {
        let event = {
            let mut state = self.state.write();
            let event =
                PreferenceChangeEvent::diff(self.config_uri.clone(), &state.values, &PreferenceMap::new());
            state.loaded = false;
            state.values.clear();
            event
        };
        if !event.is_empty() {
            self.emitter.fire(&event);
        }
    }

    pub fn folder(&self) -> &WorkspaceFolder {
        &self.folder
    }

    pub fn is_loaded(&self) -> bool {
        self.state.read().loaded
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// How many times `dispose()` was called
    pub fn dispose_calls(&self) -> usize {
        self.dispose_calls.load(Ordering::SeqCst)
    }

    /// How many times `write_value()` was called
    pub fn write_attempts(&self) -> usize {
        self.write_attempts.load(Ordering::SeqCst)
    }

    pub fn listener_count(&self) -> usize {
        self.emitter.listener_count()
    }
}

#[async_trait]
impl FolderConfigResolver for MemoryFolderResolver {
    fn location(&self) -> &ConfigLocation {
        &self.location
    }

    fn config_uri(&self) -> &ResourceUri {
        &self.config_uri
    }

    async fn ready(&self) -> FolderConfigResult<()> {
        match &self.ready_error {
            Some(message) => Err(FolderConfigError::NotReady(format!("{}: {}", self.config_uri, message))),
            None => Ok(()),
        }
    }

    fn config_uri_for(&self, resource: &ResourceUri) -> Option<ResourceUri> {
        if self.is_loaded() && self.folder.contains(resource) {
            Some(self.config_uri.clone())
        } else {
            None
        }
    }

    fn all_preferences(&self) -> PreferenceMap {
        self.state.read().values.clone()
    }

    async fn write_value(
        &self,
        key: &str,
        value: Option<PreferenceValue>,
        resource: &ResourceUri,
    ) -> FolderConfigResult<bool> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        if self.is_disposed() {
            return Err(FolderConfigError::Disposed(self.config_uri.clone()));
        }
        if let Some(message) = &self.write_error {
            return Err(FolderConfigError::write_failed(&self.config_uri, key, message.clone()));
        }
        if self.read_only || !self.folder.contains(resource) {
            return Ok(false);
        }

        let event = {
            let mut state = self.state.write();
            let before = state.values.clone();
            match value {
                Some(value) => {
                    state.values.insert(key.to_string(), value);
                }
                None => {
                    state.values.remove(key);
                }
            }
            state.loaded = true;
            PreferenceChangeEvent::diff(self.config_uri.clone(), &before, &state.values)
        };
        if !event.is_empty() {
            self.emitter.fire(&event);
        }
        Ok(true)
    }

    fn on_did_change(&self, listener: Listener<PreferenceChangeEvent>) -> Subscription {
        self.emitter.subscribe(listener)
    }

    fn dispose(&self) {
        self.dispose_calls.fetch_add(1, Ordering::SeqCst);
        self.disposed.store(true, Ordering::SeqCst);
        self.emitter.clear();
    }
}

impl std::fmt::Debug for MemoryFolderResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryFolderResolver")
            .field("config_uri", &self.config_uri)
            .field("loaded", &self.is_loaded())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Test double producing `MemoryFolderResolver`s from per-file seeds
///
/// Every resolver it creates is recorded, disposed ones included, so callers
/// can inspect creation and disposal after reconciliation. The record only
/// grows; long-lived users call `prune_disposed` after workspace churn.
#[derive(Default)]
pub struct MemoryResolverFactory {
    seeds: RwLock<HashMap<String, PreferenceMap>>,
    ready_failures: RwLock<HashMap<String, String>>,
    write_failures: RwLock<HashMap<String, String>>,
    read_only: RwLock<HashSet<String>>,
    created: Mutex<Vec<Arc<MemoryFolderResolver>>>,
}

impl MemoryResolverFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents of the file at `config_uri` for resolvers created from now on
    pub fn seed(&self, config_uri: &ResourceUri, values: PreferenceMap) {
        self.seeds.write().insert(config_uri.to_string(), values);
    }

    pub fn fail_ready(&self, config_uri: &ResourceUri, message: impl Into<String>) {
        self.ready_failures.write().insert(config_uri.to_string(), message.into());
    }

    pub fn fail_writes(&self, config_uri: &ResourceUri, message: impl Into<String>) {
        self.write_failures.write().insert(config_uri.to_string(), message.into());
    }

    pub fn set_read_only(&self, config_uri: &ResourceUri) {
        self.read_only.write().insert(config_uri.to_string());
    }

    /// Create a resolver for one location
    pub fn create(&self, folder: &WorkspaceFolder, location: &ConfigLocation) -> Arc<MemoryFolderResolver> {
        let identity = location.identity();
        let mut resolver = MemoryFolderResolver::new(folder.clone(), location.clone());
        if let Some(values) = self.seeds.read().get(&identity) {
            resolver = resolver.with_values(values.clone());
        }
        if let Some(message) = self.ready_failures.read().get(&identity) {
            resolver = resolver.failing_ready(message.clone());
        }
        if let Some(message) = self.write_failures.read().get(&identity) {
            resolver = resolver.failing_writes(message.clone());
        }
        if self.read_only.read().contains(&identity) {
            resolver = resolver.read_only();
        }

        let resolver = Arc::new(resolver);
        self.created.lock().push(resolver.clone());
        resolver
    }

    /// Every resolver created so far, in creation order
    pub fn created(&self) -> Vec<Arc<MemoryFolderResolver>> {
        self.created.lock().clone()
    }

    /// Resolvers created for the given config file URI
    pub fn created_for(&self, config_uri: &ResourceUri) -> Vec<Arc<MemoryFolderResolver>> {
        self.created
            .lock()
            .iter()
            .filter(|r| r.config_uri() == config_uri)
            .cloned()
            .collect()
    }

    /// Forget recorded resolvers that have been disposed
    ///
    /// Returns how many were dropped.
    pub fn prune_disposed(&self) -> usize {
        let mut created = self.created.lock();
        let before = created.len();
        created.retain(|r| !r.is_disposed());
        before - created.len()
    }

    /// Adapt into the boxed factory the registry consumes
    pub fn factory(self: &Arc<Self>) -> ResolverFactory {
        let this = Arc::clone(self);
        Box::new(
            move |folder: &WorkspaceFolder, location: &ConfigLocation| -> Arc<dyn FolderConfigResolver> {
                this.create(folder, location)
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ConfigDirectory, ConfigFile};
    use serde_json::json;

    fn map(value: serde_json::Value) -> PreferenceMap {
        value.as_object().cloned().unwrap()
    }

    fn settings_resolver() -> MemoryFolderResolver {
        let folder = WorkspaceFolder::new(ResourceUri::parse("/root/a").unwrap());
        let location = ConfigLocation::new(folder.uri.clone(), ConfigDirectory::Primary, ConfigFile::Settings);
        MemoryFolderResolver::new(folder, location)
    }

    #[test]
    fn test_unloaded_resolver_governs_nothing() {
        let resolver = settings_resolver();
        let resource = ResourceUri::parse("/root/a/main.rs").unwrap();
        assert!(resolver.config_uri_for(&resource).is_none());
        assert!(!resolver.resolve_value("a", &resource).is_set());
    }

    #[test]
    fn test_loaded_resolver_governs_folder_only() {
        let resolver = settings_resolver().with_values(map(json!({"a": 1})));
        let inside = ResourceUri::parse("/root/a/main.rs").unwrap();
        let outside = ResourceUri::parse("/root/b/main.rs").unwrap();

        assert_eq!(
            resolver.config_uri_for(&inside).unwrap().as_str(),
            "file:///root/a/.folderprefs/settings.json"
        );
        assert!(resolver.config_uri_for(&outside).is_none());
        assert_eq!(resolver.resolve_value("a", &inside).value, Some(json!(1)));
    }

    #[tokio::test]
    async fn test_write_loads_and_notifies() {
        let resolver = settings_resolver();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let _sub = resolver.on_did_change(Arc::new(move |e: &PreferenceChangeEvent| sink.lock().push(e.clone())));

        let resource = ResourceUri::parse("/root/a/main.rs").unwrap();
        assert!(resolver.write_value("x", Some(json!(5)), &resource).await.unwrap());
        assert!(resolver.is_loaded());
        assert_eq!(resolver.all_preferences(), map(json!({"x": 5})));

        assert!(resolver.write_value("x", None, &resource).await.unwrap());
        assert!(resolver.all_preferences().is_empty());

        let events = events.lock();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].changes[0].new_value, Some(json!(5)));
        assert_eq!(events[1].changes[0].new_value, None);
    }

    #[tokio::test]
    async fn test_write_modes() {
        let resource = ResourceUri::parse("/root/a/main.rs").unwrap();

        let read_only = settings_resolver().read_only();
        assert!(!read_only.write_value("x", Some(json!(1)), &resource).await.unwrap());

        let failing = settings_resolver().failing_writes("disk full");
        assert!(matches!(
            failing.write_value("x", Some(json!(1)), &resource).await,
            Err(FolderConfigError::WriteFailed { .. })
        ));

        let outside = ResourceUri::parse("/root/b/main.rs").unwrap();
        let plain = settings_resolver();
        assert!(!plain.write_value("x", Some(json!(1)), &outside).await.unwrap());
        assert_eq!(plain.write_attempts(), 1);
    }

    #[tokio::test]
    async fn test_ready_failure() {
        let resolver = settings_resolver().failing_ready("malformed JSON");
        assert!(matches!(resolver.ready().await, Err(FolderConfigError::NotReady(_))));
        assert!(settings_resolver().ready().await.is_ok());
    }

    #[test]
    fn test_dispose_clears_listeners() {
        let resolver = settings_resolver();
        let _sub = resolver.on_did_change(Arc::new(|_: &PreferenceChangeEvent| {}));
        assert_eq!(resolver.listener_count(), 1);

        resolver.dispose();
        assert!(resolver.is_disposed());
        assert_eq!(resolver.dispose_calls(), 1);
        assert_eq!(resolver.listener_count(), 0);
    }

    #[test]
    fn test_factory_applies_seeds() {
        let factory = Arc::new(MemoryResolverFactory::new());
        let folder = WorkspaceFolder::new(ResourceUri::parse("/root/a").unwrap());
        let location = ConfigLocation::new(folder.uri.clone(), ConfigDirectory::Compat, ConfigFile::Launch);
        factory.seed(&location.config_uri(), map(json!({"k": true})));

        let build = factory.factory();
        let resolver = build(&folder, &location);
        assert_eq!(resolver.all_preferences(), map(json!({"k": true})));
        assert_eq!(factory.created_for(&location.config_uri()).len(), 1);
    }

    #[test]
    fn test_prune_disposed() {
        let factory = Arc::new(MemoryResolverFactory::new());
        let folder = WorkspaceFolder::new(ResourceUri::parse("/root/a").unwrap());
        let kept = factory.create(&folder, &ConfigLocation::new(folder.uri.clone(), ConfigDirectory::Primary, ConfigFile::Launch));
        let gone = factory.create(&folder, &ConfigLocation::new(folder.uri.clone(), ConfigDirectory::Compat, ConfigFile::Launch));

        gone.dispose();
        assert_eq!(factory.prune_disposed(), 1);
        assert_eq!(factory.created().len(), 1);
        assert_eq!(factory.created()[0].config_uri(), kept.config_uri());
        assert_eq!(factory.prune_disposed(), 0);
    }
}
