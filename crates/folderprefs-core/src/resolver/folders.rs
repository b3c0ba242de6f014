//! Folder preferences façade
//!
//! `FoldersPreferences` answers preference queries for a multi-root workspace.
//! Each query takes a snapshot of the resolver registry under a read lock,
//! ranks it for the resource, and works on the winning group only:
//!
//! - `resolve_value`: first non-null value in precedence order
//! - `merged_preferences`: all keys of the group, higher precedence wins
//! - `write_preference`: first resolver accepting the write
//! - `config_uri_for`: the settings file that governs the resource
//!
//! Reconciliation takes the write lock for its whole run, so a query never
//! observes a half-updated registry.
//!
//! # Example
//!
//! ```rust,ignore
//! use folderprefs_core::{FoldersPreferences, FoldersPreferencesOptions};
//!
//! let prefs = FoldersPreferences::start(workspace, factory, FoldersPreferencesOptions::from_env()).await;
//! prefs.ready().await;
//!
//! let tab_size = prefs.resolve_value("editor.tabSize", Some(&resource));
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;

use crate::config::{FolderConfigResult, ResolverFactory};
use crate::types::{
    ConfigFile, ConfigLocation, PreferenceChangeEvent, PreferenceMap, PreferenceValue, ResolvedValue,
    ResourceUri, Subscription, WorkspaceFolder,
};
use crate::workspace::WorkspaceRoots;
use crate::{log_debug, log_error, log_warn};

use super::options::{FoldersPreferencesOptions, WriteFailurePolicy};
use super::precedence::{self, Candidate, RegistrySnapshot};
use super::registry::{ReconcileReport, ResolverRegistry};

/// Capacity of the re-emitted change channel
const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Outcome of the aggregate readiness wait
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Readiness {
    /// Number of resolvers whose readiness settled
    pub settled: usize,
    /// Identities of resolvers whose readiness failed
    pub failed: Vec<String>,
}

/// Preferences of every workspace folder, resolved per resource
pub struct FoldersPreferences {
    registry: RwLock<ResolverRegistry>,
    changes: broadcast::Sender<PreferenceChangeEvent>,
    options: FoldersPreferencesOptions,
    workspace_subscription: Mutex<Option<Subscription>>,
    roots_dirty: AtomicBool,
    roots_syncing: AtomicBool,
}

impl FoldersPreferences {
    /// Create a façade with an empty registry
    ///
    /// Call `reconcile` with the workspace folders, or use `start` to follow
    /// a `WorkspaceRoots` source.
    pub fn new(factory: ResolverFactory, options: FoldersPreferencesOptions) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        let registry = ResolverRegistry::new(factory, changes.clone(), options.logger.clone());
        Self {
            registry: RwLock::new(registry),
            changes,
            options,
            workspace_subscription: Mutex::new(None),
            roots_dirty: AtomicBool::new(false),
            roots_syncing: AtomicBool::new(false),
        }
    }

    /// Create a façade bound to a workspace root source
    ///
    /// Waits for the workspace to finish opening, reconciles with its current
    /// roots, and from then on reconciles again on every roots-changed
    /// notification.
    pub async fn start(
        workspace: Arc<dyn WorkspaceRoots>,
        factory: ResolverFactory,
        options: FoldersPreferencesOptions,
    ) -> Arc<Self> {
        // The awaited list may already be stale once we get here; every sync
        // reads the current roots instead.
        let opened = workspace.roots().await;

        let this = Arc::new(Self::new(factory, options));
        log_debug!(this.options.logger, "Workspace opened with {} roots", opened.len());

        let weak = Arc::downgrade(&this);
        let source = Arc::downgrade(&workspace);
        let subscription = workspace.on_did_change_roots(Arc::new(move |_: &Vec<WorkspaceFolder>| {
            if let (Some(this), Some(source)) = (weak.upgrade(), source.upgrade()) {
                this.sync_roots(source.as_ref());
            }
        }));
        *this.workspace_subscription.lock() = Some(subscription);

        this.sync_roots(workspace.as_ref());
        this
    }

    /// Reconcile with the workspace's current roots
    ///
    /// Requests are coalesced: while one caller is syncing, others only mark
    /// the roots dirty and the running caller reads them again. The last
    /// reconciliation therefore always uses the latest root list, even when
    /// notifications race each other or fire from inside `try_get_roots`.
    fn sync_roots(&self, workspace: &dyn WorkspaceRoots) {
        self.roots_dirty.store(true, Ordering::SeqCst);
        loop {
            if self
                .roots_syncing
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                return;
            }
            while self.roots_dirty.swap(false, Ordering::SeqCst) {
                let roots = workspace.try_get_roots();
                self.reconcile(&roots);
            }
            self.roots_syncing.store(false, Ordering::SeqCst);
            if !self.roots_dirty.load(Ordering::SeqCst) {
                return;
            }
        }
    }

    /// Synchronize the resolver set with `folders`
    pub fn reconcile(&self, folders: &[WorkspaceFolder]) -> ReconcileReport {
        self.registry.write().reconcile(folders)
    }

    fn snapshot(&self) -> RegistrySnapshot {
        self.registry.read().snapshot()
    }

    /// Folder URIs currently known
    pub fn domain(&self) -> Vec<ResourceUri> {
        self.registry.read().domain()
    }

    /// Folders currently known, in declaration order
    pub fn folders(&self) -> Vec<WorkspaceFolder> {
        self.registry.read().folders().to_vec()
    }

    /// Locations of every live resolver, in generation order
    pub fn live_locations(&self) -> Vec<ConfigLocation> {
        self.registry
            .read()
            .records()
            .iter()
            .map(|r| r.location().clone())
            .collect()
    }

    /// The winning resolver group for `resource`, highest precedence first
    pub fn rank(&self, resource: Option<&ResourceUri>) -> Vec<Candidate> {
        precedence::rank(&self.snapshot(), resource)
    }

    /// The settings file a generic preference write for `resource` would land in
    pub fn config_uri_for(&self, resource: Option<&ResourceUri>) -> Option<ResourceUri> {
        self.config_uri_for_file(resource, ConfigFile::Settings)
    }

    /// First live resolver governing `resource` whose backing file is `file`
    ///
    /// Scans every live resolver in generation order, not only the ranked group.
    pub fn config_uri_for_file(&self, resource: Option<&ResourceUri>, file: ConfigFile) -> Option<ResourceUri> {
        let resource = resource?;
        self.snapshot().candidates.iter().find_map(|c| {
            c.resolver
                .config_uri_for(resource)
                .filter(|uri| ConfigFile::of_uri(uri) == Some(file))
        })
    }

    /// Effective value of `key` for `resource`
    ///
    /// Only the winning group is consulted; a key it does not define is
    /// reported as unset even if a farther folder or directory defines it.
    pub fn resolve_value(&self, key: &str, resource: Option<&ResourceUri>) -> ResolvedValue {
        let Some(resource) = resource else {
            return ResolvedValue::empty();
        };
        for candidate in self.rank(Some(resource)) {
            let resolved = candidate.resolver.resolve_value(key, resource);
            if resolved.is_set() {
                return ResolvedValue {
                    value: resolved.value,
                    config_uri: resolved
                        .config_uri
                        .or_else(|| Some(candidate.resolver.config_uri().clone())),
                };
            }
        }
        ResolvedValue::empty()
    }

    /// All preferences of the winning group for `resource`
    ///
    /// Higher-precedence files overwrite lower ones key by key.
    pub fn merged_preferences(&self, resource: Option<&ResourceUri>) -> PreferenceMap {
        let mut merged = PreferenceMap::new();
        for candidate in self.rank(resource).iter().rev() {
            for (key, value) in candidate.resolver.all_preferences() {
                merged.insert(key, value);
            }
        }
        merged
    }

    /// Write `key` to the highest-precedence resolver that accepts it
    ///
    /// Returns `Ok(false)` when no resolver took the write.
    pub async fn write_preference(
        &self,
        key: &str,
        value: PreferenceValue,
        resource: Option<&ResourceUri>,
    ) -> FolderConfigResult<bool> {
        self.write_through(key, Some(value), resource).await
    }

    /// Remove `key` from the highest-precedence resolver that accepts it
    pub async fn remove_preference(&self, key: &str, resource: Option<&ResourceUri>) -> FolderConfigResult<bool> {
        self.write_through(key, None, resource).await
    }

    async fn write_through(
        &self,
        key: &str,
        value: Option<PreferenceValue>,
        resource: Option<&ResourceUri>,
    ) -> FolderConfigResult<bool> {
        let Some(resource) = resource else {
            return Ok(false);
        };
        for candidate in self.rank(Some(resource)) {
            match candidate.resolver.write_value(key, value.clone(), resource).await {
                Ok(true) => {
                    log_debug!(self.options.logger, "Wrote {} to {}", key, candidate.resolver.config_uri());
                    return Ok(true);
                }
                Ok(false) => continue,
                Err(e) => match self.options.write_failure_policy {
                    WriteFailurePolicy::Isolate => {
                        log_warn!(
                            self.options.logger,
                            "Write of {} to {} failed, trying next: {}",
                            key,
                            candidate.resolver.config_uri(),
                            e
                        );
                    }
                    WriteFailurePolicy::Abort => return Err(e),
                },
            }
        }
        Ok(false)
    }

    /// Wait until every currently registered resolver has settled
    ///
    /// Failures are logged and reported, never propagated.
    pub async fn ready(&self) -> Readiness {
        let candidates = self.snapshot().candidates;
        let results = join_all(candidates.iter().map(|c| async move {
            (c.location.identity(), c.resolver.ready().await)
        }))
        .await;

        let mut readiness = Readiness {
            settled: results.len(),
            failed: Vec::new(),
        };
        for (identity, result) in results {
            if let Err(e) = result {
                log_error!(self.options.logger, "Folder preferences {} failed to load: {}", identity, e);
                readiness.failed.push(identity);
            }
        }
        readiness
    }

    /// Receive change deltas from every live resolver
    pub fn subscribe(&self) -> broadcast::Receiver<PreferenceChangeEvent> {
        self.changes.subscribe()
    }

    /// Stop following the workspace and dispose every resolver
    pub fn dispose(&self) {
        if let Some(subscription) = self.workspace_subscription.lock().take() {
            subscription.dispose();
        }
        self.registry.write().dispose_all();
    }
}

impl std::fmt::Debug for FoldersPreferences {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.registry.read();
        f.debug_struct("FoldersPreferences")
            .field("folders", &registry.domain())
            .field("resolvers", &registry.len())
            .field("options", &self.options)
            .finish()
    }
}
