//! Resolver registry and reconciliation
//!
//! The registry owns exactly one `FolderConfigResolver` per configuration
//! location of the current workspace folders. `reconcile` brings it in line
//! with a new folder list:
//!
//! 1. Every location of every folder (folder × directory × file) is desired.
//! 2. Desired locations that already have a record keep it untouched, so
//!    loaded values, pending writes and watchers survive workspace churn.
//! 3. Missing locations get a fresh resolver from the factory.
//! 4. Records no longer desired are disposed, once, and dropped.
//!
//! Records are kept in generation order (folder declaration order, then
//! directory priority, then file priority).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::{FolderConfigResolver, ResolverFactory};
use crate::logging::SharedLogger;
use crate::types::{ConfigLocation, PreferenceChangeEvent, ResourceUri, Subscription, WorkspaceFolder};
use crate::{log_debug, log_info};

use super::precedence::{Candidate, RegistrySnapshot};

/// One live resolver and its change-forwarding subscription
pub struct ResolverRecord {
    identity: String,
    location: ConfigLocation,
    resolver: Arc<dyn FolderConfigResolver>,
    forwarder: Subscription,
}

impl ResolverRecord {
    /// Canonical config file URI string
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn location(&self) -> &ConfigLocation {
        &self.location
    }

    pub fn resolver(&self) -> &Arc<dyn FolderConfigResolver> {
        &self.resolver
    }

    fn dispose(self) {
        self.forwarder.dispose();
        self.resolver.dispose();
    }
}

impl std::fmt::Debug for ResolverRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverRecord")
            .field("identity", &self.identity)
            .finish()
    }
}

/// What a reconciliation run changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Identities of newly created resolvers, in generation order
    pub created: Vec<String>,
    /// Number of records kept as they were
    pub retained: usize,
    /// Identities of disposed resolvers, in their previous registry order
    pub disposed: Vec<String>,
}

impl ReconcileReport {
    /// Whether the run left the registry unchanged
    pub fn is_noop(&self) -> bool {
        self.created.is_empty() && self.disposed.is_empty()
    }
}

/// Owner of the live resolver set
pub struct ResolverRegistry {
    factory: ResolverFactory,
    folders: Vec<WorkspaceFolder>,
    records: Vec<ResolverRecord>,
    changes: broadcast::Sender<PreferenceChangeEvent>,
    logger: SharedLogger,
}

impl ResolverRegistry {
    /// Create an empty registry
    ///
    /// Change events of every registered resolver are re-sent on `changes`.
    pub fn new(
        factory: ResolverFactory,
        changes: broadcast::Sender<PreferenceChangeEvent>,
        logger: SharedLogger,
    ) -> Self {
        Self {
            factory,
            folders: Vec::new(),
            records: Vec::new(),
            changes,
            logger,
        }
    }

    /// Synchronize the live resolver set with `folders`
    ///
    /// Duplicate folders (same URI) are collapsed onto their first occurrence.
    pub fn reconcile(&mut self, folders: &[WorkspaceFolder]) -> ReconcileReport {
        let mut seen = HashSet::new();
        let folders: Vec<WorkspaceFolder> = folders
            .iter()
            .filter(|f| seen.insert(f.uri.clone()))
            .cloned()
            .collect();

        let previous_order: Vec<String> = self.records.iter().map(|r| r.identity.clone()).collect();
        let mut existing: HashMap<String, ResolverRecord> = self
            .records
            .drain(..)
            .map(|r| (r.identity.clone(), r))
            .collect();

        let mut report = ReconcileReport::default();
        let mut records = Vec::with_capacity(folders.len() * 4);
        for folder in &folders {
            for location in ConfigLocation::candidates(std::slice::from_ref(folder)) {
                let identity = location.identity();
                match existing.remove(&identity) {
                    Some(record) => {
                        report.retained += 1;
                        records.push(record);
                    }
                    None => {
                        records.push(self.create_record(folder, location, identity.clone()));
                        report.created.push(identity);
                    }
                }
            }
        }
        self.records = records;
        self.folders = folders;

        // Whatever is left in `existing` is no longer desired
        for identity in previous_order {
            if let Some(record) = existing.remove(&identity) {
                record.dispose();
                report.disposed.push(identity);
            }
        }

        if report.is_noop() {
            log_debug!(self.logger, "Reconciled {} folders: no changes", self.folders.len());
        } else {
            log_info!(
                self.logger,
                "Reconciled {} folders: {} created, {} retained, {} disposed",
                self.folders.len(),
                report.created.len(),
                report.retained,
                report.disposed.len()
            );
        }
        report
    }

    fn create_record(&self, folder: &WorkspaceFolder, location: ConfigLocation, identity: String) -> ResolverRecord {
        let resolver = (self.factory)(folder, &location);
        let sender = self.changes.clone();
        // send() only fails when nobody is subscribed
        let forwarder = resolver.on_did_change(Arc::new(move |event: &PreferenceChangeEvent| {
            let _ = sender.send(event.clone());
        }));
        ResolverRecord {
            identity,
            location,
            resolver,
            forwarder,
        }
    }

    /// Dispose every resolver and forget all folders
    ///
    /// Returns the number of disposed resolvers.
    pub fn dispose_all(&mut self) -> usize {
        let count = self.records.len();
        for record in self.records.drain(..) {
            record.dispose();
        }
        self.folders.clear();
        if count > 0 {
            log_debug!(self.logger, "Disposed {} folder resolvers", count);
        }
        count
    }

    /// Current folders in declaration order
    pub fn folders(&self) -> &[WorkspaceFolder] {
        &self.folders
    }

    /// Current folder URIs
    pub fn domain(&self) -> Vec<ResourceUri> {
        self.folders.iter().map(|f| f.uri.clone()).collect()
    }

    /// Live records in generation order
    pub fn records(&self) -> &[ResolverRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consistent copy of the live set for one query
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            folders: self.folders.clone(),
            candidates: self
                .records
                .iter()
                .map(|r| Candidate {
                    location: r.location.clone(),
                    resolver: r.resolver.clone(),
                })
                .collect(),
        }
    }
}

impl Drop for ResolverRegistry {
    fn drop(&mut self) {
        self.dispose_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryResolverFactory;
    use crate::logging::NoOpLogger;
    use crate::types::{ConfigDirectory, ConfigFile};
    use serde_json::json;

    fn folder(path: &str) -> WorkspaceFolder {
        WorkspaceFolder::new(ResourceUri::parse(path).unwrap())
    }

    fn registry(factory: &Arc<MemoryResolverFactory>) -> (ResolverRegistry, broadcast::Receiver<PreferenceChangeEvent>) {
        let (tx, rx) = broadcast::channel(16);
        (ResolverRegistry::new(factory.factory(), tx, Arc::new(NoOpLogger::new())), rx)
    }

    #[test]
    fn test_four_resolvers_per_folder() {
        let factory = Arc::new(MemoryResolverFactory::new());
        let (mut registry, _rx) = registry(&factory);

        let report = registry.reconcile(&[folder("/root/a"), folder("/root/b"), folder("/root/c")]);
        assert_eq!(registry.len(), 12);
        assert_eq!(report.created.len(), 12);
        assert_eq!(report.retained, 0);

        let identities: HashSet<&str> = registry.records().iter().map(|r| r.identity()).collect();
        assert_eq!(identities.len(), 12);
        assert_eq!(registry.records()[0].identity(), "file:///root/a/.folderprefs/launch.json");
        assert_eq!(registry.records()[11].identity(), "file:///root/c/.vscode/settings.json");
    }

    #[test]
    fn test_duplicate_folders_collapse() {
        let factory = Arc::new(MemoryResolverFactory::new());
        let (mut registry, _rx) = registry(&factory);

        registry.reconcile(&[folder("/root/a"), folder("/root/a/")]);
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.folders().len(), 1);
    }

    #[test]
    fn test_unchanged_folders_are_not_recreated() {
        let factory = Arc::new(MemoryResolverFactory::new());
        let (mut registry, _rx) = registry(&factory);

        registry.reconcile(&[folder("/root/a")]);
        let report = registry.reconcile(&[folder("/root/a"), folder("/root/b")]);

        assert_eq!(report.retained, 4);
        assert_eq!(report.created.len(), 4);
        assert!(report.disposed.is_empty());
        assert_eq!(factory.created().len(), 8);
        assert!(factory.created().iter().all(|r| r.dispose_calls() == 0));

        let again = registry.reconcile(&[folder("/root/a"), folder("/root/b")]);
        assert!(again.is_noop());
        assert_eq!(factory.created().len(), 8);
    }

    #[test]
    fn test_removed_folder_disposed_once() {
        let factory = Arc::new(MemoryResolverFactory::new());
        let (mut registry, _rx) = registry(&factory);

        registry.reconcile(&[folder("/root/a"), folder("/root/b")]);
        let report = registry.reconcile(&[folder("/root/b")]);

        assert_eq!(report.disposed.len(), 4);
        assert!(report.disposed.iter().all(|id| id.starts_with("file:///root/a/")));
        assert_eq!(registry.len(), 4);

        for resolver in factory.created() {
            let expected = usize::from(resolver.folder().uri.as_str() == "file:///root/a");
            assert_eq!(resolver.dispose_calls(), expected);
        }

        registry.reconcile(&[folder("/root/b")]);
        assert!(factory.created().iter().all(|r| r.dispose_calls() <= 1));
    }

    #[test]
    fn test_generation_order_follows_new_folder_order() {
        let factory = Arc::new(MemoryResolverFactory::new());
        let (mut registry, _rx) = registry(&factory);

        registry.reconcile(&[folder("/root/a"), folder("/root/b")]);
        registry.reconcile(&[folder("/root/b"), folder("/root/a")]);

        assert_eq!(factory.created().len(), 8);
        assert_eq!(registry.records()[0].identity(), "file:///root/b/.folderprefs/launch.json");
        assert_eq!(registry.records()[4].identity(), "file:///root/a/.folderprefs/launch.json");
    }

    #[tokio::test]
    async fn test_changes_are_forwarded_until_disposed() {
        let factory = Arc::new(MemoryResolverFactory::new());
        let (mut registry, mut rx) = registry(&factory);
        registry.reconcile(&[folder("/root/a")]);

        let location = ConfigLocation::new(
            ResourceUri::parse("/root/a").unwrap(),
            ConfigDirectory::Primary,
            ConfigFile::Settings,
        );
        let resolver = factory.created_for(&location.config_uri()).pop().unwrap();
        resolver.set_values(json!({"k": 1}).as_object().cloned().unwrap());

        let event = rx.recv().await.unwrap();
        assert_eq!(event.config_uri, location.config_uri());
        assert!(event.affects("k"));

        registry.reconcile(&[]);
        assert_eq!(resolver.listener_count(), 0);
        assert!(resolver.is_disposed());
    }

    #[test]
    fn test_drop_disposes_remaining() {
        let factory = Arc::new(MemoryResolverFactory::new());
        {
            let (mut registry, _rx) = registry(&factory);
            registry.reconcile(&[folder("/root/a")]);
            assert_eq!(registry.dispose_all(), 4);
            registry.reconcile(&[folder("/root/b")]);
        }
        assert!(factory.created().iter().all(|r| r.dispose_calls() == 1));
    }
}
