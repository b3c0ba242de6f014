//! In-memory workspace root source

use async_trait::async_trait;
use parking_lot::RwLock;

use super::traits::WorkspaceRoots;
use crate::types::{Emitter, Listener, Subscription, WorkspaceFolder};

/// Workspace whose roots are set programmatically
#[derive(Default)]
pub struct MemoryWorkspace {
    roots: RwLock<Vec<WorkspaceFolder>>,
    emitter: Emitter<Vec<WorkspaceFolder>>,
}

impl MemoryWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_roots(roots: Vec<WorkspaceFolder>) -> Self {
        Self {
            roots: RwLock::new(roots),
            emitter: Emitter::new(),
        }
    }

    /// Replace the root list and notify listeners
    pub fn set_roots(&self, roots: Vec<WorkspaceFolder>) {
        *self.roots.write() = roots.clone();
        self.emitter.fire(&roots);
    }

    /// Append one root and notify listeners
    pub fn add_root(&self, folder: WorkspaceFolder) {
        let roots = {
            let mut roots = self.roots.write();
            roots.push(folder);
            roots.clone()
        };
        self.emitter.fire(&roots);
    }

    /// Remove a root by URI; returns whether it was present
    pub fn remove_root(&self, folder: &WorkspaceFolder) -> bool {
        let roots = {
            let mut roots = self.roots.write();
            let before = roots.len();
            roots.retain(|r| r.uri != folder.uri);
            if roots.len() == before {
                return false;
            }
            roots.clone()
        };
        self.emitter.fire(&roots);
        true
    }
}

#[async_trait]
impl WorkspaceRoots for MemoryWorkspace {
    async fn roots(&self) -> Vec<WorkspaceFolder> {
        self.try_get_roots()
    }

    fn try_get_roots(&self) -> Vec<WorkspaceFolder> {
        self.roots.read().clone()
    }

    fn on_did_change_roots(&self, listener: Listener<Vec<WorkspaceFolder>>) -> Subscription {
        self.emitter.subscribe(listener)
    }
}
