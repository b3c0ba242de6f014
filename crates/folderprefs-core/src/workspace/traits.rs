//! Workspace root source trait

use async_trait::async_trait;

use crate::types::{Listener, Subscription, WorkspaceFolder};

/// Source of the current workspace roots
///
/// Implementations:
/// - `MemoryWorkspace`: In-memory root list for tests and embedders
/// - Host adapters: an editor's workspace service, an LSP client's folder list
#[async_trait]
pub trait WorkspaceRoots: Send + Sync {
    /// The root list once the workspace has finished opening
    async fn roots(&self) -> Vec<WorkspaceFolder>;

    /// The root list as currently known, without waiting
    fn try_get_roots(&self) -> Vec<WorkspaceFolder>;

    /// Fires with the new root list whenever the set of roots changes
    fn on_did_change_roots(&self, listener: Listener<Vec<WorkspaceFolder>>) -> Subscription;
}
