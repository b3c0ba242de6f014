//! Workspace root sources
//!
//! - `WorkspaceRoots`: the consumed interface
//! - `MemoryWorkspace`: In-memory implementation

mod traits;
mod memory;

pub use traits::WorkspaceRoots;
pub use memory::MemoryWorkspace;
