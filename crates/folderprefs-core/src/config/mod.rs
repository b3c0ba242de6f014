//! Folder configuration resolvers
//!
//! One resolver backs one configuration file of one workspace folder:
//! - `FolderConfigResolver`: the consumed interface
//! - `MemoryFolderResolver`: In-memory implementation for tests and embedders

mod traits;
mod memory;

pub use traits::{FolderConfigResolver, FolderConfigError, FolderConfigResult, ResolverFactory};
pub use memory::{MemoryFolderResolver, MemoryResolverFactory};
