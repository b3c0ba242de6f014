//! Per-folder preference resolution
//!
//! - `ResolverRegistry`: one resolver per (folder, directory, file), kept in
//!   sync with the workspace folders
//! - `precedence`: ranking of resolvers for a resource
//! - `FoldersPreferences`: the query façade

mod options;
mod registry;
pub mod precedence;
mod folders;

pub use options::{FoldersPreferencesOptions, WriteFailurePolicy};
pub use registry::{ResolverRegistry, ResolverRecord, ReconcileReport};
pub use precedence::{Candidate, RankKey, RegistrySnapshot};
pub use folders::{FoldersPreferences, Readiness};
