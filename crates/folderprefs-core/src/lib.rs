//! folderprefs core
//!
//! Per-folder preference resolution for multi-root workspaces.
//! Every workspace folder carries up to four configuration files, one per
//! (directory, file) pair of `.folderprefs`/`.vscode` and
//! `launch.json`/`settings.json`. This crate keeps one resolver per file in
//! sync with the folder set and answers queries for a resource from the most
//! specific folder's most authoritative files.
//!
//! ```rust,ignore
//! use folderprefs_core::{FoldersPreferences, FoldersPreferencesOptions};
//!
//! let prefs = FoldersPreferences::start(workspace, factory, FoldersPreferencesOptions::from_env()).await;
//! prefs.ready().await;
//!
//! let resolved = prefs.resolve_value("editor.tabSize", Some(&resource));
//! let target = prefs.config_uri_for(Some(&resource));
//! ```
//!
//! File parsing, watching and persisting belong to `FolderConfigResolver`
//! implementations supplied through a `ResolverFactory`.

pub mod types;
pub mod logging;
pub mod config;
pub mod workspace;
pub mod resolver;

// Re-export commonly used types
pub use types::{
    ResourceUri, ResourceUriError, WorkspaceFolder,
    ConfigDirectory, ConfigFile, ConfigLocation,
    PreferenceValue, PreferenceMap, ResolvedValue, PreferenceChange, PreferenceChangeEvent,
    Subscription, Emitter, Listener,
};

pub use logging::{Logger, SharedLogger, NoOpLogger, ConsoleLogger, MemoryLogger, LogLevel};

pub use config::{
    FolderConfigResolver, FolderConfigError, FolderConfigResult, ResolverFactory,
    MemoryFolderResolver, MemoryResolverFactory,
};

pub use workspace::{WorkspaceRoots, MemoryWorkspace};

pub use resolver::{
    FoldersPreferences, FoldersPreferencesOptions, WriteFailurePolicy, Readiness,
    ResolverRegistry, ReconcileReport, Candidate, RankKey,
};
