//! Core types shared by the registry, the precedence resolver and the façade

mod uri;
mod folder;
mod location;
mod preference;
mod events;

pub use uri::{ResourceUri, ResourceUriError};
pub use folder::WorkspaceFolder;
pub use location::{ConfigDirectory, ConfigFile, ConfigLocation};
pub use preference::{
    PreferenceValue, PreferenceMap, ResolvedValue,
    PreferenceChange, PreferenceChangeEvent,
};
pub use events::{Subscription, Emitter, Listener};
