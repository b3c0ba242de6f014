//! Preference values, query results and change payloads

use serde::{Deserialize, Serialize};

use super::uri::ResourceUri;

/// A single preference value
pub type PreferenceValue = serde_json::Value;

/// A flat key → value preference set
pub type PreferenceMap = serde_json::Map<String, PreferenceValue>;

/// Result of resolving a single preference key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedValue {
    /// The winning value, if any resolver defined one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<PreferenceValue>,
    /// The configuration file the value came from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_uri: Option<ResourceUri>,
}

impl ResolvedValue {
    pub fn new(value: PreferenceValue, config_uri: ResourceUri) -> Self {
        Self {
            value: Some(value),
            config_uri: Some(config_uri),
        }
    }

    /// "Not configured": no value, no source
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether a non-null value was found
    pub fn is_set(&self) -> bool {
        matches!(&self.value, Some(v) if !v.is_null())
    }
}

/// A single key's change inside one configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceChange {
    pub key: String,
    pub old_value: Option<PreferenceValue>,
    pub new_value: Option<PreferenceValue>,
}

impl PreferenceChange {
    pub fn new(
        key: impl Into<String>,
        old_value: Option<PreferenceValue>,
        new_value: Option<PreferenceValue>,
    ) -> Self {
        Self {
            key: key.into(),
            old_value,
            new_value,
        }
    }
}

/// Delta payload fired by a resolver when its configuration file changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceChangeEvent {
    pub config_uri: ResourceUri,
    pub changes: Vec<PreferenceChange>,
}

impl PreferenceChangeEvent {
    /// Compute the per-key delta between two preference sets
    pub fn diff(config_uri: ResourceUri, before: &PreferenceMap, after: &PreferenceMap) -> Self {
        let mut changes = Vec::new();
        for (key, old) in before {
            match after.get(key) {
                Some(new) if new == old => {}
                new => changes.push(PreferenceChange::new(key, Some(old.clone()), new.cloned())),
            }
        }
        for (key, new) in after {
            if !before.contains_key(key) {
                changes.push(PreferenceChange::new(key, None, Some(new.clone())));
            }
        }
        Self { config_uri, changes }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Whether the given key changed
    pub fn affects(&self, key: &str) -> bool {
        self.changes.iter().any(|c| c.key == key)
    }
}
