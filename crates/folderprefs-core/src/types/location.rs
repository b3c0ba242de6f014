//! The fixed matrix of configuration locations per folder
//!
//! Every workspace folder has up to four candidate configuration files:
//!
//! | directory      | file            |
//! |----------------|-----------------|
//! | `.folderprefs` | `launch.json`   |
//! | `.folderprefs` | `settings.json` |
//! | `.vscode`      | `launch.json`   |
//! | `.vscode`      | `settings.json` |
//!
//! Both axes are listed in priority order. The matrix is part of the public
//! contract and cannot be changed at runtime.

use serde::{Deserialize, Serialize};

use super::folder::WorkspaceFolder;
use super::uri::ResourceUri;

/// Configuration directory axis, highest priority first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigDirectory {
    /// Tool-specific directory (`.folderprefs`)
    Primary,
    /// Compatibility directory (`.vscode`)
    Compat,
}

impl ConfigDirectory {
    /// All directories in priority order
    pub const ALL: [ConfigDirectory; 2] = [ConfigDirectory::Primary, ConfigDirectory::Compat];

    pub fn dir_name(self) -> &'static str {
        match self {
            ConfigDirectory::Primary => ".folderprefs",
            ConfigDirectory::Compat => ".vscode",
        }
    }
}

/// Configuration file axis, highest priority first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigFile {
    /// Execution/launch configuration (`launch.json`)
    Launch,
    /// General settings (`settings.json`)
    Settings,
}

impl ConfigFile {
    /// All files in priority order
    pub const ALL: [ConfigFile; 2] = [ConfigFile::Launch, ConfigFile::Settings];

    pub fn file_name(self) -> &'static str {
        match self {
            ConfigFile::Launch => "launch.json",
            ConfigFile::Settings => "settings.json",
        }
    }

    pub fn from_file_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.file_name() == name)
    }

    /// Classify a configuration file URI by its file name
    pub fn of_uri(uri: &ResourceUri) -> Option<Self> {
        uri.file_name().and_then(Self::from_file_name)
    }
}

/// One (folder, directory, file) configuration location
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigLocation {
    pub folder: ResourceUri,
    pub directory: ConfigDirectory,
    pub file: ConfigFile,
}

impl ConfigLocation {
    pub fn new(folder: ResourceUri, directory: ConfigDirectory, file: ConfigFile) -> Self {
        Self { folder, directory, file }
    }

    /// URI of the backing configuration file
    pub fn config_uri(&self) -> ResourceUri {
        self.directory_uri().join(self.file.file_name())
    }

    /// URI of the configuration directory
    pub fn directory_uri(&self) -> ResourceUri {
        self.folder.join(self.directory.dir_name())
    }

    /// Registry identity: the canonical string of the config file URI
    pub fn identity(&self) -> String {
        self.config_uri().to_string()
    }

    /// Identity of the (folder, directory) group this location belongs to
    pub fn directory_identity(&self) -> String {
        self.directory_uri().to_string()
    }

    /// All candidate locations for the given folders, in generation order:
    /// folder order, then directory priority, then file priority.
    pub fn candidates(folders: &[WorkspaceFolder]) -> Vec<ConfigLocation> {
        let mut locations = Vec::with_capacity(folders.len() * 4);
        for folder in folders {
            for directory in ConfigDirectory::ALL {
                for file in ConfigFile::ALL {
                    locations.push(ConfigLocation::new(folder.uri.clone(), directory, file));
                }
            }
        }
        locations
    }
}
