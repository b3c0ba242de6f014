//! Precedence ranking of folder resolvers for a resource
//!
//! For a given resource, only resolvers that govern it are considered. Each is
//! scored with a `RankKey`:
//!
//! 1. relativity: depth of the enclosing folder (deeper is more specific)
//! 2. folder order: earlier-declared workspace root wins a tie
//! 3. directory priority: `.folderprefs` before `.vscode`
//! 4. file priority: `launch.json` before `settings.json`
//!
//! The first three components pick one (folder, directory) group; the result
//! is that group's resolvers ordered by file priority. Nothing outside the
//! winning group takes part in a query.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::config::FolderConfigResolver;
use crate::logging::file_logger;
use crate::types::{ConfigDirectory, ConfigFile, ConfigLocation, ResourceUri, WorkspaceFolder};

/// A live resolver together with its location
#[derive(Clone)]
pub struct Candidate {
    pub location: ConfigLocation,
    pub resolver: Arc<dyn FolderConfigResolver>,
}

impl std::fmt::Debug for Candidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Candidate")
            .field("location", &self.location)
            .finish()
    }
}

/// Consistent copy of the registry taken at query time
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    pub folders: Vec<WorkspaceFolder>,
    pub candidates: Vec<Candidate>,
}

impl RegistrySnapshot {
    /// Declaration index of a folder
    pub fn folder_order(&self, folder: &ResourceUri) -> Option<usize> {
        self.folders.iter().position(|f| &f.uri == folder)
    }
}

/// How deeply `folder` encloses `resource`
///
/// `None` when the folder does not enclose the resource at all.
pub fn relativity(folder: &ResourceUri, resource: &ResourceUri) -> Option<usize> {
    if folder.encloses(resource) {
        Some(folder.depth())
    } else {
        None
    }
}

/// Explicit precedence of one candidate; greater means higher precedence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankKey {
    pub relativity: usize,
    pub folder_order: usize,
    pub directory: ConfigDirectory,
    pub file: ConfigFile,
}

impl RankKey {
    /// Whether both keys belong to the same (folder, directory) group
    pub fn same_group(&self, other: &RankKey) -> bool {
        self.cmp_group(other) == Ordering::Equal
    }

    fn cmp_group(&self, other: &RankKey) -> Ordering {
        self.relativity
            .cmp(&other.relativity)
            .then_with(|| other.folder_order.cmp(&self.folder_order))
            .then_with(|| other.directory.cmp(&self.directory))
    }
}

impl Ord for RankKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_group(other).then_with(|| other.file.cmp(&self.file))
    }
}

impl PartialOrd for RankKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Score a candidate for `resource`, or `None` if it does not apply
pub fn rank_key(snapshot: &RegistrySnapshot, candidate: &Candidate, resource: &ResourceUri) -> Option<RankKey> {
    candidate.resolver.config_uri_for(resource)?;
    Some(RankKey {
        relativity: relativity(&candidate.location.folder, resource)?,
        folder_order: snapshot.folder_order(&candidate.location.folder)?,
        directory: candidate.location.directory,
        file: candidate.location.file,
    })
}

/// Resolvers of the winning group for `resource`, highest precedence first
pub fn rank(snapshot: &RegistrySnapshot, resource: Option<&ResourceUri>) -> Vec<Candidate> {
    let Some(resource) = resource else {
        return Vec::new();
    };

    let mut scored: Vec<(RankKey, &Candidate)> = snapshot
        .candidates
        .iter()
        .filter_map(|c| rank_key(snapshot, c, resource).map(|key| (key, c)))
        .collect();

    let Some(best) = scored.iter().map(|(key, _)| *key).max() else {
        if file_logger::trace_enabled() {
            file_logger::trace("precedence", &format!("rank {}: no applicable resolvers", resource));
        }
        return Vec::new();
    };

    scored.retain(|(key, _)| key.same_group(&best));
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    if file_logger::trace_enabled() {
        let group = scored
            .first()
            .map(|(_, c)| c.location.directory_identity())
            .unwrap_or_default();
        let winners: Vec<&str> = scored.iter().map(|(_, c)| c.location.file.file_name()).collect();
        file_logger::trace(
            "precedence",
            &format!("rank {}: relativity={} group={} -> {:?}", resource, best.relativity, group, winners),
        );
    }

    scored.into_iter().map(|(_, c)| c.clone()).collect()
}
