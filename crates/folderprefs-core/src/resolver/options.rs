//! Façade options

use std::sync::Arc;

use crate::logging::{NoOpLogger, SharedLogger};

/// What `write_preference` does when a resolver's write errors out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteFailurePolicy {
    /// Log the error and try the next-ranked resolver
    #[default]
    Isolate,
    /// Stop and return the error to the caller
    Abort,
}

impl WriteFailurePolicy {
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "abort" | "propagate" | "fail-fast" => WriteFailurePolicy::Abort,
            _ => WriteFailurePolicy::Isolate,
        }
    }
}

/// Options for `FoldersPreferences`
#[derive(Clone)]
pub struct FoldersPreferencesOptions {
    pub logger: SharedLogger,
    pub write_failure_policy: WriteFailurePolicy,
}

impl Default for FoldersPreferencesOptions {
    fn default() -> Self {
        Self {
            logger: Arc::new(NoOpLogger::new()),
            write_failure_policy: WriteFailurePolicy::default(),
        }
    }
}

impl FoldersPreferencesOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options whose write policy comes from `FOLDERPREFS_WRITE_FAILURES`
    pub fn from_env() -> Self {
        let policy = std::env::var("FOLDERPREFS_WRITE_FAILURES")
            .map(|v| WriteFailurePolicy::from_str(&v))
            .unwrap_or_default();
        Self::default().with_write_failure_policy(policy)
    }

    pub fn with_logger(mut self, logger: SharedLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_write_failure_policy(mut self, policy: WriteFailurePolicy) -> Self {
        self.write_failure_policy = policy;
        self
    }
}

impl std::fmt::Debug for FoldersPreferencesOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FoldersPreferencesOptions")
            .field("write_failure_policy", &self.write_failure_policy)
            .finish()
    }
}
