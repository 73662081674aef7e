use crate::common::data::PathConfig;
use std::collections::BTreeMap;

const ROOT_PATH: &str = "/";

/// A registered path: its response configuration plus the number of requests it served.
#[derive(Debug, Clone, Default)]
pub(crate) struct PathRegistration {
    pub config: PathConfig,
    pub hits: usize,
}

/// Maps exact path strings to their registrations.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    entries: BTreeMap<String, PathRegistration>,
}

impl Registry {
    /// Returns the registration for `path`, creating a default one if the path is unknown.
    /// Registering the same path twice yields the same entry.
    pub fn register(&mut self, path: &str) -> &mut PathRegistration {
        if !self.entries.contains_key(path) {
            if !path.starts_with('/') {
                tracing::warn!(
                    "Registering path '{}' which does not start with '/'. It will never match a request.",
                    path
                );
            }
            tracing::debug!("Registering new path '{}'", path);
        }

        self.entries.entry(path.to_string()).or_default()
    }

    /// Exact, case-sensitive lookup without any normalization.
    pub fn lookup(&self, path: &str) -> Option<&PathRegistration> {
        self.entries.get(path)
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Finds the registration responsible for a request to `path`.
    ///
    /// If the root path is the one and only registration, it handles every path. Otherwise
    /// only an exact match is returned. Note that this makes the routing of the root path
    /// depend on how many paths are registered.
    pub fn resolve_mut(&mut self, path: &str) -> Option<&mut PathRegistration> {
        if self.entries.len() == 1 && self.entries.contains_key(ROOT_PATH) {
            return self.entries.get_mut(ROOT_PATH);
        }

        self.entries.get_mut(path)
    }
}
