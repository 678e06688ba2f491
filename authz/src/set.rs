//! The ordered collection of grants held by a repository.

use crate::error::{AuthzError, Result};
use crate::groups::GroupRegistry;
use crate::types::{by_path_then_mode_then_principal, AccessMode, Authorization, Principal};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Grants kept sorted by [`by_path_then_mode_then_principal`], without exact
/// duplicates.
///
/// The same principal may hold both `r` and `rw` on one path; only an
/// identical `(path, principal, mode)` triple counts as a duplicate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Authorization>", into = "Vec<Authorization>")]
pub struct AuthorizationSet {
    entries: Vec<Authorization>,
}

impl AuthorizationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a grant after checking that a referenced group exists and the
    /// triple is not already present. The set is unchanged on error.
    pub fn add(
        &mut self,
        path: &str,
        principal: Principal,
        mode: AccessMode,
        groups: &GroupRegistry,
    ) -> Result<()> {
        let authorization = Authorization::new(path, principal, mode)?;

        if let Principal::Group(name) = authorization.principal() {
            if !groups.contains(name) {
                return Err(AuthzError::UnknownGroup(name.clone()));
            }
        }

        self.insert(authorization)
    }

    /// Inserts a validated grant at its sorted position.
    fn insert(&mut self, authorization: Authorization) -> Result<()> {
        match self
            .entries
            .binary_search_by(|probe| by_path_then_mode_then_principal(probe, &authorization))
        {
            Ok(_) => Err(AuthzError::DuplicateAuthorization {
                path: authorization.path().to_string(),
                principal: authorization.principal().to_string(),
                mode: authorization.mode().to_string(),
            }),
            Err(index) => {
                debug!("Adding authorization {}", authorization);
                self.entries.insert(index, authorization);
                Ok(())
            }
        }
    }

    /// Removes every grant for `principal` on `path`, whatever its mode.
    pub fn remove(&mut self, path: &str, principal: &Principal) -> usize {
        let before = self.entries.len();
        self.entries.retain(|a| !a.matches(path, principal));
        let removed = before - self.entries.len();
        debug!("Removed {} authorizations for {} on {}", removed, principal, path);
        removed
    }

    /// Removes every grant for `principal` on any path.
    pub fn remove_by_principal(&mut self, principal: &Principal) -> usize {
        let before = self.entries.len();
        self.entries.retain(|a| a.principal() != principal);
        let removed = before - self.entries.len();
        debug!("Removed {} authorizations for {}", removed, principal);
        removed
    }

    /// Exact triple membership.
    pub fn exists(&self, path: &str, principal: &Principal, mode: AccessMode) -> bool {
        self.entries
            .iter()
            .any(|a| a.matches(path, principal) && a.mode() == mode)
    }

    /// Whether `principal` holds any grant on `path`.
    pub fn exists_any_mode(&self, path: &str, principal: &Principal) -> bool {
        AccessMode::ALL
            .iter()
            .any(|mode| self.exists(path, principal, *mode))
    }

    /// Sorted, deduplicated users who can reach the repository.
    ///
    /// Group grants are expanded through `groups`; accounts in `excluded`
    /// are left out even when granted directly.
    pub fn list_users(&self, groups: &GroupRegistry, excluded: &[String]) -> Vec<String> {
        let mut users = BTreeSet::new();

        for authorization in &self.entries {
            match authorization.principal() {
                Principal::User(name) => {
                    users.insert(name.as_str());
                }
                Principal::Group(name) => {
                    users.extend(groups.members(name).iter().map(String::as_str));
                }
            }
        }

        users
            .into_iter()
            .filter(|user| !excluded.iter().any(|e| e == user))
            .map(str::to_string)
            .collect()
    }

    /// Distinct paths, ascending.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.entries.iter().map(Authorization::path).collect();
        paths.dedup();
        paths
    }

    /// Grants on exactly `path`, in canonical order.
    pub fn for_path<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a Authorization> {
        self.entries.iter().filter(move |a| a.path() == path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Authorization> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// Persisted descriptors are re-sorted on load; group references are not
// re-checked because a deleted group may legitimately leave orphans behind.
impl TryFrom<Vec<Authorization>> for AuthorizationSet {
    type Error = AuthzError;

    fn try_from(entries: Vec<Authorization>) -> Result<Self> {
        let mut set = AuthorizationSet::new();
        for authorization in entries {
            set.insert(authorization)?;
        }
        Ok(set)
    }
}

impl From<AuthorizationSet> for Vec<Authorization> {
    fn from(set: AuthorizationSet) -> Self {
        set.entries
    }
}
