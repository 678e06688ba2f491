//! The repository descriptor: the unit that is loaded, mutated and saved.

use crate::codec::{self, SkippedLine};
use crate::error::{AuthzError, Result};
use crate::groups::GroupRegistry;
use crate::set::AuthorizationSet;
use crate::types::{AccessMode, Principal};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A repository's identity together with its groups and grants.
///
/// The descriptor owns both the [`GroupRegistry`] and the
/// [`AuthorizationSet`], and is the only place where a change to one is
/// carried over to the other. Nothing here touches the filesystem; callers
/// render and persist after each mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryDescriptor {
    pub name: String,
    /// Slash-separated namespace, empty for top-level repositories.
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub indexing_enabled: bool,
    #[serde(default)]
    groups: GroupRegistry,
    #[serde(default)]
    authorizations: AuthorizationSet,
}

impl RepositoryDescriptor {
    pub fn new(prefix: impl Into<String>, name: impl Into<String>, indexing_enabled: bool) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into().trim_matches('/').to_string(),
            indexing_enabled,
            groups: GroupRegistry::new(),
            authorizations: AuthorizationSet::new(),
        }
    }

    /// `prefix/name`, or just `name` without a prefix.
    pub fn path(&self) -> String {
        self.path_with_separator("/")
    }

    /// The path with `/` replaced, e.g. `its_sakai` for flat file names.
    pub fn path_with_separator(&self, separator: &str) -> String {
        if self.prefix.is_empty() {
            self.name.clone()
        } else {
            format!("{}{}{}", self.prefix.replace('/', separator), separator, self.name)
        }
    }

    pub fn groups(&self) -> &GroupRegistry {
        &self.groups
    }

    pub fn authorizations(&self) -> &AuthorizationSet {
        &self.authorizations
    }

    /// Grants `mode` on `path` to a raw principal (`user` or `@group`).
    pub fn add_authorization(&mut self, path: &str, principal: &str, mode: &str) -> Result<()> {
        let parsed = Principal::parse(principal)?;
        let mode: AccessMode = mode.parse()?;
        self.authorizations.add(path, parsed, mode, &self.groups)?;
        info!(
            "Added authorization ({}, {}, {}) to {}",
            path,
            principal,
            mode,
            self.path()
        );
        Ok(())
    }

    /// Whether `principal` holds any grant on `path`.
    pub fn has_authorization(&self, path: &str, principal: &str) -> Result<bool> {
        let principal = Principal::parse(principal)?;
        Ok(self.authorizations.exists_any_mode(path, &principal))
    }

    /// Removes all of a principal's grants on `path`; returns how many.
    pub fn remove_authorization(&mut self, path: &str, principal: &str) -> Result<usize> {
        let principal = Principal::parse(principal)?;
        Ok(self.authorizations.remove(path, &principal))
    }

    /// Removes every direct grant held by `user`.
    ///
    /// Group memberships are not touched, so the user keeps whatever access
    /// their groups grant.
    pub fn remove_user(&mut self, user: &str) -> Result<usize> {
        let principal = Principal::parse(user)?;
        let removed = self.authorizations.remove_by_principal(&principal);
        debug!("Removed {} grants for {} from {}", removed, user, self.path());
        Ok(removed)
    }

    pub fn add_group(&mut self, name: &str, members: Vec<String>) -> Result<()> {
        self.groups.add(name, members)
    }

    /// Deletes a group along with every `@name` grant; returns the number of
    /// grants removed.
    pub fn remove_group(&mut self, name: &str) -> Result<usize> {
        self.groups.remove(name)?;
        let removed = self
            .authorizations
            .remove_by_principal(&Principal::group(name));
        info!(
            "Removed group {} and {} of its grants from {}",
            name,
            removed,
            self.path()
        );
        Ok(removed)
    }

    pub fn add_group_member(&mut self, name: &str, user: &str) -> Result<()> {
        self.groups.add_member(name, user)
    }

    pub fn remove_group_member(&mut self, name: &str, user: &str) -> Result<()> {
        self.groups.remove_member(name, user)
    }

    /// Whether any grant is held by `@name`.
    pub fn group_has_grants(&self, name: &str) -> bool {
        let group = Principal::group(name);
        self.authorizations.iter().any(|a| a.principal() == &group)
    }

    /// Users with access to the repository, excluding `excluded`.
    pub fn list_users(&self, excluded: &[String]) -> Vec<String> {
        self.authorizations.list_users(&self.groups, excluded)
    }

    /// Users holding a grant on `/`, groups expanded, in first-seen order.
    ///
    /// This is the audience allowed to browse the repository through the
    /// indexing service.
    pub fn index_viewers(&self) -> Vec<String> {
        let mut viewers: Vec<String> = Vec::new();
        for authorization in self.authorizations.for_path("/") {
            let names = match authorization.principal() {
                Principal::User(name) => std::slice::from_ref(name),
                Principal::Group(name) => self.groups.members(name),
            };
            for name in names {
                if !viewers.contains(name) {
                    viewers.push(name.clone());
                }
            }
        }
        viewers
    }

    /// Renders the authz file for this repository.
    pub fn render_acl(&self) -> String {
        codec::render(&self.groups, &self.authorizations)
    }

    /// Replaces groups and grants with the content of an authz file and
    /// returns the lines that could not be imported.
    pub fn import_acl(&mut self, text: &str) -> Vec<SkippedLine> {
        let parsed = codec::parse(text);
        self.groups = parsed.groups;
        self.authorizations = parsed.authorizations;
        info!(
            "Imported {} groups and {} authorizations into {}",
            self.groups.len(),
            self.authorizations.len(),
            self.path()
        );
        parsed.skipped
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        self.to_yaml().map(String::into_bytes)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| AuthzError::Serialization(format!("descriptor is not UTF-8: {}", e)))?;
        Self::from_yaml(text)
    }
}
