//! Named groups of users, referenced from grants as `@name`.
//!
//! The registry knows nothing about authorizations. Removing a group here
//! leaves any `@name` grants in place; the repository descriptor performs the
//! cascade.

use crate::error::{AuthzError, Result};
use crate::types::is_valid_name;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A group and its members, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub members: Vec<String>,
}

impl Group {
    /// Creates a group, rejecting invalid names and repeated members.
    pub fn new(name: impl Into<String>, members: Vec<String>) -> Result<Self> {
        let name = name.into();
        if !is_valid_name(&name) {
            return Err(AuthzError::InvalidPrincipal(name));
        }

        let mut group = Self {
            name,
            members: Vec::with_capacity(members.len()),
        };
        for member in members {
            group.add(member)?;
        }
        Ok(group)
    }

    pub fn contains(&self, member: &str) -> bool {
        self.members.iter().any(|m| m == member)
    }

    /// Appends a member.
    pub fn add(&mut self, member: impl Into<String>) -> Result<()> {
        let member = member.into();
        if !is_valid_name(&member) {
            return Err(AuthzError::InvalidPrincipal(member));
        }
        if self.contains(&member) {
            return Err(AuthzError::DuplicateMember {
                group: self.name.clone(),
                member,
            });
        }
        self.members.push(member);
        Ok(())
    }

    /// Removes a member, failing if it is not present.
    pub fn remove(&mut self, member: &str) -> Result<()> {
        let Some(index) = self.members.iter().position(|m| m == member) else {
            return Err(AuthzError::UnknownMember {
                group: self.name.clone(),
                member: member.to_string(),
            });
        };
        self.members.remove(index);
        Ok(())
    }
}

/// The groups defined for one repository. Names are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Group>", into = "Vec<Group>")]
pub struct GroupRegistry {
    groups: Vec<Group>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines a new group.
    pub fn add(&mut self, name: &str, members: Vec<String>) -> Result<()> {
        if self.contains(name) {
            return Err(AuthzError::DuplicateGroup(name.to_string()));
        }
        let group = Group::new(name, members)?;
        debug!("Adding group {} with {} members", group.name, group.members.len());
        self.groups.push(group);
        Ok(())
    }

    /// Deletes a group and returns it.
    pub fn remove(&mut self, name: &str) -> Result<Group> {
        let Some(index) = self.groups.iter().position(|g| g.name == name) else {
            return Err(AuthzError::UnknownGroup(name.to_string()));
        };
        debug!("Removing group {}", name);
        Ok(self.groups.remove(index))
    }

    pub fn add_member(&mut self, name: &str, user: &str) -> Result<()> {
        self.get_mut(name)?.add(user)
    }

    pub fn remove_member(&mut self, name: &str, user: &str) -> Result<()> {
        self.get_mut(name)?.remove(user)
    }

    pub fn get(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut Group> {
        self.groups
            .iter_mut()
            .find(|g| g.name == name)
            .ok_or_else(|| AuthzError::UnknownGroup(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Members of a group, or an empty slice for an unknown group.
    pub fn members(&self, name: &str) -> &[String] {
        self.get(name).map(|g| g.members.as_slice()).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl TryFrom<Vec<Group>> for GroupRegistry {
    type Error = AuthzError;

    fn try_from(groups: Vec<Group>) -> Result<Self> {
        let mut registry = GroupRegistry::new();
        for group in groups {
            registry.add(&group.name, group.members)?;
        }
        Ok(registry)
    }
}

impl From<GroupRegistry> for Vec<Group> {
    fn from(registry: GroupRegistry) -> Self {
        registry.groups
    }
}
