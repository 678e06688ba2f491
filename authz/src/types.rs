//! Core access-control types: principals, access modes and authorizations.
//!
//! Principals arrive from the command line and from `authz` files as plain
//! strings where a leading `@` marks a group reference. They are parsed into
//! [`Principal`] once, at the boundary, and handled as the tagged value from
//! then on.

use crate::error::{AuthzError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Marker prefixed to a group name when it is referenced as a principal.
pub const GROUP_MARKER: char = '@';

/// Characters that would break the `key = value` lines of an authz file.
const RESERVED: [char; 5] = ['=', ',', '[', ']', '#'];

/// Who a grant applies to: a single user or every member of a group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Principal {
    User(String),
    Group(String),
}

impl Principal {
    /// Parses a raw principal, treating a leading `@` as a group reference.
    pub fn parse(raw: &str) -> Result<Self> {
        let principal = match raw.strip_prefix(GROUP_MARKER) {
            Some(group) => Principal::Group(group.to_string()),
            None => Principal::User(raw.to_string()),
        };

        if !is_valid_name(principal.name()) {
            return Err(AuthzError::InvalidPrincipal(raw.to_string()));
        }
        Ok(principal)
    }

    pub fn user(name: impl Into<String>) -> Self {
        Principal::User(name.into())
    }

    pub fn group(name: impl Into<String>) -> Self {
        Principal::Group(name.into())
    }

    /// The user or group name, without the group marker.
    pub fn name(&self) -> &str {
        match self {
            Principal::User(name) | Principal::Group(name) => name,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Principal::Group(_))
    }

    /// Bytes of the textual form, marker included.
    fn text_bytes(&self) -> impl Iterator<Item = u8> + '_ {
        let marker = self.is_group().then_some(GROUP_MARKER as u8);
        marker.into_iter().chain(self.name().bytes())
    }
}

/// Checks that a user or group name can be written to an authz file verbatim.
pub(crate) fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(GROUP_MARKER)
        && !name
            .chars()
            .any(|c| c.is_whitespace() || RESERVED.contains(&c))
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Principal::User(name) => f.write_str(name),
            Principal::Group(name) => write!(f, "{}{}", GROUP_MARKER, name),
        }
    }
}

impl FromStr for Principal {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self> {
        Principal::parse(s)
    }
}

impl TryFrom<String> for Principal {
    type Error = AuthzError;

    fn try_from(value: String) -> Result<Self> {
        Principal::parse(&value)
    }
}

impl From<Principal> for String {
    fn from(principal: Principal) -> Self {
        principal.to_string()
    }
}

// Principals sort by their textual form so `@devs` and `alice` order the same
// way in memory as they do in a rendered file.
impl Ord for Principal {
    fn cmp(&self, other: &Self) -> Ordering {
        self.text_bytes().cmp(other.text_bytes())
    }
}

impl PartialOrd for Principal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Permission level of a grant. `ReadOnly` sorts before `ReadWrite`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AccessMode {
    #[serde(rename = "r", alias = "read-only")]
    ReadOnly,
    #[serde(rename = "rw", alias = "read-write")]
    ReadWrite,
}

impl AccessMode {
    pub const ALL: [AccessMode; 2] = [AccessMode::ReadOnly, AccessMode::ReadWrite];

    /// The token written to authz files.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessMode::ReadOnly => "r",
            AccessMode::ReadWrite => "rw",
        }
    }

    /// Plain-language verb used in user-facing messages.
    pub fn verb(&self) -> &'static str {
        match self {
            AccessMode::ReadOnly => "read",
            AccessMode::ReadWrite => "write",
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessMode {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "r" | "read-only" => Ok(AccessMode::ReadOnly),
            "rw" | "read-write" => Ok(AccessMode::ReadWrite),
            other => Err(AuthzError::InvalidMode(other.to_string())),
        }
    }
}

/// Characters that would end or open a `[path]` section header.
const PATH_RESERVED: [char; 2] = ['[', ']'];

/// Validates a repository-relative path.
///
/// The path is written verbatim into a section header, so it must survive
/// being read back: no brackets, no control characters and no surrounding
/// whitespace.
pub(crate) fn validate_path(path: &str) -> Result<()> {
    let valid = path.starts_with('/')
        && path.trim() == path
        && !path
            .chars()
            .any(|c| c.is_control() || PATH_RESERVED.contains(&c));

    if valid {
        Ok(())
    } else {
        Err(AuthzError::InvalidPath(path.to_string()))
    }
}

/// A single `(path, principal, mode)` grant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawAuthorization")]
pub struct Authorization {
    path: String,
    principal: Principal,
    mode: AccessMode,
}

impl Authorization {
    /// Builds a grant, rejecting relative or empty paths.
    pub fn new(path: impl Into<String>, principal: Principal, mode: AccessMode) -> Result<Self> {
        let path = path.into();
        validate_path(&path)?;
        Ok(Self {
            path,
            principal,
            mode,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    pub(crate) fn matches(&self, path: &str, principal: &Principal) -> bool {
        self.path == path && &self.principal == principal
    }
}

impl fmt::Display for Authorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.path, self.principal, self.mode)
    }
}

#[derive(Deserialize)]
struct RawAuthorization {
    path: String,
    principal: Principal,
    mode: AccessMode,
}

impl TryFrom<RawAuthorization> for Authorization {
    type Error = AuthzError;

    fn try_from(raw: RawAuthorization) -> Result<Self> {
        Authorization::new(raw.path, raw.principal, raw.mode)
    }
}

/// Canonical ordering of grants: path, then mode, then principal.
///
/// Shorter paths sort ahead of the paths beneath them and `r` ahead of `rw`,
/// which is the order in which `mod_authz_svn` resolves a request. Both the
/// authorization set and the renderer order entries with this function.
pub fn by_path_then_mode_then_principal(a: &Authorization, b: &Authorization) -> Ordering {
    a.path
        .cmp(&b.path)
        .then_with(|| a.mode.cmp(&b.mode))
        .then_with(|| a.principal.cmp(&b.principal))
}

impl Ord for Authorization {
    fn cmp(&self, other: &Self) -> Ordering {
        by_path_then_mode_then_principal(self, other)
    }
}

impl PartialOrd for Authorization {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
