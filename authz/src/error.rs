//! Error types for the access-control model and its codec.
//!
//! Every variant carries the offending path, principal, mode or line so the
//! caller can report exactly which invariant a rejected mutation violated.

use thiserror::Error;

/// Errors raised by authorization and group mutations, and by the ACL codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthzError {
    /// A repository path without the leading `/`.
    #[error("Invalid path '{0}': paths must start with '/' and cannot contain brackets or control characters")]
    InvalidPath(String),

    /// A mode string outside of `r` / `rw`.
    #[error("Invalid mode '{0}': expected one of r, rw")]
    InvalidMode(String),

    /// A principal string that is empty or contains reserved characters.
    #[error("Invalid principal '{0}'")]
    InvalidPrincipal(String),

    /// A group reference (or group operation) naming a group that does not exist.
    #[error("Group @{0} is not a valid group for this repository")]
    UnknownGroup(String),

    /// The exact (path, principal, mode) triple is already granted.
    #[error("Authorization ({path}, {principal}, {mode}) already exists")]
    DuplicateAuthorization {
        path: String,
        principal: String,
        mode: String,
    },

    #[error("Group {0} already exists")]
    DuplicateGroup(String),

    #[error("{member} is already a member of {group}")]
    DuplicateMember { group: String, member: String },

    #[error("{member} is not a member of the {group} group")]
    UnknownMember { group: String, member: String },

    /// A line of ACL text the codec could not interpret.
    #[error("Malformed line '{0}'")]
    MalformedLine(String),

    /// A removal that matched nothing where the caller required a match.
    #[error("{0}")]
    NotFound(String),

    /// Descriptor (de)serialization failed.
    #[error("Descriptor serialization failed: {0}")]
    Serialization(String),
}

/// A specialized Result type for access-control operations.
pub type Result<T> = std::result::Result<T, AuthzError>;

impl From<serde_yaml::Error> for AuthzError {
    fn from(err: serde_yaml::Error) -> Self {
        AuthzError::Serialization(err.to_string())
    }
}
