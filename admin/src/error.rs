use authz::AuthzError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdminError>;

/// Failures of the collaborators around the access-control core: the
/// filesystem, Subversion tooling, the indexing service and mail delivery.
#[derive(Error, Debug)]
pub enum AdminError {
    #[error(transparent)]
    Authz(#[from] AuthzError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid repository path '{0}'")]
    InvalidRepositoryPath(String),

    #[error("A repository named \"{0}\" already exists")]
    RepositoryAlreadyExists(String),

    #[error("No repository found at {0}")]
    RepositoryNotFound(PathBuf),

    #[error("There was an error loading the repository description at {path}: {reason}")]
    DescriptorLoad { path: PathBuf, reason: String },

    #[error("{tool} failed: {output}")]
    ToolFailed { tool: String, output: String },

    #[error("Version control error: {0}")]
    Vcs(String),

    #[error("Indexing service error: {0}")]
    Indexing(String),

    #[error("Invalid indexing service admin password")]
    InvalidIndexingPassword,

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Template error: {0}")]
    Template(String),
}

impl From<reqwest::Error> for AdminError {
    fn from(err: reqwest::Error) -> Self {
        AdminError::Indexing(err.to_string())
    }
}
