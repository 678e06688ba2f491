//! Everything around the access-control core that touches the outside
//! world: settings, on-disk layout, descriptor persistence, Subversion
//! tooling, the indexing service and grant notifications.

pub mod config;
pub mod error;
pub mod indexing;
pub mod layout;
pub mod notify;
pub mod storage;
pub mod store;
pub mod templates;
pub mod vcs;

pub use config::AdminConfig;
pub use error::{AdminError, Result};
pub use indexing::{FisheyeAdmin, IndexingService};
pub use layout::{parse_repository_path, RepositoryLayout};
pub use notify::{Notifier, SmtpNotifier};
pub use storage::{RepositoryStorage, SvnadminStorage};
pub use store::DescriptorStore;
pub use templates::Template;
pub use vcs::{Revision, SvnClient, VersionControl};
