//! Access-control model for Subversion repositories served through Apache.
//!
//! A [`RepositoryDescriptor`] holds the groups and per-path grants of one
//! repository. Grants are `(path, principal, mode)` triples kept in a fixed
//! order, and the descriptor renders them to the `authz` file format read by
//! `mod_authz_svn`:
//!
//! ```rust
//! use authz::RepositoryDescriptor;
//!
//! let mut repo = RepositoryDescriptor::new("its", "sakai", false);
//! repo.add_group("devs", vec!["alice".into(), "bob".into()]).unwrap();
//! repo.add_authorization("/", "@devs", "rw").unwrap();
//! repo.add_authorization("/docs", "carol", "r").unwrap();
//!
//! assert_eq!(
//!     repo.render_acl(),
//!     "[groups]\ndevs = alice, bob\n\n[/]\n@devs = rw\n\n[/docs]\ncarol = r\n\n"
//! );
//! ```
//!
//! Everything in this crate is synchronous and free of I/O. Writing the
//! rendered text, persisting descriptors and talking to Subversion are left
//! to the caller. A descriptor is not internally synchronized; hosts that
//! share one across threads must hold an exclusive lock per repository.

pub mod codec;
pub mod descriptor;
pub mod error;
pub mod groups;
pub mod set;
pub mod types;

pub use codec::{ParsedAcl, SkippedLine};
pub use descriptor::RepositoryDescriptor;
pub use error::{AuthzError, Result};
pub use groups::{Group, GroupRegistry};
pub use set::AuthorizationSet;
pub use types::{by_path_then_mode_then_principal, AccessMode, Authorization, Principal};
