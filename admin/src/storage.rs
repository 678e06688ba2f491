//! Provisioning repository storage with `svnadmin`.

use crate::error::{AdminError, Result};
use crate::layout::{is_repository, RepositoryLayout};
use std::fs;
use std::process::Command;
use tracing::info;

/// Creates the on-disk repository backing a descriptor.
pub trait RepositoryStorage {
    fn exists(&self, layout: &RepositoryLayout) -> bool;

    /// Creates the repository, failing with
    /// [`AdminError::RepositoryAlreadyExists`] if one is already there.
    fn create(&self, layout: &RepositoryLayout) -> Result<()>;
}

/// FSFS repositories created by the `svnadmin` binary.
#[derive(Debug, Clone)]
pub struct SvnadminStorage {
    svnadmin: String,
}

impl SvnadminStorage {
    pub fn new(svnadmin: impl Into<String>) -> Self {
        Self {
            svnadmin: svnadmin.into(),
        }
    }
}

impl RepositoryStorage for SvnadminStorage {
    fn exists(&self, layout: &RepositoryLayout) -> bool {
        is_repository(&layout.repository_dir)
    }

    fn create(&self, layout: &RepositoryLayout) -> Result<()> {
        let dir = &layout.repository_dir;
        if self.exists(layout) {
            return Err(AdminError::RepositoryAlreadyExists(dir.display().to_string()));
        }

        fs::create_dir_all(dir)?;
        info!("Creating repository at {:?}", dir);

        let output = Command::new(&self.svnadmin)
            .args(["create", "--fs-type", "fsfs"])
            .arg(dir)
            .output()
            .map_err(|e| AdminError::ToolFailed {
                tool: self.svnadmin.clone(),
                output: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(AdminError::ToolFailed {
                tool: self.svnadmin.clone(),
                output: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        info!("Created repository at {:?}", dir);
        Ok(())
    }
}
