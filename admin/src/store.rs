//! Persistence of descriptors and of the files derived from them.

use crate::config::AdminConfig;
use crate::error::{AdminError, Result};
use crate::layout::RepositoryLayout;
use crate::templates::Template;
use authz::RepositoryDescriptor;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Reads and writes descriptor YAML, `authz` files, Apache configuration
/// and the indexing service's access list.
#[derive(Debug, Clone)]
pub struct DescriptorStore {
    config: AdminConfig,
}

impl DescriptorStore {
    pub fn new(config: AdminConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AdminConfig {
        &self.config
    }

    pub fn layout(&self, descriptor: &RepositoryDescriptor) -> RepositoryLayout {
        RepositoryLayout::for_descriptor(&self.config, descriptor)
    }

    /// Loads the descriptor for `prefix/name`.
    pub fn load(&self, prefix: &str, name: &str) -> Result<RepositoryDescriptor> {
        let layout = RepositoryLayout::new(&self.config, prefix, name);
        let path = &layout.descriptor_file;
        debug!("Loading repository descriptor from: {:?}", path);

        let bytes = fs::read(path).map_err(|e| AdminError::DescriptorLoad {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        RepositoryDescriptor::deserialize(&bytes).map_err(|e| AdminError::DescriptorLoad {
            path: path.clone(),
            reason: e.to_string(),
        })
    }

    /// Writes the descriptor YAML.
    pub fn save(&self, descriptor: &RepositoryDescriptor) -> Result<()> {
        let layout = self.layout(descriptor);
        write_file(&layout.descriptor_file, &descriptor.serialize()?)?;
        info!("Wrote descriptor for {} to {:?}", descriptor.path(), layout.descriptor_file);
        Ok(())
    }

    /// Writes the rendered `authz` file.
    pub fn write_acl(&self, descriptor: &RepositoryDescriptor) -> Result<()> {
        let layout = self.layout(descriptor);
        write_file(&layout.apache_authz, descriptor.render_acl().as_bytes())?;
        info!("Wrote authz for {} to {:?}", descriptor.path(), layout.apache_authz);
        Ok(())
    }

    /// Reads the current `authz` file of a repository.
    pub fn read_acl(&self, descriptor: &RepositoryDescriptor) -> Result<String> {
        let layout = self.layout(descriptor);
        fs::read_to_string(&layout.apache_authz).map_err(|e| {
            AdminError::Configuration(format!(
                "No authz file found at {}: {}",
                layout.apache_authz.display(),
                e
            ))
        })
    }

    /// Writes the users allowed to browse the repository through the
    /// indexing service, one per line. Does nothing when indexing is off.
    pub fn write_index_access(&self, descriptor: &RepositoryDescriptor) -> Result<()> {
        if !descriptor.indexing_enabled {
            return Ok(());
        }

        let layout = self.layout(descriptor);
        let mut contents = descriptor.index_viewers().join("\n");
        contents.push('\n');
        write_file(&layout.index_access_file, contents.as_bytes())?;
        info!("Wrote index access list for {}", descriptor.path());
        Ok(())
    }

    pub fn remove_index_access(&self, descriptor: &RepositoryDescriptor) -> Result<()> {
        let layout = self.layout(descriptor);
        if layout.index_access_file.exists() {
            fs::remove_file(&layout.index_access_file)?;
            info!("Removed index access list {:?}", layout.index_access_file);
        }
        Ok(())
    }

    /// Writes the Apache `<Location>` block for the repository.
    pub fn write_apache_conf(&self, descriptor: &RepositoryDescriptor) -> Result<()> {
        let layout = self.layout(descriptor);
        let template = Template::apache_conf(self.config.template_dir.as_deref())?;
        let users = descriptor.list_users(&self.config.non_directory_users);

        let data = HashMap::from([
            ("repopath", descriptor.path()),
            ("svn_prefix", self.config.svn_prefix.clone()),
            ("repository_dir", layout.repository_dir.display().to_string()),
            ("apache_authz_path", layout.apache_authz.display().to_string()),
            ("users", users.join(", ")),
        ]);
        template.render_to_file(&layout.apache_conf, &data)?;
        info!("Wrote Apache configuration to {:?}", layout.apache_conf);
        Ok(())
    }

    /// Rewrites the descriptor, the index access list and the `authz` file
    /// after a mutation.
    pub fn persist(&self, descriptor: &RepositoryDescriptor) -> Result<()> {
        self.save(descriptor)?;
        self.write_index_access(descriptor)?;
        self.write_acl(descriptor)
    }
}

fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(root: &Path) -> DescriptorStore {
        let config = AdminConfig::from_lookup(root, |key| match key {
            "REPO_ROOT" => Some("repos".to_string()),
            "APACHE_CONF_ROOT" => Some("conf".to_string()),
            "NON_DIRECTORY_USERS" => Some("test1".to_string()),
            _ => None,
        })
        .unwrap();
        DescriptorStore::new(config)
    }

    fn descriptor() -> RepositoryDescriptor {
        let mut repo = RepositoryDescriptor::new("its", "sakai", true);
        repo.add_group("devs", vec!["alice".into(), "test1".into()]).unwrap();
        repo.add_authorization("/", "@devs", "rw").unwrap();
        repo.add_authorization("/", "bob", "r").unwrap();
        repo.add_authorization("/docs", "carol", "r").unwrap();
        repo
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(temp_dir.path());
        let repo = descriptor();

        store.save(&repo).unwrap();
        assert!(temp_dir.path().join("repos/yaml/its/sakai.yaml").is_file());

        let loaded = store.load("its", "sakai").unwrap();
        assert_eq!(loaded, repo);
    }

    #[test]
    fn test_load_missing() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(temp_dir.path());
        assert!(matches!(
            store.load("its", "ghost"),
            Err(AdminError::DescriptorLoad { .. })
        ));
    }

    #[test]
    fn test_persist_writes_derived_files() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(temp_dir.path());
        let repo = descriptor();

        store.persist(&repo).unwrap();

        let authz = fs::read_to_string(temp_dir.path().join("conf/its_sakai.authz")).unwrap();
        assert_eq!(authz, repo.render_acl());
        assert_eq!(store.read_acl(&repo).unwrap(), authz);

        let access = fs::read_to_string(temp_dir.path().join("repos/yaml/its/sakai.fisheyeauth"))
            .unwrap();
        assert_eq!(access, "bob\nalice\ntest1\n");

        store.remove_index_access(&repo).unwrap();
        assert!(!temp_dir.path().join("repos/yaml/its/sakai.fisheyeauth").exists());
    }

    #[test]
    fn test_index_access_skipped_without_indexing() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(temp_dir.path());
        let mut repo = descriptor();
        repo.indexing_enabled = false;

        store.write_index_access(&repo).unwrap();
        assert!(!store.layout(&repo).index_access_file.exists());
    }

    #[test]
    fn test_apache_conf() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(temp_dir.path());
        let repo = descriptor();

        store.write_apache_conf(&repo).unwrap();
        let conf = fs::read_to_string(temp_dir.path().join("conf/its_sakai.conf")).unwrap();
        assert!(conf.starts_with("<Location /svn/its/sakai>"));
        assert!(conf.contains("its_sakai.authz"));
    }
}
