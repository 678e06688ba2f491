//! Where each repository's files live on disk.

use crate::config::AdminConfig;
use crate::error::{AdminError, Result};
use authz::RepositoryDescriptor;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level directories under the repository root that never hold repositories.
const NON_REPOSITORY_DIRS: [&str; 3] = ["bin", "yaml", ".svn"];

/// Splits a repository argument into `(prefix, name)`.
///
/// `sakai` and `/sakai` have no prefix; `/its/some/sakai` has prefix
/// `its/some`. Empty segments are ignored.
pub fn parse_repository_path(path: &str) -> Result<(String, String)> {
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let Some(name) = segments.pop() else {
        return Err(AdminError::InvalidRepositoryPath(path.to_string()));
    };
    Ok((segments.join("/"), name.to_string()))
}

/// A directory is a Subversion repository when it holds `conf` and `format`.
pub fn is_repository(path: &Path) -> bool {
    path.join("conf").exists() && path.join("format").is_file()
}

/// Paths and names derived for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryLayout {
    pub repository_dir: PathBuf,
    pub descriptor_file: PathBuf,
    /// User list read by the indexing service.
    pub index_access_file: PathBuf,
    pub apache_authz: PathBuf,
    pub apache_conf: PathBuf,
    /// Name under which the indexing service knows the repository.
    pub index_name: String,
    pub url: String,
}

impl RepositoryLayout {
    pub fn new(config: &AdminConfig, prefix: &str, name: &str) -> Self {
        Self::for_descriptor(config, &RepositoryDescriptor::new(prefix, name, false))
    }

    pub fn for_descriptor(config: &AdminConfig, descriptor: &RepositoryDescriptor) -> Self {
        let path = descriptor.path();
        let flat = descriptor.path_with_separator("_");

        Self {
            repository_dir: config.repo_root.join(&path),
            descriptor_file: config.descriptor_root.join(format!("{}.yaml", path)),
            index_access_file: config.descriptor_root.join(format!("{}.fisheyeauth", path)),
            apache_authz: config.apache_conf_root.join(format!("{}.authz", flat)),
            apache_conf: config.apache_conf_root.join(format!("{}.conf", flat)),
            index_name: flat,
            url: config.repository_url(&path),
        }
    }
}

/// Repositories found under `REPO_ROOT/prefix`, sorted by name.
pub fn list_repositories(config: &AdminConfig, prefix: &str) -> Result<Vec<String>> {
    let dir = config.repo_root.join(prefix);
    let mut names: Vec<String> = fs::read_dir(&dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| is_repository(&entry.path()))
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    Ok(names)
}

/// Top-level prefixes under the repository root, sorted.
pub fn list_prefixes(config: &AdminConfig) -> Result<Vec<String>> {
    let mut prefixes: Vec<String> = fs::read_dir(&config.repo_root)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| !NON_REPOSITORY_DIRS.contains(&name.as_str()))
        .collect();
    prefixes.sort();
    Ok(prefixes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(root: &Path) -> AdminConfig {
        AdminConfig::from_lookup(root, |key| match key {
            "REPO_ROOT" => Some("repos".to_string()),
            "APACHE_CONF_ROOT" => Some("conf".to_string()),
            _ => None,
        })
        .unwrap()
    }

    #[test]
    fn test_parse_repository_path() {
        let cases = [
            ("/sakai", ("", "sakai")),
            ("sakai", ("", "sakai")),
            ("/its/sakai", ("its", "sakai")),
            ("/its/some/sakai", ("its/some", "sakai")),
            ("its//sakai/", ("its", "sakai")),
        ];
        for (input, (prefix, name)) in cases {
            assert_eq!(
                parse_repository_path(input).unwrap(),
                (prefix.to_string(), name.to_string()),
                "parsing {input}"
            );
        }

        assert!(matches!(
            parse_repository_path("//"),
            Err(AdminError::InvalidRepositoryPath(_))
        ));
    }

    #[test]
    fn test_layout_paths() {
        let layout = RepositoryLayout::new(&config(Path::new("/srv")), "its/web", "sakai");
        assert_eq!(layout.repository_dir, PathBuf::from("/srv/repos/its/web/sakai"));
        assert_eq!(layout.descriptor_file, PathBuf::from("/srv/repos/yaml/its/web/sakai.yaml"));
        assert_eq!(
            layout.index_access_file,
            PathBuf::from("/srv/repos/yaml/its/web/sakai.fisheyeauth")
        );
        assert_eq!(layout.apache_authz, PathBuf::from("/srv/conf/its_web_sakai.authz"));
        assert_eq!(layout.apache_conf, PathBuf::from("/srv/conf/its_web_sakai.conf"));
        assert_eq!(layout.index_name, "its_web_sakai");
        assert_eq!(layout.url, "https://svn.example.com/svn/its/web/sakai");
    }

    #[test]
    fn test_listing() {
        let temp_dir = TempDir::new().unwrap();
        let config = config(temp_dir.path());

        let repo = config.repo_root.join("its").join("sakai");
        fs::create_dir_all(repo.join("conf")).unwrap();
        fs::write(repo.join("format"), "5\n").unwrap();
        fs::create_dir_all(config.repo_root.join("its").join("notes")).unwrap();
        fs::create_dir_all(config.repo_root.join("yaml")).unwrap();
        fs::create_dir_all(config.repo_root.join("math")).unwrap();

        assert!(is_repository(&repo));
        assert_eq!(list_prefixes(&config).unwrap(), vec!["its", "math"]);
        assert_eq!(list_repositories(&config, "its").unwrap(), vec!["sakai"]);
        assert!(list_repositories(&config, "math").unwrap().is_empty());
    }
}
