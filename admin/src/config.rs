//! Administration settings, read from the environment.
//!
//! A `.env` file in the working directory is loaded first when present.
//! Relative paths are resolved against the base directory.

use crate::error::{AdminError, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Settings for every collaborator that touches the outside world.
///
/// The access-control core takes no configuration; this struct is handed
/// to the store, the Subversion tooling, the indexing client and the
/// notifier.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub repo_root: PathBuf,
    pub descriptor_root: PathBuf,
    pub apache_conf_root: PathBuf,
    /// Directory holding an `apache.conf` template; the built-in one is used when unset.
    pub template_dir: Option<PathBuf>,
    pub svn_server: String,
    pub url_prefix: String,
    pub svn_prefix: String,
    pub svnadmin: String,
    pub svn: String,
    pub mock_vcs: bool,
    /// Accounts that are never listed as repository users.
    pub non_directory_users: Vec<String>,
    pub indexing_admin_url: String,
    pub indexing_admin_password: String,
    pub notify_grants: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub email_domain: String,
    pub email_from: String,
}

impl AdminConfig {
    /// Load settings from environment variables with defaults
    pub fn load() -> Result<Self> {
        Self::load_with_base(None)
    }

    /// Load settings with an optional base directory for relative paths
    pub fn load_with_base(base_dir: Option<PathBuf>) -> Result<Self> {
        let base = if let Some(base) = base_dir {
            base
        } else {
            if let Ok(cwd) = env::current_dir() {
                let env_file = cwd.join(".env");
                if env_file.exists() {
                    dotenvy::from_path(&env_file).ok();
                }
            }
            env::current_dir()?
        };

        Self::from_lookup(&base, |key| env::var(key).ok())
    }

    /// Build settings from an arbitrary variable source.
    pub fn from_lookup<F>(base: &Path, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = |key: &str, default: &str| resolve(base, &lookup(key).unwrap_or_else(|| default.to_string()));
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let repo_root = path("REPO_ROOT", "/repos");
        let descriptor_root = match lookup("DESCRIPTOR_ROOT") {
            Some(dir) => resolve(base, &dir),
            None => repo_root.join("yaml"),
        };

        let smtp_port = text("SMTP_PORT", "25")
            .parse()
            .map_err(|e| AdminError::Configuration(format!("Invalid SMTP_PORT: {}", e)))?;

        Ok(Self {
            repo_root,
            descriptor_root,
            apache_conf_root: path("APACHE_CONF_ROOT", "/etc/httpd/conf/repos.d"),
            template_dir: lookup("TEMPLATE_DIR").map(|dir| resolve(base, &dir)),
            svn_server: text("SVN_SERVER", "svn.example.com"),
            url_prefix: text("URL_PREFIX", "https://"),
            svn_prefix: text("SVN_PREFIX", "svn"),
            svnadmin: text("SVNADMIN", "svnadmin"),
            svn: text("SVN", "svn"),
            mock_vcs: parse_flag("MOCK_VCS", lookup("MOCK_VCS"), false)?,
            non_directory_users: lookup("NON_DIRECTORY_USERS")
                .map(|users| split_list(&users))
                .unwrap_or_default(),
            indexing_admin_url: text("INDEXING_ADMIN_URL", "https://example.com/fisheye/admin")
                .trim_end_matches('/')
                .to_string(),
            indexing_admin_password: text("INDEXING_ADMIN_PASSWORD", ""),
            notify_grants: parse_flag("NOTIFY_GRANTS", lookup("NOTIFY_GRANTS"), true)?,
            smtp_host: text("SMTP_HOST", "localhost"),
            smtp_port,
            email_domain: text("EMAIL_DOMAIN", "example.com"),
            email_from: text("EMAIL_FROM", "svn.admins@example.com"),
        })
    }

    /// Public checkout URL of a repository path such as `its/sakai`.
    pub fn repository_url(&self, repository_path: &str) -> String {
        format!(
            "{}{}/{}/{}",
            self.url_prefix, self.svn_server, self.svn_prefix, repository_path
        )
    }
}

fn resolve(base: &Path, value: &str) -> PathBuf {
    let path = PathBuf::from(value);
    if path.is_relative() {
        base.join(path)
    } else {
        path
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_flag(key: &str, value: Option<String>, default: bool) -> Result<bool> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(AdminError::Configuration(format!(
            "Invalid value '{}' for {}",
            other, key
        ))),
    }
}
