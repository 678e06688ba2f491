//! Minimal `{{name}}` templates for generated Apache configuration.

use crate::error::{AdminError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

const APACHE_CONF_FILE: &str = "apache.conf";

const DEFAULT_APACHE_CONF: &str = r#"<Location /{{svn_prefix}}/{{repopath}}>
    DAV svn
    SVNPath {{repository_dir}}
    AuthzSVNAccessFile {{apache_authz_path}}
    Require valid-user
</Location>
"#;

/// A text template with a declared set of required parameters.
#[derive(Debug, Clone)]
pub struct Template {
    source: String,
    params: Vec<&'static str>,
}

impl Template {
    pub fn from_string(source: impl Into<String>, params: &[&'static str]) -> Self {
        Self {
            source: source.into(),
            params: params.to_vec(),
        }
    }

    pub fn from_file(path: &Path, params: &[&'static str]) -> Result<Self> {
        if !path.is_file() {
            return Err(AdminError::Template(format!(
                "Can't find template file {}",
                path.display()
            )));
        }
        Ok(Self::from_string(fs::read_to_string(path)?, params))
    }

    /// The per-repository `<Location>` block, from `template_dir/apache.conf`
    /// when a template directory is configured.
    pub fn apache_conf(template_dir: Option<&Path>) -> Result<Self> {
        let params = &["repopath", "apache_authz_path"];
        match template_dir {
            Some(dir) => Self::from_file(&dir.join(APACHE_CONF_FILE), params),
            None => Ok(Self::from_string(DEFAULT_APACHE_CONF, params)),
        }
    }

    /// Substitutes every `{{key}}` in `data`; fails when a required
    /// parameter is missing.
    pub fn render(&self, data: &HashMap<&str, String>) -> Result<String> {
        if let Some(missing) = self.params.iter().find(|p| !data.contains_key(*p)) {
            return Err(AdminError::Template(format!(
                "Missing required template parameter {}",
                missing
            )));
        }

        let mut output = self.source.clone();
        for (key, value) in data {
            output = output.replace(&format!("{{{{{}}}}}", key), value);
        }
        Ok(output)
    }

    pub fn render_to_file(&self, path: &Path, data: &HashMap<&str, String>) -> Result<()> {
        let output = self.render(data)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, output)?;
        debug!("Wrote template output to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_render() {
        let template = Template::from_string("Foo: {{foo}} {{foo}}", &["foo"]);
        let data = HashMap::from([("foo", "bar".to_string())]);
        assert_eq!(template.render(&data).unwrap(), "Foo: bar bar");

        assert!(matches!(
            template.render(&HashMap::new()),
            Err(AdminError::Template(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        assert!(matches!(
            Template::from_file(&temp_dir.path().join("nope.conf"), &[]),
            Err(AdminError::Template(_))
        ));
        assert!(Template::apache_conf(Some(temp_dir.path())).is_err());
    }

    #[test]
    fn test_default_apache_conf() {
        let template = Template::apache_conf(None).unwrap();
        let data = HashMap::from([
            ("svn_prefix", "svn".to_string()),
            ("repopath", "its/sakai".to_string()),
            ("repository_dir", "/repos/its/sakai".to_string()),
            ("apache_authz_path", "/etc/repos.d/its_sakai.authz".to_string()),
        ]);
        let output = template.render(&data).unwrap();
        assert!(output.starts_with("<Location /svn/its/sakai>\n"));
        assert!(output.contains("SVNPath /repos/its/sakai\n"));
        assert!(output.contains("AuthzSVNAccessFile /etc/repos.d/its_sakai.authz\n"));
    }
}
