//! Checking descriptors into the administration working copy.

use crate::error::{AdminError, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::info;

/// A committed revision number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Revision(pub u64);

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Version control for the descriptor directory.
pub trait VersionControl {
    fn add(&self, path: &Path) -> Result<()>;

    /// Commits `paths`; `None` means there was nothing to commit.
    fn commit(&self, paths: &[PathBuf], message: &str) -> Result<Option<Revision>>;
}

/// The `svn` command-line client. In mock mode every call is logged and
/// nothing is run.
#[derive(Debug, Clone)]
pub struct SvnClient {
    svn: String,
    mock: bool,
}

impl SvnClient {
    pub fn new(svn: impl Into<String>, mock: bool) -> Self {
        Self {
            svn: svn.into(),
            mock,
        }
    }

    fn run(&self, args: &[&str], paths: &[PathBuf]) -> Result<String> {
        let output = Command::new(&self.svn)
            .args(args)
            .args(paths)
            .output()
            .map_err(|e| AdminError::Vcs(format!("failed to run {}: {}", self.svn, e)))?;

        if !output.status.success() {
            return Err(AdminError::Vcs(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl VersionControl for SvnClient {
    fn add(&self, path: &Path) -> Result<()> {
        if self.mock {
            info!("svn add {:?} (mocked)", path);
            return Ok(());
        }
        self.run(&["add", "--parents"], &[path.to_path_buf()])?;
        Ok(())
    }

    fn commit(&self, paths: &[PathBuf], message: &str) -> Result<Option<Revision>> {
        if self.mock {
            info!("svn commit {:?} -m {:?} (mocked)", paths, message);
            return Ok(None);
        }
        let output = self.run(&["commit", "--non-interactive", "-m", message], paths)?;
        Ok(parse_committed_revision(&output))
    }
}

/// Finds the revision in `svn commit` output (`Committed revision 42.`).
pub fn parse_committed_revision(output: &str) -> Option<Revision> {
    output.lines().find_map(|line| {
        line.trim()
            .strip_prefix("Committed revision ")?
            .trim_end_matches('.')
            .parse::<u64>()
            .ok()
            .map(Revision)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_committed_revision() {
        let output = "Sending        its/sakai.yaml\nTransmitting file data .done\nCommitting transaction...\nCommitted revision 42.\n";
        assert_eq!(parse_committed_revision(output), Some(Revision(42)));
        assert_eq!(parse_committed_revision(""), None);
        assert_eq!(parse_committed_revision("Committed revision x."), None);
    }

    #[test]
    fn test_mock_client_runs_nothing() {
        let client = SvnClient::new("/nonexistent/svn", true);
        client.add(Path::new("/tmp/a.yaml")).unwrap();
        assert_eq!(
            client.commit(&[PathBuf::from("/tmp/a.yaml")], "msg").unwrap(),
            None
        );
    }

    #[test]
    fn test_missing_client_reported() {
        let client = SvnClient::new("/nonexistent/svn", false);
        assert!(matches!(
            client.commit(&[PathBuf::from("/tmp/a.yaml")], "msg"),
            Err(AdminError::Vcs(_))
        ));
    }
}
