//! Driving the indexing service's (FishEye) web admin on the operator's behalf.

use crate::error::{AdminError, Result};
use crate::layout::RepositoryLayout;
use async_trait::async_trait;
use authz::RepositoryDescriptor;
use tracing::{debug, info, warn};

/// Registers repositories with the external indexing service.
#[async_trait]
pub trait IndexingService: Send + Sync {
    /// Returns `false` when the service refused to create the index.
    async fn create_index(
        &self,
        descriptor: &RepositoryDescriptor,
        layout: &RepositoryLayout,
        description: &str,
    ) -> Result<bool>;

    /// Returns `false` when the repository is not known to the service.
    async fn delete_index(
        &self,
        descriptor: &RepositoryDescriptor,
        layout: &RepositoryLayout,
    ) -> Result<bool>;
}

/// A logged-in session against the FishEye admin pages.
///
/// The admin has no API; the client posts the same forms a browser would
/// and infers the outcome from the page it lands on.
pub struct FisheyeAdmin {
    client: reqwest::Client,
    base_url: String,
}

impl FisheyeAdmin {
    /// Logs in with the admin password.
    pub async fn connect(base_url: &str, password: &str) -> Result<Self> {
        let client = reqwest::Client::builder().cookie_store(true).build()?;
        let admin = Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        };
        admin.login(password).await?;
        Ok(admin)
    }

    fn url(&self, page: &str) -> String {
        format!("{}/{}", self.base_url, page)
    }

    async fn login(&self, password: &str) -> Result<()> {
        let response = self
            .client
            .post(self.url("login.do"))
            .form(&[("adminPassword", password)])
            .send()
            .await?
            .error_for_status()?;

        let landed = response.url().path().to_string();
        debug!("Indexing admin login landed on {}", landed);
        if landed.ends_with("/login.do") {
            return Err(AdminError::InvalidIndexingPassword);
        }
        if !landed.ends_with("/viewRepList.do") {
            warn!("Unexpected page after indexing admin login: {}", landed);
        }
        Ok(())
    }
}

#[async_trait]
impl IndexingService for FisheyeAdmin {
    async fn create_index(
        &self,
        _descriptor: &RepositoryDescriptor,
        layout: &RepositoryLayout,
        description: &str,
    ) -> Result<bool> {
        let svn_url = format!("file://{}", layout.repository_dir.display());
        let response = self
            .client
            .post(self.url("addRep.do"))
            .form(&[
                ("repository.name", layout.index_name.as_str()),
                ("repository.description", description),
                ("repoTypeSelection", "SVN"),
                ("svn.url", svn_url.as_str()),
                ("svnSymbolic.type", "none"),
            ])
            .send()
            .await?
            .error_for_status()?;

        let created = response.url().path().ends_with("/viewRep.do");
        info!(
            "Indexing service {} {}",
            if created { "created" } else { "refused" },
            layout.index_name
        );
        Ok(created)
    }

    async fn delete_index(
        &self,
        _descriptor: &RepositoryDescriptor,
        layout: &RepositoryLayout,
    ) -> Result<bool> {
        let page = self
            .client
            .get(self.url("viewRepList.do"))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let Some(id) = find_repository_id(&page, &layout.index_name) else {
            warn!("{} is not listed by the indexing service", layout.index_name);
            return Ok(false);
        };

        self.client
            .get(self.url(&format!("manageRep.do?rep={}&doStop=true", id)))
            .send()
            .await?
            .error_for_status()?;
        self.client
            .post(self.url(&format!("deleteRep.do?rep={}", id)))
            .send()
            .await?
            .error_for_status()?;

        info!("Indexing service deleted {} (id {})", layout.index_name, id);
        Ok(true)
    }
}

/// Marks the block of the repository list page that holds the repository links.
const REPOSITORY_LIST_MARKER: &str = "class=\"helpPane\"";

/// Finds the numeric id in a `...?rep=N` link whose text is `name`.
///
/// Only links inside the `helpPane` block are considered; navigation and
/// other anchors on the page are ignored.
pub fn find_repository_id(html: &str, name: &str) -> Option<u32> {
    let start = html.find(REPOSITORY_LIST_MARKER)?;
    let pane = &html[start..];
    let pane = pane.split_once("</div>").map_or(pane, |(inner, _)| inner);

    pane.split("<a ").skip(1).find_map(|anchor| {
        let (attributes, rest) = anchor.split_once('>')?;
        let (text, _) = rest.split_once("</a>")?;
        if text.trim() != name {
            return None;
        }

        let href = attributes.split_once("href=\"")?.1.split_once('"')?.0;
        let id = href.split_once("rep=")?.1;
        let digits: String = id.chars().take_while(char::is_ascii_digit).collect();
        digits.parse().ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPO_LIST: &str = r#"
        <div class="nav"><a href="/admin/viewRep.do?rep=99">its_sakai</a></div>
        <div class="helpPane">
          <ul><li><a href="/admin/viewRep.do?rep=3">its_web</a></li></ul>
          <ul><li><a class="x" href="/admin/viewRep.do?rep=17&amp;a=b">its_sakai</a></li></ul>
        </div>
    "#;

    #[test]
    fn test_find_repository_id() {
        assert_eq!(find_repository_id(REPO_LIST, "its_sakai"), Some(17));
        assert_eq!(find_repository_id(REPO_LIST, "its_web"), Some(3));
        assert_eq!(find_repository_id(REPO_LIST, "its"), None);
        assert_eq!(find_repository_id("", "its_sakai"), None);
    }

    #[test]
    fn test_find_repository_id_ignores_links_outside_list() {
        let page = r#"<a href="/admin/viewRep.do?rep=5">its_web</a>
            <div class="helpPane"><ul><li><a href="x?rep=6">other</a></li></ul></div>
            <a href="/admin/viewRep.do?rep=7">its_sakai</a>"#;
        assert_eq!(find_repository_id(page, "its_web"), None);
        assert_eq!(find_repository_id(page, "its_sakai"), None);
        assert_eq!(find_repository_id(page, "other"), Some(6));
    }

    #[tokio::test]
    async fn test_connect_unreachable_server() {
        let result = FisheyeAdmin::connect("http://127.0.0.1:9", "secret").await;
        assert!(matches!(result, Err(AdminError::Indexing(_))));
    }
}
