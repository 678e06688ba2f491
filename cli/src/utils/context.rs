use admin::{
    parse_repository_path, AdminConfig, DescriptorStore, FisheyeAdmin, RepositoryLayout,
    SmtpNotifier, SvnClient, SvnadminStorage, VersionControl,
};
use anyhow::{Context as _, Result};
use authz::RepositoryDescriptor;
use colored::*;

/// Settings and collaborators shared by every command.
pub struct Context {
    pub config: AdminConfig,
    pub store: DescriptorStore,
    pub storage: SvnadminStorage,
    pub vcs: SvnClient,
}

impl Context {
    /// Load settings from the environment (and `.env`) and wire up the
    /// collaborators they describe.
    pub fn load() -> Result<Self> {
        let config = AdminConfig::load().context("Failed to load configuration")?;
        Ok(Self::new(config))
    }

    pub fn new(config: AdminConfig) -> Self {
        Self {
            store: DescriptorStore::new(config.clone()),
            storage: SvnadminStorage::new(config.svnadmin.clone()),
            vcs: SvnClient::new(config.svn.clone(), config.mock_vcs),
            config,
        }
    }

    /// Split a repository argument and print what it resolved to.
    pub fn resolve(&self, repository: &str) -> Result<(String, String)> {
        let (prefix, name) = parse_repository_path(repository)?;
        println!("{} {}", "Name:".cyan(), name);
        if !prefix.is_empty() {
            println!("{} {}", "Prefix:".cyan(), prefix);
        }
        Ok((prefix, name))
    }

    /// Resolve a repository argument and load its descriptor.
    pub fn load_descriptor(&self, repository: &str) -> Result<RepositoryDescriptor> {
        let (prefix, name) = self.resolve(repository)?;
        Ok(self.store.load(&prefix, &name)?)
    }

    pub fn layout(&self, descriptor: &RepositoryDescriptor) -> RepositoryLayout {
        self.store.layout(descriptor)
    }

    /// Commit the descriptor file and report the outcome.
    pub fn checkin(&self, descriptor: &RepositoryDescriptor, message: &str) -> Result<()> {
        let layout = self.layout(descriptor);
        let revision = self
            .vcs
            .commit(&[layout.descriptor_file.clone()], message)
            .context("Error committing the descriptor")?;

        match revision {
            Some(revision) => println!(
                "{} Descriptor for {} committed at revision {}.",
                "✓".green(),
                descriptor.path(),
                revision
            ),
            None => println!(
                "{}",
                format!("Nothing to commit for {}.", layout.descriptor_file.display()).yellow()
            ),
        }
        Ok(())
    }

    /// Log into the indexing service's admin.
    pub async fn indexing_admin(&self) -> Result<FisheyeAdmin> {
        Ok(FisheyeAdmin::connect(
            &self.config.indexing_admin_url,
            &self.config.indexing_admin_password,
        )
        .await?)
    }

    /// The grant notifier, when notifications are enabled.
    pub fn notifier(&self) -> Option<SmtpNotifier> {
        self.config
            .notify_grants
            .then(|| SmtpNotifier::new(&self.config))
    }
}
