use crate::utils::context::Context;
use crate::utils::output::print_access;
use admin::layout::{list_prefixes, list_repositories};
use admin::{AdminError, IndexingService, RepositoryLayout, RepositoryStorage, VersionControl};
use anyhow::{bail, Context as _, Result};
use authz::RepositoryDescriptor;
use clap::ValueEnum;
use colored::*;
use std::fs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IndexingMode {
    On,
    Off,
    Check,
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

fn require_description(description: Option<String>) -> Result<String> {
    match description.map(|d| d.trim().to_string()) {
        Some(description) if !description.is_empty() => Ok(description),
        _ => bail!("The indexing service needs a short description; pass --description"),
    }
}

/// Create the descriptor directory for a new prefix and check it in, so the
/// descriptor itself can be committed on its own.
fn prepare_descriptor_dir(context: &Context, layout: &RepositoryLayout) -> Result<()> {
    let Some(dir) = layout.descriptor_file.parent() else {
        return Ok(());
    };
    if dir.exists() {
        return Ok(());
    }

    fs::create_dir_all(dir)
        .with_context(|| format!("Error creating directory at {}", dir.display()))?;
    context.vcs.add(dir)?;
    context.vcs.commit(
        &[dir.to_path_buf()],
        &format!("Add directory {} for descriptors.", dir.display()),
    )?;
    Ok(())
}

/// Create the repository, its configuration and its descriptor
pub async fn create(
    context: &Context,
    repository: &str,
    indexing: bool,
    description: Option<String>,
) -> Result<()> {
    let (prefix, name) = context.resolve(repository)?;
    println!("{} {}", "Indexing:".cyan(), on_off(indexing));

    let description = if indexing {
        Some(require_description(description)?)
    } else {
        None
    };

    let descriptor = RepositoryDescriptor::new(prefix, name, indexing);
    let layout = context.layout(&descriptor);
    if context.storage.exists(&layout) {
        return Err(AdminError::RepositoryAlreadyExists(descriptor.path()).into());
    }

    prepare_descriptor_dir(context, &layout)?;

    println!("Creating the repository ...");
    context.storage.create(&layout).with_context(|| {
        format!(
            "Failed to create the repository at {}",
            layout.repository_dir.display()
        )
    })?;
    println!("{} Created the repository", "✓".green());

    context.store.write_apache_conf(&descriptor)?;
    println!("Wrote Apache configuration {}", layout.apache_conf.display());
    context.store.persist(&descriptor)?;
    println!("Wrote descriptor {}", layout.descriptor_file.display());

    if let Some(description) = description {
        let admin = context.indexing_admin().await?;
        if admin.create_index(&descriptor, &layout, &description).await? {
            println!(
                "{} Created an indexing instance for {}",
                "✓".green(),
                descriptor.name
            );
        } else {
            println!(
                "{}",
                format!(
                    "Failed to create an indexing instance for {}. Please do it by hand.",
                    descriptor.name
                )
                .yellow()
            );
        }
    }

    context.vcs.add(&layout.descriptor_file)?;
    context.checkin(
        &descriptor,
        &format!("Create repository: {}.", layout.repository_dir.display()),
    )?;

    println!(
        "{} Created repository at {}",
        "✓".green().bold(),
        descriptor.path()
    );
    Ok(())
}

/// Print the manual steps that back up and remove a repository
pub fn delete(context: &Context, repository: &str) -> Result<()> {
    let descriptor = context.load_descriptor(repository)?;
    let layout = context.layout(&descriptor);

    println!();
    println!("{}", "Removal is done by hand.".bold());
    println!("Delete the Apache files:");
    println!("  {}", layout.apache_authz.display());
    println!("  {}", layout.apache_conf.display());
    println!();
    println!("Delete the descriptor:");
    println!("  {}", layout.descriptor_file.display());
    println!();
    if descriptor.indexing_enabled {
        println!("Delete the index access file:");
        println!("  {}", layout.index_access_file.display());
        println!();
    }
    println!("Tar up the repository:");
    println!(
        "  tar czvf {}.tgz {}",
        descriptor.name,
        layout.repository_dir.display()
    );
    println!();
    println!("Restart Apache.");
    Ok(())
}

/// List repositories under one prefix, or under every prefix
pub fn list(context: &Context, prefix: Option<&str>) -> Result<()> {
    let prefixes = match prefix {
        Some(prefix) => vec![prefix.trim_matches('/').to_string()],
        None => list_prefixes(&context.config).with_context(|| {
            format!(
                "Cannot read repository root {}",
                context.config.repo_root.display()
            )
        })?,
    };

    for prefix in prefixes {
        let dir = context.config.repo_root.join(&prefix);
        let names = list_repositories(&context.config, &prefix)
            .with_context(|| format!("Cannot list repositories in {}", dir.display()))?;

        println!();
        println!("{}", format!("[ Repositories in {} ]", dir.display()).bold());
        for name in names {
            println!("{}", name);
        }
    }
    Ok(())
}

/// Print a summary of a repository
pub fn info(context: &Context, repository: &str, verbose: bool) -> Result<()> {
    let descriptor = context.load_descriptor(repository)?;
    let layout = context.layout(&descriptor);

    println!();
    println!("{}", "=== Repository summary ===".bold());
    println!("{} {}", "URL:".cyan(), layout.url);
    println!(
        "{} {}",
        "Indexing:".cyan(),
        on_off(descriptor.indexing_enabled)
    );

    if verbose {
        println!();
        println!("{} {}", "Path:".cyan(), descriptor.path());
        println!("{} {}", "Descriptor:".cyan(), layout.descriptor_file.display());
        println!("{} {}", "Apache config:".cyan(), layout.apache_conf.display());
        println!("{} {}", "Apache authz:".cyan(), layout.apache_authz.display());
        if descriptor.indexing_enabled {
            println!(
                "{} {}",
                "Index access file:".cyan(),
                layout.index_access_file.display()
            );
        }
    }

    println!();
    print_access(&descriptor);
    Ok(())
}

/// Commit the descriptor of an existing repository
pub fn commit(context: &Context, repository: &str, add: bool) -> Result<()> {
    let (prefix, name) = context.resolve(repository)?;
    let descriptor = context
        .store
        .load(&prefix, &name)
        .unwrap_or_else(|_| RepositoryDescriptor::new(prefix, name, false));
    let layout = context.layout(&descriptor);

    if !context.storage.exists(&layout) {
        return Err(anyhow::Error::new(AdminError::RepositoryNotFound(
            layout.repository_dir,
        ))
        .context("Cannot commit a descriptor for a repository that doesn't exist"));
    }

    if add {
        context.vcs.add(&layout.descriptor_file)?;
    }
    context.checkin(
        &descriptor,
        &format!("Committing descriptor for {}.", descriptor.path()),
    )
}

/// Rewrite the descriptor and every file generated from it
pub fn flush(context: &Context, repository: &str) -> Result<()> {
    let descriptor = context.load_descriptor(repository)?;

    context.store.persist(&descriptor)?;
    println!("{} Wrote descriptor and Apache authz.", "✓".green());
    context.store.write_apache_conf(&descriptor)?;
    println!("{} Wrote Apache conf.", "✓".green());
    Ok(())
}

/// Turn indexing on or off, or report whether it is on
pub async fn indexing(
    context: &Context,
    repository: &str,
    mode: IndexingMode,
    description: Option<String>,
) -> Result<()> {
    let mut descriptor = context.load_descriptor(repository)?;
    let layout = context.layout(&descriptor);

    let message = match mode {
        IndexingMode::Check => {
            println!(
                "Indexing is {} for {}",
                on_off(descriptor.indexing_enabled).to_uppercase(),
                descriptor.name
            );
            return Ok(());
        }
        IndexingMode::On if descriptor.indexing_enabled => {
            println!("Indexing is already turned on for {}.", descriptor.name);
            return Ok(());
        }
        IndexingMode::Off if !descriptor.indexing_enabled => {
            println!("Indexing is already turned off for {}.", descriptor.name);
            return Ok(());
        }
        IndexingMode::On => {
            let description = require_description(description)?;
            let admin = context.indexing_admin().await?;
            descriptor.indexing_enabled = true;
            if admin.create_index(&descriptor, &layout, &description).await? {
                println!(
                    "{} Created an indexing instance for {}",
                    "✓".green(),
                    descriptor.name
                );
            } else {
                println!(
                    "{}",
                    format!(
                        "Failed to create an indexing instance for {}. Please do it by hand.",
                        descriptor.name
                    )
                    .yellow()
                );
            }
            format!("Turned indexing ON for {}.", descriptor.path())
        }
        IndexingMode::Off => {
            let admin = context.indexing_admin().await?;
            descriptor.indexing_enabled = false;
            if admin.delete_index(&descriptor, &layout).await? {
                println!(
                    "{} Deleted the indexing instance for {}",
                    "✓".green(),
                    descriptor.name
                );
            } else {
                println!(
                    "{}",
                    format!(
                        "Failed to delete the indexing instance for {}. Please do it by hand.",
                        descriptor.name
                    )
                    .yellow()
                );
            }
            format!("Turned indexing OFF for {}.", descriptor.path())
        }
    };

    context.store.save(&descriptor)?;
    context.checkin(&descriptor, &message)?;

    if descriptor.indexing_enabled {
        context.store.write_index_access(&descriptor)?;
    } else {
        context.store.remove_index_access(&descriptor)?;
    }
    Ok(())
}
