use crate::utils::context::Context;
use admin::VersionControl;
use anyhow::{bail, Context as _, Result};
use authz::RepositoryDescriptor;
use colored::*;
use std::fs;
use std::path::Path;

/// Build a descriptor for a repository that so far only has an authz file
pub fn execute(context: &Context, repository: &str, from: Option<&Path>) -> Result<()> {
    let (prefix, name) = context.resolve(repository)?;
    let mut descriptor = RepositoryDescriptor::new(prefix, name, false);
    let layout = context.layout(&descriptor);

    if layout.descriptor_file.exists() {
        bail!(
            "A descriptor already exists at {}",
            layout.descriptor_file.display()
        );
    }

    let text = match from {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("No authz file found at {}", path.display()))?,
        None => context.store.read_acl(&descriptor)?,
    };

    let skipped = descriptor.import_acl(&text);
    for line in &skipped {
        println!(
            "{} line {}: {} ({})",
            "Skipped".yellow(),
            line.line_number,
            line.content,
            line.reason
        );
    }

    context.store.save(&descriptor)?;
    context.vcs.add(&layout.descriptor_file)?;
    context.checkin(
        &descriptor,
        &format!("Add descriptor after importing {}.", descriptor.path()),
    )?;

    println!();
    println!("{}", "Import complete.".green().bold());
    println!(
        "{} {}",
        "Authorizations imported:".cyan(),
        descriptor.authorizations().len()
    );
    println!("{} {}", "Groups imported:".cyan(), descriptor.groups().len());
    if !skipped.is_empty() {
        println!("{} {}", "Lines skipped:".cyan(), skipped.len());
    }
    Ok(())
}
