use crate::utils::context::Context;
use crate::utils::output::{plural, print_access};
use admin::Notifier;
use anyhow::{Context as _, Result};
use authz::{AccessMode, AuthzError, Principal};
use colored::*;

/// Grant a user or group access to a path, then tell the user
pub async fn add(
    context: &Context,
    repository: &str,
    path: &str,
    user: &str,
    mode: &str,
) -> Result<()> {
    let mode: AccessMode = mode.parse().with_context(|| {
        format!(
            "Invalid authorization type. Please enter one of the following: {}",
            AccessMode::ALL.map(|m| m.as_str()).join(", ")
        )
    })?;
    let principal = Principal::parse(user)?;

    let mut descriptor = context.load_descriptor(repository)?;
    println!("{} {}", "Path:".cyan(), path);
    println!("{} {}", "User:".cyan(), user);
    println!("{} {}", "Mode:".cyan(), mode);

    descriptor
        .add_authorization(path, user, mode.as_str())
        .context("Cannot add auth")?;
    println!("{} Added auth ({}, {}, {})", "✓".green(), path, user, mode);

    context.store.persist(&descriptor)?;
    context.checkin(
        &descriptor,
        &format!(
            "Add Auth ({}, {}, {}) to repository: {}.",
            path,
            user,
            mode,
            descriptor.path()
        ),
    )?;

    if principal.is_group() {
        return Ok(());
    }
    if let Some(notifier) = context.notifier() {
        let url = context.layout(&descriptor).url;
        // The grant is already committed; a mail failure is only reported.
        if let Err(e) = notifier.notify_grant(user, &url, path, mode).await {
            eprintln!("{} {}", "Warning:".yellow().bold(), e);
        }
    }
    Ok(())
}

/// Remove every grant a principal holds on a path
pub fn remove(context: &Context, repository: &str, path: &str, user: &str) -> Result<()> {
    let mut descriptor = context.load_descriptor(repository)?;
    println!("{} {}", "Path:".cyan(), path);
    println!("{} {}", "User:".cyan(), user);

    if !descriptor.has_authorization(path, user)? {
        return Err(AuthzError::NotFound(format!(
            "No authorizations found for {} on {} in {}",
            user, path, descriptor.name
        ))
        .into());
    }

    let removed = descriptor.remove_authorization(path, user)?;
    println!(
        "{} Removed {} for {} from {}.",
        "✓".green(),
        plural(removed, "permission"),
        user,
        descriptor.name
    );

    context.store.persist(&descriptor)?;
    context.checkin(
        &descriptor,
        &format!(
            "Delete Auth ({}, {}) from repository: {}.",
            path,
            user,
            descriptor.path()
        ),
    )
}

/// Remove every direct grant of a user
pub fn remove_user(context: &Context, repository: &str, user: &str) -> Result<()> {
    let mut descriptor = context.load_descriptor(repository)?;
    println!("{} {}", "User:".cyan(), user);

    let removed = descriptor.remove_user(user)?;
    if removed == 0 {
        return Err(AuthzError::NotFound(format!(
            "{} has no permissions for the repository {}",
            user, descriptor.name
        ))
        .into());
    }
    println!(
        "{} Removed {} for {} from {}.",
        "✓".green(),
        plural(removed, "permission"),
        user,
        descriptor.name
    );

    context.store.persist(&descriptor)?;
    context.checkin(
        &descriptor,
        &format!("Del User {} from repository: {}.", user, descriptor.path()),
    )
}

/// List the groups and grants of a repository
pub fn list(context: &Context, repository: &str) -> Result<()> {
    let descriptor = context.load_descriptor(repository)?;
    println!();
    print_access(&descriptor);
    Ok(())
}
