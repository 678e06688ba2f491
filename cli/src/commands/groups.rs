use crate::utils::context::Context;
use crate::utils::output::plural;
use anyhow::{bail, Context as _, Result};
use colored::*;

/// Characters trimmed from member arguments, so `alice, bob:` works.
const MEMBER_SEPARATORS: &[char] = &[' ', ',', ':', '\t', '\n'];

fn clean_members(users: Vec<String>) -> Vec<String> {
    users
        .iter()
        .map(|user| user.trim_matches(MEMBER_SEPARATORS))
        .filter(|user| !user.is_empty())
        .map(str::to_string)
        .collect()
}

/// Add a group with its members
pub fn add(context: &Context, repository: &str, group: &str, users: Vec<String>) -> Result<()> {
    let users = clean_members(users);
    if users.is_empty() {
        bail!("A group needs at least one member");
    }

    let mut descriptor = context.load_descriptor(repository)?;
    println!("{} {}", "Group:".cyan(), group);
    println!("{} {}", "Users:".cyan(), users.join(", "));

    descriptor
        .add_group(group, users.clone())
        .with_context(|| format!("Cannot add group {}", group))?;
    println!(
        "{} Added group {} to {} with members: {}",
        "✓".green(),
        group,
        descriptor.name,
        users.join(", ")
    );

    context.store.persist(&descriptor)?;
    context.checkin(
        &descriptor,
        &format!(
            "Add group (name:{}, users:{}) to repository: {}.",
            group,
            users.join(", "),
            descriptor.path()
        ),
    )
}

/// Remove members from a group, or the group itself and every grant it holds
pub fn remove(
    context: &Context,
    repository: &str,
    group: &str,
    users: Vec<String>,
    confirmed: bool,
) -> Result<()> {
    let users = clean_members(users);
    let mut descriptor = context.load_descriptor(repository)?;
    println!("{} {}", "Group:".cyan(), group);

    let message = if users.is_empty() {
        if !confirmed {
            bail!(
                "Removing group {} also removes all of its grants; pass --yes to confirm",
                group
            );
        }
        let removed = descriptor.remove_group(group)?;
        println!(
            "{} Removed the group {} and {}",
            "✓".green(),
            group,
            plural(removed, "grant")
        );
        format!("Delete Group:{} from repository: {}.", group, descriptor.path())
    } else {
        println!("{} {}", "Users:".cyan(), users.join(", "));
        for user in &users {
            descriptor.remove_group_member(group, user)?;
        }
        println!(
            "{} Removed users {} from group {}.",
            "✓".green(),
            users.join(", "),
            group
        );
        if descriptor.groups().members(group).is_empty() && descriptor.group_has_grants(group) {
            // Empty groups are left out of the authz file, so its @group grants
            // would name an undefined group.
            eprintln!(
                "{} Group {} has no members left but still holds grants; mod_authz_svn will reject the authz file until members are added or the group is removed with --yes",
                "Warning:".yellow().bold(),
                group
            );
        }
        format!(
            "Delete users {} from group {} in repository: {}.",
            users.join(", "),
            group,
            descriptor.path()
        )
    };

    context.store.persist(&descriptor)?;
    context.checkin(&descriptor, &message)
}
