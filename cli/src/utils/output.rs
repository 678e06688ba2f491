use authz::RepositoryDescriptor;
use colored::*;

/// `1 permission`, `2 permissions`.
pub fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

/// Print groups and grants the way `lsauth` and `info` show them.
pub fn print_access(descriptor: &RepositoryDescriptor) {
    if !descriptor.groups().is_empty() {
        println!("{}", "Groups:".bold());
        for group in descriptor.groups().iter() {
            println!("  {} = {}", group.name.cyan(), group.members.join(", "));
        }
        println!();
    }

    if descriptor.authorizations().is_empty() {
        println!("{}", "No authorizations!".yellow());
        return;
    }

    println!("{}", "Authorizations:".bold());
    for authorization in descriptor.authorizations().iter() {
        println!(
            "  path: {}\tuser: {}\tpermission: {}",
            authorization.path(),
            authorization.principal(),
            authorization.mode()
        );
    }
}
