use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use tracing_subscriber::EnvFilter;

mod commands;
mod utils;

use commands::{access, groups, import, repository};
use utils::context::Context;

/// repoadm - Administration of Subversion repositories and their access control
#[derive(Parser)]
#[command(name = "repoadm")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new Subversion repository
    Create {
        /// Repository path, e.g. its/sakai
        repository: String,

        /// Register the repository with the indexing service
        #[arg(short = 'i', long)]
        indexing: bool,

        /// Description shown by the indexing service
        #[arg(short, long, requires = "indexing")]
        description: Option<String>,
    },

    /// Print the steps to back up and remove a repository
    Delete { repository: String },

    /// Grant USER (or @group) MODE (r, rw) on PATH
    Addauth {
        repository: String,
        path: String,
        user: String,
        mode: String,
    },

    /// Remove every grant USER holds on PATH
    Delauth {
        repository: String,
        path: String,
        user: String,
    },

    /// Remove all direct grants of a user
    Deluser { repository: String, user: String },

    /// Add a group with its members
    Addgroup {
        repository: String,
        group: String,
        #[arg(required = true)]
        users: Vec<String>,
    },

    /// Remove members from a group, or the whole group and its grants
    Delgroup {
        repository: String,
        group: String,
        users: Vec<String>,

        /// Confirm removal of the whole group
        #[arg(short, long)]
        yes: bool,
    },

    /// List repositories, optionally under a single prefix
    Ls { prefix: Option<String> },

    /// List the groups and grants of a repository
    Lsauth { repository: String },

    /// Print a summary of a repository; file locations with --verbose
    Info { repository: String },

    /// Commit the repository descriptor
    Commit {
        repository: String,

        /// Add the descriptor to version control first
        #[arg(short, long)]
        add: bool,
    },

    /// Rewrite every file derived from the descriptor
    Flush { repository: String },

    /// Turn indexing on or off, or show its status
    Indexing {
        repository: String,

        #[arg(value_enum, default_value = "check")]
        mode: repository::IndexingMode,

        /// Description shown by the indexing service
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Build a descriptor from an existing authz file
    Import {
        repository: String,

        /// Authz file to read instead of the repository's own
        #[arg(short, long)]
        from: Option<std::path::PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli.command, cli.verbose).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(command: Commands, verbose: bool) -> Result<()> {
    let context = Context::load()?;

    match command {
        Commands::Create {
            repository,
            indexing,
            description,
        } => repository::create(&context, &repository, indexing, description).await,
        Commands::Delete { repository } => repository::delete(&context, &repository),
        Commands::Addauth {
            repository,
            path,
            user,
            mode,
        } => access::add(&context, &repository, &path, &user, &mode).await,
        Commands::Delauth {
            repository,
            path,
            user,
        } => access::remove(&context, &repository, &path, &user),
        Commands::Deluser { repository, user } => {
            access::remove_user(&context, &repository, &user)
        }
        Commands::Addgroup {
            repository,
            group,
            users,
        } => groups::add(&context, &repository, &group, users),
        Commands::Delgroup {
            repository,
            group,
            users,
            yes,
        } => groups::remove(&context, &repository, &group, users, yes),
        Commands::Ls { prefix } => repository::list(&context, prefix.as_deref()),
        Commands::Lsauth { repository } => access::list(&context, &repository),
        Commands::Info { repository } => repository::info(&context, &repository, verbose),
        Commands::Commit { repository, add } => repository::commit(&context, &repository, add),
        Commands::Flush { repository } => repository::flush(&context, &repository),
        Commands::Indexing {
            repository,
            mode,
            description,
        } => repository::indexing(&context, &repository, mode, description).await,
        Commands::Import { repository, from } => {
            import::execute(&context, &repository, from.as_deref())
        }
    }
}
