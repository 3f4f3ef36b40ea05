mod commands;
mod config;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cloudplane")]
#[command(about = "Create, inspect, and destroy cloud resources across providers", long_about = None)]
struct Cli {
    /// Project directory holding .cloudplane state and provider configs
    #[arg(long, global = true, default_value = ".")]
    project: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Diff a desired-state document against durable state
    Plan {
        /// Path to the desired-state document (YAML)
        file: PathBuf,
    },
    /// Apply a desired-state document
    Apply {
        /// Path to the desired-state document (YAML)
        file: PathBuf,
        /// Maximum nodes applying concurrently
        #[arg(long, default_value_t = 4)]
        concurrency: usize,
        /// Per-node backend timeout in seconds
        #[arg(long, default_value_t = 600)]
        timeout: u64,
        /// Destroy resources whose descriptors were removed
        #[arg(long)]
        prune: bool,
    },
    /// Destroy everything a desired-state document describes
    Destroy {
        /// Path to the desired-state document (YAML)
        file: PathBuf,
        /// Per-node backend timeout in seconds
        #[arg(long, default_value_t = 600)]
        timeout: u64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// List live resources of a kind straight from the provider API
    List {
        /// Resource kind (database, databaseUser, vpc, ...)
        kind: String,
        /// Provider account to query
        #[arg(short, long)]
        account: String,
        /// Substring filter on resource ids
        #[arg(long)]
        id: Option<String>,
        /// Page size
        #[arg(long)]
        limit: Option<usize>,
        /// Page offset
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// Fetch one live resource by id
    Get {
        /// Resource kind (database, databaseUser, vpc, ...)
        kind: String,
        /// Resource id
        id: String,
        /// Provider account to query
        #[arg(short, long)]
        account: String,
    },
    /// Manage provider accounts
    #[command(subcommand)]
    Providers(ProviderCommands),
}

#[derive(Subcommand)]
enum ProviderCommands {
    /// Register a provider account from a credentials file
    Add {
        /// Account name, unique within the project
        name: String,
        /// Provider type (digitalocean, postgres)
        #[arg(short = 't', long = "type")]
        provider_type: String,
        /// Path to a JSON file with the credential bag
        #[arg(long)]
        credentials: PathBuf,
    },
    /// List registered provider accounts
    List,
    /// Remove a provider account
    Remove { name: String },
    /// Run the live credential check for an account
    Test { name: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Plan { file } => commands::plan::run(&cli.project, &file).await,
        Commands::Apply {
            file,
            concurrency,
            timeout,
            prune,
        } => commands::apply::run(&cli.project, &file, concurrency, timeout, prune).await,
        Commands::Destroy { file, timeout, yes } => {
            commands::destroy::run(&cli.project, &file, timeout, yes).await
        }
        Commands::List {
            kind,
            account,
            id,
            limit,
            offset,
        } => commands::list::run(&cli.project, &kind, &account, id, limit, offset).await,
        Commands::Get { kind, id, account } => {
            commands::list::get(&cli.project, &kind, &id, &account).await
        }
        Commands::Providers(command) => match command {
            ProviderCommands::Add {
                name,
                provider_type,
                credentials,
            } => commands::providers::add(&cli.project, &name, &provider_type, &credentials).await,
            ProviderCommands::List => commands::providers::list(&cli.project),
            ProviderCommands::Remove { name } => commands::providers::remove(&cli.project, &name),
            ProviderCommands::Test { name } => commands::providers::test(&cli.project, &name).await,
        },
    }
}
