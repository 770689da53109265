mod cmd;
mod output;
mod prompts;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ferret",
    about = "Quick actions and process supervision for the ferret file browser",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config root (default: $FERRET_CONFIG_DIR or ~/.config/ferret)
    #[arg(long, global = true, env = "FERRET_CONFIG_DIR")]
    config_root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install the bundled default actions (never overwrites existing files)
    Install,

    /// Resolve and list the actions visible for a selection
    List {
        /// Selected files
        paths: Vec<PathBuf>,
    },

    /// Run an action against a selection
    Run {
        /// Action display name, as shown by `list`
        action: String,
        /// Selected files
        paths: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let root = ferret_core::paths::config_root(cli.config_root.as_deref())?;

    match cli.command {
        Commands::Install => cmd::install::run(&root),
        Commands::List { paths } => cmd::list::run(&root, &paths, cli.json),
        Commands::Run { action, paths } => cmd::run::run(&root, &action, &paths).await,
    }
}
