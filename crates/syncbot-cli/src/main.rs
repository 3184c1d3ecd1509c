mod cmd;
mod output;

use clap::{Parser, Subcommand};
use cmd::EventSource;

#[derive(Parser)]
#[command(
    name = "syncbot",
    about = "GitHub event automation: Notion records, Slack notifications and daily reports",
    version,
    propagate_version = true
)]
struct Cli {
    /// Repository display name, owner/name
    #[arg(long, global = true, env = "GITHUB_REPOSITORY")]
    repository: Option<String>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Debug logging
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or update the Notion record for an issue/PR event and post to Slack
    Sync {
        #[command(flatten)]
        source: EventSource,
    },

    /// Post a plain Slack message mentioning the item's assignees
    Notify {
        #[command(flatten)]
        source: EventSource,
    },

    /// Summarize yesterday's issues into a Notion report page
    Report {
        /// Report on this UTC day instead of yesterday (YYYY-MM-DD)
        #[arg(long)]
        date: Option<chrono::NaiveDate>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let repository = cli.repository.as_deref();

    let result = match cli.command {
        Commands::Sync { source } => cmd::sync::run(&source, repository, cli.json),
        Commands::Notify { source } => cmd::notify::run(&source, repository, cli.json),
        Commands::Report { date } => cmd::report::run(date, repository, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
