mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cronman", about = "Cron table manager with execution tracking")]
struct Cli {
    /// Config file path (defaults to ~/.cronman/config.json5)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List tasks in the local table
    List {
        /// Read the live system table instead
        #[arg(long)]
        system: bool,
    },
    /// Add a task to the table
    Add {
        /// 5-field cron schedule, e.g. "*/5 * * * *"
        schedule: String,
        /// Shell command to run
        command: String,
    },
    /// Replace the task at an index
    Update {
        index: usize,
        schedule: String,
        command: String,
    },
    /// Remove the task at an index
    Remove { index: usize },
    /// Execute a command now and record the result
    Run { command: String },
    /// Print the raw local table
    Export,
    /// Replace the local table from a file ("-" for stdin)
    Import { file: PathBuf },
    /// Show live tasks tagged known/unknown against the local table
    Diff,
    /// Adopt the live system table as authoritative
    Pull,
    /// Write the local table to the live scheduler
    Push,
    /// Execution statistics over a day window
    Stats {
        #[arg(long, default_value_t = 30)]
        days: i64,
    },
    /// Record an externally reported execution (JSON payload, "-" for stdin)
    Track {
        file: PathBuf,
        /// Shared API key as handed to the wrapper script
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Recent execution records
    History {
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Recent table mutations
    Audit {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Print the external tracking wrapper script
    Wrapper,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => cronman_config::load_config_from(path)?,
        None => cronman_config::load_config()?,
    };

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(commands::dispatch(config, cli.command))
}
