mod app;
mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use lectern_lib::review::Understanding;

#[derive(Parser)]
#[command(name = "lectern-cli", about = "Review scheduling and study progress for a Markdown vault", version)]
struct Cli {
    /// Config file (default: <config dir>/lectern/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Vault directory, overriding the config
    #[arg(long, global = true)]
    vault: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Compute a next review date without touching any note
    NextDate {
        /// Last review date (YYYY-MM-DD)
        last: String,
        /// Reviews done so far
        #[arg(long, default_value = "0")]
        count: u32,
        /// Difficulty 0-5
        #[arg(long, default_value = "0")]
        difficulty: i64,
        /// none, hard, ok, good or perfect
        #[arg(long, default_value = "none")]
        understanding: Understanding,
    },

    /// Check off a repeat of a note
    Repeat {
        /// Note path relative to the vault
        note: String,
        /// Repeat number
        index: u32,
    },

    /// Record a timed review and/or rate a note
    Review {
        /// Note path relative to the vault
        note: String,
        /// Time spent, in seconds
        #[arg(long)]
        seconds: Option<u64>,
        /// none, hard, ok, good or perfect
        #[arg(long)]
        understanding: Option<Understanding>,
        /// Difficulty 0-5
        #[arg(long)]
        difficulty: Option<i64>,
    },

    /// Add a feedback entry to a note
    Feedback {
        /// Note path relative to the vault
        note: String,
        /// Feedback text
        text: String,
    },

    /// Recompute segment progress of a note
    Progress {
        /// Note path relative to the vault
        note: String,
    },

    /// Show completion of a series
    Series {
        /// Series name
        name: String,
    },

    /// List notes due for review
    Due {
        /// Date to check against (default: today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Watch the vault and track progress until interrupted
    Watch,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let opts = app::Options {
        config: cli.config,
        vault: cli.vault,
    };

    match cli.command {
        Command::NextDate {
            last,
            count,
            difficulty,
            understanding,
        } => {
            commands::next_date::run(&last, count, difficulty, understanding, &cli.format)?;
        }
        Command::Repeat { note, index } => {
            let app = app::App::new(&opts)?;
            commands::review::run_repeat(&app, &note, index, &cli.format).await?;
        }
        Command::Review {
            note,
            seconds,
            understanding,
            difficulty,
        } => {
            let app = app::App::new(&opts)?;
            let rating = commands::review::Rating {
                seconds,
                understanding,
                difficulty,
            };
            commands::review::run_review(&app, &note, rating, &cli.format).await?;
        }
        Command::Feedback { note, text } => {
            let app = app::App::new(&opts)?;
            commands::review::run_feedback(&app, &note, &text, &cli.format).await?;
        }
        Command::Progress { note } => {
            let app = app::App::new(&opts)?;
            commands::progress::run(&app, &note, &cli.format).await?;
        }
        Command::Series { name } => {
            let app = app::App::new(&opts)?;
            commands::series::run(&app, &name, &cli.format).await?;
        }
        Command::Due { date } => {
            let app = app::App::new(&opts)?;
            commands::due::run(&app, date.as_deref(), &cli.format).await?;
        }
        Command::Watch => {
            let app = app::App::new(&opts)?;
            commands::watch::run(app).await?;
        }
    }

    Ok(())
}
