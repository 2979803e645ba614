use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod app;
mod render;

#[derive(Parser)]
#[command(name = "paperchat")]
#[command(about = "paperchat - AI summaries for your reference library")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize an attachment and stream the answer to the terminal
    Summarize(SummarizeArgs),
    /// Show the config file location, or write a default one
    Config {
        /// Write default settings if no config file exists yet
        #[arg(long)]
        init: bool,
    },
}

#[derive(Args)]
pub struct SummarizeArgs {
    /// Attachment file (PDF from library storage, or a text file)
    pub path: PathBuf,

    /// Attachment key (defaults to the name of the containing directory)
    #[arg(short, long)]
    pub key: Option<String>,

    /// Model to use instead of the configured one
    #[arg(short, long)]
    pub model: Option<String>,

    /// Title for the saved conversation
    #[arg(short, long)]
    pub title: Option<String>,

    /// Save the conversation and create a note with the summary
    #[arg(long)]
    pub save: bool,

    /// Attach the note to this parent item
    #[arg(long, conflicts_with = "collection")]
    pub parent: Option<String>,

    /// File the note into this collection
    #[arg(long)]
    pub collection: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let settings = paperchat_core::Settings::load();

    match cli.command {
        Command::Summarize(args) => app::run_summarize(&settings, args).await?,
        Command::Config { init } => app::run_config(&settings, init)?,
    }

    Ok(())
}
