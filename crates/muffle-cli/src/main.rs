mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "muffle")]
#[command(about = "Blur policy-violating items in a live feed", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the pipeline, reading feed edits as JSON lines
    Run {
        /// Feed file, or "-" for stdin. Without a feed only the control socket drives the pipeline
        #[arg(short, long)]
        feed: Option<PathBuf>,
        /// Exit once the feed has ended and every request has resolved
        #[arg(long)]
        once: bool,
        /// Write logs to this file instead of stderr
        #[arg(long)]
        log_file: Option<PathBuf>,
    },
    /// Turn suppression on or off in the running pipeline
    Toggle {
        #[arg(value_enum)]
        state: commands::control::Switch,
    },
    /// Show the running pipeline's status
    Status,
    /// Stop the running pipeline
    Stop,
    /// Classify texts in a single request (does not need a running pipeline)
    Classify {
        #[arg(required = true)]
        texts: Vec<String>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the config file location
    Path,
    /// Print the effective configuration (API key masked)
    Show,
    /// Write the default configuration if no config file exists
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Run {
            log_file: Some(path),
            ..
        } => commands::run::setup_file_logging(path)?,
        _ => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
                .format_timestamp_secs()
                .init();
        }
    }

    match cli.command {
        Commands::Run { feed, once, .. } => commands::run::run_pipeline(feed, once).await,
        Commands::Toggle { state } => commands::control::toggle(state).await,
        Commands::Status => commands::control::show_status().await,
        Commands::Stop => commands::control::stop().await,
        Commands::Classify { texts } => commands::classify::classify_texts(texts).await,
        Commands::Config { action } => match action {
            ConfigAction::Path => commands::config::show_path(),
            ConfigAction::Show => commands::config::show_config(),
            ConfigAction::Init => commands::config::init_config(),
        },
    }
}
