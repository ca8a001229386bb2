use clap::{Parser, Subcommand};
use hr_assistant::Result;
use hr_assistant::commands::{ask_question, run_chat, show_status, upload_files};
use hr_assistant::config::{Config, run_interactive_config, show_config};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hr-assistant")]
#[command(about = "Answer questions about HR policy documents using retrieval-augmented generation")]
#[command(version)]
struct Cli {
    /// Configuration directory (defaults to the platform config directory)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the embedding server, vector index and generation model
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Upload PDF or DOCX documents into the index
    Upload {
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Ask a single question about the uploaded documents
    Ask {
        /// The question to answer
        query: String,
    },
    /// Start an interactive upload and question session
    Chat,
    /// Show the status of the external services
    Status,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_dir = match cli.config_dir {
        Some(dir) => dir,
        None => Config::default_dir()?,
    };

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config(&config_dir)?;
            } else {
                run_interactive_config(&config_dir)?;
            }
        }
        Commands::Upload { files } => {
            upload_files(&config_dir, &files)?;
        }
        Commands::Ask { query } => {
            ask_question(&config_dir, &query)?;
        }
        Commands::Chat => {
            run_chat(&config_dir)?;
        }
        Commands::Status => {
            show_status(&config_dir)?;
        }
    }

    Ok(())
}
