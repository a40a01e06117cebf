pub mod chat;
pub mod config;
pub mod search;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Chat with the assistant in an interactive session
    ///
    /// Commands inside the session:
    ///   /history   show the remembered exchanges
    ///   /clear     forget this session's history
    ///   /exit      leave
    ///
    /// Examples:
    ///   luna chat
    ///   luna chat --memory-len 10 --docs notes.txt
    ///   luna chat --model deepseek-r1-distill-llama-70b
    Chat {
        /// Session key; each key keeps its own history
        #[arg(short, long, default_value = "default")]
        session: String,
        /// Chat model (overrides config)
        #[arg(short, long)]
        model: Option<String>,
        /// Conversational memory length in exchanges (overrides config)
        #[arg(long)]
        memory_len: Option<usize>,
        /// Document file consulted before every reply (paragraphs separated by blank lines)
        #[arg(short, long)]
        docs: Option<PathBuf>,
        /// Number of documents retrieved per reply (overrides config)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Find the documents nearest to a query
    ///
    /// Examples:
    ///   luna search --docs notes.txt "tech stack"
    ///   luna search --docs notes.txt -k 5 --json "favorite food"
    Search {
        /// Search query
        query: String,
        /// Document file (paragraphs separated by blank lines)
        #[arg(short, long)]
        docs: PathBuf,
        /// Number of results (default: from config)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Get a configuration value
    Get {
        /// Configuration key to get
        key: String,
    },
    /// Set a configuration value
    Set {
        /// Configuration key to set
        key: String,
        /// Value to set
        value: String,
    },
    /// Reset a configuration value to its default
    Unset {
        /// Configuration key to reset
        key: String,
    },
    /// List all configuration values
    List,
    /// Show the path to the config file
    Path,
}

/// Route and execute CLI commands
pub async fn run_command(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Chat {
            session,
            model,
            memory_len,
            docs,
            top_k,
        } => {
            self::chat::handle_chat(self::chat::ChatOptions {
                session,
                model,
                memory_len,
                docs,
                top_k,
            })
            .await
        }

        Commands::Search {
            query,
            docs,
            top_k,
            json,
        } => self::search::handle_search(query, docs, top_k, json).await,

        Commands::Config { command } => match command {
            ConfigCommands::Get { key } => self::config::handle_config_get(key).await,
            ConfigCommands::Set { key, value } => self::config::handle_config_set(key, value).await,
            ConfigCommands::Unset { key } => self::config::handle_config_unset(key).await,
            ConfigCommands::List => self::config::handle_config_list().await,
            ConfigCommands::Path => self::config::handle_config_path().await,
        },
    }
}
