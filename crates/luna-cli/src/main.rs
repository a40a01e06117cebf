use clap::Parser;
use std::path::PathBuf;
use tokio::runtime::Runtime;

use luna_core::env::logging as log_env;
use luna_core::logging::{init_logging, LoggingConfig};

mod commands;
use commands::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logging_config = match &cli.command {
        Commands::Chat { .. } => {
            // The REPL owns the terminal; log to ~/.luna/logs unless a file is configured
            let config = LoggingConfig::from_env().with_stdout(false);
            if std::env::var(log_env::LOG_FILE).is_ok() {
                config
            } else {
                let log_dir = dirs::home_dir()
                    .map(|home| home.join(".luna").join("logs"))
                    .unwrap_or_else(|| PathBuf::from("logs"));
                config.with_file(log_dir.join(format!(
                    "luna-{}.log",
                    chrono::Local::now().format("%Y%m%d")
                )))
            }
        }
        Commands::Search { .. } => {
            // Keep result output clean
            LoggingConfig::from_env().with_stdout(false)
        }
        Commands::Config { .. } => LoggingConfig::from_env(),
    };

    let _guard = init_logging(logging_config)?;

    let rt = Runtime::new()?;
    rt.block_on(commands::run_command(cli.command))
}
