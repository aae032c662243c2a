// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mnemo - memory and model inspection for the assistant core.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mnemo_config::MnemoConfig;

/// Mnemo - a memory-grounded personal assistant core.
#[derive(Parser, Debug)]
#[command(name = "mnemo", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show index statistics, embedding backend and selected model.
    Status {
        #[arg(long)]
        json: bool,
        /// Disable colors.
        #[arg(long)]
        plain: bool,
    },
    /// Rebuild the index from the memory files on disk.
    Reindex,
    /// Hybrid search over memory.
    Search {
        query: String,
        #[arg(long)]
        json: bool,
    },
    /// Print the memory block injected into the system prompt.
    Context,
    /// Print lines of a memory file.
    Lines {
        path: String,
        #[arg(default_value_t = 1)]
        from: usize,
        #[arg(default_value_t = 40)]
        count: usize,
    },
    /// Append an entry to today's daily log.
    Append { text: String },
    /// List the model catalogue and which models are usable.
    Models {
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => mnemo_config::load_and_validate_path(path),
        None => mnemo_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            mnemo_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.agent.log_level);

    if let Err(e) = dispatch(cli.command, &config).await {
        eprintln!("mnemo: {e}");
        std::process::exit(1);
    }
}

async fn dispatch(command: Option<Commands>, config: &MnemoConfig) -> Result<(), mnemo_core::MnemoError> {
    match command {
        Some(Commands::Status { json, plain }) => commands::status(config, json, plain).await,
        Some(Commands::Reindex) => commands::reindex(config).await,
        Some(Commands::Search { query, json }) => commands::search(config, &query, json).await,
        Some(Commands::Context) => commands::context(config).await,
        Some(Commands::Lines { path, from, count }) => {
            commands::lines(config, &path, from, count).await
        }
        Some(Commands::Append { text }) => commands::append(config, &text).await,
        Some(Commands::Models { json }) => {
            commands::models(config, json);
            Ok(())
        }
        None => {
            println!("mnemo: use --help for available commands");
            Ok(())
        }
    }
}

/// Initializes the tracing subscriber. `RUST_LOG` wins over `agent.log_level`.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mnemo={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_loads_config_defaults() {
        let config = mnemo_config::load_and_validate_str("").expect("default config should be valid");
        assert_eq!(config.agent.name, "mnemo");
    }

    #[test]
    fn cli_parses_lines_defaults() {
        let cli = Cli::parse_from(["mnemo", "lines", "MEMORY.md"]);
        match cli.command {
            Some(Commands::Lines { path, from, count }) => {
                assert_eq!(path, "MEMORY.md");
                assert_eq!(from, 1);
                assert_eq!(count, 40);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_accepts_global_config() {
        let cli = Cli::parse_from(["mnemo", "search", "tea", "--config", "/tmp/m.toml", "--json"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/m.toml")));
        assert!(matches!(cli.command, Some(Commands::Search { json: true, .. })));
    }
}
