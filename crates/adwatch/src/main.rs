// SPDX-FileCopyrightText: 2026 Adwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adwatch - a keyword-notification daemon for group chat streams.
//!
//! This is the binary entry point for the adwatch daemon.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod serve;

/// Adwatch - a keyword-notification daemon for group chat streams.
#[derive(Parser, Debug)]
#[command(name = "adwatch", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the notification daemon.
    Serve,
    /// Load and validate the configuration, then print a summary.
    Check,
}

fn load_config(path: Option<&PathBuf>) -> adwatch_config::AdwatchConfig {
    let result = match path {
        Some(path) => match adwatch_config::load_config_from_path(path) {
            Ok(config) => adwatch_config::validation::validate_config(&config).map(|()| config),
            Err(e) => Err(adwatch_config::diagnostic::figment_to_config_errors(
                e,
                &collect_source(path),
            )),
        },
        None => adwatch_config::load_and_validate(),
    };

    match result {
        Ok(config) => config,
        Err(errors) => {
            adwatch_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

fn collect_source(path: &std::path::Path) -> Vec<(String, String)> {
    std::fs::read_to_string(path)
        .map(|content| vec![(path.display().to_string(), content)])
        .unwrap_or_default()
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());

    match cli.command {
        Some(Commands::Serve) | None => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("adwatch: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Check) => {
            println!(
                "adwatch: config ok (database={}, idle_timeout={}s, keywords_limit={})",
                config.storage.database_path,
                config.engine.idle_timeout_secs,
                config.engine.keywords_limit
            );
        }
    }
}
