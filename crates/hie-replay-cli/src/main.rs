mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use hie_replay::ReplayError;
use hie_replay::config::loader::load_config;

use cli::{Cli, Commands, ConfigCommands};
use output::print_error;

const EXIT_FATAL: i32 = 1;
const EXIT_CONFIG: i32 = 2;
/// Exit code when the run finished but some records failed.
const EXIT_PARTIAL: i32 = 3;

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        // A missing .env is fine
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound) {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            print_error(&format!("Configuration error: {e}"));
            std::process::exit(EXIT_CONFIG);
        }
    };
    hie_replay::observability::init_tracing_with_level(&config.logging.level);
    tracing::debug!(environment = %cli.env, "configuration loaded");

    let result = run(&cli, &config).await;
    if let Err(e) = &result {
        print_error(&format!("{e:#}"));
    }
    if let Some(code) = exit_code(&result) {
        std::process::exit(code);
    }
}

/// Process exit code for a finished run, `None` when everything was replayed.
fn exit_code(result: &Result<bool>) -> Option<i32> {
    match result {
        Ok(true) => None,
        Ok(false) => Some(EXIT_PARTIAL),
        Err(e) => match e.downcast_ref::<ReplayError>() {
            Some(ReplayError::Config(_)) => Some(EXIT_CONFIG),
            _ => Some(EXIT_FATAL),
        },
    }
}

async fn run(cli: &Cli, config: &hie_replay::ReplayConfig) -> Result<bool> {
    let format = cli.format.unwrap_or_default();

    match &cli.command {
        Commands::Replay(args) => commands::replay::replay(config, cli.env, args, format).await,
        Commands::List(args) => {
            commands::list::list(config, args, format).await?;
            Ok(true)
        }
        Commands::Config(args) => match &args.command {
            ConfigCommands::Show => {
                commands::config::show(config, cli.env, format)?;
                Ok(true)
            }
        },
    }
}
