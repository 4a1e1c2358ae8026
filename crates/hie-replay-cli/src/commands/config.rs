use anyhow::Result;
use colored::Colorize;
use hie_replay::{EnvironmentName, ReplayConfig};

use crate::cli::OutputFormat;
use crate::output::print_json;

const REDACTED: &str = "********";

fn redacted(config: &ReplayConfig) -> ReplayConfig {
    let mut config = config.clone();
    for env in [&mut config.environments.dev, &mut config.environments.prod]
        .into_iter()
        .flatten()
    {
        if !env.password.is_empty() {
            env.password = REDACTED.to_string();
        }
    }
    if config.store.password.is_some() {
        config.store.password = Some(REDACTED.to_string());
    }
    config
}

pub fn show(config: &ReplayConfig, selected: EnvironmentName, format: OutputFormat) -> Result<()> {
    let config = redacted(config);
    if matches!(format, OutputFormat::Table) {
        println!("{}: {}", "Environment".cyan(), selected);
        match config.environments.get(selected) {
            Some(env) => {
                println!("{}: {}", "SHR".cyan(), env.base_url);
                println!("{}: {}", "User".cyan(), env.username);
            }
            None => println!("{}: (not configured)", "SHR".cyan()),
        }
        println!(
            "{}: {:?} {}",
            "Store".cyan(),
            config.store.source,
            config
                .store
                .url
                .as_deref()
                .or(config.store.path.as_deref().and_then(|p| p.to_str()))
                .unwrap_or("(not set)")
        );
        println!("{}: {}", "Routes".cyan(), config.replay.routes.join(", "));
        println!("{}: {}", "Only failed".cyan(), config.replay.only_failed);
        println!("{}: {}", "Log level".cyan(), config.logging.level);
    } else {
        print_json(&serde_json::to_value(&config)?);
    }
    Ok(())
}
