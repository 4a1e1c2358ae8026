use clap::{Parser, Subcommand, ValueEnum};
use hie_replay::EnvironmentName;

#[derive(Parser)]
#[command(name = "hie-replay")]
#[command(about = "Replay logged QuestionnaireResponse transactions to the shared health record")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to ./hie-replay.toml when present)
    #[arg(short, long, global = true, env = "HIE_REPLAY_CONFIG")]
    pub config: Option<String>,

    /// Target SHR environment (dev or prod)
    #[arg(short, long, global = true, env = "HIE_REPLAY_ENV", default_value = "dev")]
    pub env: EnvironmentName,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the transaction log and re-send matching QuestionnaireResponses
    Replay(ReplayArgs),
    /// Show which transactions would be replayed
    List(ListArgs),
    /// Inspect resolved configuration
    Config(ConfigArgs),
}

#[derive(clap::Args)]
pub struct ReplayArgs {
    /// Prepare every payload but do not send anything
    #[arg(long)]
    pub dry_run: bool,
    /// Only replay transactions the interoperability layer logged as failed
    #[arg(long)]
    pub only_failed: bool,
}

#[derive(clap::Args)]
pub struct ListArgs {
    /// Only list transactions the interoperability layer logged as failed
    #[arg(long)]
    pub only_failed: bool,
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show resolved config with secrets redacted
    Show,
}
