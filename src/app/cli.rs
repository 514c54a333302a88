use clap::Parser;
use std::path::PathBuf;

/// abloop - A/B loop for the web player, simulated in your terminal 🔁
#[derive(Parser, Debug)]
#[command(name = "abloop", version, about)]
pub struct Args {
    /// Storage file (defaults to ~/.config/abloop/storage.json)
    #[arg(long, conflicts_with = "in_memory")]
    pub storage: Option<PathBuf>,

    /// Keep loop state in memory only
    #[arg(long)]
    pub in_memory: bool,

    /// Track shown by the simulated player
    #[arg(long)]
    pub track: Option<String>,

    /// Track length in seconds
    #[arg(long)]
    pub duration: Option<f64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Generate default config.toml to stdout
    #[arg(long)]
    pub generate_config: bool,
}
