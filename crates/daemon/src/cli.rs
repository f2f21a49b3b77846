//! Command-line interface.

use clap::{Parser, Subcommand};

use sw_domain::config::Config;
use sw_domain::{TimeOfDay, TimerIntent};

/// StayWake — keep the machine awake until a timer expires.
#[derive(Debug, Parser)]
#[command(name = "staywake", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the keep-awake daemon (default when no subcommand is given).
    Run(RunArgs),
    /// Print the persisted timer state and remaining time.
    Status,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Default, clap::Args)]
pub struct RunArgs {
    /// Keep awake for this many minutes (5–1440), then revert.
    #[arg(long, conflicts_with_all = ["until", "indefinite"])]
    pub for_minutes: Option<u32>,
    /// Keep awake until the next local occurrence of HH:MM, then revert.
    #[arg(long, conflicts_with_all = ["for_minutes", "indefinite"])]
    pub until: Option<TimeOfDay>,
    /// Keep awake until explicitly stopped.
    #[arg(long)]
    pub indefinite: bool,
}

impl RunArgs {
    /// The intent override, when any timer flag was given.
    pub fn intent_override(&self) -> Option<TimerIntent> {
        if let Some(minutes) = self.for_minutes {
            Some(TimerIntent::for_minutes(minutes))
        } else if let Some(until) = self.until {
            Some(TimerIntent::until(until))
        } else if self.indefinite {
            Some(TimerIntent::default())
        } else {
            None
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

/// Load configuration from `$STAYWAKE_CONFIG` or `config.toml`, falling
/// back to defaults when the file is absent.
pub fn load_config() -> anyhow::Result<(Config, String)> {
    let config_path = std::env::var("STAYWAKE_CONFIG").unwrap_or_else(|_| "config.toml".into());

    let config = if std::path::Path::new(&config_path).exists() {
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
        toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))?
    } else {
        Config::default()
    };

    Ok((config, config_path))
}

/// Human-readable remaining-time span (whole seconds).
pub fn format_span(secs: u64) -> String {
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    if h > 0 {
        format!("{h}h {m:02}m {s:02}s")
    } else if m > 0 {
        format!("{m}m {s:02}s")
    } else {
        format!("{s}s")
    }
}
