use clap::Parser;
use tracing_subscriber::EnvFilter;

use sw_daemon::cli::{self, Cli, Command, ConfigCommand, RunArgs};
use sw_daemon::runtime::{Event, LogNotifier, TimerLoop};
use sw_daemon::store::IntentStore;
use sw_domain::config::ObservabilityConfig;
use sw_domain::TimerMode;
use sw_engine::{Remaining, SystemClock};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        // Default to run when no subcommand is given.
        None => run(RunArgs::default()).await,
        Some(Command::Run(args)) => run(args).await,
        Some(Command::Status) => status(),
        Some(Command::Config(ConfigCommand::Validate)) => {
            let (config, config_path) = cli::load_config()?;
            config.validate()?;
            println!("{config_path}: ok");
            Ok(())
        }
        Some(Command::Config(ConfigCommand::Show)) => {
            let (config, _config_path) = cli::load_config()?;
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        Some(Command::Version) => {
            println!("staywake {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn run(args: RunArgs) -> anyhow::Result<()> {
    let (config, _config_path) = cli::load_config()?;
    config.validate()?;
    init_tracing(&config.observability);

    // CLI misuse is a hard error; only persisted garbage gets the soft
    // reset-to-indefinite treatment.
    let override_intent = args.intent_override();
    if let Some(intent) = &override_intent {
        intent.validate()?;
    }

    let clock = SystemClock::from_config(config.engine.timezone.as_deref());
    let store = IntentStore::new(&config.engine.state_dir);
    let (timer_loop, events) = TimerLoop::new(store, clock, LogNotifier);

    // Ctrl-C funnels through the same serialized event stream as fires.
    let shutdown_tx = events.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(Event::Shutdown);
        }
    });

    timer_loop.run(override_intent).await;
    Ok(())
}

fn status() -> anyhow::Result<()> {
    let (config, _config_path) = cli::load_config()?;
    config.validate()?;
    let clock = SystemClock::from_config(config.engine.timezone.as_deref());
    let intent = IntentStore::new(&config.engine.state_dir).load();

    match intent.mode {
        TimerMode::Indefinite => println!("timer: indefinite (no expiration)"),
        TimerMode::Duration => println!("timer: {} minutes", intent.duration_minutes),
        TimerMode::UntilTime => println!("timer: until {}", intent.until),
    }
    match sw_engine::remaining_secs(&intent, &clock)? {
        Remaining::Infinite => {}
        Remaining::Finite(0) => println!("remaining: expired"),
        Remaining::Finite(secs) => println!("remaining: {}", cli::format_span(secs)),
    }
    Ok(())
}

/// Structured logging with an env-filter; JSON format when configured.
fn init_tracing(obs: &ObservabilityConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sw_daemon=debug,sw_engine=debug"));

    if obs.json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .init();
    }
}
