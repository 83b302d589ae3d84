use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use partwatch::{Monitor, RuleBasedAnalyzer, Settings, SimulatedSource, TelemetrySource};

#[derive(Parser, Debug)]
#[command(name = "partwatch")]
#[command(about = "Condition monitoring and incident reports for robot parts")]
struct Args {
    /// Path to a TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for report files (overrides settings)
    #[arg(long)]
    reports_dir: Option<PathBuf>,

    /// Evaluation interval (e.g., "5s", "500ms")
    #[arg(short, long)]
    interval: Option<String>,

    /// Seed for simulated telemetry
    #[arg(long)]
    seed: Option<u64>,

    /// Evaluate every robot once, print the outcomes and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "partwatch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(dir) = args.reports_dir {
        settings.reports_dir = dir;
    }
    if let Some(interval) = args.interval {
        settings.tick_interval = interval;
    }
    if args.seed.is_some() {
        settings.seed = args.seed;
    }
    let config = settings.into_monitor_config()?;

    let source = match config.seed {
        Some(seed) => SimulatedSource::with_seed(config.thresholds.clone(), seed),
        None => SimulatedSource::new(config.thresholds.clone()),
    };
    tracing::info!(source = source.description(), "Telemetry source ready");

    let analyzer = RuleBasedAnalyzer::new(config.thresholds.clone());
    let monitor = Monitor::new(config, Box::new(source), Box::new(analyzer));

    if args.once {
        let outcomes = monitor.tick();
        for outcome in &outcomes {
            println!(
                "{}: {} critical, {} warning, {} report(s)",
                outcome.robot_id,
                outcome.critical_count,
                outcome.warning_count,
                outcome.written().len()
            );
        }
    } else {
        monitor.start()?;
        tokio::signal::ctrl_c().await?;
        monitor.stop();
    }

    println!("{}", serde_json::to_string_pretty(&monitor.status())?);
    Ok(())
}
