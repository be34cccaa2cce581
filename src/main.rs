use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::{debug, info};

use civic_pulse::config::EngineConfig;
use civic_pulse::fetch::FeedbackSource;
use civic_pulse::orchestrator::{run_dashboard, RunOptions};
use civic_pulse::period::PeriodKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Source {
    All,
    Recent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Period {
    Daily,
    Weekly,
    Monthly,
}

impl From<Period> for PeriodKey {
    fn from(p: Period) -> Self {
        match p {
            Period::Daily => PeriodKey::Daily,
            Period::Weekly => PeriodKey::Weekly,
            Period::Monthly => PeriodKey::Monthly,
        }
    }
}

/// Civic Pulse - citizen feedback analytics snapshot
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Output directory for generated files (default: "out")
    #[arg(short, long, default_value = "out")]
    output_dir: PathBuf,

    /// Path to YAML config file (overrides CIVIC_PULSE_CONFIG environment variable)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dashboard API base URL, e.g. http://127.0.0.1:5000/api
    #[arg(long)]
    api_base: Option<String>,

    /// Period to export; repeat for several. Default: all
    #[arg(short, long, value_enum)]
    period: Vec<Period>,

    /// IANA timezone for hour and day buckets, e.g. Asia/Manila
    #[arg(long)]
    timezone: Option<String>,

    /// Feedback endpoint to aggregate
    #[arg(long, value_enum, default_value = "all")]
    source: Source,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();

    info!("Starting civic_pulse");

    let args = Args::parse();

    // Config: file (flag > env > defaults), then CLI overrides
    let mut cfg = EngineConfig::resolve(args.config.as_deref())?;
    if let Some(base) = args.api_base {
        debug!("Using API base from --api-base: {}", base);
        cfg.api_base = base;
    }
    if let Some(tz) = args.timezone {
        debug!("Using timezone from --timezone: {}", tz);
        cfg.timezone = tz;
    }
    cfg.validate()?;

    let periods = if args.period.is_empty() {
        PeriodKey::ALL.to_vec()
    } else {
        args.period.iter().copied().map(PeriodKey::from).collect()
    };

    let opts = RunOptions {
        output_dir: args.output_dir,
        source: match args.source {
            Source::All => FeedbackSource::All,
            Source::Recent => FeedbackSource::Recent,
        },
        periods,
    };

    let dir = run_dashboard(&cfg, &opts).await?;
    info!("Snapshot written to {}", dir.display());
    Ok(())
}
