use anyhow::{bail, Context, Result};
use chrono::Utc;
use reqwest::Client;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::analysis::{build_snapshot, DashboardInputs};
use crate::config::EngineConfig;
use crate::fetch::{
    fetch_dashboard, fetch_feedback, fetch_negative_feedback, fetch_recommendations,
    fetch_service_performance, FeedbackSource,
};
use crate::period::PeriodKey;
use crate::render::render_report_markdown;
use crate::viz_export::write_all_viz;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub output_dir: PathBuf,
    pub source: FeedbackSource,
    pub periods: Vec<PeriodKey>,
}

/// Fetch every dashboard source once, run all views, persist the bundle.
/// Returns the date-scoped output directory.
pub async fn run_dashboard(cfg: &EngineConfig, opts: &RunOptions) -> Result<PathBuf> {
    let pipeline_start = std::time::Instant::now();
    let tz = cfg.tz()?;
    let date = Utc::now().with_timezone(&tz).format("%Y-%m-%d").to_string();
    info!("Pipeline started - date={}, api_base={}, periods={:?}", date, cfg.api_base, opts.periods);

    let client = Client::builder().build()?;

    // 1) fetch all sources concurrently; the engine runs once on the full set
    let fetch_start = std::time::Instant::now();
    let base = cfg.api_base.as_str();
    let (feedback, periods, insights, services, negatives) = futures::try_join!(
        fetch_feedback(&client, base, opts.source, tz),
        fetch_dashboard(&client, base),
        fetch_recommendations(&client, base),
        fetch_service_performance(&client, base),
        fetch_negative_feedback(&client, base),
    )?;
    info!(
        "Fetch completed - duration={:.2}s, feedback={}, periods={}, insight_periods={}, services={}",
        fetch_start.elapsed().as_secs_f32(),
        feedback.len(),
        periods.len(),
        insights.len(),
        services.len()
    );

    let inputs = DashboardInputs { feedback, periods, insights, services, negatives };
    if inputs.feedback.is_empty()
        && inputs.periods.is_empty()
        && inputs.insights.is_empty()
        && inputs.services.is_empty()
    {
        error!("No dashboard data available - api_base={}", base);
        bail!("No dashboard data available from {} (all endpoints empty or missing).", base);
    }

    // 2) aggregate
    let snapshot = build_snapshot(&date, &inputs, &opts.periods, cfg, tz);
    for ov in &snapshot.overviews {
        if ov.snapshot().is_none() {
            info!("Period view absent - period={}, rendering no-data state", ov.period());
        }
    }

    // 3) persist
    let date_dir = opts.output_dir.join(&date);
    let files = write_all_viz(&date_dir, &snapshot)?;
    write_report(&date_dir, &render_report_markdown(&snapshot))?;
    debug!("Wrote report.md and {} JSON files", files.len());

    info!(
        "Pipeline completed - total_duration={:.2}s, directory={}",
        pipeline_start.elapsed().as_secs_f32(),
        date_dir.display()
    );
    Ok(date_dir)
}

fn write_report(dir: &Path, md: &str) -> Result<()> {
    let path = dir.join("report.md");
    std::fs::write(&path, md.as_bytes()).with_context(|| format!("write {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_report_names_path_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such-day");
        let err = write_report(&missing, "# r").unwrap_err();
        assert!(format!("{:#}", err).contains("no-such-day"));

        write_report(dir.path(), "# r").unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("report.md")).unwrap(), "# r");
    }
}
