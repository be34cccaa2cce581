// src/viz_export.rs
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;
use std::{fs, path::Path};
use tracing::debug;

use crate::out_models::DashboardSnapshot;

/* -------------------------------------------------------------------------- */
/* Entry point                                                                */
/* -------------------------------------------------------------------------- */

/// Write chart-ready JSON for every view into `out/<date>/`.
/// Returns the file names written, index last.
pub fn write_all_viz(out_dir_for_date: &Path, snapshot: &DashboardSnapshot) -> Result<Vec<String>> {
    fs::create_dir_all(out_dir_for_date).with_context(|| format!("create {:?}", out_dir_for_date))?;
    let mut files = Vec::new();

    // 1) Feedback analysis (sentiment pie, ratings bar, hourly timeline)
    files.push(write_named(out_dir_for_date, "analysis.feedback.json", &snapshot.analysis)?);

    // 1b) Feedback browser, newest first, unfiltered
    files.push(write_named(out_dir_for_date, "feedback.json", &snapshot.feedback)?);

    // 2) Overview per period; an absent period gets its explicit no-data document
    for ov in &snapshot.overviews {
        let name = format!("overview.{}.json", slug(ov.period()));
        files.push(write_named(out_dir_for_date, &name, ov)?);
    }

    // 3) Insight briefs per period
    for ins in &snapshot.insights {
        let name = format!("insights.{}.json", slug(ins.period()));
        files.push(write_named(out_dir_for_date, &name, ins)?);
    }

    // 4) Service board
    files.push(write_named(out_dir_for_date, "services.json", &snapshot.services)?);

    // 5) Per-day index
    let counts = json!({
        "feedback": snapshot.analysis.total_entries,
        "feedback_page": snapshot.feedback.items.len(),
        "rated_services": snapshot.analysis.service_ratings.len(),
        "services": snapshot.services.rows.len(),
        "overviews_ready": snapshot.overviews.iter().filter(|o| o.snapshot().is_some()).count(),
        "insights_ready": snapshot.insights.iter().filter(|i| i.brief().is_some()).count(),
    });
    let idx = json!({
        "date": snapshot.date,
        "version": 1,
        "counts": counts,
        "files": files,
    });
    files.push(write_named(out_dir_for_date, "viz.index.json", &idx)?);

    debug!("Viz bundle written - dir={}, files={}", out_dir_for_date.display(), files.len());
    Ok(files)
}

fn write_named<T: ?Sized + Serialize>(dir: &Path, name: &str, value: &T) -> Result<String> {
    write_json(dir.join(name), value)?;
    Ok(name.to_string())
}

fn write_json<P: AsRef<Path>, T: ?Sized + Serialize>(path: P, value: &T) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, serde_json::to_vec_pretty(value)?).with_context(|| format!("write {:?}", path))
}

/// "1 Daily" -> "1-daily", "weekly" -> "weekly".
fn slug(period: &str) -> String {
    let mut out = String::with_capacity(period.len());
    for c in period.trim().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{build_snapshot, DashboardInputs};
    use crate::config::EngineConfig;
    use crate::period::PeriodKey;

    #[test]
    fn test_slug() {
        assert_eq!(slug("1 Daily"), "1-daily");
        assert_eq!(slug("30  Monthly"), "30-monthly");
        assert_eq!(slug("weekly"), "weekly");
    }

    #[test]
    fn test_writes_bundle_with_no_data_documents() {
        let cfg = EngineConfig::default();
        let snapshot = build_snapshot(
            "2025-03-02",
            &DashboardInputs::default(),
            &[PeriodKey::Daily],
            &cfg,
            chrono_tz::UTC,
        );

        let dir = tempfile::tempdir().unwrap();
        let files = write_all_viz(dir.path(), &snapshot).unwrap();
        assert_eq!(
            files,
            vec![
                "analysis.feedback.json",
                "feedback.json",
                "overview.1-daily.json",
                "insights.daily.json",
                "services.json",
                "viz.index.json"
            ]
        );

        let overview: serde_json::Value =
            serde_json::from_slice(&fs::read(dir.path().join("overview.1-daily.json")).unwrap()).unwrap();
        assert_eq!(overview["status"], "no_data");

        let index: serde_json::Value =
            serde_json::from_slice(&fs::read(dir.path().join("viz.index.json")).unwrap()).unwrap();
        assert_eq!(index["counts"]["overviews_ready"], 0);
        assert_eq!(index["files"].as_array().unwrap().len(), 5);
        assert_eq!(index["counts"]["feedback_page"], 0);
    }
}
