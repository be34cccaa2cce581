// src/render.rs
use itertools::Itertools;

use crate::out_models::{DashboardSnapshot, InsightResult, OverviewResult};

pub fn render_report_markdown(s: &DashboardSnapshot) -> String {
    let a = &s.analysis;
    let mut md = String::new();
    md.push_str(&format!("# Citizen Feedback Report — {}\n\n", s.date));

    md.push_str("## Sentiment\n");
    md.push_str(&format!("Total entries: {}\n\n", a.total_entries));
    for (count, pct) in a.sentiment.iter().zip(&a.sentiment_percent) {
        md.push_str(&format!("- {}: {} ({}%)\n", count.name, count.value, pct.value));
    }
    md.push('\n');

    if !a.service_ratings.is_empty() {
        md.push_str("## Service Ratings\n");
        for (i, r) in a.service_ratings.iter().enumerate() {
            let rating = r.rating.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "n/a".into());
            md.push_str(&format!("{}. **{}** — {} / 5 ({} responses)\n", i + 1, r.name, rating, r.count));
        }
        md.push('\n');
    }

    if !a.timeline.is_empty() {
        md.push_str("## Volume by Hour\n");
        md.push_str(&format!(
            "{}\n",
            a.timeline.iter().map(|b| format!("{}: {}", b.key, b.count)).join(" · ")
        ));
        if let Some(peak) = &a.peak_hour {
            md.push_str(&format!("\nBusiest hour: **{}** ({} entries)\n", peak.key, peak.count));
        }
        md.push('\n');
    }

    for ov in &s.overviews {
        match ov {
            OverviewResult::Ready(snap) => {
                md.push_str(&format!("## Overview — {}\n", snap.period));
                md.push_str(&format!(
                    "Dimensions: {} good, {} below 3.0\n",
                    snap.good_count, snap.poor_count
                ));
                for d in &snap.dimensions {
                    let mark = if d.strong { " (strong)" } else { "" };
                    md.push_str(&format!("- {}: {:.2}{}\n", d.name, d.score, mark));
                }
                md.push_str(&format!(
                    "\nCharter awareness: {} (overall {})\n\n",
                    snap.awareness_trend.iter().map(|p| format!("{} {}", p.key, p.score)).join(", "),
                    snap.awareness_overall
                ));
            }
            OverviewResult::NoData { period } => {
                md.push_str(&format!("## Overview — {}\n_No data for this period._\n\n", period));
            }
        }
    }

    for ins in &s.insights {
        match ins {
            InsightResult::Ready(b) => {
                md.push_str(&format!("## Insights — {}\n", b.period));
                if let Some(range) = &b.date_range {
                    md.push_str(&format!("Range: {}\n", range));
                }
                let assumed = if b.sentiment_substituted { " (assumed from severity)" } else { "" };
                md.push_str(&format!(
                    "Severity: {} · Sentiment score: {}/100{}\n\n",
                    b.severity.as_deref().unwrap_or("Standard"),
                    b.sentiment_score,
                    assumed
                ));
                for item in &b.playbook {
                    md.push_str(&format!(
                        "- [{}] **{}** ({})\n",
                        item.category_name,
                        item.issue,
                        item.severity.as_deref().unwrap_or("Standard")
                    ));
                    for action in &item.actions {
                        md.push_str(&format!("  - {}\n", action));
                    }
                }
                md.push('\n');
            }
            InsightResult::NoData { period, .. } => {
                md.push_str(&format!("## Insights — {}\n_No data for this period._\n\n", period));
            }
        }
    }

    let board = &s.services;
    if !board.rows.is_empty() {
        md.push_str("## Service Performance\n");
        if let Some(best) = &board.highest_rated {
            md.push_str(&format!("Top performer: **{}** ({:.1} / 5.0)\n", best.name, best.rating));
        }
        if let Some(worst) = &board.highest_negative {
            md.push_str(&format!("Priority alert: **{}** ({}% negative)\n", worst.name, worst.negative));
        }
        md.push('\n');
        for row in &board.rows {
            md.push_str(&format!(
                "- {} — {:.1} ({:?}), {}% negative ({:?}), {} responses\n",
                row.service.name, row.service.rating, row.tier, row.service.negative, row.load, row.service.volume
            ));
        }
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{build_snapshot, DashboardInputs};
    use crate::config::EngineConfig;
    use crate::period::PeriodKey;

    #[test]
    fn test_report_marks_missing_periods() {
        let snapshot = build_snapshot(
            "2025-03-02",
            &DashboardInputs::default(),
            &PeriodKey::ALL,
            &EngineConfig::default(),
            chrono_tz::UTC,
        );
        let md = render_report_markdown(&snapshot);
        assert!(md.starts_with("# Citizen Feedback Report — 2025-03-02"));
        assert!(md.contains("## Overview — 30 Monthly\n_No data for this period._"));
        assert!(md.contains("## Insights — weekly\n_No data for this period._"));
        assert!(!md.contains("## Service Performance"));
    }
}
