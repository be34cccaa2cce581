use anyhow::{bail, Result};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::category::flatten_by_category;
use crate::models::{InsightStore, Kpi, PeriodStore, PeriodView};
use crate::out_models::{
    AwarenessPoint, DimensionScore, InsightBrief, IntegrityStatus, KpiCard, OverviewResult,
    OverviewSnapshot,
};

/// Dimensions averaging at least this are "good" on the overview.
pub const GOOD_DIMENSION_THRESHOLD: f64 = 3.0;

/// Sentiment substituted when an insight summary carries no score.
pub const CRITICAL_DEFAULT_SENTIMENT: f64 = 0.25;
pub const STANDARD_DEFAULT_SENTIMENT: f64 = 0.75;

const FAVORABLE_TRENDS: [&str; 4] = ["Moderate", "Stable", "Improving", "Optimal"];

/// Dashboard granularity. The two upstream endpoints key the same periods
/// differently ("1 Daily" vs "daily").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodKey {
    Daily,
    Weekly,
    Monthly,
}

impl PeriodKey {
    pub const ALL: [PeriodKey; 3] = [Self::Daily, Self::Weekly, Self::Monthly];

    /// Key used by GET /dashboard.
    pub fn dashboard_key(&self) -> &'static str {
        match self {
            Self::Daily => "1 Daily",
            Self::Weekly => "7 Weekly",
            Self::Monthly => "30 Monthly",
        }
    }

    /// Key used by GET /recommendations.
    pub fn insight_key(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    pub fn days(&self) -> u32 {
        match self {
            Self::Daily => 1,
            Self::Weekly => 7,
            Self::Monthly => 30,
        }
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.insight_key())
    }
}

impl FromStr for PeriodKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let folded = s.trim().to_lowercase();
        for key in Self::ALL {
            if folded == key.insight_key()
                || folded == key.dashboard_key().to_lowercase()
                || folded == key.days().to_string()
            {
                return Ok(key);
            }
        }
        bail!("unknown period '{}' (expected daily, weekly or monthly)", s)
    }
}

/// Direct lookup. A missing key is `None`: no other period is substituted,
/// since that would misrepresent which period is on screen.
pub fn resolve_view<'a>(store: &'a PeriodStore, key: &str) -> Option<&'a PeriodView> {
    let view = store.get(key);
    if view.is_none() {
        debug!("Period view missing - key={}, available={:?}", key, store.keys().collect::<Vec<_>>());
    }
    view
}

/// Insight brief for one period, or `None` when the period or its summary is
/// absent. A summary without a sentiment score gets a severity-derived
/// default, flagged in `sentiment_substituted`.
pub fn resolve_insight(store: &InsightStore, key: &str) -> Option<InsightBrief> {
    let period = store.get(key)?;
    let summary = period.summary.as_ref()?;

    let (raw_sentiment, substituted) = match summary.sentiment_score {
        Some(s) if s.is_finite() => (s, false),
        _ => {
            let critical = summary.overall_severity.as_deref() == Some("Critical");
            let fallback = if critical { CRITICAL_DEFAULT_SENTIMENT } else { STANDARD_DEFAULT_SENTIMENT };
            (fallback, true)
        }
    };
    let sentiment_score = (raw_sentiment * 100.0).round().clamp(0.0, 100.0) as u32;

    let date_range = match (&period.start_date, &period.end_date) {
        (Some(start), Some(end)) => Some(format!("{} - {}", start, end)),
        _ => None,
    };

    Some(InsightBrief {
        period: key.to_string(),
        date_range,
        severity: summary.overall_severity.clone(),
        inference_strength: summary.confidence_score,
        sentiment_score,
        sentiment_substituted: substituted,
        integrity: IntegrityStatus::from_score(Some(sentiment_score)),
        is_critical: sentiment_score < 50,
        playbook: flatten_by_category(&period.recommendations),
    })
}

/// Overview snapshot for `key`, or the explicit no-data result.
pub fn build_overview(store: &PeriodStore, key: &str) -> OverviewResult {
    match resolve_view(store, key) {
        Some(view) => OverviewResult::Ready(overview_snapshot(key, view)),
        None => OverviewResult::NoData { period: key.to_string() },
    }
}

pub fn overview_snapshot(key: &str, view: &PeriodView) -> OverviewSnapshot {
    let dimensions = dimension_scores(view);
    let good_count = dimensions.iter().filter(|d| d.good).count();
    let poor_count = dimensions.len() - good_count;

    OverviewSnapshot {
        period: key.to_string(),
        start_date: view.start_date.clone(),
        end_date: view.end_date.clone(),
        kpi: view.kpi.iter().map(kpi_card).collect(),
        sentiment: view.sentiment.clone(),
        dimensions,
        good_count,
        poor_count,
        awareness_trend: awareness_trend(view),
        awareness_overall: view.charter_awareness.overall,
    }
}

pub fn dimension_scores(view: &PeriodView) -> Vec<DimensionScore> {
    view.averages
        .iter()
        .map(|(name, &score)| DimensionScore {
            key: name.to_string(),
            name: capitalize(name),
            score,
            strong: view.strong_dimensions.iter().any(|s| s == name),
            good: score >= GOOD_DIMENSION_THRESHOLD,
        })
        .collect()
}

/// Charter awareness as an ordered CC1, CC2, CC3 series.
pub fn awareness_trend(view: &PeriodView) -> Vec<AwarenessPoint> {
    let cc = &view.charter_awareness;
    [("CC1", cc.cc1), ("CC2", cc.cc2), ("CC3", cc.cc3)]
        .into_iter()
        .map(|(key, score)| AwarenessPoint { key: key.to_string(), score })
        .collect()
}

/// A trend reads favourably when it shows growth or a calm status word.
pub fn is_favorable_trend(trend: &str) -> bool {
    trend.contains('+') || FAVORABLE_TRENDS.contains(&trend)
}

fn kpi_card(kpi: &Kpi) -> KpiCard {
    KpiCard {
        favorable: is_favorable_trend(&kpi.trend),
        is_sentiment: kpi.title.to_lowercase().contains("sentiment"),
        kpi: kpi.clone(),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> PeriodStore {
        serde_json::from_str(
            r#"{
              "1 Daily": {
                "kpi": [{"id": 1, "title": "Overall Sentiment", "value": "72%", "trend": "+3%"},
                        {"id": 2, "title": "Responses", "value": 140, "trend": "-8%"}],
                "sentiment": [{"name": "Positive", "value": 60}, {"name": "Neutral", "value": 25},
                              {"name": "Negative", "value": 15}],
                "averages": {"responsiveness": 4.1, "reliability": 2.7, "access": 3.0},
                "strong_dimensions": ["responsiveness"],
                "charter_awareness": {"cc1": 80, "cc2": 65, "cc3": 40, "overall": 62},
                "start_date": "2025-03-01", "end_date": "2025-03-01"
              },
              "7 Weekly": {}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_missing_period_is_explicit_no_data() {
        let store = store();
        assert!(resolve_view(&store, "30 Monthly").is_none());
        match build_overview(&store, "30 Monthly") {
            OverviewResult::NoData { period } => assert_eq!(period, "30 Monthly"),
            OverviewResult::Ready(_) => panic!("must not substitute another period"),
        }
    }

    #[test]
    fn test_overview_derivations() {
        let store = store();
        let OverviewResult::Ready(snap) = build_overview(&store, "1 Daily") else {
            panic!("daily view should resolve");
        };

        let names: Vec<&str> = snap.dimensions.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Responsiveness", "Reliability", "Access"]);
        assert!(snap.dimensions[0].strong);
        assert!(!snap.dimensions[1].strong);
        assert_eq!(snap.good_count, 2);
        assert_eq!(snap.poor_count, 1);

        let trend: Vec<&str> = snap.awareness_trend.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(trend, vec!["CC1", "CC2", "CC3"]);
        assert_eq!(snap.awareness_overall, 62.0);

        assert!(snap.kpi[0].favorable && snap.kpi[0].is_sentiment);
        assert!(!snap.kpi[1].favorable && !snap.kpi[1].is_sentiment);
    }

    #[test]
    fn test_empty_view_still_resolves() {
        let store = store();
        let OverviewResult::Ready(snap) = build_overview(&store, "7 Weekly") else {
            panic!("present but empty view is not missing");
        };
        assert!(snap.dimensions.is_empty());
        assert_eq!(snap.awareness_trend.len(), 3);
    }

    #[test]
    fn test_favorable_trend_words() {
        assert!(is_favorable_trend("Stable"));
        assert!(is_favorable_trend("+12%"));
        assert!(!is_favorable_trend("-2%"));
        assert!(!is_favorable_trend("stable"));
    }

    #[test]
    fn test_period_key_parsing() {
        assert_eq!("daily".parse::<PeriodKey>().unwrap(), PeriodKey::Daily);
        assert_eq!("7 Weekly".parse::<PeriodKey>().unwrap(), PeriodKey::Weekly);
        assert_eq!("30".parse::<PeriodKey>().unwrap(), PeriodKey::Monthly);
        assert!("yearly".parse::<PeriodKey>().is_err());
        assert_eq!(PeriodKey::Monthly.dashboard_key(), "30 Monthly");
    }

    fn insights(json: &str) -> InsightStore {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_insight_severity_default() {
        let store = insights(
            r#"{"daily": {"summary": {"overall_severity": "Critical"}},
                "weekly": {"summary": {"overall_severity": "Moderate", "confidence_score": 0.8}},
                "monthly": {"summary": {"overall_severity": "Critical", "sentiment_score": 0.91},
                            "start_date": "2025-02-01", "end_date": "2025-02-28"}}"#,
        );

        let daily = resolve_insight(&store, "daily").unwrap();
        assert_eq!(daily.sentiment_score, 25);
        assert!(daily.sentiment_substituted);
        assert!(daily.is_critical);
        assert_eq!(daily.integrity, IntegrityStatus::NeedsReview);

        let weekly = resolve_insight(&store, "weekly").unwrap();
        assert_eq!(weekly.sentiment_score, 75);
        assert_eq!(weekly.inference_strength, Some(0.8));

        let monthly = resolve_insight(&store, "monthly").unwrap();
        assert_eq!(monthly.sentiment_score, 91);
        assert!(!monthly.sentiment_substituted);
        assert_eq!(monthly.integrity, IntegrityStatus::Optimal);
        assert_eq!(monthly.date_range.as_deref(), Some("2025-02-01 - 2025-02-28"));
    }

    #[test]
    fn test_insight_missing_period_or_summary() {
        let store = insights(r#"{"daily": {"recommendations": {}}}"#);
        assert!(resolve_insight(&store, "daily").is_none());
        assert!(resolve_insight(&store, "weekly").is_none());
        assert_eq!(IntegrityStatus::from_score(None), IntegrityStatus::Standby);
    }

    #[test]
    fn test_insight_playbook_is_flattened() {
        let store = insights(
            r#"{"daily": {"summary": {"sentiment_score": 0.4},
                "recommendations": {"Queue": [{"issue": "long wait"}], "Staff": [{"issue": "rude"}]}}}"#,
        );
        let brief = resolve_insight(&store, "daily").unwrap();
        let cats: Vec<&str> = brief.playbook.iter().map(|p| p.category_name.as_str()).collect();
        assert_eq!(cats, vec!["Queue", "Staff"]);
        assert_eq!(brief.sentiment_score, 40);
    }
}
