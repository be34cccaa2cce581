use serde::{Deserialize, Serialize};

use crate::models::{
    FeedbackRecord, Kpi, NegativeComment, PlaybookItem, SentimentSlice, ServiceAggregate,
    ServicePerformance, TimeBucket,
};

/* Feedback analysis */

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackAnalysis {
    pub total_entries: usize,
    pub sentiment: Vec<SentimentSlice>,            // counts
    pub sentiment_percent: Vec<SentimentSlice>,    // whole-number shares
    pub service_ratings: Vec<ServiceAggregate>,    // leaderboard, top N
    pub timeline: Vec<TimeBucket>,                 // hour of day, chronological
    pub daily_volume: Vec<TimeBucket>,             // calendar day, chronological
    pub peak_hour: Option<TimeBucket>,
    pub top_performer: Option<ServiceAggregate>,
    pub lowest_performer: Option<ServiceAggregate>,
}

/// One page of the feedback browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackPage {
    pub matched: usize,
    pub items: Vec<FeedbackRecord>,
}

/* Overview */

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiCard {
    #[serde(flatten)]
    pub kpi: Kpi,
    pub favorable: bool,
    pub is_sentiment: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub key: String,
    pub name: String, // display name
    pub score: f64,
    pub strong: bool,
    pub good: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwarenessPoint {
    pub key: String, // CC1 | CC2 | CC3
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverviewSnapshot {
    pub period: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub kpi: Vec<KpiCard>,
    pub sentiment: Vec<SentimentSlice>,
    pub dimensions: Vec<DimensionScore>,
    pub good_count: usize,
    pub poor_count: usize,
    pub awareness_trend: Vec<AwarenessPoint>,
    pub awareness_overall: f64,
}

/// Either a snapshot or an explicit "no current view" marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OverviewResult {
    Ready(OverviewSnapshot),
    NoData { period: String },
}

/* Insights */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityStatus {
    Optimal,
    NeedsReview,
    Standby, // no data
}

impl IntegrityStatus {
    /// From a 0..100 sentiment score.
    pub fn from_score(score: Option<u32>) -> Self {
        match score {
            Some(s) if s >= 80 => Self::Optimal,
            Some(_) => Self::NeedsReview,
            None => Self::Standby,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightBrief {
    pub period: String,
    pub date_range: Option<String>,
    pub severity: Option<String>,
    pub inference_strength: Option<f64>,
    pub sentiment_score: u32, // 0..100
    pub sentiment_substituted: bool,
    pub integrity: IntegrityStatus,
    pub is_critical: bool,
    pub playbook: Vec<PlaybookItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InsightResult {
    Ready(InsightBrief),
    NoData { period: String, integrity: IntegrityStatus },
}

/* Service board */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingTier {
    Excellent,
    Good,
    NeedsReview,
}

impl RatingTier {
    pub fn from_rating(rating: f64) -> Self {
        if rating >= 4.0 {
            Self::Excellent
        } else if rating >= 3.0 {
            Self::Good
        } else {
            Self::NeedsReview
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegativeLoad {
    Critical,
    Moderate,
    Stable,
}

impl NegativeLoad {
    /// From the percentage of negative feedback.
    pub fn from_percent(negative: f64) -> Self {
        if negative > 20.0 {
            Self::Critical
        } else if negative > 10.0 {
            Self::Moderate
        } else {
            Self::Stable
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRow {
    #[serde(flatten)]
    pub service: ServicePerformance,
    pub tier: RatingTier,
    pub load: NegativeLoad,
    pub negative_comments: Vec<NegativeComment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceBoard {
    pub rows: Vec<ServiceRow>,
    pub highest_rated: Option<ServicePerformance>,
    pub highest_negative: Option<ServicePerformance>,
}

/* Full run */

/// Everything one fetch produces, ready for export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub date: String, // YYYY-MM-DD, local to the dashboard timezone
    pub analysis: FeedbackAnalysis,
    pub feedback: FeedbackPage,
    pub overviews: Vec<OverviewResult>,
    pub insights: Vec<InsightResult>,
    pub services: ServiceBoard,
}

impl OverviewResult {
    pub fn period(&self) -> &str {
        match self {
            Self::Ready(s) => &s.period,
            Self::NoData { period } => period,
        }
    }

    pub fn snapshot(&self) -> Option<&OverviewSnapshot> {
        match self {
            Self::Ready(s) => Some(s),
            Self::NoData { .. } => None,
        }
    }
}

impl InsightResult {
    /// No brief for `period`; the integrity badge reads standby.
    pub fn no_data(period: impl Into<String>) -> Self {
        Self::NoData { period: period.into(), integrity: IntegrityStatus::from_score(None) }
    }

    pub fn period(&self) -> &str {
        match self {
            Self::Ready(b) => &b.period,
            Self::NoData { period, .. } => period,
        }
    }

    pub fn brief(&self) -> Option<&InsightBrief> {
        match self {
            Self::Ready(b) => Some(b),
            Self::NoData { .. } => None,
        }
    }
}
