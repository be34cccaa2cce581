use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::api_types::{lenient_f64, lenient_string};
use crate::ordered::{CategoryMap, OrderedMap};

pub const DEFAULT_CLIENT: &str = "General Public";
pub const DEFAULT_SERVICE: &str = "Unknown";

/// One citizen feedback entry after ingestion. Defaults for absent fields are
/// applied by `fetch::normalize_feedback`, so the engine never sees a missing
/// client or service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub id: String,
    pub client: String,
    pub text: String,
    pub service: String,
    pub sentiment: Option<String>, // raw upstream label, any casing
    pub confidence: Option<f64>,   // None when absent or non-numeric
    pub timestamp: Option<DateTime<FixedOffset>>,
}

impl FeedbackRecord {
    /// Confidence used for weighting; 1.0 when the upstream value was unusable.
    pub fn effective_confidence(&self) -> f64 {
        match self.confidence {
            Some(c) if c.is_finite() => c,
            _ => 1.0,
        }
    }

    pub fn canonical_sentiment(&self) -> CanonicalSentiment {
        crate::sentiment::normalize(self.sentiment.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CanonicalSentiment {
    Positive,
    Neutral,
    Negative,
}

impl CanonicalSentiment {
    pub const ALL: [CanonicalSentiment; 3] = [Self::Positive, Self::Neutral, Self::Negative];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "Positive",
            Self::Neutral => "Neutral",
            Self::Negative => "Negative",
        }
    }
}

impl fmt::Display for CanonicalSentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accumulated (score, count) for one dimension value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceAggregate {
    pub name: String,
    pub score: f64,          // sum of weight * confidence
    pub count: usize,        // support
    pub rating: Option<f64>, // [0, 5]; None below the support threshold
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBucket {
    pub key: String,
    pub count: usize,
}

/* Period views (GET /dashboard) */

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodView {
    #[serde(default)]
    pub kpi: Vec<Kpi>,
    #[serde(default)]
    pub sentiment: Vec<SentimentSlice>,
    #[serde(default)]
    pub averages: OrderedMap<f64>, // dimension -> mean score
    #[serde(default)]
    pub strong_dimensions: Vec<String>,
    #[serde(default)]
    pub charter_awareness: CharterAwareness,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

/// Granularity key -> precomputed view, e.g. "1 Daily", "7 Weekly", "30 Monthly".
pub type PeriodStore = OrderedMap<PeriodView>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Kpi {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub value: String,
    #[serde(default)]
    pub total: Option<String>,
    #[serde(default)]
    pub trend: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub variant: Option<String>,
    #[serde(default, rename = "statusLabel")]
    pub status_label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentSlice {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharterAwareness {
    #[serde(default)]
    pub cc1: f64,
    #[serde(default)]
    pub cc2: f64,
    #[serde(default)]
    pub cc3: f64,
    #[serde(default)]
    pub overall: f64,
}

/* Insight periods (GET /recommendations) */

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightPeriod {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub summary: Option<InsightSummary>,
    #[serde(default)]
    pub recommendations: CategoryMap<RawPlaybookItem>,
}

/// "daily" | "weekly" | "monthly" -> insight period.
pub type InsightStore = OrderedMap<InsightPeriod>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightSummary {
    #[serde(default)]
    pub overall_severity: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub sentiment_score: Option<f64>, // 0..1
    #[serde(default, deserialize_with = "lenient_f64")]
    pub confidence_score: Option<f64>,
}

/// Recommendation item as delivered, before it is tagged with its category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPlaybookItem {
    #[serde(default)]
    pub issue: String,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub root_cause: String,
    #[serde(default)]
    pub impact: String,
    #[serde(default)]
    pub actions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybookItem {
    pub category_name: String,
    pub issue: String,
    pub severity: Option<String>,
    pub confidence: Option<f64>,
    pub root_cause: String,
    pub impact: String,
    pub actions: Vec<String>,
}

/* Service performance (GET /service-performance, /get-negative-feedback) */

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServicePerformance {
    pub name: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub negative: f64, // percent of negative feedback
    #[serde(default)]
    pub cc_awareness: f64, // 0..1
    #[serde(default)]
    pub volume: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegativeComment {
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Service name -> negative comments, in upstream order.
pub type NegativeFeedbackMap = OrderedMap<Vec<NegativeComment>>;
