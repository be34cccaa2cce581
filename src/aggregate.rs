use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

use crate::models::{CanonicalSentiment, FeedbackRecord, ServiceAggregate};

/// Per-class weight applied before confidence scaling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentWeights {
    pub positive: f64, // 1.0
    pub neutral: f64,  // 0.5
    pub negative: f64, // -1.0
}

impl Default for SentimentWeights {
    fn default() -> Self {
        Self { positive: 1.0, neutral: 0.5, negative: -1.0 }
    }
}

impl SentimentWeights {
    pub fn weight(&self, s: CanonicalSentiment) -> f64 {
        match s {
            CanonicalSentiment::Positive => self.positive,
            CanonicalSentiment::Neutral => self.neutral,
            CanonicalSentiment::Negative => self.negative,
        }
    }
}

/// Linear map from the mean contribution range onto a star rating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingScale {
    pub min_contribution: f64, // -1.0
    pub max_contribution: f64, // 1.0
    pub max_rating: f64,       // 5.0
    pub decimals: u32,         // 2
}

impl Default for RatingScale {
    fn default() -> Self {
        Self { min_contribution: -1.0, max_contribution: 1.0, max_rating: 5.0, decimals: 2 }
    }
}

impl RatingScale {
    /// Rating for a group, clamped to `[0, max_rating]`. `None` for an empty
    /// group or an unusable scale.
    pub fn rate(&self, score: f64, count: usize) -> Option<f64> {
        if count == 0 {
            return None;
        }
        let span = self.max_contribution - self.min_contribution;
        if span <= 0.0 || !span.is_finite() || !self.max_rating.is_finite() || self.max_rating <= 0.0 {
            return None;
        }
        let avg = score / count as f64;
        let normalized = (avg - self.min_contribution) / span;
        let rating = (normalized * self.max_rating).clamp(0.0, self.max_rating);
        Some(round_to(rating, self.decimals))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregateParams {
    pub min_support: usize, // groups below this never get a rating
    pub weights: SentimentWeights,
    pub scale: RatingScale,
}

impl Default for AggregateParams {
    fn default() -> Self {
        Self {
            min_support: 3,
            weights: SentimentWeights::default(),
            scale: RatingScale::default(),
        }
    }
}

pub fn contribution(record: &FeedbackRecord, weights: &SentimentWeights) -> f64 {
    weights.weight(record.canonical_sentiment()) * record.effective_confidence()
}

/// Every group with its raw (score, count). Groups under `min_support` keep
/// `rating: None`. Ordered by group name.
pub fn accumulate<'a, F>(
    records: &'a [FeedbackRecord],
    group_key: F,
    params: &AggregateParams,
) -> Vec<ServiceAggregate>
where
    F: Fn(&'a FeedbackRecord) -> &'a str,
{
    let mut groups: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for r in records {
        let acc = groups.entry(group_key(r)).or_insert((0.0, 0));
        acc.0 += contribution(r, &params.weights);
        acc.1 += 1;
    }

    groups
        .into_iter()
        .map(|(name, (score, count))| ServiceAggregate {
            name: name.to_string(),
            score,
            count,
            rating: if count >= params.min_support {
                params.scale.rate(score, count)
            } else {
                None
            },
        })
        .collect()
}

/// Rated groups only, in leaderboard order: rating desc, count desc, name asc.
pub fn aggregate<'a, F>(
    records: &'a [FeedbackRecord],
    group_key: F,
    params: &AggregateParams,
) -> Vec<ServiceAggregate>
where
    F: Fn(&'a FeedbackRecord) -> &'a str,
{
    let all = accumulate(records, group_key, params);
    let total_groups = all.len();

    let mut rated: Vec<ServiceAggregate> = all.into_iter().filter(|a| a.rating.is_some()).collect();
    rated.sort_by(leaderboard_order);

    debug!(
        "Aggregation completed - records={}, groups={}, rated={}, min_support={}",
        records.len(),
        total_groups,
        rated.len(),
        params.min_support
    );
    rated
}

/// Convenience for the common case: group by service.
pub fn aggregate_by_service(records: &[FeedbackRecord], params: &AggregateParams) -> Vec<ServiceAggregate> {
    aggregate(records, |r| r.service.as_str(), params)
}

fn leaderboard_order(a: &ServiceAggregate, b: &ServiceAggregate) -> Ordering {
    let ra = a.rating.unwrap_or(f64::NEG_INFINITY);
    let rb = b.rating.unwrap_or(f64::NEG_INFINITY);
    rb.total_cmp(&ra)
        .then_with(|| b.count.cmp(&a.count))
        .then_with(|| a.name.cmp(&b.name))
}

pub(crate) fn round_to(x: f64, decimals: u32) -> f64 {
    let f = 10f64.powi(decimals as i32);
    (x * f).round() / f
}
