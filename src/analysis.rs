//! View composition: each function turns one fetched collection into the
//! snapshot a dashboard screen needs. Pure; recomputed on every input.

use chrono_tz::Tz;
use tracing::debug;

use crate::aggregate::aggregate_by_service;
use crate::bucket::{bucketize, calendar_day_in, hour_of_day_in, peak_bucket};
use crate::config::EngineConfig;
use crate::filter::{browse, FeedbackQuery};
use crate::models::{FeedbackRecord, InsightStore, NegativeFeedbackMap, PeriodStore, ServicePerformance};
use crate::out_models::{
    DashboardSnapshot, FeedbackAnalysis, FeedbackPage, InsightResult, NegativeLoad, RatingTier,
    ServiceBoard, ServiceRow,
};
use crate::period::{build_overview, resolve_insight, PeriodKey};
use crate::rank::{top_by_metric, top_n, Direction};
use crate::sentiment::SentimentDistribution;

pub fn analyze_feedback(records: &[FeedbackRecord], cfg: &EngineConfig, tz: Tz) -> FeedbackAnalysis {
    let dist = SentimentDistribution::from_records(records);

    let rated = aggregate_by_service(records, &cfg.aggregate_params());
    let top_performer = top_by_metric(&rated, |a| a.rating.unwrap_or(f64::NAN), Direction::Highest).cloned();
    let lowest_performer = top_by_metric(&rated, |a| a.rating.unwrap_or(f64::NAN), Direction::Lowest).cloned();

    let timeline = bucketize(records, hour_of_day_in(tz));
    let daily_volume = bucketize(records, calendar_day_in(tz));
    let peak_hour = peak_bucket(&timeline).cloned();

    debug!(
        "Feedback analysis built - entries={}, rated_services={}, hours={}, days={}",
        records.len(),
        rated.len(),
        timeline.len(),
        daily_volume.len()
    );

    FeedbackAnalysis {
        total_entries: records.len(),
        sentiment: dist.slices(),
        sentiment_percent: dist.percentage_slices(),
        service_ratings: top_n(&rated, cfg.leaderboard_size).to_vec(),
        timeline,
        daily_volume,
        peak_hour,
        top_performer,
        lowest_performer,
    }
}

/// Inputs of one dashboard pass, as delivered by ingestion.
#[derive(Debug, Clone, Default)]
pub struct DashboardInputs {
    pub feedback: Vec<FeedbackRecord>,
    pub periods: PeriodStore,
    pub insights: InsightStore,
    pub services: Vec<ServicePerformance>,
    pub negatives: NegativeFeedbackMap,
}

/// Run every view over `inputs` for the requested periods.
pub fn build_snapshot(
    date: &str,
    inputs: &DashboardInputs,
    periods: &[PeriodKey],
    cfg: &EngineConfig,
    tz: Tz,
) -> DashboardSnapshot {
    let overviews = periods
        .iter()
        .map(|p| build_overview(&inputs.periods, p.dashboard_key()))
        .collect();
    let insights = periods
        .iter()
        .map(|p| match resolve_insight(&inputs.insights, p.insight_key()) {
            Some(brief) => InsightResult::Ready(brief),
            None => InsightResult::no_data(p.insight_key()),
        })
        .collect();

    DashboardSnapshot {
        date: date.to_string(),
        analysis: analyze_feedback(&inputs.feedback, cfg, tz),
        feedback: feedback_page(&inputs.feedback, &FeedbackQuery::default(), cfg.feedback_page_size),
        overviews,
        insights,
        services: service_board(&inputs.services, &inputs.negatives),
    }
}

pub fn feedback_page(records: &[FeedbackRecord], query: &FeedbackQuery, limit: usize) -> FeedbackPage {
    let hits = browse(records, query);
    FeedbackPage {
        matched: hits.len(),
        items: hits.into_iter().take(limit).cloned().collect(),
    }
}

pub fn service_board(services: &[ServicePerformance], negatives: &NegativeFeedbackMap) -> ServiceBoard {
    let rows = services
        .iter()
        .map(|s| ServiceRow {
            service: s.clone(),
            tier: RatingTier::from_rating(s.rating),
            load: NegativeLoad::from_percent(s.negative),
            negative_comments: negatives.get(&s.name).cloned().unwrap_or_default(),
        })
        .collect();

    ServiceBoard {
        rows,
        highest_rated: top_by_metric(services, |s| s.rating, Direction::Highest).cloned(),
        highest_negative: top_by_metric(services, |s| s.negative, Direction::Highest).cloned(),
    }
}
