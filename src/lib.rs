//! Citizen feedback analytics: sentiment normalization, weighted service
//! ratings, time-bucketed volume, leaderboards and period views, computed
//! as pure functions over an already-fetched feedback collection.

pub mod aggregate;
pub mod analysis;
pub mod api_types;
pub mod bucket;
pub mod category;
pub mod config;
pub mod fetch;
pub mod filter;
pub mod models;
pub mod orchestrator;
pub mod ordered;
pub mod out_models;
pub mod period;
pub mod rank;
pub mod render;
pub mod sentiment;
pub mod viz_export;

pub use aggregate::{aggregate, AggregateParams};
pub use bucket::{bucketize, peak_bucket};
pub use category::flatten_by_category;
pub use models::{CanonicalSentiment, FeedbackRecord, PeriodView, PlaybookItem, ServiceAggregate, TimeBucket};
pub use period::{resolve_insight, resolve_view};
pub use rank::{top_by_metric, Direction};
pub use sentiment::normalize;
