use std::cmp::Reverse;

use crate::models::{CanonicalSentiment, FeedbackRecord};
use crate::sentiment::fold;

/// Sentiment selection on the overview and analysis screens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SentimentFilter {
    #[default]
    All,
    Only(CanonicalSentiment),
}

impl SentimentFilter {
    /// Selecting the active sentiment again clears the filter.
    pub fn toggle(self, picked: CanonicalSentiment) -> Self {
        match self {
            Self::Only(cur) if cur == picked => Self::All,
            _ => Self::Only(picked),
        }
    }

    pub fn matches(&self, s: CanonicalSentiment) -> bool {
        match self {
            Self::All => true,
            Self::Only(want) => *want == s,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackQuery {
    pub search: String,
    pub sentiment: SentimentFilter,
}

impl FeedbackQuery {
    pub fn matches(&self, record: &FeedbackRecord) -> bool {
        let term = fold(&self.search);
        let hit = term.is_empty()
            || fold(&record.client).contains(&term)
            || fold(&record.text).contains(&term);
        hit && self.sentiment.matches(record.canonical_sentiment())
    }
}

/// Matching records, newest first. Undated records go last in input order.
pub fn browse<'a>(records: &'a [FeedbackRecord], query: &FeedbackQuery) -> Vec<&'a FeedbackRecord> {
    let mut hits: Vec<&FeedbackRecord> = records.iter().filter(|r| query.matches(r)).collect();
    hits.sort_by_key(|r| Reverse(r.timestamp));
    hits
}
