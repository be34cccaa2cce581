use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::models::{CanonicalSentiment, FeedbackRecord, SentimentSlice};

/// Map a free-text sentiment label onto the canonical enum.
///
/// Matching is permissive on purpose: upstream labels arrive as "POSITIVE",
/// "Negative ", "pos." and so on. Anything that carries neither marker,
/// including a missing label, is Neutral.
pub fn normalize(raw: Option<&str>) -> CanonicalSentiment {
    let Some(raw) = raw else {
        return CanonicalSentiment::Neutral;
    };
    let folded = fold(raw);
    if folded.contains("pos") {
        CanonicalSentiment::Positive
    } else if folded.contains("neg") {
        CanonicalSentiment::Negative
    } else {
        CanonicalSentiment::Neutral
    }
}

pub(crate) fn fold(s: &str) -> String {
    s.nfc().collect::<String>().to_lowercase().trim().to_string()
}

/// Per-class record counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentDistribution {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

impl SentimentDistribution {
    pub fn from_records(records: &[FeedbackRecord]) -> Self {
        let mut dist = Self::default();
        for r in records {
            dist.add(r.canonical_sentiment());
        }
        dist
    }

    pub fn add(&mut self, s: CanonicalSentiment) {
        match s {
            CanonicalSentiment::Positive => self.positive += 1,
            CanonicalSentiment::Neutral => self.neutral += 1,
            CanonicalSentiment::Negative => self.negative += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.positive + self.neutral + self.negative
    }

    pub fn count(&self, s: CanonicalSentiment) -> usize {
        match s {
            CanonicalSentiment::Positive => self.positive,
            CanonicalSentiment::Neutral => self.neutral,
            CanonicalSentiment::Negative => self.negative,
        }
    }

    /// Whole-number share of `s`, rounded half up. 0 for an empty distribution.
    pub fn percentage(&self, s: CanonicalSentiment) -> u32 {
        let total = self.total();
        if total == 0 {
            return 0;
        }
        ((self.count(s) * 100 + total / 2) / total) as u32
    }

    /// Counts in fixed Positive, Neutral, Negative order.
    pub fn slices(&self) -> Vec<SentimentSlice> {
        CanonicalSentiment::ALL
            .iter()
            .map(|&s| SentimentSlice {
                name: s.as_str().to_string(),
                value: self.count(s) as f64,
            })
            .collect()
    }

    pub fn percentage_slices(&self) -> Vec<SentimentSlice> {
        CanonicalSentiment::ALL
            .iter()
            .map(|&s| SentimentSlice {
                name: s.as_str().to_string(),
                value: f64::from(self.percentage(s)),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tolerates_messy_labels() {
        assert_eq!(normalize(Some("POSITIVE")), CanonicalSentiment::Positive);
        assert_eq!(normalize(Some("pos.")), CanonicalSentiment::Positive);
        assert_eq!(normalize(Some("  Negative ")), CanonicalSentiment::Negative);
        assert_eq!(normalize(Some("very negative")), CanonicalSentiment::Negative);
        assert_eq!(normalize(Some("Neutral")), CanonicalSentiment::Neutral);
    }

    #[test]
    fn test_normalize_defaults_to_neutral() {
        assert_eq!(normalize(None), CanonicalSentiment::Neutral);
        assert_eq!(normalize(Some("")), CanonicalSentiment::Neutral);
        assert_eq!(normalize(Some("   ")), CanonicalSentiment::Neutral);
        assert_eq!(normalize(Some("meh")), CanonicalSentiment::Neutral);
        assert_eq!(normalize(Some("😐")), CanonicalSentiment::Neutral);
    }

    #[test]
    fn test_pos_marker_checked_first() {
        // contains both markers
        assert_eq!(normalize(Some("neg/pos")), CanonicalSentiment::Positive);
    }

    #[test]
    fn test_distribution_percentages() {
        let mut d = SentimentDistribution::default();
        for _ in 0..2 {
            d.add(CanonicalSentiment::Positive);
        }
        d.add(CanonicalSentiment::Negative);

        assert_eq!(d.total(), 3);
        assert_eq!(d.percentage(CanonicalSentiment::Positive), 67);
        assert_eq!(d.percentage(CanonicalSentiment::Negative), 33);
        assert_eq!(d.percentage(CanonicalSentiment::Neutral), 0);

        let names: Vec<String> = d.slices().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Positive", "Neutral", "Negative"]);
    }

    #[test]
    fn test_empty_distribution_is_all_zero() {
        let d = SentimentDistribution::from_records(&[]);
        assert!(d.percentage_slices().iter().all(|s| s.value == 0.0));
    }
}
