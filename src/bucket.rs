use chrono::{DateTime, FixedOffset, NaiveDate, Timelike};
use chrono_tz::Tz;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use crate::models::{FeedbackRecord, TimeBucket};

/// A bucket key whose `Ord` is its chronological order.
pub trait BucketKey: Ord {
    fn label(&self) -> String;
}

/// Hour of the day, 0..=23, labelled on a 12-hour clock ("12 AM", "9 AM", "2 PM").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HourOfDay(u8);

impl HourOfDay {
    pub fn new(hour: u8) -> Option<Self> {
        (hour < 24).then_some(Self(hour))
    }

    pub fn hour(&self) -> u8 {
        self.0
    }

    /// Parse a "9 AM" style label back into its 0..=23 ordinal.
    pub fn parse_label(label: &str) -> Option<Self> {
        let mut parts = label.split_whitespace();
        let num: u8 = parts.next()?.parse().ok()?;
        let suffix = parts.next()?.to_ascii_uppercase();
        if parts.next().is_some() || !(1..=12).contains(&num) {
            return None;
        }
        let hour = match (num, suffix.as_str()) {
            (12, "AM") => 0,
            (12, "PM") => 12,
            (h, "AM") => h,
            (h, "PM") => h + 12,
            _ => return None,
        };
        Some(Self(hour))
    }
}

impl fmt::Display for HourOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = if self.0 >= 12 { "PM" } else { "AM" };
        let h12 = match self.0 % 12 {
            0 => 12,
            h => h,
        };
        write!(f, "{} {}", h12, suffix)
    }
}

impl BucketKey for HourOfDay {
    fn label(&self) -> String {
        self.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDay(pub NaiveDate);

impl BucketKey for CalendarDay {
    fn label(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }
}

/// A label from a fixed, ordered vocabulary such as CC1, CC2, CC3.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NamedPeriod {
    position: usize, // compared first
    label: String,
}

impl BucketKey for NamedPeriod {
    fn label(&self) -> String {
        self.label.clone()
    }
}

/// Ordered vocabulary of period names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedPeriods {
    labels: Vec<String>,
}

impl NamedPeriods {
    pub fn new<S: Into<String>>(labels: impl IntoIterator<Item = S>) -> Self {
        Self { labels: labels.into_iter().map(Into::into).collect() }
    }

    /// Case-insensitive lookup; unknown names yield `None`.
    pub fn key(&self, name: &str) -> Option<NamedPeriod> {
        let wanted = name.trim();
        self.labels
            .iter()
            .position(|l| l.eq_ignore_ascii_case(wanted))
            .map(|position| NamedPeriod { position, label: self.labels[position].clone() })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Reorder buckets by vocabulary position; unknown labels go last, stable.
    pub fn sort_buckets(&self, buckets: &mut [TimeBucket]) {
        buckets.sort_by_key(|b| self.key(&b.key).map_or(usize::MAX, |k| k.position));
    }
}

/// Count records per bucket. Records without a timestamp, or for which
/// `bucket_fn` yields `None`, are skipped. Output is chronological.
pub fn bucketize<K, F>(records: &[FeedbackRecord], bucket_fn: F) -> Vec<TimeBucket>
where
    K: BucketKey,
    F: Fn(&DateTime<FixedOffset>) -> Option<K>,
{
    let mut counts: BTreeMap<K, usize> = BTreeMap::new();
    let mut skipped = 0usize;
    for r in records {
        match r.timestamp.as_ref().and_then(&bucket_fn) {
            Some(k) => *counts.entry(k).or_insert(0) += 1,
            None => skipped += 1,
        }
    }
    debug!(
        "Bucketing completed - records={}, buckets={}, skipped={}",
        records.len(),
        counts.len(),
        skipped
    );
    counts
        .into_iter()
        .map(|(k, count)| TimeBucket { key: k.label(), count })
        .collect()
}

/// Bucket function: local hour of day in `tz`.
pub fn hour_of_day_in(tz: Tz) -> impl Fn(&DateTime<FixedOffset>) -> Option<HourOfDay> {
    move |ts| HourOfDay::new(ts.with_timezone(&tz).hour() as u8)
}

/// Bucket function: local calendar day in `tz`.
pub fn calendar_day_in(tz: Tz) -> impl Fn(&DateTime<FixedOffset>) -> Option<CalendarDay> {
    move |ts| Some(CalendarDay(ts.with_timezone(&tz).date_naive()))
}

pub fn hour_label_ordinal(label: &str) -> Option<u8> {
    HourOfDay::parse_label(label).map(|h| h.hour())
}

/// Reorder hour-labelled buckets chronologically. Unparsable labels go last,
/// keeping their relative order.
pub fn sort_hour_buckets(buckets: &mut [TimeBucket]) {
    buckets.sort_by_key(|b| hour_label_ordinal(&b.key).unwrap_or(u8::MAX));
}

/// Busiest bucket; ties go to the earliest. Expects chronological input.
pub fn peak_bucket(buckets: &[TimeBucket]) -> Option<&TimeBucket> {
    let mut best: Option<&TimeBucket> = None;
    for b in buckets {
        if best.map_or(true, |cur| b.count > cur.count) {
            best = Some(b);
        }
    }
    best
}
