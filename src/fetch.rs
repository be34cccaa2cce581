use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use url::Url;
use xxhash_rust::xxh3::xxh3_64;

use crate::api_types::*;
use crate::models::*;

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Which feedback endpoint to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackSource {
    All,    // GET /all-feedback
    Recent, // GET /recent-feedback
}

impl FeedbackSource {
    fn path(&self) -> &'static str {
        match self {
            Self::All => "all-feedback",
            Self::Recent => "recent-feedback",
        }
    }
}

/// `base` may or may not end in '/'; the path is appended under it.
pub fn endpoint(base: &str, path: &str) -> Result<Url> {
    let base = format!("{}/", base.trim_end_matches('/'));
    Url::parse(&base)
        .and_then(|u| u.join(path))
        .with_context(|| format!("Invalid API base {}", base))
}

/// GET and decode; Ok(None) on 404.
pub async fn fetch_json_opt<T: DeserializeOwned>(client: &Client, url: &Url) -> Result<Option<T>> {
    let start = std::time::Instant::now();
    debug!("Fetching - url={}", url);

    let resp = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("Request failed for {}", url))?;

    if resp.status() == reqwest::StatusCode::NOT_FOUND {
        warn!("Endpoint not found (404) - {}", url);
        return Ok(None);
    }

    let resp = resp
        .error_for_status()
        .with_context(|| format!("HTTP error for {}", url))?;

    let body: T = resp
        .json()
        .await
        .with_context(|| format!("Decoding JSON for {}", url))?;

    info!(
        "API fetch completed - url={}, duration={:.2}s",
        url,
        start.elapsed().as_secs_f32()
    );
    Ok(Some(body))
}

pub async fn fetch_feedback(client: &Client, base: &str, source: FeedbackSource, tz: Tz) -> Result<Vec<FeedbackRecord>> {
    let url = endpoint(base, source.path())?;
    let rows = fetch_json_opt::<ApiFeedbackPayload>(client, &url)
        .await?
        .map(ApiFeedbackPayload::into_rows)
        .unwrap_or_default();
    Ok(normalize_feedback(rows, tz))
}

pub async fn fetch_dashboard(client: &Client, base: &str) -> Result<PeriodStore> {
    let url = endpoint(base, "dashboard")?;
    Ok(fetch_json_opt(client, &url).await?.unwrap_or_default())
}

pub async fn fetch_recommendations(client: &Client, base: &str) -> Result<InsightStore> {
    let url = endpoint(base, "recommendations")?;
    Ok(fetch_json_opt(client, &url).await?.unwrap_or_default())
}

pub async fn fetch_service_performance(client: &Client, base: &str) -> Result<Vec<ServicePerformance>> {
    let url = endpoint(base, "service-performance")?;
    let rows: Vec<ApiServicePerformance> = fetch_json_opt(client, &url).await?.unwrap_or_default();
    Ok(rows.into_iter().map(ServicePerformance::from).collect())
}

pub async fn fetch_negative_feedback(client: &Client, base: &str) -> Result<NegativeFeedbackMap> {
    let url = endpoint(base, "get-negative-feedback")?;
    let raw: ApiNegativeFeedback = fetch_json_opt(client, &url).await?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .map(|(service, comments)| (service, comments.into_iter().map(NegativeComment::from).collect()))
        .collect())
}

fn make_feedback_id(parts: &[&str]) -> String {
    format!("{:016x}", xxh3_64(parts.join("|").as_bytes()))
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Apply field defaults and parse timestamps. This is the only place that
/// knows about upstream quirks; the engine sees clean records.
pub fn normalize_feedback(rows: Vec<ApiFeedback>, tz: Tz) -> Vec<FeedbackRecord> {
    let total = rows.len();
    let mut undated = 0usize;
    let mut seen: HashMap<String, usize> = HashMap::new();

    let records: Vec<FeedbackRecord> = rows
        .into_iter()
        .map(|row| {
            let raw_date = row.date.unwrap_or_default();
            let timestamp = parse_timestamp(&raw_date, tz);
            if timestamp.is_none() {
                undated += 1;
            }
            let client = non_empty(row.client).unwrap_or_else(|| DEFAULT_CLIENT.to_string());
            let text = row.text.unwrap_or_default().trim().to_string();
            let service = non_empty(row.service).unwrap_or_else(|| DEFAULT_SERVICE.to_string());
            let id = non_empty(row.id).unwrap_or_else(|| {
                let sentiment = row.sentiment.as_deref().unwrap_or_default();
                make_feedback_id(&[client.as_str(), service.as_str(), sentiment, text.as_str(), raw_date.as_str()])
            });
            // Ids must be unique per run; repeats get a "-n" suffix.
            let n = seen.entry(id.clone()).or_insert(0);
            *n += 1;
            let id = if *n == 1 { id } else { format!("{}-{}", id, *n) };
            FeedbackRecord {
                id,
                client,
                text,
                service,
                sentiment: row.sentiment,
                confidence: row.confidence,
                timestamp,
            }
        })
        .collect();

    debug!("Feedback normalized - records={}, undated={}", total, undated);
    records
}

/// RFC 3339, RFC 2822, or a naive local time interpreted in `tz`.
/// Anything else is `None`.
pub fn parse_timestamp(raw: &str, tz: Tz) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt);
    }
    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;
    tz.from_local_datetime(&naive).earliest().map(|dt| dt.fixed_offset())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use chrono_tz::Asia::Manila;

    #[test]
    fn test_endpoint_keeps_base_path() {
        assert_eq!(
            endpoint("http://127.0.0.1:5000/api", "dashboard").unwrap().as_str(),
            "http://127.0.0.1:5000/api/dashboard"
        );
        assert_eq!(
            endpoint("http://host/api/", "all-feedback").unwrap().as_str(),
            "http://host/api/all-feedback"
        );
        assert!(endpoint("not a url", "x").is_err());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let rfc3339 = parse_timestamp("2025-03-01T14:05:00Z", Manila).unwrap();
        assert_eq!(rfc3339.hour(), 14);

        let http = parse_timestamp("Tue, 14 Jan 2025 08:00:00 GMT", Manila).unwrap();
        assert_eq!(http.with_timezone(&Manila).hour(), 16);

        let naive = parse_timestamp("2025-03-01 09:15:00", Manila).unwrap();
        assert_eq!(naive.hour(), 9);
        assert_eq!(naive.offset().local_minus_utc(), 8 * 3600);

        assert!(parse_timestamp("2025-03-01", Manila).is_some());
        assert!(parse_timestamp("", Manila).is_none());
        assert!(parse_timestamp("yesterday", Manila).is_none());
    }

    #[test]
    fn test_normalize_applies_defaults() {
        let rows: Vec<ApiFeedback> = serde_json::from_str(
            r#"[{"id": 7, "client": "  ", "service": "", "text": " hi ", "sentiment": "POS", "confidence": 0.7,
                 "date": "2025-03-01 10:00:00"},
                {"text": "no id", "date": "garbage"}]"#,
        )
        .unwrap();
        let recs = normalize_feedback(rows, Manila);

        assert_eq!(recs[0].id, "7");
        assert_eq!(recs[0].client, DEFAULT_CLIENT);
        assert_eq!(recs[0].service, DEFAULT_SERVICE);
        assert_eq!(recs[0].text, "hi");
        assert_eq!(recs[0].confidence, Some(0.7));
        assert!(recs[0].timestamp.is_some());

        assert_eq!(recs[1].id.len(), 16);
        assert!(recs[1].timestamp.is_none());
        assert_eq!(recs[1].canonical_sentiment(), CanonicalSentiment::Neutral);
    }

    #[test]
    fn test_derived_ids_are_stable() {
        assert_eq!(make_feedback_id(&["a", "b", "c"]), make_feedback_id(&["a", "b", "c"]));
        assert_ne!(make_feedback_id(&["a", "b", "c"]), make_feedback_id(&["a", "b", "d"]));
    }

    #[test]
    fn test_ids_unique_across_rows() {
        let rows: Vec<ApiFeedback> = serde_json::from_str(
            r#"[{"text":"ok","service":"A"},{"text":"ok","service":"B"},
                {"text":"ok","service":"A"},{"id":"x1"},{"id":"x1"}]"#,
        )
        .unwrap();
        let recs = normalize_feedback(rows, Manila);
        let ids: std::collections::HashSet<&str> = recs.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), recs.len());
        assert_ne!(recs[0].id, recs[1].id);
        assert_eq!(recs[2].id, format!("{}-2", recs[0].id));
        assert_eq!(recs[4].id, "x1-2");
    }
}
