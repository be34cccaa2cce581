use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::models::{NegativeComment, ServicePerformance};
use crate::ordered::OrderedMap;

/// Feedback row as served by /all-feedback and /recent-feedback.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiFeedback {
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub client: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub service: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub sentiment: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub confidence: Option<f64>,
    #[serde(default, alias = "timestamp", deserialize_with = "lenient_opt_string")]
    pub date: Option<String>, // ISO8601, RFC 2822 or naive local time
}

/// The feedback endpoints answer either `{ "feedback": [...] }` or a bare array.
/// Rows stay untyped until `into_rows`, so one bad row cannot sink the payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ApiFeedbackPayload {
    Bare(Vec<Value>),
    Wrapped {
        #[serde(default)]
        feedback: Value,
    },
}

impl ApiFeedbackPayload {
    /// Decode each row on its own. Rows that are not objects are skipped and counted.
    pub fn into_rows(self) -> Vec<ApiFeedback> {
        let values = match self {
            Self::Bare(rows) => rows,
            Self::Wrapped { feedback: Value::Array(rows) } => rows,
            Self::Wrapped { feedback: Value::Null } => Vec::new(),
            Self::Wrapped { feedback } => {
                warn!("Feedback field is not an array - value={}", feedback);
                Vec::new()
            }
        };

        let total = values.len();
        let rows: Vec<ApiFeedback> = values
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect();

        let skipped = total - rows.len();
        if skipped > 0 {
            warn!("Skipped malformed feedback rows - skipped={}, kept={}", skipped, rows.len());
        }
        rows
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiServicePerformance {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub rating: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub negative: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub cc_awareness: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub volume: Option<f64>,
}

impl From<ApiServicePerformance> for ServicePerformance {
    fn from(a: ApiServicePerformance) -> Self {
        ServicePerformance {
            name: a.name,
            rating: a.rating.unwrap_or(0.0),
            negative: a.negative.unwrap_or(0.0),
            cc_awareness: a.cc_awareness.unwrap_or(0.0),
            volume: a.volume.map(|v| v.max(0.0).round() as u64).unwrap_or(0),
        }
    }
}

/// Negative comments come either as plain strings or as objects.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ApiNegativeComment {
    Text(String),
    Detailed {
        #[serde(alias = "text")]
        comment: String,
        #[serde(default, deserialize_with = "lenient_opt_string")]
        date: Option<String>,
    },
}

impl From<ApiNegativeComment> for NegativeComment {
    fn from(a: ApiNegativeComment) -> Self {
        match a {
            ApiNegativeComment::Text(comment) => NegativeComment { comment, date: None },
            ApiNegativeComment::Detailed { comment, date } => NegativeComment { comment, date },
        }
    }
}

pub type ApiNegativeFeedback = OrderedMap<Vec<ApiNegativeComment>>;

/* Lenient field decoders: upstream types drift, absence of signal is not an error. */

/// Numbers become `Some`; strings, booleans, null and missing become `None`.
pub fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.and_then(|v| v.as_f64()))
}

/// Strings pass through; numbers and booleans are rendered; null becomes "".
pub fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(lenient_opt_string(d)?.unwrap_or_default())
}

pub fn lenient_opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let v = Option::<Value>::deserialize(d)?;
    Ok(match v {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_accepts_wrapped_and_bare() {
        let wrapped: ApiFeedbackPayload =
            serde_json::from_str(r#"{"feedback":[{"id":1,"text":"ok"}]}"#).unwrap();
        let bare: ApiFeedbackPayload = serde_json::from_str(r#"[{"id":"a"},{"id":"b"}]"#).unwrap();
        let empty: ApiFeedbackPayload = serde_json::from_str(r#"{"status":"ok"}"#).unwrap();

        let wrapped = wrapped.into_rows();
        assert_eq!(wrapped.len(), 1);
        assert_eq!(wrapped[0].id.as_deref(), Some("1"));
        assert_eq!(bare.into_rows().len(), 2);
        assert!(empty.into_rows().is_empty());
    }

    #[test]
    fn test_bad_rows_do_not_sink_payload() {
        let wrapped: ApiFeedbackPayload = serde_json::from_str(
            r#"{"feedback":[{"id":1,"service":"Tax"},{"id":2,"service":17,"client":null,"text":false}]}"#,
        )
        .unwrap();
        let rows = wrapped.into_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].service.as_deref(), Some("Tax"));
        assert_eq!(rows[1].service.as_deref(), Some("17"));
        assert_eq!(rows[1].client, None);
        assert_eq!(rows[1].text.as_deref(), Some("false"));

        let bare: ApiFeedbackPayload = serde_json::from_str(r#"[{"id":1,"text":"fine"}, null, 3, "x"]"#).unwrap();
        let rows = bare.into_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text.as_deref(), Some("fine"));

        let odd: ApiFeedbackPayload = serde_json::from_str(r#"{"feedback":"offline"}"#).unwrap();
        assert!(odd.into_rows().is_empty());
    }

    #[test]
    fn test_non_numeric_confidence_is_dropped() {
        let row: ApiFeedback =
            serde_json::from_str(r#"{"confidence":"0.9","sentiment":null}"#).unwrap();
        assert_eq!(row.confidence, None);
        assert_eq!(row.sentiment, None);
    }

    #[test]
    fn test_negative_comment_shapes() {
        let map: ApiNegativeFeedback = serde_json::from_str(
            r#"{"Permits":["slow queue",{"comment":"rude staff","date":"2025-01-02"}]}"#,
        )
        .unwrap();
        let comments: Vec<NegativeComment> = map
            .into_iter()
            .flat_map(|(_, v)| v.into_iter().map(NegativeComment::from))
            .collect();
        assert_eq!(comments[0].comment, "slow queue");
        assert_eq!(comments[1].date.as_deref(), Some("2025-01-02"));
    }

    #[test]
    fn test_service_performance_volume_rounds() {
        let row: ApiServicePerformance =
            serde_json::from_str(r#"{"name":"Tax","rating":4.1,"volume":120.6}"#).unwrap();
        let perf = ServicePerformance::from(row);
        assert_eq!(perf.volume, 121);
        assert_eq!(perf.negative, 0.0);
    }
}
