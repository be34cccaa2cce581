use anyhow::{anyhow, Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::aggregate::{AggregateParams, RatingScale, SentimentWeights};

pub const CONFIG_ENV: &str = "CIVIC_PULSE_CONFIG";
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:5000/api";
pub const DEFAULT_TIMEZONE: &str = "Asia/Manila";
const MAX_DECIMALS: u32 = 6;

/// Engine and ingestion settings. Every field has a default, so an empty or
/// partial YAML file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub api_base: String,
    pub timezone: String, // IANA name
    pub min_support: usize,
    pub leaderboard_size: usize,
    pub feedback_page_size: usize, // newest-first rows exported to feedback.json
    pub sentiment_weights: SentimentWeights,
    pub rating_scale: RatingScale,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            min_support: 3,
            leaderboard_size: 5,
            feedback_page_size: 50,
            sentiment_weights: SentimentWeights::default(),
            rating_scale: RatingScale::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Self = serde_yaml::from_str(s).context("parsing engine config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml_str(&raw).with_context(|| format!("in {}", path.display()))
    }

    /// `--config` flag, then `CIVIC_PULSE_CONFIG`, then built-in defaults.
    pub fn resolve(cli_path: Option<&Path>) -> Result<Self> {
        let path = match cli_path {
            Some(p) => Some(p.to_path_buf()),
            None => std::env::var(CONFIG_ENV).ok().map(PathBuf::from),
        };
        match path {
            Some(p) => {
                debug!("Loading config from: {}", p.display());
                Self::load(&p)
            }
            None => {
                debug!("No config file given, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow!("invalid timezone '{}': {}", self.timezone, e))
    }

    pub fn aggregate_params(&self) -> AggregateParams {
        AggregateParams {
            min_support: self.min_support,
            weights: self.sentiment_weights,
            scale: self.rating_scale,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.tz()?;
        if self.min_support == 0 {
            return Err(anyhow!("min_support must be at least 1"));
        }
        let scale = &self.rating_scale;
        if !scale.min_contribution.is_finite() || !scale.max_contribution.is_finite() {
            return Err(anyhow!("rating_scale contribution bounds must be finite"));
        }
        if scale.max_contribution <= scale.min_contribution {
            return Err(anyhow!(
                "rating_scale.max_contribution ({}) must exceed min_contribution ({})",
                scale.max_contribution,
                scale.min_contribution
            ));
        }
        if !scale.max_rating.is_finite() || scale.max_rating <= 0.0 {
            return Err(anyhow!("rating_scale.max_rating must be a positive number, got {}", scale.max_rating));
        }
        if scale.decimals > MAX_DECIMALS {
            return Err(anyhow!("rating_scale.decimals must be at most {}, got {}", MAX_DECIMALS, scale.decimals));
        }
        let w = &self.sentiment_weights;
        if ![w.positive, w.neutral, w.negative].iter().all(|v| v.is_finite()) {
            return Err(anyhow!("sentiment_weights must be finite numbers"));
        }
        Ok(())
    }
}
