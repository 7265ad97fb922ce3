//! Data models and structures
//!
//! Defines the conversion request, the slide document produced from model
//! output, the storage descriptor returned after a commit, and the runtime
//! configuration.

use crate::ai::ReplyMode;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One conversion job: the lesson text and the title its deck is stored under.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    raw_text: String,
    title: String,
}

impl ConversionRequest {
    /// Both fields must contain something other than whitespace.
    pub fn new(raw_text: impl Into<String>, title: impl Into<String>) -> Result<Self> {
        let raw_text = raw_text.into();
        let title = title.into();

        if raw_text.trim().is_empty() {
            return Err(Error::InvalidRequest("raw text must not be empty".to_string()));
        }
        if title.trim().is_empty() {
            return Err(Error::InvalidRequest("title must not be empty".to_string()));
        }

        Ok(Self { raw_text, title })
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SlideRecord {
    pub title: String,
    pub desc: String,
    pub prompt_image: String,
}

/// Ordered slides for one lesson. Only the normalizer builds these.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct SlideDocument {
    slides: Vec<SlideRecord>,
}

impl SlideDocument {
    pub(crate) fn new(slides: Vec<SlideRecord>) -> Self {
        Self { slides }
    }

    pub fn slides(&self) -> &[SlideRecord] {
        &self.slides
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SlideRecord> {
        self.slides.iter()
    }
}

impl<'a> IntoIterator for &'a SlideDocument {
    type Item = &'a SlideRecord;
    type IntoIter = std::slice::Iter<'a, SlideRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.slides.iter()
    }
}

/// Hint passed to the storage backend about how to treat an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Raw,
    Binary,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Raw => "raw",
            ResourceType::Binary => "binary",
        }
    }
}

/// Confirmation of a completed storage write.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageDescriptor {
    pub key: String,
    pub size: u64,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
    pub url: String,
}

// Configuration
const DEFAULT_AI_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_STORAGE_REGION: &str = "us-east-1";
pub const DEFAULT_STORAGE_FOLDER: &str = "AI Slide";
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_STORAGE_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub ai_api_key: String,
    pub ai_base_url: String,
    pub chat_model: String,
    pub reply_mode: ReplyMode,
    pub model_timeout: Duration,
    pub storage_access_key_id: Option<String>,
    pub storage_secret_access_key: Option<String>,
    pub storage_endpoint: String,
    pub storage_region: String,
    pub storage_bucket: String,
    pub storage_public_base_url: String,
    pub storage_folder: String,
    pub storage_timeout: Duration,
    pub desc_min_coverage: Option<f64>,
    pub dry_run: bool,
}

impl Config {
    /// Load `.env` (if present) and read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let required =
            |key: &str| get(key).ok_or_else(|| Error::Config(format!("{} not set", key)));

        let dry_run = get("DRY_RUN")
            .map(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let reply_mode = match get("CHAT_REPLY_MODE") {
            Some(value) => value.parse()?,
            None => ReplyMode::default(),
        };

        let (storage_access_key_id, storage_secret_access_key) = if dry_run {
            (get("STORAGE_ACCESS_KEY_ID"), get("STORAGE_SECRET_ACCESS_KEY"))
        } else {
            (
                Some(required("STORAGE_ACCESS_KEY_ID")?),
                Some(required("STORAGE_SECRET_ACCESS_KEY")?),
            )
        };

        let storage_endpoint = if dry_run {
            get("STORAGE_ENDPOINT").unwrap_or_default()
        } else {
            required("STORAGE_ENDPOINT")?
        };

        let storage_bucket = if dry_run {
            get("STORAGE_BUCKET").unwrap_or_else(|| "dry-run".to_string())
        } else {
            required("STORAGE_BUCKET")?
        };

        let storage_public_base_url = get("STORAGE_PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("{}/{}", storage_endpoint, storage_bucket))
            .trim_end_matches('/')
            .to_string();

        let desc_min_coverage = match get("DESC_MIN_COVERAGE") {
            Some(value) => {
                let ratio: f64 = value.trim().parse().map_err(|_| {
                    Error::Config(format!("DESC_MIN_COVERAGE is not a number: {}", value))
                })?;
                if !(ratio > 0.0 && ratio <= 1.0) {
                    return Err(Error::Config(format!(
                        "DESC_MIN_COVERAGE must be in (0, 1], got {}",
                        ratio
                    )));
                }
                Some(ratio)
            }
            None => None,
        };

        Ok(Self {
            ai_api_key: required("AI_API_KEY")?,
            ai_base_url: get("AI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_AI_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            chat_model: get("CHAT_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            reply_mode,
            model_timeout: parse_secs(
                get("MODEL_TIMEOUT_SECS"),
                "MODEL_TIMEOUT_SECS",
                DEFAULT_MODEL_TIMEOUT_SECS,
            )?,
            storage_access_key_id,
            storage_secret_access_key,
            storage_endpoint,
            storage_region: get("STORAGE_REGION")
                .unwrap_or_else(|| DEFAULT_STORAGE_REGION.to_string()),
            storage_bucket,
            storage_public_base_url,
            storage_folder: get("STORAGE_FOLDER")
                .unwrap_or_else(|| DEFAULT_STORAGE_FOLDER.to_string()),
            storage_timeout: parse_secs(
                get("STORAGE_TIMEOUT_SECS"),
                "STORAGE_TIMEOUT_SECS",
                DEFAULT_STORAGE_TIMEOUT_SECS,
            )?,
            desc_min_coverage,
            dry_run,
        })
    }
}

fn parse_secs(value: Option<String>, key: &str, default: u64) -> Result<Duration> {
    let secs = match value {
        Some(value) => value.trim().parse::<u64>().map_err(|_| {
            Error::Config(format!(
                "{} is not a whole number of seconds: {}",
                key, value
            ))
        })?,
        None => default,
    };
    if secs == 0 {
        return Err(Error::Config(format!("{} must be greater than zero", key)));
    }
    Ok(Duration::from_secs(secs))
}
