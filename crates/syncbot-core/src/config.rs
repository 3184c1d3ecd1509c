//! Settings for the three jobs, validated eagerly from a key lookup.
//!
//! Every job builds its config before any network call so a missing
//! credential fails fast with a [`ConfigError`]. The lookup is usually
//! `std::env::var`, but any `Fn(&str) -> Option<String>` works, which keeps
//! tests free of process-global environment mutation.

use crate::error::ConfigError;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

pub const NOTION_TOKEN: &str = "NOTION_TOKEN";
pub const NOTION_DATABASE_ID: &str = "NOTION_DATABASE_ID";
pub const NOTION_REPORT_PAGE_ID: &str = "NOTION_REPORT_PAGE_ID";
pub const NOTION_API_URL: &str = "NOTION_API_URL";
pub const SLACK_WEBHOOK_URL: &str = "SLACK_WEBHOOK_URL";
pub const GITHUB_SLACK_MAPPING: &str = "GITHUB_SLACK_MAPPING";
pub const GITHUB_REPOSITORY: &str = "GITHUB_REPOSITORY";
pub const GITHUB_TOKEN: &str = "GITHUB_TOKEN";
pub const GITHUB_API_URL: &str = "GITHUB_API_URL";
pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const GEMINI_API_URL: &str = "GEMINI_API_URL";
pub const GEMINI_MODEL: &str = "GEMINI_MODEL";
pub const HTTP_TIMEOUT_SECS: &str = "SYNCBOT_HTTP_TIMEOUT_SECS";

pub const DEFAULT_NOTION_API_URL: &str = "https://api.notion.com";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Printed in place of credentials and webhook URLs.
pub const REDACTED: &str = "<redacted>";

// ---------------------------------------------------------------------------
// Shared pieces
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, Eq)]
pub struct NotionConfig {
    pub token: String,
    pub api_url: String,
}

impl NotionConfig {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            token: require(lookup, NOTION_TOKEN)?,
            api_url: url_or_default(lookup, NOTION_API_URL, DEFAULT_NOTION_API_URL)?,
        })
    }
}

impl fmt::Debug for NotionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotionConfig")
            .field("token", &REDACTED)
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct GitHubConfig {
    pub token: String,
    pub api_url: String,
    pub repository: String,
}

impl fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("token", &REDACTED)
            .field("api_url", &self.api_url)
            .field("repository", &self.repository)
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct GeminiConfig {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
}

impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &REDACTED)
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// SyncConfig
// ---------------------------------------------------------------------------

/// Settings for `syncbot sync`.
#[derive(Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub notion: NotionConfig,
    pub database_id: String,
    pub slack_webhook_url: String,
    pub repository: String,
    pub timeout: Duration,
}

impl fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConfig")
            .field("notion", &self.notion)
            .field("database_id", &self.database_id)
            .field("slack_webhook_url", &REDACTED)
            .field("repository", &self.repository)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl SyncConfig {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            notion: NotionConfig::from_lookup(&lookup)?,
            database_id: require(&lookup, NOTION_DATABASE_ID)?,
            slack_webhook_url: require_url(&lookup, SLACK_WEBHOOK_URL)?,
            repository: require(&lookup, GITHUB_REPOSITORY)?,
            timeout: timeout(&lookup)?,
        })
    }
}

// ---------------------------------------------------------------------------
// NotifyConfig
// ---------------------------------------------------------------------------

/// Settings for `syncbot notify`.
#[derive(Clone, PartialEq, Eq)]
pub struct NotifyConfig {
    pub slack_webhook_url: String,
    pub repository: String,
    /// GitHub login → Slack member id.
    pub mentions: HashMap<String, String>,
    pub timeout: Duration,
}

impl fmt::Debug for NotifyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifyConfig")
            .field("slack_webhook_url", &REDACTED)
            .field("repository", &self.repository)
            .field("mentions", &self.mentions)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl NotifyConfig {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            slack_webhook_url: require_url(&lookup, SLACK_WEBHOOK_URL)?,
            repository: require(&lookup, GITHUB_REPOSITORY)?,
            mentions: parse_mentions(lookup(GITHUB_SLACK_MAPPING).as_deref()),
            timeout: timeout(&lookup)?,
        })
    }
}

/// Parse the login → member id mapping. A broken mapping only loses mentions,
/// so it degrades to an empty map instead of failing the job.
pub fn parse_mentions(raw: Option<&str>) -> HashMap<String, String> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return HashMap::new();
    };
    match serde_json::from_str(raw) {
        Ok(map) => map,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unparseable {GITHUB_SLACK_MAPPING}");
            HashMap::new()
        }
    }
}

// ---------------------------------------------------------------------------
// ReportConfig
// ---------------------------------------------------------------------------

/// Settings for `syncbot report`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    pub notion: NotionConfig,
    pub report_page_id: String,
    pub github: GitHubConfig,
    pub gemini: GeminiConfig,
    pub timeout: Duration,
}

impl ReportConfig {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            notion: NotionConfig::from_lookup(&lookup)?,
            report_page_id: require(&lookup, NOTION_REPORT_PAGE_ID)?,
            github: GitHubConfig {
                token: require(&lookup, GITHUB_TOKEN)?,
                api_url: url_or_default(&lookup, GITHUB_API_URL, DEFAULT_GITHUB_API_URL)?,
                repository: require(&lookup, GITHUB_REPOSITORY)?,
            },
            gemini: GeminiConfig {
                api_key: require(&lookup, GEMINI_API_KEY)?,
                api_url: url_or_default(&lookup, GEMINI_API_URL, DEFAULT_GEMINI_API_URL)?,
                model: optional(&lookup, GEMINI_MODEL)
                    .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            },
            timeout: timeout(&lookup)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Reads the process environment.
pub fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn optional(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn require(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<String, ConfigError> {
    optional(lookup, key).ok_or(ConfigError::Missing(key))
}

fn check_url(key: &'static str, value: String) -> Result<String, ConfigError> {
    if value.starts_with("https://") || value.starts_with("http://") {
        Ok(value.trim_end_matches('/').to_string())
    } else {
        Err(ConfigError::Invalid {
            key,
            reason: format!("expected an http(s) URL, got '{value}'"),
        })
    }
}

fn require_url(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<String, ConfigError> {
    check_url(key, require(lookup, key)?)
}

fn url_or_default(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<String, ConfigError> {
    match optional(lookup, key) {
        Some(v) => check_url(key, v),
        None => Ok(default.to_string()),
    }
}

fn timeout(lookup: &impl Fn(&str) -> Option<String>) -> Result<Duration, ConfigError> {
    let Some(raw) = optional(lookup, HTTP_TIMEOUT_SECS) else {
        return Ok(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    };
    match raw.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::Invalid {
            key: HTTP_TIMEOUT_SECS,
            reason: format!("expected a positive number of seconds, got '{raw}'"),
        }),
    }
}
