use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("malformed event payload: {0}")]
    MalformedEvent(String),

    #[error("{service} API error: {status} - {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{service} response is missing '{field}'")]
    MissingField {
        service: &'static str,
        field: &'static str,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Startup precondition failures. Raised before any network call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, SyncError>;
