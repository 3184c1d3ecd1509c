use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("Gemini API error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse generateContent response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Response contained no text candidate")]
    EmptyResponse,
}

// Transport errors never carry the request URL.
impl From<reqwest::Error> for GeminiError {
    fn from(e: reqwest::Error) -> Self {
        GeminiError::Http(e.without_url())
    }
}
