use reqwest::blocking::Client;

use crate::{GeminiError, GenerateContentRequest, GenerateContentResponse, GenerateOptions, Result};
use crate::types::UsageMetadata;

const API_KEY_HEADER: &str = "x-goog-api-key";

// ─── RunConfig ────────────────────────────────────────────────────────────

/// A single-turn generation request.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub prompt: String,
    pub opts: GenerateOptions,
}

// ─── RunResult ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    pub text: String,
    pub finish_reason: Option<String>,
    pub usage: Option<UsageMetadata>,
}

// ─── Public API ───────────────────────────────────────────────────────────

/// POST the prompt to `generateContent` and return the first candidate's text.
///
/// Any non-2xx status is [`GeminiError::Api`] carrying the response body.
pub fn run(config: RunConfig) -> Result<RunResult> {
    let opts = &config.opts;
    let client = Client::builder()
        .timeout(opts.timeout)
        .user_agent(concat!("gemini-agent/", env!("CARGO_PKG_VERSION")))
        .build()?;

    tracing::debug!(model = %opts.model, prompt_chars = config.prompt.chars().count(), "generateContent");
    let response = client
        .post(opts.endpoint())
        .header(API_KEY_HEADER, opts.api_key.as_str())
        .json(&GenerateContentRequest::from_prompt(config.prompt.as_str()))
        .send()?;

    let status = response.status();
    let body = response.text()?;
    if !status.is_success() {
        return Err(GeminiError::Api {
            status: status.as_u16(),
            body,
        });
    }
    collect(serde_json::from_str(&body)?)
}

// ─── Internal ─────────────────────────────────────────────────────────────

/// Extract the [`RunResult`] from a parsed response.
pub(crate) fn collect(response: GenerateContentResponse) -> Result<RunResult> {
    let text = response
        .first_text()
        .ok_or(GeminiError::EmptyResponse)?
        .to_string();
    let finish_reason = response
        .candidates
        .first()
        .and_then(|c| c.finish_reason.clone());
    Ok(RunResult {
        text,
        finish_reason,
        usage: response.usage_metadata,
    })
}

// ─── Tests ────────────────────────────────────────────────────────────────
