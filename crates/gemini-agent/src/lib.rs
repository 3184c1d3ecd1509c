//! `gemini-agent`: blocking client for the Gemini `generateContent` endpoint.
//!
//! ```text
//! GenerateOptions + prompt
//!     │
//!     ▼
//! run()          ← POST {api_url}/v1beta/models/{model}:generateContent
//!     │
//!     ▼
//! collect()      ← first candidate, first text part
//!     │
//!     ▼
//! RunResult
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use gemini_agent::{generate, GenerateOptions};
//!
//! let text = generate("Summarize these issues.", GenerateOptions::new("key"))?;
//! println!("{text}");
//! ```

pub mod error;
pub mod runner;
pub mod types;


pub use error::GeminiError;
pub use runner::{run as agent_run, RunConfig, RunResult};
pub use types::{
    Candidate, Content, GenerateContentRequest, GenerateContentResponse, GenerateOptions, Part,
    UsageMetadata,
};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, GeminiError>;

/// Send a single-turn prompt and return the generated text.
pub fn generate(prompt: impl Into<String>, opts: GenerateOptions) -> Result<String> {
    runner::run(RunConfig {
        prompt: prompt.into(),
        opts,
    })
    .map(|r| r.text)
}
