pub mod notify;
pub mod report;
pub mod sync;

use anyhow::Context;
use clap::Args;
use std::path::PathBuf;
use syncbot_core::config;
use syncbot_core::event::TrackedItemEvent;

/// Where the webhook payload comes from. Inline JSON wins over the file.
#[derive(Args, Debug)]
pub struct EventSource {
    /// Webhook payload as inline JSON
    #[arg(long, env = "GITHUB_EVENT", hide_env_values = true)]
    pub event: Option<String>,

    /// Path to the webhook payload file
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    pub event_path: Option<PathBuf>,
}

impl EventSource {
    pub fn load(&self) -> anyhow::Result<TrackedItemEvent> {
        let raw = match (&self.event, &self.event_path) {
            (Some(inline), _) => inline.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("failed to read event payload {}", path.display()))?,
            (None, None) => {
                anyhow::bail!("no event payload: set GITHUB_EVENT or GITHUB_EVENT_PATH")
            }
        };
        TrackedItemEvent::from_json(&raw).context("failed to decode event payload")
    }
}

/// Environment lookup with the `--repository` flag layered on top.
pub fn settings(repository: Option<&str>) -> impl Fn(&str) -> Option<String> + '_ {
    move |key: &str| match (key, repository) {
        (config::GITHUB_REPOSITORY, Some(r)) => Some(r.to_string()),
        _ => config::env_lookup(key),
    }
}
