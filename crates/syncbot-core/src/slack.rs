//! Slack incoming-webhook delivery and Block Kit helpers.

use crate::config::REDACTED;
use crate::error::Result;
use crate::http;
use reqwest::blocking::Client;
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;

const SERVICE: &str = "Slack";

/// Destination for chat payloads.
pub trait ChatSink {
    fn send(&self, payload: &Value) -> Result<()>;
}

impl<T: ChatSink + ?Sized> ChatSink for &T {
    fn send(&self, payload: &Value) -> Result<()> {
        (**self).send(payload)
    }
}

#[derive(Clone)]
pub struct SlackWebhook {
    client: Client,
    url: String,
}

// The webhook URL is the credential.
impl fmt::Debug for SlackWebhook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlackWebhook")
            .field("url", &REDACTED)
            .finish_non_exhaustive()
    }
}

impl SlackWebhook {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http::client(timeout)?,
            url: url.into(),
        })
    }
}

impl ChatSink for SlackWebhook {
    fn send(&self, payload: &Value) -> Result<()> {
        let response = self.client.post(&self.url).json(payload).send()?;
        http::check(SERVICE, response)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Block Kit
// ---------------------------------------------------------------------------

pub fn header(text: &str) -> Value {
    json!({
        "type": "header",
        "text": {"type": "plain_text", "text": text}
    })
}

pub fn mrkdwn(text: &str) -> Value {
    json!({"type": "mrkdwn", "text": text})
}

pub fn section(text: &str) -> Value {
    json!({"type": "section", "text": mrkdwn(text)})
}

pub fn fields(entries: &[(&str, &str)]) -> Value {
    let fields: Vec<Value> = entries
        .iter()
        .map(|(label, value)| mrkdwn(&format!("*{label}:*\n{value}")))
        .collect();
    json!({"type": "section", "fields": fields})
}

pub fn button(text: &str, url: &str, primary: bool) -> Value {
    let mut b = json!({
        "type": "button",
        "text": {"type": "plain_text", "text": text},
        "url": url
    });
    if primary {
        b["style"] = json!("primary");
    }
    b
}

pub fn actions(elements: Vec<Value>) -> Value {
    json!({"type": "actions", "elements": elements})
}
