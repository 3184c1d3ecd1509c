//! Plain-text Slack notification with assignee mentions.
//!
//! Unlike the sync job, a failed delivery here is a job failure: the caller
//! gets the error back and exits nonzero.

use crate::error::Result;
use crate::event::{ItemEvent, TrackedItemEvent};
use crate::slack::ChatSink;
use crate::text::{truncate_chars, EXCERPT_LIMIT};
use crate::types::Action;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;

pub const NO_ASSIGNEE: &str = "담당자 없음";

/// Header word for this job. `edited` has no entry and shows as the raw token.
pub fn action_word(action: &Action) -> &str {
    match action {
        Action::Opened => "생성됨",
        Action::Closed => "완료됨",
        Action::Reopened => "재오픈됨",
        other => other.as_str(),
    }
}

/// `<@U123>` for mapped logins, `@login` otherwise.
pub fn mentions(assignees: &[String], map: &HashMap<String, String>) -> Vec<String> {
    assignees
        .iter()
        .map(|login| match map.get(login) {
            Some(id) => format!("<@{id}>"),
            None => format!("@{login}"),
        })
        .collect()
}

pub fn build_text(event: &ItemEvent, map: &HashMap<String, String>) -> String {
    let item = &event.item;
    let mentioned = mentions(&item.assignees, map);
    let mention_text = if mentioned.is_empty() {
        NO_ASSIGNEE.to_string()
    } else {
        mentioned.join(", ")
    };

    let mut text = format!(
        "{} *{} #{} {}*\n\n",
        item.kind.emoji(),
        item.kind,
        item.number,
        action_word(&event.action)
    );
    text.push_str(&format!("*{}*\n\n", item.title));
    text.push_str(&format!(
        "📝 {}\n\n",
        truncate_chars(item.body_text(), EXCERPT_LIMIT)
    ));
    text.push_str(&format!("👤 담당자: {mention_text}\n"));
    text.push_str(&format!("🔗 {}", item.url));

    if mentioned.is_empty() {
        text
    } else {
        format!("{}\n\n{text}", mentioned.join(" "))
    }
}

pub fn build_payload(event: &ItemEvent, map: &HashMap<String, String>) -> Value {
    json!({"text": build_text(event, map)})
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NotifyOutcome {
    NotApplicable,
    Sent { number: u64, mentions: usize },
}

/// Send the mention notification for `event`.
pub fn notify(
    chat: &impl ChatSink,
    event: &TrackedItemEvent,
    map: &HashMap<String, String>,
) -> Result<NotifyOutcome> {
    let Some(event) = event.item_event() else {
        tracing::info!("not an issue or pull request event, skipping");
        return Ok(NotifyOutcome::NotApplicable);
    };
    chat.send(&build_payload(event, map))?;
    tracing::info!(
        kind = %event.item.kind,
        number = event.item.number,
        "Slack notification sent"
    );
    Ok(NotifyOutcome::Sent {
        number: event.item.number,
        mentions: event.item.assignees.len(),
    })
}
