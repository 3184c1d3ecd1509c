//! Decoding of GitHub webhook payloads into typed tracked-item events.
//!
//! The payload is inspected exactly once here. Everything downstream works on
//! [`TrackedItemEvent`] and never looks at raw marker fields again.

use crate::error::{Result, SyncError};
use crate::types::{Action, ItemKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Shown wherever an item has no body text.
pub const NO_DESCRIPTION: &str = "No description";

// ---------------------------------------------------------------------------
// TrackedItem
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackedItem {
    pub kind: ItemKind,
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub state: String,
    pub labels: Vec<String>,
    pub assignees: Vec<String>,
    pub url: String,
}

impl TrackedItem {
    /// Body text, or [`NO_DESCRIPTION`] when the body is absent or empty.
    pub fn body_text(&self) -> &str {
        match self.body.as_deref() {
            Some(b) if !b.is_empty() => b,
            _ => NO_DESCRIPTION,
        }
    }

    /// Substring used to find an existing database record for this item.
    pub fn lookup_key(&self) -> String {
        format!("#{}", self.number)
    }

    /// `[Issue #42] Bug X`
    pub fn record_title(&self) -> String {
        format!("[{} #{}] {}", self.kind, self.number, self.title)
    }
}

// ---------------------------------------------------------------------------
// TrackedItemEvent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemEvent {
    pub action: Action,
    pub item: TrackedItem,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackedItemEvent {
    Issue(ItemEvent),
    PullRequest(ItemEvent),
    /// Neither an issue-only nor a pull-request payload. Not an error.
    Unsupported,
}

impl TrackedItemEvent {
    pub fn from_json(payload: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(payload)
            .map_err(|e| SyncError::MalformedEvent(format!("invalid JSON: {e}")))?;
        Self::from_value(&value)
    }

    /// Classify a decoded payload.
    ///
    /// An `issue` without a nested `pull_request` key is an issue. Otherwise a
    /// top-level `pull_request` makes it a pull request. Anything else is
    /// [`TrackedItemEvent::Unsupported`].
    pub fn from_value(value: &Value) -> Result<Self> {
        let Some(obj) = value.as_object() else {
            return Err(SyncError::MalformedEvent(
                "payload is not a JSON object".into(),
            ));
        };

        let issue = obj.get("issue").filter(|i| i.get("pull_request").is_none());
        let (kind, raw) = match (issue, obj.get("pull_request")) {
            (Some(raw), _) => (ItemKind::Issue, raw),
            (None, Some(raw)) => (ItemKind::PullRequest, raw),
            (None, None) => return Ok(TrackedItemEvent::Unsupported),
        };

        let action = obj
            .get("action")
            .and_then(Value::as_str)
            .ok_or_else(|| SyncError::MalformedEvent("missing 'action'".into()))?;
        let item = decode_item(kind, raw)?;
        let event = ItemEvent {
            action: Action::from(action),
            item,
        };

        Ok(match kind {
            ItemKind::Issue => TrackedItemEvent::Issue(event),
            ItemKind::PullRequest => TrackedItemEvent::PullRequest(event),
        })
    }

    pub fn item_event(&self) -> Option<&ItemEvent> {
        match self {
            TrackedItemEvent::Issue(e) | TrackedItemEvent::PullRequest(e) => Some(e),
            TrackedItemEvent::Unsupported => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Raw payload shapes
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct RawItem {
    number: u64,
    title: String,
    #[serde(default)]
    body: Option<String>,
    state: String,
    #[serde(default)]
    labels: Vec<RawLabel>,
    #[serde(default)]
    assignees: Vec<RawUser>,
    html_url: String,
}

#[derive(Deserialize)]
struct RawLabel {
    name: String,
}

#[derive(Deserialize)]
struct RawUser {
    login: String,
}

fn decode_item(kind: ItemKind, raw: &Value) -> Result<TrackedItem> {
    let raw: RawItem = RawItem::deserialize(raw)
        .map_err(|e| SyncError::MalformedEvent(format!("{kind} payload: {e}")))?;
    Ok(TrackedItem {
        kind,
        number: raw.number,
        title: raw.title,
        body: raw.body,
        state: raw.state,
        labels: raw.labels.into_iter().map(|l| l.name).collect(),
        assignees: raw.assignees.into_iter().map(|u| u.login).collect(),
        url: raw.html_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item_json(number: u64) -> Value {
        json!({
            "number": number,
            "title": "Bug X",
            "body": "short",
            "state": "open",
            "labels": [{"name": "bug"}, {"name": "p1"}],
            "assignees": [{"login": "octocat"}],
            "html_url": format!("https://github.com/acme/app/issues/{number}")
        })
    }

    #[test]
    fn decodes_issue_event() {
        let payload = json!({"action": "opened", "issue": item_json(42)});
        let event = TrackedItemEvent::from_value(&payload).unwrap();
        let TrackedItemEvent::Issue(e) = event else {
            panic!("expected Issue")
        };
        assert_eq!(e.action, Action::Opened);
        assert_eq!(e.item.kind, ItemKind::Issue);
        assert_eq!(e.item.number, 42);
        assert_eq!(e.item.labels, vec!["bug", "p1"]);
        assert_eq!(e.item.assignees, vec!["octocat"]);
        assert_eq!(e.item.lookup_key(), "#42");
        assert_eq!(e.item.record_title(), "[Issue #42] Bug X");
    }

    #[test]
    fn decodes_pull_request_event() {
        let payload = json!({"action": "closed", "pull_request": item_json(7)});
        let event = TrackedItemEvent::from_value(&payload).unwrap();
        let TrackedItemEvent::PullRequest(e) = event else {
            panic!("expected PullRequest")
        };
        assert_eq!(e.item.record_title(), "[PR #7] Bug X");
        assert_eq!(e.action, Action::Closed);
    }

    #[test]
    fn issue_with_pull_request_marker_is_a_pull_request() {
        let mut issue = item_json(9);
        issue["pull_request"] = json!({"url": "https://api.github.com/repos/acme/app/pulls/9"});
        let payload = json!({"action": "edited", "issue": issue, "pull_request": item_json(9)});
        let event = TrackedItemEvent::from_value(&payload).unwrap();
        assert!(matches!(event, TrackedItemEvent::PullRequest(_)));
    }

    #[test]
    fn issue_with_marker_and_no_pull_request_is_unsupported() {
        let mut issue = item_json(9);
        issue["pull_request"] = json!({});
        let payload = json!({"action": "created", "issue": issue, "comment": {}});
        let event = TrackedItemEvent::from_value(&payload).unwrap();
        assert_eq!(event, TrackedItemEvent::Unsupported);
        assert!(event.item_event().is_none());
    }

    #[test]
    fn push_event_is_unsupported() {
        let payload = json!({"ref": "refs/heads/main", "commits": []});
        assert_eq!(
            TrackedItemEvent::from_value(&payload).unwrap(),
            TrackedItemEvent::Unsupported
        );
    }

    #[test]
    fn missing_action_is_malformed() {
        let payload = json!({"issue": item_json(1)});
        let err = TrackedItemEvent::from_value(&payload).unwrap_err();
        assert!(matches!(err, SyncError::MalformedEvent(_)));
    }

    #[test]
    fn non_object_and_bad_json_are_malformed() {
        assert!(TrackedItemEvent::from_json("[1, 2]").is_err());
        assert!(TrackedItemEvent::from_json("{not json").is_err());
    }

    #[test]
    fn null_body_and_missing_lists_use_defaults() {
        let payload = json!({
            "action": "opened",
            "issue": {
                "number": 3,
                "title": "t",
                "body": null,
                "state": "open",
                "html_url": "https://github.com/acme/app/issues/3"
            }
        });
        let event = TrackedItemEvent::from_value(&payload).unwrap();
        let item = &event.item_event().unwrap().item;
        assert_eq!(item.body_text(), NO_DESCRIPTION);
        assert!(item.labels.is_empty());
        assert!(item.assignees.is_empty());
    }
}
