use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ItemKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Issue,
    PullRequest,
}

impl ItemKind {
    /// Label used in record titles, headers and log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            ItemKind::Issue => "Issue",
            ItemKind::PullRequest => "PR",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            ItemKind::Issue => "🐛",
            ItemKind::PullRequest => "🔀",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// Lifecycle token carried at the top level of the event payload.
///
/// Unknown tokens are kept verbatim so headers can fall back to them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Action {
    Opened,
    Edited,
    Closed,
    Reopened,
    Other(String),
}

impl Action {
    pub fn as_str(&self) -> &str {
        match self {
            Action::Opened => "opened",
            Action::Edited => "edited",
            Action::Closed => "closed",
            Action::Reopened => "reopened",
            Action::Other(s) => s,
        }
    }

    /// `opened` is the creation action: it always produces a new record.
    pub fn is_creation(&self) -> bool {
        matches!(self, Action::Opened)
    }

    /// Past-tense word shown in sync notification headers.
    pub fn word(&self) -> &str {
        match self {
            Action::Opened => "생성됨",
            Action::Edited => "수정됨",
            Action::Closed => "완료됨",
            Action::Reopened => "재오픈됨",
            Action::Other(s) => s,
        }
    }

    /// Attachment colour for sync notifications.
    pub fn color(&self) -> &'static str {
        match self {
            Action::Opened => "#36a64f",
            Action::Edited => "#2196F3",
            Action::Reopened => "#ff9800",
            Action::Closed | Action::Other(_) => "#808080",
        }
    }
}

impl From<String> for Action {
    fn from(s: String) -> Self {
        match s.as_str() {
            "opened" => Action::Opened,
            "edited" => Action::Edited,
            "closed" => Action::Closed,
            "reopened" => Action::Reopened,
            _ => Action::Other(s),
        }
    }
}

impl From<&str> for Action {
    fn from(s: &str) -> Self {
        Action::from(s.to_string())
    }
}

impl From<Action> for String {
    fn from(a: Action) -> Self {
        a.as_str().to_string()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Select option written to the database `상태` property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    InProgress,
    Done,
    Reopened,
}

impl Status {
    pub fn from_known_state(state: &str) -> Option<Status> {
        match state {
            "open" => Some(Status::InProgress),
            "closed" => Some(Status::Done),
            "reopened" => Some(Status::Reopened),
            _ => None,
        }
    }

    /// Maps an item state to a status. Unrecognised states are in progress.
    pub fn from_state(state: &str) -> Status {
        Status::from_known_state(state).unwrap_or(Status::InProgress)
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::InProgress => "진행중",
            Status::Done => "완료",
            Status::Reopened => "재오픈",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Status label for display; unrecognised states are shown as the raw token.
pub fn state_display(state: &str) -> &str {
    match Status::from_known_state(state) {
        Some(status) => status.label(),
        None => state,
    }
}
