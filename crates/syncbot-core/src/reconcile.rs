//! Create-or-update reconciliation of tracked items against the record store,
//! followed by a chat notification.
//!
//! Both side-effecting legs run inside their own failure boundary: a database
//! failure degrades the notification instead of preventing it, and a
//! notification failure never touches the database write.
//!
//! The existence check and the write are not atomic. Two near-simultaneous
//! `opened` deliveries for the same number both create a record, and an
//! `opened` delivery for an already-recorded number creates a second one.

use crate::event::{ItemEvent, TrackedItemEvent};
use crate::notion::{RecordDraft, RecordRef, RecordStore};
use crate::slack::{self, ChatSink};
use crate::text::{code_block, excerpt, join_or};
use crate::types::{state_display, Action, ItemKind, Status};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::{json, Value};

/// Placeholder for empty assignee and label lists.
pub const NONE_LABEL: &str = "없음";
pub const SOURCE_BUTTON: &str = "GitHub에서 보기";
pub const RECORD_BUTTON: &str = "Notion에서 보기";

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum DatabaseResult {
    Created { record: RecordRef },
    Updated { record: RecordRef },
    Failed { reason: String },
}

impl DatabaseResult {
    /// Browse URL of the affected record, `None` when the database leg failed.
    pub fn record_url(&self) -> Option<String> {
        match self {
            DatabaseResult::Created { record } | DatabaseResult::Updated { record } => {
                Some(record.browse_url())
            }
            DatabaseResult::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, DatabaseResult::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum DeliveryResult {
    Delivered,
    Failed { reason: String },
}

impl DeliveryResult {
    pub fn is_failed(&self) -> bool {
        matches!(self, DeliveryResult::Failed { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Succeeded,
    Partial,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Leg {
    Database,
    Notification,
}

impl OutcomeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OutcomeStatus::Succeeded => "succeeded",
            OutcomeStatus::Partial => "partial",
            OutcomeStatus::Failed => "failed",
        }
    }
}

impl Leg {
    pub fn as_str(self) -> &'static str {
        match self {
            Leg::Database => "database",
            Leg::Notification => "notification",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub kind: ItemKind,
    pub number: u64,
    pub action: Action,
    pub database: DatabaseResult,
    pub notification: DeliveryResult,
}

impl SyncReport {
    pub fn status(&self) -> OutcomeStatus {
        match (self.database.is_failed(), self.notification.is_failed()) {
            (false, false) => OutcomeStatus::Succeeded,
            (true, true) => OutcomeStatus::Failed,
            _ => OutcomeStatus::Partial,
        }
    }

    pub fn failed_legs(&self) -> Vec<Leg> {
        let mut legs = Vec::new();
        if self.database.is_failed() {
            legs.push(Leg::Database);
        }
        if self.notification.is_failed() {
            legs.push(Leg::Notification);
        }
        legs
    }
}

// `status` and `failed_legs` are derived from the legs and written alongside them.
impl Serialize for SyncReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut st = serializer.serialize_struct("SyncReport", 7)?;
        st.serialize_field("kind", &self.kind)?;
        st.serialize_field("number", &self.number)?;
        st.serialize_field("action", &self.action)?;
        st.serialize_field("status", &self.status())?;
        st.serialize_field("failed_legs", &self.failed_legs())?;
        st.serialize_field("database", &self.database)?;
        st.serialize_field("notification", &self.notification)?;
        st.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// The event was neither an issue nor a pull request. Nothing was called.
    NotApplicable,
    Completed(SyncReport),
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

pub struct Reconciler<S, C> {
    store: S,
    chat: C,
    repository: String,
}

impl<S: RecordStore, C: ChatSink> Reconciler<S, C> {
    pub fn new(store: S, chat: C, repository: impl Into<String>) -> Self {
        Self {
            store,
            chat,
            repository: repository.into(),
        }
    }

    /// One database write (create or status update) and one chat send.
    pub fn reconcile(&self, event: &TrackedItemEvent) -> SyncOutcome {
        let Some(event) = event.item_event() else {
            tracing::info!("not an issue or pull request event, skipping");
            return SyncOutcome::NotApplicable;
        };

        let database = self.sync_record(event);
        let message = build_message(&self.repository, event, &database);
        let notification = self.deliver(event, &message);

        let report = SyncReport {
            kind: event.item.kind,
            number: event.item.number,
            action: event.action.clone(),
            database,
            notification,
        };
        tracing::info!(
            kind = %report.kind,
            number = report.number,
            status = ?report.status(),
            failed_legs = ?report.failed_legs(),
            "sync finished"
        );
        SyncOutcome::Completed(report)
    }

    fn sync_record(&self, event: &ItemEvent) -> DatabaseResult {
        let item = &event.item;
        let key = item.lookup_key();

        let existing = match self.store.find_by_title(&key) {
            Ok(found) => found,
            Err(e) => return database_failure(item.kind, item.number, e),
        };

        let result = match existing.first() {
            Some(record) if !event.action.is_creation() => self
                .store
                .update_status(&record.id, Status::from_state(&item.state))
                .map(|record| DatabaseResult::Updated { record }),
            _ => self
                .store
                .create(&RecordDraft::from_item(item))
                .map(|record| DatabaseResult::Created { record }),
        };

        match result {
            Ok(done) => {
                let verb = match done {
                    DatabaseResult::Created { .. } => "created",
                    _ => "updated",
                };
                tracing::info!(kind = %item.kind, number = item.number, "{verb} record in Notion");
                done
            }
            Err(e) => database_failure(item.kind, item.number, e),
        }
    }

    fn deliver(&self, event: &ItemEvent, message: &Value) -> DeliveryResult {
        let item = &event.item;
        match self.chat.send(message) {
            Ok(()) => {
                tracing::info!(kind = %item.kind, number = item.number, "sent Slack notification");
                DeliveryResult::Delivered
            }
            Err(e) => {
                tracing::error!(kind = %item.kind, number = item.number, error = %e, "Slack error");
                DeliveryResult::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

fn database_failure(kind: ItemKind, number: u64, e: crate::error::SyncError) -> DatabaseResult {
    tracing::error!(kind = %kind, number, error = %e, "Notion error");
    DatabaseResult::Failed {
        reason: e.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// Slack attachment announcing the event and linking to both the item and its
/// record. The record button is left out when the database leg failed.
pub fn build_message(repository: &str, event: &ItemEvent, database: &DatabaseResult) -> Value {
    let item = &event.item;

    let header = format!(
        "{} {} #{} {}",
        item.kind.emoji(),
        item.kind,
        item.number,
        event.action.word()
    );

    let assignees: Vec<String> = item.assignees.iter().map(|a| format!("@{a}")).collect();
    let labels: Vec<String> = item.labels.iter().map(|l| format!("`{l}`")).collect();
    let assignee_text = join_or(&assignees, NONE_LABEL);
    let label_text = join_or(&labels, NONE_LABEL);

    let mut buttons = vec![slack::button(SOURCE_BUTTON, &item.url, true)];
    if let Some(url) = database.record_url() {
        buttons.push(slack::button(RECORD_BUTTON, &url, false));
    }

    let blocks = vec![
        slack::header(&header),
        slack::section(&format!("*{}*", item.title)),
        slack::fields(&[
            ("Repository", repository),
            ("상태", state_display(&item.state)),
            ("담당자", assignee_text.as_str()),
            ("태그", label_text.as_str()),
        ]),
        slack::section(&code_block(&excerpt(item.body_text()))),
        slack::actions(buttons),
    ];

    json!({
        "attachments": [{
            "color": event.action.color(),
            "blocks": blocks
        }]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, SyncError};
    use crate::event::TrackedItem;
    use std::cell::{Cell, RefCell};

    // -- fakes --------------------------------------------------------------

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Find(String),
        Create(RecordDraft),
        Update(String, Status),
    }

    #[derive(Default)]
    struct FakeStore {
        records: RefCell<Vec<(String, String)>>,
        calls: RefCell<Vec<Call>>,
        fail_query: bool,
        next_id: Cell<u32>,
    }

    impl FakeStore {
        fn with_record(id: &str, title: &str) -> Self {
            let store = FakeStore::default();
            store
                .records
                .borrow_mut()
                .push((id.to_string(), title.to_string()));
            store
        }

        fn creates(&self) -> Vec<RecordDraft> {
            self.calls
                .borrow()
                .iter()
                .filter_map(|c| match c {
                    Call::Create(d) => Some(d.clone()),
                    _ => None,
                })
                .collect()
        }

        fn updates(&self) -> Vec<(String, Status)> {
            self.calls
                .borrow()
                .iter()
                .filter_map(|c| match c {
                    Call::Update(id, s) => Some((id.clone(), *s)),
                    _ => None,
                })
                .collect()
        }
    }

    impl RecordStore for FakeStore {
        fn find_by_title(&self, needle: &str) -> Result<Vec<RecordRef>> {
            self.calls.borrow_mut().push(Call::Find(needle.to_string()));
            if self.fail_query {
                return Err(SyncError::Api {
                    service: "Notion",
                    status: 502,
                    body: "bad gateway".into(),
                });
            }
            Ok(self
                .records
                .borrow()
                .iter()
                .filter(|(_, title)| title.contains(needle))
                .map(|(id, _)| RecordRef { id: id.clone() })
                .collect())
        }

        fn create(&self, draft: &RecordDraft) -> Result<RecordRef> {
            self.calls.borrow_mut().push(Call::Create(draft.clone()));
            let n = self.next_id.get() + 1;
            self.next_id.set(n);
            let id = format!("0000-{n:04}");
            self.records
                .borrow_mut()
                .push((id.clone(), draft.title.clone()));
            Ok(RecordRef { id })
        }

        fn update_status(&self, record_id: &str, status: Status) -> Result<RecordRef> {
            self.calls
                .borrow_mut()
                .push(Call::Update(record_id.to_string(), status));
            Ok(RecordRef {
                id: record_id.to_string(),
            })
        }
    }

    #[derive(Default)]
    struct FakeChat {
        sent: RefCell<Vec<Value>>,
        fail: bool,
    }

    impl ChatSink for FakeChat {
        fn send(&self, payload: &Value) -> Result<()> {
            self.sent.borrow_mut().push(payload.clone());
            if self.fail {
                return Err(SyncError::Api {
                    service: "Slack",
                    status: 500,
                    body: "oops".into(),
                });
            }
            Ok(())
        }
    }

    // -- helpers ------------------------------------------------------------

    fn issue(number: u64, state: &str, action: &str) -> TrackedItemEvent {
        TrackedItemEvent::Issue(ItemEvent {
            action: Action::from(action),
            item: TrackedItem {
                kind: ItemKind::Issue,
                number,
                title: "Bug X".into(),
                body: Some("short".into()),
                state: state.into(),
                labels: vec![],
                assignees: vec![],
                url: format!("https://github.com/acme/app/issues/{number}"),
            },
        })
    }

    fn report(outcome: SyncOutcome) -> SyncReport {
        match outcome {
            SyncOutcome::Completed(r) => r,
            SyncOutcome::NotApplicable => panic!("expected a completed sync"),
        }
    }

    fn header_text(message: &Value) -> String {
        message["attachments"][0]["blocks"][0]["text"]["text"]
            .as_str()
            .unwrap()
            .to_string()
    }

    fn buttons(message: &Value) -> Vec<Value> {
        message["attachments"][0]["blocks"][4]["elements"]
            .as_array()
            .unwrap()
            .clone()
    }

    // -- scenarios ----------------------------------------------------------

    #[test]
    fn new_issue_creates_record_and_notifies() {
        let store = FakeStore::default();
        let chat = FakeChat::default();
        let reconciler = Reconciler::new(&store, &chat, "acme/app");
        let r = report(reconciler.reconcile(&issue(42, "open", "opened")));

        let creates = store.creates();
        assert_eq!(creates.len(), 1);
        assert_eq!(creates[0].title, "[Issue #42] Bug X");
        assert_eq!(creates[0].status, Status::InProgress);
        assert!(store.updates().is_empty());
        assert_eq!(store.calls.borrow()[0], Call::Find("#42".into()));

        let sent = chat.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert!(header_text(&sent[0]).contains("🐛 Issue #42 생성됨"));
        assert_eq!(sent[0]["attachments"][0]["color"], "#36a64f");
        assert_eq!(r.status(), OutcomeStatus::Succeeded);
        assert!(matches!(r.database, DatabaseResult::Created { .. }));
    }

    #[test]
    fn closing_existing_issue_updates_status_only() {
        let store = FakeStore::with_record("abc-123", "[Issue #42] Bug X");
        let chat = FakeChat::default();
        let r = report(
            Reconciler::new(&store, &chat, "acme/app").reconcile(&issue(42, "closed", "closed")),
        );

        assert!(store.creates().is_empty());
        assert_eq!(store.updates(), vec![("abc-123".to_string(), Status::Done)]);
        assert_eq!(
            r.database.record_url().as_deref(),
            Some("https://notion.so/abc123")
        );
        let sent = chat.sent.borrow();
        assert!(header_text(&sent[0]).contains("완료됨"));
        assert_eq!(buttons(&sent[0])[1]["url"], "https://notion.so/abc123");
    }

    #[test]
    fn query_failure_still_notifies_without_record_button() {
        let store = FakeStore {
            fail_query: true,
            ..FakeStore::default()
        };
        let chat = FakeChat::default();
        let reconciler = Reconciler::new(&store, &chat, "acme/app");
        let r = report(reconciler.reconcile(&issue(42, "open", "opened")));

        assert!(store.creates().is_empty());
        assert!(matches!(&r.database, DatabaseResult::Failed { reason } if reason.contains("502")));
        assert_eq!(r.status(), OutcomeStatus::Partial);
        assert_eq!(r.failed_legs(), vec![Leg::Database]);

        let sent = chat.sent.borrow();
        assert_eq!(sent.len(), 1);
        let b = buttons(&sent[0]);
        assert_eq!(b.len(), 1);
        assert_eq!(b[0]["text"]["text"], SOURCE_BUTTON);
    }

    #[test]
    fn duplicate_opened_events_create_two_records() {
        // Known gap: the lookup does not deduplicate creation actions.
        let store = FakeStore::default();
        let chat = FakeChat::default();
        let reconciler = Reconciler::new(&store, &chat, "acme/app");
        reconciler.reconcile(&issue(42, "open", "opened"));
        reconciler.reconcile(&issue(42, "open", "opened"));

        assert_eq!(store.creates().len(), 2);
        assert_eq!(store.records.borrow().len(), 2);
        assert!(store.updates().is_empty());
    }

    #[test]
    fn edit_without_existing_record_creates_one() {
        let store = FakeStore::default();
        let chat = FakeChat::default();
        Reconciler::new(&store, &chat, "acme/app").reconcile(&issue(8, "open", "edited"));
        assert_eq!(store.creates().len(), 1);
    }

    #[test]
    fn only_first_match_is_updated() {
        let store = FakeStore::with_record("first", "[Issue #42] Bug X");
        store
            .records
            .borrow_mut()
            .push(("second".into(), "[Issue #42] Bug X".into()));
        let chat = FakeChat::default();
        Reconciler::new(&store, &chat, "acme/app").reconcile(&issue(42, "open", "reopened"));
        assert_eq!(store.updates(), vec![("first".to_string(), Status::InProgress)]);
    }

    #[test]
    fn unknown_state_updates_to_in_progress() {
        let store = FakeStore::with_record("abc", "[Issue #3] Bug X");
        let chat = FakeChat::default();
        Reconciler::new(&store, &chat, "acme/app").reconcile(&issue(3, "merged", "edited"));
        assert_eq!(store.updates(), vec![("abc".to_string(), Status::InProgress)]);
    }

    #[test]
    fn chat_failure_keeps_database_write() {
        let store = FakeStore::default();
        let chat = FakeChat {
            fail: true,
            ..FakeChat::default()
        };
        let reconciler = Reconciler::new(&store, &chat, "acme/app");
        let r = report(reconciler.reconcile(&issue(1, "open", "opened")));
        assert_eq!(store.creates().len(), 1);
        assert!(r.notification.is_failed());
        assert_eq!(r.failed_legs(), vec![Leg::Notification]);
        assert_eq!(r.status(), OutcomeStatus::Partial);
    }

    #[test]
    fn unsupported_event_has_no_side_effects() {
        let store = FakeStore::default();
        let chat = FakeChat::default();
        let outcome =
            Reconciler::new(&store, &chat, "acme/app").reconcile(&TrackedItemEvent::Unsupported);
        assert_eq!(outcome, SyncOutcome::NotApplicable);
        assert!(store.calls.borrow().is_empty());
        assert!(chat.sent.borrow().is_empty());
    }

    // -- message ------------------------------------------------------------

    #[test]
    fn message_fields_and_excerpt() {
        let TrackedItemEvent::Issue(mut event) = issue(5, "merged", "labeled") else {
            unreachable!()
        };
        event.item.assignees = vec!["alice".into(), "bob".into()];
        event.item.labels = vec!["bug".into(), "ui".into()];
        event.item.body = Some("b".repeat(350));
        let db = DatabaseResult::Updated {
            record: RecordRef { id: "x-y".into() },
        };
        let msg = build_message("acme/app", &event, &db);
        let blocks = &msg["attachments"][0]["blocks"];

        assert_eq!(blocks[0]["text"]["text"], "🐛 Issue #5 labeled");
        assert_eq!(blocks[1]["text"]["text"], "*Bug X*");
        let f = &blocks[2]["fields"];
        assert_eq!(f[0]["text"], "*Repository:*\nacme/app");
        assert_eq!(f[1]["text"], "*상태:*\nmerged");
        assert_eq!(f[2]["text"], "*담당자:*\n@alice, @bob");
        assert_eq!(f[3]["text"], "*태그:*\n`bug`, `ui`");
        assert_eq!(
            blocks[3]["text"]["text"],
            format!("```{}...```", "b".repeat(300))
        );
        assert_eq!(msg["attachments"][0]["color"], "#808080");
    }

    #[test]
    fn message_placeholders_for_empty_lists() {
        let TrackedItemEvent::Issue(mut event) = issue(5, "open", "opened") else {
            unreachable!()
        };
        event.item.body = None;
        let db = DatabaseResult::Failed {
            reason: "x".into(),
        };
        let msg = build_message("acme/app", &event, &db);
        let blocks = &msg["attachments"][0]["blocks"];
        assert_eq!(blocks[2]["fields"][2]["text"], "*담당자:*\n없음");
        assert_eq!(blocks[2]["fields"][3]["text"], "*태그:*\n없음");
        assert_eq!(blocks[3]["text"]["text"], "```No description```");
        assert_eq!(blocks[4]["elements"][0]["style"], "primary");
    }

    #[test]
    fn pull_request_header_uses_pr_label() {
        let TrackedItemEvent::Issue(mut event) = issue(11, "open", "reopened") else {
            unreachable!()
        };
        event.item.kind = ItemKind::PullRequest;
        let db = DatabaseResult::Failed {
            reason: String::new(),
        };
        let msg = build_message("acme/app", &event, &db);
        assert_eq!(
            msg["attachments"][0]["blocks"][0]["text"]["text"],
            "🔀 PR #11 재오픈됨"
        );
        assert_eq!(msg["attachments"][0]["color"], "#ff9800");
    }

    #[test]
    fn outcome_serializes_with_tags() {
        let r = SyncReport {
            kind: ItemKind::Issue,
            number: 1,
            action: Action::Opened,
            database: DatabaseResult::Failed { reason: "x".into() },
            notification: DeliveryResult::Delivered,
        };
        let v = serde_json::to_value(SyncOutcome::Completed(r)).unwrap();
        assert_eq!(v["outcome"], "completed");
        assert_eq!(v["database"]["result"], "failed");
        assert_eq!(v["notification"]["result"], "delivered");
        assert_eq!(v["action"], "opened");
    }

    #[test]
    fn outcome_record_carries_status_and_failed_legs() {
        let store = FakeStore {
            fail_query: true,
            ..FakeStore::default()
        };
        let chat = FakeChat::default();
        let outcome =
            Reconciler::new(&store, &chat, "acme/app").reconcile(&issue(42, "open", "opened"));
        let v = serde_json::to_value(&outcome).unwrap();
        assert_eq!(v["status"], "partial");
        assert_eq!(v["failed_legs"], json!(["database"]));

        let clean = SyncReport {
            kind: ItemKind::Issue,
            number: 1,
            action: Action::Closed,
            database: DatabaseResult::Updated {
                record: RecordRef { id: "r".into() },
            },
            notification: DeliveryResult::Delivered,
        };
        let v = serde_json::to_value(SyncOutcome::Completed(clean)).unwrap();
        assert_eq!(v["status"], "succeeded");
        assert_eq!(v["failed_legs"], json!([]));
    }
}
