//! Notion REST client and the tracked-item record store built on it.
//!
//! Property names match the Korean schema of the target database:
//!
//! | property      | type         | content                  |
//! |---------------|--------------|--------------------------|
//! | `제목`        | title        | `[Issue #42] Bug X`      |
//! | `타입`        | select       | `Issue` / `PR`           |
//! | `상태`        | select       | mapped [`Status`] label  |
//! | `태그`        | multi_select | item labels              |
//! | `GitHub URL`  | url          | item URL                 |

use crate::config::NotionConfig;
use crate::error::Result;
use crate::event::TrackedItem;
use crate::http;
use crate::text::{truncate_chars, RECORD_BODY_LIMIT};
use crate::types::{ItemKind, Status};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

pub const NOTION_VERSION: &str = "2022-06-28";
const SERVICE: &str = "Notion";

pub const PROP_TITLE: &str = "제목";
pub const PROP_TYPE: &str = "타입";
pub const PROP_STATUS: &str = "상태";
pub const PROP_TAGS: &str = "태그";
pub const PROP_URL: &str = "GitHub URL";

/// Browse URL of a page: its id with dashes removed under `notion.so`.
pub fn page_url(id: &str) -> String {
    format!("https://notion.so/{}", id.replace('-', ""))
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRef {
    pub id: String,
}

impl RecordRef {
    pub fn browse_url(&self) -> String {
        page_url(&self.id)
    }
}

/// Everything written when a record is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordDraft {
    pub title: String,
    pub kind: ItemKind,
    pub status: Status,
    pub tags: Vec<String>,
    pub source_url: String,
    /// Already capped at [`RECORD_BODY_LIMIT`] characters.
    pub body: String,
}

impl RecordDraft {
    pub fn from_item(item: &TrackedItem) -> Self {
        Self {
            title: item.record_title(),
            kind: item.kind,
            status: Status::from_state(&item.state),
            tags: item.labels.clone(),
            source_url: item.url.clone(),
            body: truncate_chars(item.body_text(), RECORD_BODY_LIMIT).to_string(),
        }
    }
}

/// The external database holding one record per tracked item.
pub trait RecordStore {
    /// Records whose title contains `needle`, in the order the store returns them.
    fn find_by_title(&self, needle: &str) -> Result<Vec<RecordRef>>;

    fn create(&self, draft: &RecordDraft) -> Result<RecordRef>;

    /// Touches the status property only.
    fn update_status(&self, record_id: &str, status: Status) -> Result<RecordRef>;
}

impl<T: RecordStore + ?Sized> RecordStore for &T {
    fn find_by_title(&self, needle: &str) -> Result<Vec<RecordRef>> {
        (**self).find_by_title(needle)
    }

    fn create(&self, draft: &RecordDraft) -> Result<RecordRef> {
        (**self).create(draft)
    }

    fn update_status(&self, record_id: &str, status: Status) -> Result<RecordRef> {
        (**self).update_status(record_id, status)
    }
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

pub fn title_filter(needle: &str) -> Value {
    json!({
        "filter": {
            "property": PROP_TITLE,
            "title": {"contains": needle}
        }
    })
}

pub fn status_properties(status: Status) -> Value {
    json!({
        PROP_STATUS: {"select": {"name": status.label()}}
    })
}

pub fn create_record_body(database_id: &str, draft: &RecordDraft) -> Value {
    let tags: Vec<Value> = draft.tags.iter().map(|t| json!({"name": t})).collect();
    json!({
        "parent": {"database_id": database_id},
        "properties": {
            PROP_TITLE: {"title": [{"text": {"content": draft.title}}]},
            PROP_TYPE: {"select": {"name": draft.kind.as_str()}},
            PROP_STATUS: {"select": {"name": draft.status.label()}},
            PROP_TAGS: {"multi_select": tags},
            PROP_URL: {"url": draft.source_url}
        },
        "children": [paragraph(&draft.body)]
    })
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

pub fn rich_text(content: &str) -> Value {
    json!({"type": "text", "text": {"content": content}})
}

pub fn paragraph(content: &str) -> Value {
    json!({
        "object": "block",
        "type": "paragraph",
        "paragraph": {"rich_text": [rich_text(content)]}
    })
}

pub fn heading(level: u8, rich: Vec<Value>) -> Value {
    let key = format!("heading_{level}");
    json!({
        "object": "block",
        "type": key.clone(),
        key: {"rich_text": rich}
    })
}

pub fn divider() -> Value {
    json!({"object": "block", "type": "divider", "divider": {}})
}

// ---------------------------------------------------------------------------
// NotionClient
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedPage {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<RecordRef>,
}

#[derive(Debug, Clone)]
pub struct NotionClient {
    client: Client,
    config: NotionConfig,
}

impl NotionClient {
    pub fn new(config: NotionConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http::client(timeout)?,
            config,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/v1/{}", self.config.api_url, path))
            .bearer_auth(&self.config.token)
            .header("Notion-Version", NOTION_VERSION)
    }

    pub fn query_database(&self, database_id: &str, body: &Value) -> Result<Vec<RecordRef>> {
        let response = self
            .request(Method::POST, &format!("databases/{database_id}/query"))
            .json(body)
            .send()?;
        let parsed: QueryResponse = http::json(SERVICE, response)?;
        Ok(parsed.results)
    }

    pub fn create_page(&self, body: &Value) -> Result<CreatedPage> {
        let response = self.request(Method::POST, "pages").json(body).send()?;
        http::json(SERVICE, response)
    }

    pub fn update_page(&self, page_id: &str, properties: Value) -> Result<RecordRef> {
        let response = self
            .request(Method::PATCH, &format!("pages/{page_id}"))
            .json(&json!({"properties": properties}))
            .send()?;
        http::json(SERVICE, response)
    }
}

// ---------------------------------------------------------------------------
// NotionDatabase
// ---------------------------------------------------------------------------

/// [`RecordStore`] backed by one Notion database.
#[derive(Debug, Clone)]
pub struct NotionDatabase {
    client: NotionClient,
    database_id: String,
}

impl NotionDatabase {
    pub fn new(client: NotionClient, database_id: impl Into<String>) -> Self {
        Self {
            client,
            database_id: database_id.into(),
        }
    }
}

impl RecordStore for NotionDatabase {
    fn find_by_title(&self, needle: &str) -> Result<Vec<RecordRef>> {
        self.client
            .query_database(&self.database_id, &title_filter(needle))
    }

    fn create(&self, draft: &RecordDraft) -> Result<RecordRef> {
        let page = self
            .client
            .create_page(&create_record_body(&self.database_id, draft))?;
        Ok(RecordRef { id: page.id })
    }

    fn update_status(&self, record_id: &str, status: Status) -> Result<RecordRef> {
        self.client
            .update_page(record_id, status_properties(status))
    }
}
