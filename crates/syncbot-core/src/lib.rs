//! GitHub event reconciliation into a Notion database and Slack.
//!
//! The crate is synchronous: one event in, at most one record write and one
//! chat message out. Network edges sit behind [`notion::RecordStore`] and
//! [`slack::ChatSink`] so the decision logic runs without a network.

pub mod config;
pub mod error;
pub mod event;
pub mod github;
pub mod http;
pub mod notify;
pub mod notion;
pub mod reconcile;
pub mod report;
pub mod slack;
pub mod text;
pub mod types;

pub use error::{ConfigError, Result, SyncError};
