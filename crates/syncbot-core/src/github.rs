//! Minimal GitHub REST client for the daily report.

use crate::config::GitHubConfig;
use crate::error::Result;
use crate::http;
use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SERVICE: &str = "GitHub";
const PER_PAGE: &str = "100";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueLabel {
    pub name: String,
}

/// An entry of `GET /repos/{repo}/issues`. Pull requests are listed there too
/// and carry a `pull_request` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitHubIssue {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub html_url: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub labels: Vec<IssueLabel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<serde_json::Value>,
}

impl GitHubIssue {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }

    pub fn label_names(&self) -> Vec<String> {
        self.labels.iter().map(|l| l.name.clone()).collect()
    }
}

#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    config: GitHubConfig,
}

impl GitHubClient {
    pub fn new(config: GitHubConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http::client(timeout)?,
            config,
        })
    }

    /// One page (up to 100) of issues and pull requests in any state updated
    /// since `since`.
    pub fn list_issues_since(&self, since: DateTime<Utc>) -> Result<Vec<GitHubIssue>> {
        let url = format!(
            "{}/repos/{}/issues",
            self.config.api_url, self.config.repository
        );
        let since = since.format("%Y-%m-%dT%H:%M:%SZ").to_string();
        tracing::debug!(%url, %since, "listing issues");
        let response = self
            .client
            .get(url)
            .header("Authorization", format!("token {}", self.config.token))
            .header("Accept", "application/vnd.github.v3+json")
            .query(&[("state", "all"), ("since", since.as_str()), ("per_page", PER_PAGE)])
            .send()?;
        http::json(SERVICE, response)
    }
}
