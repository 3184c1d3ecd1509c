//! Daily issue report: window selection, summary prompt and Notion page layout.

use crate::error::Result;
use crate::github::{GitHubClient, GitHubIssue};
use crate::notion::{divider, heading, paragraph, rich_text, NotionClient};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// ReportWindow
// ---------------------------------------------------------------------------

/// One UTC calendar day, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportWindow {
    pub day: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReportWindow {
    pub fn for_day(day: NaiveDate) -> Self {
        let start = Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN));
        let end = start + Duration::days(1) - Duration::microseconds(1);
        Self { day, start, end }
    }

    /// The UTC day before `now`.
    pub fn yesterday(now: DateTime<Utc>) -> Self {
        Self::for_day((now - Duration::days(1)).date_naive())
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t <= self.end
    }

    /// `2026년 10월 18일`
    pub fn korean_date(&self) -> String {
        self.day.format("%Y년 %m월 %d일").to_string()
    }
}

/// Issues created inside the window. Pull requests are dropped.
pub fn select_issues(issues: Vec<GitHubIssue>, window: &ReportWindow) -> Vec<GitHubIssue> {
    issues
        .into_iter()
        .filter(|i| window.contains(i.created_at) && !i.is_pull_request())
        .collect()
}

// ---------------------------------------------------------------------------
// Prompt
// ---------------------------------------------------------------------------

pub fn issue_listing(issues: &[GitHubIssue]) -> String {
    let mut out = String::new();
    for (idx, issue) in issues.iter().enumerate() {
        out.push_str(&format!("{}. #{} - {}\n", idx + 1, issue.number, issue.title));
        out.push_str(&format!("   상태: {}\n", issue.state));
        let labels = issue.label_names();
        if !labels.is_empty() {
            out.push_str(&format!("   태그: {}\n", labels.join(", ")));
        }
        out.push_str(&format!("   링크: {}\n\n", issue.html_url));
    }
    out
}

pub fn build_prompt(window: &ReportWindow, issues: &[GitHubIssue]) -> String {
    format!(
        "다음은 어제({date}) 등록된 GitHub Issue 목록입니다.

{listing}

이 이슈들을 분석하여 다음 형식의 일간 보고서를 작성해주세요:

## 📊 요약
- 총 이슈 수: {count}개
- 주요 카테고리별 분류

## 🔍 주요 이슈
각 이슈를 간단히 요약 (1-2문장)

## 💡 종합 의견
전체적인 진행 상황과 주목할 점

한국어로 작성하고, 전문적이고 간결하게 작성해주세요.",
        date = window.korean_date(),
        listing = issue_listing(issues),
        count = issues.len(),
    )
}

/// Used when the summary model is unavailable.
pub fn fallback_summary(count: usize) -> String {
    format!("총 {count}개의 이슈가 등록되었습니다.")
}

// ---------------------------------------------------------------------------
// Notion page
// ---------------------------------------------------------------------------

pub fn page_title(window: &ReportWindow) -> String {
    format!("{} 개발 일간 보고", window.korean_date())
}

pub fn page_blocks(summary: &str, issues: &[GitHubIssue]) -> Vec<Value> {
    let mut blocks = vec![
        heading(2, vec![rich_text("AI 요약")]),
        paragraph(summary),
        divider(),
        heading(2, vec![rich_text("상세 이슈 목록")]),
    ];
    for issue in issues {
        let mut title = rich_text(&format!("#{} {}", issue.number, issue.title));
        title["annotations"] = json!({"bold": true});
        blocks.push(heading(3, vec![title]));

        let mut link = rich_text("링크");
        link["text"]["link"] = json!({"url": issue.html_url});
        blocks.push(json!({
            "object": "block",
            "type": "paragraph",
            "paragraph": {
                "rich_text": [rich_text(&format!("상태: {} | ", issue.state)), link]
            }
        }));
    }
    blocks
}

pub fn page_body(parent_page_id: &str, title: &str, blocks: Vec<Value>) -> Value {
    json!({
        "parent": {"page_id": parent_page_id},
        "properties": {
            "title": {"title": [{"text": {"content": title}}]}
        },
        "children": blocks
    })
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Produces the report summary text.
pub trait Summarizer {
    /// `None` makes the report fall back to [`fallback_summary`]. Implementations
    /// log their own failure reason.
    fn summarize(&self, prompt: &str) -> Option<String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReportOutcome {
    NoIssues {
        day: NaiveDate,
    },
    Created {
        day: NaiveDate,
        issues: Vec<u64>,
        page_url: Option<String>,
        ai_summary: bool,
    },
}

/// Collect the window's issues, summarize them and file the report page.
///
/// GitHub and Notion failures are returned. A summary failure is not: the
/// page is still created with the fallback sentence.
pub fn run_report(
    github: &GitHubClient,
    summarizer: &impl Summarizer,
    notion: &NotionClient,
    parent_page_id: &str,
    window: &ReportWindow,
) -> Result<ReportOutcome> {
    tracing::info!(start = %window.start, end = %window.end, "collecting issues");
    let issues = select_issues(github.list_issues_since(window.start)?, window);
    tracing::info!(count = issues.len(), "found issues for the report day");

    if issues.is_empty() {
        return Ok(ReportOutcome::NoIssues { day: window.day });
    }

    let (summary, ai_summary) = match summarizer.summarize(&build_prompt(window, &issues)) {
        Some(text) => (text, true),
        None => (fallback_summary(issues.len()), false),
    };

    let body = page_body(
        parent_page_id,
        &page_title(window),
        page_blocks(&summary, &issues),
    );
    let page = notion.create_page(&body)?;
    tracing::info!(page_id = %page.id, "daily report created");

    Ok(ReportOutcome::Created {
        day: window.day,
        issues: issues.iter().map(|i| i.number).collect(),
        page_url: page.url,
        ai_summary,
    })
}
