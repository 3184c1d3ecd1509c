use crate::cmd::settings;
use crate::output::{print_json, print_table};
use anyhow::Context;
use chrono::{NaiveDate, Utc};
use gemini_agent::GenerateOptions;
use syncbot_core::config::{GeminiConfig, ReportConfig};
use syncbot_core::github::GitHubClient;
use syncbot_core::notion::NotionClient;
use syncbot_core::report::{run_report, ReportOutcome, ReportWindow, Summarizer};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Gemini summarizer
// ---------------------------------------------------------------------------

struct GeminiSummarizer {
    opts: GenerateOptions,
}

impl GeminiSummarizer {
    fn new(config: GeminiConfig, timeout: Duration) -> Self {
        Self {
            opts: GenerateOptions {
                api_key: config.api_key,
                api_url: config.api_url,
                model: config.model,
                timeout,
            },
        }
    }
}

impl Summarizer for GeminiSummarizer {
    fn summarize(&self, prompt: &str) -> Option<String> {
        match gemini_agent::generate(prompt, self.opts.clone()) {
            Ok(text) => {
                tracing::info!("Gemini summary generated");
                Some(text)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Gemini summary failed, using fallback");
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(date: Option<NaiveDate>, repository: Option<&str>, json: bool) -> anyhow::Result<()> {
    let config = ReportConfig::from_lookup(settings(repository))
        .context("invalid report configuration")?;
    let window = match date {
        Some(day) => ReportWindow::for_day(day),
        None => ReportWindow::yesterday(Utc::now()),
    };

    let github = GitHubClient::new(config.github, config.timeout)?;
    let notion = NotionClient::new(config.notion, config.timeout)?;
    let summarizer = GeminiSummarizer::new(config.gemini, config.timeout);

    let outcome = run_report(
        &github,
        &summarizer,
        &notion,
        &config.report_page_id,
        &window,
    )
    .context("daily report failed")?;

    if json {
        return print_json(&outcome);
    }
    match outcome {
        ReportOutcome::NoIssues { day } => println!("No issues to report for {day}"),
        ReportOutcome::Created {
            day,
            issues,
            page_url,
            ai_summary,
        } => {
            let rows = issues.iter().map(|n| vec![format!("#{n}")]).collect();
            print_table(&["ISSUE"], rows);
            let summary = if ai_summary { "ai" } else { "fallback" };
            println!(
                "Report for {day} created ({summary} summary): {}",
                page_url.as_deref().unwrap_or("(no url)")
            );
        }
    }
    Ok(())
}
