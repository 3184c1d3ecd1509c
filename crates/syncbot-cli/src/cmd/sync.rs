use crate::cmd::{settings, EventSource};
use crate::output::print_json;
use anyhow::Context;
use syncbot_core::config::SyncConfig;
use syncbot_core::notion::{NotionClient, NotionDatabase};
use syncbot_core::reconcile::{DatabaseResult, DeliveryResult, Reconciler, SyncOutcome};
use syncbot_core::slack::SlackWebhook;

/// Leg failures are reported in the outcome, not as an error exit.
pub fn run(source: &EventSource, repository: Option<&str>, json: bool) -> anyhow::Result<()> {
    let config =
        SyncConfig::from_lookup(settings(repository)).context("invalid sync configuration")?;
    let event = source.load()?;

    let notion = NotionClient::new(config.notion, config.timeout)?;
    let store = NotionDatabase::new(notion, config.database_id);
    let chat = SlackWebhook::new(config.slack_webhook_url, config.timeout)?;

    let outcome = Reconciler::new(store, chat, config.repository).reconcile(&event);

    if json {
        return print_json(&outcome);
    }
    match &outcome {
        SyncOutcome::NotApplicable => {
            println!("Not an issue or pull request event, nothing to sync.");
        }
        SyncOutcome::Completed(report) => {
            println!(
                "{} #{} {}: {}",
                report.kind,
                report.number,
                report.action,
                report.status().as_str()
            );
            let record = match &report.database {
                DatabaseResult::Created { record } => format!("created {}", record.browse_url()),
                DatabaseResult::Updated { record } => format!("updated {}", record.browse_url()),
                DatabaseResult::Failed { reason } => format!("failed: {reason}"),
            };
            println!("  notion: {record}");
            let slack = match &report.notification {
                DeliveryResult::Delivered => "delivered".to_string(),
                DeliveryResult::Failed { reason } => format!("failed: {reason}"),
            };
            println!("  slack:  {slack}");
            let failed: Vec<&str> = report.failed_legs().iter().map(|l| l.as_str()).collect();
            if !failed.is_empty() {
                println!("  failed legs: {}", failed.join(", "));
            }
        }
    }
    Ok(())
}
