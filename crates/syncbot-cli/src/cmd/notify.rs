use crate::cmd::{settings, EventSource};
use crate::output::print_json;
use anyhow::Context;
use syncbot_core::config::NotifyConfig;
use syncbot_core::notify::{notify, NotifyOutcome};
use syncbot_core::slack::SlackWebhook;

pub fn run(source: &EventSource, repository: Option<&str>, json: bool) -> anyhow::Result<()> {
    let config =
        NotifyConfig::from_lookup(settings(repository)).context("invalid notify configuration")?;
    let event = source.load()?;

    let chat = SlackWebhook::new(config.slack_webhook_url, config.timeout)?;
    let outcome =
        notify(&chat, &event, &config.mentions).context("failed to send Slack notification")?;

    if json {
        return print_json(&outcome);
    }
    match outcome {
        NotifyOutcome::NotApplicable => {
            println!("Not an issue or pull request event, nothing to notify.")
        }
        NotifyOutcome::Sent { number, mentions } => {
            println!("Sent notification for #{number} in {} ({mentions} mentioned)", config.repository)
        }
    }
    Ok(())
}
