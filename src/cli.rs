///
/// This module implements the CLI interface for gradwatch: argument parsing and
/// wiring of the concrete clients into the core pipelines.
///
/// All parsing, filtering and deduplication lives in [`gradwatch-core`]. This
/// module only constructs the GitHub, Notion and webhook clients from
/// [`Settings`] and invokes the flows.
///
/// - `gradwatch`: publish new regional postings, then refresh stored ages.
/// - `gradwatch --update-ages`: refresh stored ages only.
///
/// [`gradwatch-core`]: ../../gradwatch-core/
/// [`Settings`]: crate::load_config::Settings
use crate::github::GithubReadme;
use crate::load_config::load_config;
use crate::notion::NotionStore;
use crate::slack::select_notifier;
use anyhow::{anyhow, Context, Result};
use clap::Parser;
use gradwatch_core::pipeline::{publish, refresh_ages};

/// Harvest new-grad postings for one region into Notion, with Slack alerts.
#[derive(Parser, Debug)]
#[clap(
    name = "gradwatch",
    version,
    about = "Publish new-grad job postings for one region from a GitHub README to Notion"
)]
pub struct Cli {
    /// Only re-synchronise the Age field of records already in Notion
    #[clap(long)]
    pub update_ages: bool,
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!(update_ages = cli.update_ages, "trace_initialised");

    let settings = load_config()?;
    settings.harvest.trace_loaded();
    let harvest = &settings.harvest;

    let source = GithubReadme::new(&settings.github)
        .map_err(|e| anyhow!("Failed to construct GitHub client: {e}"))?;
    let store = NotionStore::new(&settings.notion)
        .map_err(|e| anyhow!("Failed to construct Notion client: {e}"))?;

    if !cli.update_ages {
        let notifier = select_notifier(settings.slack_webhook_url.as_deref())
            .map_err(|e| anyhow!("Failed to construct notifier: {e}"))?;
        println!("Publishing new {} postings...", harvest.region_label);
        let report = publish(&source, &store, notifier.as_ref(), harvest)
            .await
            .context("Publish flow failed")?;
        tracing::info!(?report, "Publish complete");
        println!("{}", report.summary(&harvest.region_label));
    }

    println!("Refreshing posting ages...");
    let report = refresh_ages(&source, &store, harvest)
        .await
        .context("Age refresh failed")?;
    tracing::info!(?report, "Age refresh complete");
    println!("{}", report.summary());

    if report.errors > 0 {
        anyhow::bail!("{} age update(s) failed", report.errors);
    }
    Ok(())
}
