//! One-shot review check and the runner shared by the long-running modes

use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use revwatch_core::{
    AppStore, CheckReport, Config, Notifier, ReviewChecker, ReviewSource, Secrets,
};
use revwatch_db::Database;
use revwatch_play::PlayClient;
use revwatch_slack::SlackWebhook;
use tokio::sync::Mutex;
use tracing::{error, info};

/// Run one review check pass
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Print the pass report as JSON
    #[arg(long)]
    pub json: bool,
}

impl CheckArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let db = Database::open(config.database.path.as_deref()).await?;
        let runner = CheckRunner::from_config(config, &db).await?;

        let report = runner.run().await?;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_report(&report);
        }

        db.close().await;
        Ok(())
    }
}

/// Runs check passes one at a time
///
/// The scheduled loop and the HTTP trigger share one runner, so two passes
/// never deliver the same comments concurrently.
pub struct CheckRunner {
    checker: ReviewChecker,
    lock: Mutex<()>,
}

impl CheckRunner {
    pub fn new(checker: ReviewChecker) -> Self {
        Self {
            checker,
            lock: Mutex::new(()),
        }
    }

    pub fn with_parts(
        store: Arc<dyn AppStore>,
        source: Arc<dyn ReviewSource>,
        notifier: Arc<dyn Notifier>,
        config: &Config,
    ) -> Self {
        Self::new(ReviewChecker::new(
            store,
            source,
            notifier,
            config.check_settings(),
        ))
    }

    /// Wire the Play API, the Slack webhook and the watermark store
    pub async fn from_config(config: &Config, db: &Database) -> anyhow::Result<Self> {
        let secrets = Secrets::load()?;

        let notifier = SlackWebhook::from_secrets(&secrets)?;
        let source = PlayClient::new(secrets.service_account())
            .await
            .context("Failed to create Play Developer API client")?
            .with_base_url(&config.play.base_url)?;

        Ok(Self::with_parts(
            Arc::new(db.apps()),
            Arc::new(source),
            Arc::new(notifier),
            config,
        ))
    }

    /// Run a pass, waiting for any pass already in progress
    pub async fn run(&self) -> revwatch_core::Result<CheckReport> {
        let _guard = self.lock.lock().await;
        let started = chrono::Utc::now();

        match self.checker.run().await {
            Ok(report) => {
                let elapsed = chrono::Utc::now() - started;
                info!(
                    delivered = report.delivered(),
                    elapsed_ms = elapsed.num_milliseconds(),
                    "Pass finished"
                );
                Ok(report)
            }
            Err(e) => {
                error!(error = %e, "Pass failed");
                Err(e)
            }
        }
    }
}

pub fn print_report(report: &CheckReport) {
    println!("Review check complete");
    println!("=====================");

    if !report.invalid.is_empty() {
        println!("Invalid apps (no package name): {}", report.invalid.join(", "));
    }
    if !report.ignored.is_empty() {
        println!("Ignored apps: {}", report.ignored.join(", "));
    }
    for failed in &report.failed {
        println!("Fetch failed for {}: {}", failed.app_id, failed.reason);
    }

    for app in &report.apps {
        let watermark = match app.watermark {
            Some(ts) => revwatch_core::model::format_date(ts),
            None => "unchanged".to_string(),
        };
        println!(
            "  {}: {} reviews, {} new comments, {} delivered, {} failed, watermark {}",
            app.app_id,
            app.reviews,
            app.new_comments,
            app.delivered,
            app.failed_deliveries,
            watermark
        );
    }

    println!();
    println!("Delivered {} messages", report.delivered());
}
