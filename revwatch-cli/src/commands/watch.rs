//! Scheduled review checks

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use revwatch_core::config::parse_duration;
use revwatch_core::Config;
use revwatch_db::Database;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use super::check::{print_report, CheckRunner};

const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Run review checks on a fixed schedule
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Time between passes (overrides config and env, e.g. `15m`)
    #[arg(short, long, value_parser = parse_duration)]
    pub interval: Option<Duration>,

    /// Print a report after every pass
    #[arg(long)]
    pub report: bool,
}

impl WatchArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let db = Database::open(config.database.path.as_deref()).await?;
        let runner = Arc::new(CheckRunner::from_config(config, &db).await?);

        info!(interval = ?config.check.interval, "Watching for new reviews");

        tokio::select! {
            _ = schedule(runner, config.check.interval, self.report) => {}
            result = tokio::signal::ctrl_c() => {
                result?;
                info!("Interrupted, stopping");
            }
        }

        db.close().await;
        Ok(())
    }
}

/// Run a pass immediately and then once per `interval`, forever.
///
/// A failed pass is logged and the schedule continues.
pub async fn schedule(runner: Arc<CheckRunner>, interval: Duration, print: bool) {
    let mut ticker = tokio::time::interval(interval.max(MIN_INTERVAL));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match runner.run().await {
            Ok(report) if print => print_report(&report),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Scheduled pass failed, retrying next tick"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::check::tests::{runner, Counter};
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_schedule_runs_immediately() {
        let db = Database::in_memory().await.unwrap();
        let notifier = Arc::new(Counter::default());
        let runner = Arc::new(runner(&db, notifier.clone()).await);

        let task = tokio::spawn(schedule(runner, Duration::from_secs(3600), false));
        for _ in 0..100 {
            if notifier.0.load(Ordering::SeqCst) > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        task.abort();

        assert_eq!(notifier.0.load(Ordering::SeqCst), 1);
    }
}
