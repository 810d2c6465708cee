//! The review check pass
//!
//! One pass:
//! 1. Reads every tracked app and splits them into invalid, ignored and eligible
//! 2. Fetches the latest reviews of all eligible apps concurrently; a failed
//!    fetch only affects its own app
//! 3. Walks each fetched app sequentially, oldest review first, and delivers
//!    every comment newer than the app's watermark through the throttle
//! 4. Raises the app's watermark to the newest delivered comment

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::backend::{AppStore, Notifier, ReviewSource};
use crate::message::{LinkContext, Message};
use crate::model::{Review, TrackedApp};
use crate::throttle::Throttle;
use crate::Result;

/// Upstream page-size ceiling for review listing
pub const MAX_RESULTS: u32 = 100;

/// Default spacing between two deliveries
pub const DELIVERY_INTERVAL: Duration = Duration::from_secs(1);

/// Tunables of a check pass
#[derive(Debug, Clone)]
pub struct CheckSettings {
    /// Reviews requested per app
    pub max_results: u32,
    /// Minimum spacing between two notifier calls
    pub delivery_interval: Duration,
    /// Console identifiers for settings links
    pub links: LinkContext,
}

impl Default for CheckSettings {
    fn default() -> Self {
        Self {
            max_results: MAX_RESULTS,
            delivery_interval: DELIVERY_INTERVAL,
            links: LinkContext::default(),
        }
    }
}

/// Tracked apps split by eligibility
#[derive(Debug, Clone, Default)]
pub struct Partition {
    /// Apps without a package name
    pub invalid: Vec<TrackedApp>,
    /// Valid apps flagged as ignored
    pub ignored: Vec<TrackedApp>,
    /// Valid apps that are not ignored
    pub eligible: Vec<TrackedApp>,
}

impl Partition {
    pub fn classify(apps: Vec<TrackedApp>) -> Self {
        let mut partition = Self::default();
        for app in apps {
            if app.is_invalid() {
                partition.invalid.push(app);
            } else if app.is_eligible() {
                partition.eligible.push(app);
            } else {
                partition.ignored.push(app);
            }
        }
        partition
    }
}

/// Result of fetching one app's reviews
#[derive(Debug)]
pub enum FetchOutcome {
    Fetched { app: TrackedApp, reviews: Vec<Review> },
    Failed { app: TrackedApp, reason: String },
}

/// A fetch that failed during a pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedFetch {
    pub app_id: String,
    pub reason: String,
}

/// What happened to one fetched app during a pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppReport {
    pub app_id: String,
    /// Reviews returned by the source
    pub reviews: usize,
    /// Comments newer than the watermark
    pub new_comments: usize,
    /// Comments accepted by the notifier
    pub delivered: usize,
    /// Comments the notifier rejected
    pub failed_deliveries: usize,
    /// Comment slots with neither a user nor a developer comment
    pub malformed: usize,
    /// Watermark before the pass
    pub previous_watermark: Option<i64>,
    /// Watermark written by this pass, if it moved
    pub watermark: Option<i64>,
}

/// Summary of a whole pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub invalid: Vec<String>,
    pub ignored: Vec<String>,
    pub failed: Vec<FailedFetch>,
    pub apps: Vec<AppReport>,
}

impl CheckReport {
    /// Total messages delivered in the pass
    pub fn delivered(&self) -> usize {
        self.apps.iter().map(|a| a.delivered).sum()
    }
}

/// Runs review check passes against injected collaborators
pub struct ReviewChecker {
    store: Arc<dyn AppStore>,
    source: Arc<dyn ReviewSource>,
    notifier: Arc<dyn Notifier>,
    throttle: Throttle,
    settings: CheckSettings,
}

impl ReviewChecker {
    pub fn new(
        store: Arc<dyn AppStore>,
        source: Arc<dyn ReviewSource>,
        notifier: Arc<dyn Notifier>,
        settings: CheckSettings,
    ) -> Self {
        Self {
            store,
            source,
            notifier,
            throttle: Throttle::new(settings.delivery_interval),
            settings,
        }
    }

    /// Run one pass over every tracked app.
    ///
    /// Fetch and delivery failures are reported, not returned. Only failing
    /// to read the apps or to persist a watermark ends the pass with an error.
    pub async fn run(&self) -> Result<CheckReport> {
        let apps = self.store.list_apps().await?;
        let partition = Partition::classify(apps);

        let mut report = CheckReport {
            invalid: ids(&partition.invalid),
            ignored: ids(&partition.ignored),
            ..Default::default()
        };

        if !report.invalid.is_empty() {
            info!(count = report.invalid.len(), apps = ?report.invalid, "Skipping invalid apps");
        }
        if !report.ignored.is_empty() {
            info!(count = report.ignored.len(), apps = ?report.ignored, "Skipping ignored apps");
        }
        info!(
            count = partition.eligible.len(),
            apps = ?ids(&partition.eligible),
            "Checking eligible apps"
        );

        let mut fetched = Vec::new();
        for outcome in self.fetch_all(partition.eligible).await {
            match outcome {
                FetchOutcome::Fetched { app, reviews } => fetched.push((app, reviews)),
                FetchOutcome::Failed { app, reason } => report.failed.push(FailedFetch {
                    app_id: app.id,
                    reason,
                }),
            }
        }

        if !report.failed.is_empty() {
            warn!(count = report.failed.len(), failures = ?report.failed, "Review requests failed");
        }

        let review_count: usize = fetched.iter().map(|(_, r)| r.len()).sum();
        let comment_count: usize = fetched
            .iter()
            .flat_map(|(_, r)| r.iter())
            .map(|r| r.comments.len())
            .sum();
        info!(reviews = review_count, comments = comment_count, "Fetched reviews");

        for (app, reviews) in fetched {
            let app_report = self.process_app(&app, &reviews).await?;
            report.apps.push(app_report);
        }

        info!(
            delivered = report.delivered(),
            failed_fetches = report.failed.len(),
            "Review check complete"
        );

        Ok(report)
    }

    /// Fetch reviews for every app concurrently and wait for all of them
    pub async fn fetch_all(&self, apps: Vec<TrackedApp>) -> Vec<FetchOutcome> {
        let max_results = self.settings.max_results;
        let requests = apps.into_iter().map(|app| async move {
            debug!(app_id = %app.id, package = %app.package(), "Requesting reviews");
            match self.source.list_reviews(app.package(), max_results).await {
                Ok(reviews) => FetchOutcome::Fetched { app, reviews },
                Err(e) => FetchOutcome::Failed {
                    app,
                    reason: e.to_string(),
                },
            }
        });

        join_all(requests).await
    }

    async fn process_app(&self, app: &TrackedApp, reviews: &[Review]) -> Result<AppReport> {
        let mut report = AppReport {
            app_id: app.id.clone(),
            reviews: reviews.len(),
            previous_watermark: app.watermark,
            ..Default::default()
        };

        let mut delivered = Vec::new();
        let mut earliest_failure: Option<i64> = None;

        // The source lists newest first
        for review in reviews.iter().rev() {
            for slot in &review.comments {
                let Some(comment) = slot.comment() else {
                    error!(app_id = %app.id, review_id = %review.review_id, "Unexpected comment type");
                    report.malformed += 1;
                    continue;
                };

                let Some(timestamp) = comment.timestamp() else {
                    let last_modified = comment.last_modified();
                    error!(
                        app_id = %app.id,
                        review_id = %review.review_id,
                        seconds = last_modified.seconds,
                        nanos = last_modified.nanos,
                        "Comment timestamp out of range"
                    );
                    report.malformed += 1;
                    continue;
                };

                if !app.is_newer(timestamp) {
                    continue;
                }
                report.new_comments += 1;

                let message = Message::for_comment(app, review, comment, &self.settings.links);

                self.throttle.acquire().await;
                debug!(
                    app_id = %app.id,
                    review_id = %review.review_id,
                    kind = comment.kind(),
                    timestamp,
                    "Sending message"
                );

                match self.notifier.send(&message).await {
                    Ok(()) => {
                        delivered.push(timestamp);
                        report.delivered += 1;
                    }
                    Err(e) => {
                        error!(
                            app_id = %app.id,
                            review_id = %review.review_id,
                            timestamp,
                            error = %e,
                            "Failed to deliver message"
                        );
                        report.failed_deliveries += 1;
                        earliest_failure = Some(earliest_failure.map_or(timestamp, |t| t.min(timestamp)));
                    }
                }
            }
        }

        if let Some(watermark) = next_watermark(app.watermark, &delivered, earliest_failure) {
            if self.store.advance_watermark(&app.id, watermark).await? {
                info!(app_id = %app.id, previous = ?app.watermark, watermark, "Advanced watermark");
                report.watermark = Some(watermark);
            } else {
                warn!(app_id = %app.id, watermark, "Stored watermark already at or past new value");
            }
        }

        Ok(report)
    }
}

/// Watermark to persist after delivering `delivered`, if it should move.
///
/// Timestamps at or after the earliest failed delivery are not counted, so
/// the failed comment is still newer than the watermark on the next pass.
/// A pass can therefore deliver comments and leave the watermark where it
/// was; those comments are delivered again next pass. Taking the plain
/// maximum would lose the failed comment for good.
pub fn next_watermark(
    current: Option<i64>,
    delivered: &[i64],
    earliest_failure: Option<i64>,
) -> Option<i64> {
    let candidate = delivered
        .iter()
        .copied()
        .filter(|ts| earliest_failure.map_or(true, |failure| *ts < failure))
        .max()?;

    match current {
        Some(current) if candidate <= current => None,
        _ => Some(candidate),
    }
}

fn ids(apps: &[TrackedApp]) -> Vec<String> {
    apps.iter().map(|a| a.id.clone()).collect()
}
