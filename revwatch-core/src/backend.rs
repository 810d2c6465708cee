//! Collaborators of the review check: where apps live, where reviews come
//! from and where notifications go

use async_trait::async_trait;

use crate::message::Message;
use crate::model::{Review, TrackedApp};
use crate::Result;

/// Store of tracked app documents and their watermarks
#[async_trait]
pub trait AppStore: Send + Sync {
    /// Read every tracked app
    async fn list_apps(&self) -> Result<Vec<TrackedApp>>;

    /// Raise the watermark of an app to `watermark`.
    ///
    /// Returns `false` without writing when the stored watermark is already
    /// equal or higher, so concurrent passes can never move it backwards.
    async fn advance_watermark(&self, app_id: &str, watermark: i64) -> Result<bool>;
}

/// Paginated source of reviews for one app at a time
#[async_trait]
pub trait ReviewSource: Send + Sync {
    /// Fetch the first page of up to `max_results` reviews, newest first
    async fn list_reviews(&self, package_name: &str, max_results: u32) -> Result<Vec<Review>>;
}

/// Message delivery sink
///
/// Implementations do not throttle; callers space out their calls.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &Message) -> Result<()>;
}
