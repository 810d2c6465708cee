//! revwatch core - store review polling and chat notification
//!
//! This crate holds the review-check pass: it reads the tracked apps,
//! fetches their latest reviews, delivers every comment newer than the
//! app's watermark and then advances the watermark.

pub mod backend;
pub mod blocks;
pub mod check;
pub mod config;
pub mod error;
pub mod links;
pub mod message;
pub mod model;
pub mod secrets;
pub mod throttle;

pub use backend::{AppStore, Notifier, ReviewSource};
pub use check::{
    AppReport, CheckReport, CheckSettings, FailedFetch, FetchOutcome, Partition, ReviewChecker,
};
pub use config::Config;
pub use error::{Error, Result};
pub use message::{LinkContext, Message};
pub use model::{
    AppDocument, Comment, DeveloperComment, DeviceMetadata, LastModified, Review, ReviewComment,
    TrackedApp, UserComment,
};
pub use secrets::{Secrets, ServiceAccountKey};
pub use throttle::Throttle;
