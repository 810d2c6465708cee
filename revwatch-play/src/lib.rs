//! revwatch Play - Google Play Developer API integration for revwatch
//!
//! This crate lists the reviews of an app through the `reviews.list`
//! endpoint and exposes them as a [`revwatch_core::ReviewSource`].

mod client;
mod error;
mod reviews;

pub use client::{PlayClient, ANDROID_PUBLISHER_SCOPE};
pub use error::{Error, Result};
pub use reviews::ReviewsListResponse;
