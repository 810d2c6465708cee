//! revwatch Slack - chat delivery for revwatch
//!
//! Posts review notifications to a Slack incoming webhook.

mod error;
mod webhook;

pub use error::{Error, Result};
pub use webhook::SlackWebhook;
