//! Review listing (`reviews.list`)

use async_trait::async_trait;
use revwatch_core::{Review, ReviewSource};
use serde::Deserialize;
use tracing::debug;

use crate::{Error, PlayClient, Result};

/// Body of a `reviews.list` response
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReviewsListResponse {
    /// Absent when the app has no reviews in the window the API keeps
    pub reviews: Vec<Review>,
    pub token_pagination: Option<TokenPagination>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TokenPagination {
    pub next_page_token: Option<String>,
}

/// Google API error envelope
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl PlayClient {
    /// Fetch the first page of reviews for a package, newest first
    pub async fn list_reviews(&self, package_name: &str, max_results: u32) -> Result<ReviewsListResponse> {
        debug!(package = %package_name, max_results, "Listing reviews");

        let url = self.reviews_url(package_name)?;
        let token = self.access_token().await?;

        let response = self
            .http()
            .get(url)
            .bearer_auth(token)
            .query(&[("maxResults", max_results)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response".to_string());
            return Err(Error::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let body = response.text().await?;
        let list: ReviewsListResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Parse(format!("Failed to parse reviews response: {}", e)))?;

        debug!(
            package = %package_name,
            reviews = list.reviews.len(),
            has_more = list.token_pagination.as_ref().is_some_and(|p| p.next_page_token.is_some()),
            "Listed reviews"
        );

        Ok(list)
    }
}

/// Message of a Google error envelope, or the raw body
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => match envelope.error.status {
            Some(status) => format!("{}: {}", status, envelope.error.message),
            None => envelope.error.message,
        },
        Err(_) => body.trim().to_string(),
    }
}

#[async_trait]
impl ReviewSource for PlayClient {
    async fn list_reviews(&self, package_name: &str, max_results: u32) -> revwatch_core::Result<Vec<Review>> {
        let list = PlayClient::list_reviews(self, package_name, max_results).await?;
        Ok(list.reviews)
    }
}
