//! Play Developer API client authenticated with gcp_auth

use std::sync::Arc;
use std::time::Duration;

use gcp_auth::{CustomServiceAccount, TokenProvider};
use revwatch_core::ServiceAccountKey;
use tracing::{debug, info};
use url::Url;

use crate::{Error, Result};

/// OAuth scope of the Play Developer API
pub const ANDROID_PUBLISHER_SCOPE: &str = "https://www.googleapis.com/auth/androidpublisher";

const DEFAULT_BASE_URL: &str = "https://androidpublisher.googleapis.com";

enum Credentials {
    Provider(Arc<dyn TokenProvider>),
    Static(String),
}

/// Play Developer API client for review listing
pub struct PlayClient {
    http: reqwest::Client,
    credentials: Credentials,
    base_url: Url,
}

impl PlayClient {
    /// Create a client from a service account key.
    ///
    /// Without a key, credentials are discovered from the environment
    /// (`GOOGLE_APPLICATION_CREDENTIALS`, gcloud, or the metadata server).
    pub async fn new(key: Option<ServiceAccountKey>) -> Result<Self> {
        let provider: Arc<dyn TokenProvider> = match key {
            Some(ServiceAccountKey::Json(json)) => {
                debug!("Loading service account from inline JSON");
                Arc::new(CustomServiceAccount::from_json(&json)?)
            }
            Some(ServiceAccountKey::File(path)) => {
                debug!(path = %path.display(), "Loading service account key file");
                Arc::new(CustomServiceAccount::from_file(&path)?)
            }
            None => {
                debug!("Discovering Google credentials from the environment");
                gcp_auth::provider().await?
            }
        };

        let client = Self::with_provider(provider)?;
        info!("Created Play Developer API client");
        Ok(client)
    }

    /// Create a client that takes tokens from an existing provider
    pub fn with_provider(provider: Arc<dyn TokenProvider>) -> Result<Self> {
        Self::build(Credentials::Provider(provider))
    }

    /// Create a client that sends a fixed bearer token
    pub fn with_static_token(token: impl Into<String>) -> Result<Self> {
        Self::build(Credentials::Static(token.into()))
    }

    fn build(credentials: Credentials) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("revwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = Url::parse(DEFAULT_BASE_URL).map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self {
            http,
            credentials,
            base_url,
        })
    }

    /// Point the client at another API host
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        let url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("Invalid base URL '{}': {}", base_url, e)))?;
        if url.cannot_be_a_base() {
            return Err(Error::Config(format!("Invalid base URL '{}'", base_url)));
        }
        self.base_url = url;
        Ok(self)
    }

    /// Get the API base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Bearer token for the Play Developer API scope
    pub(crate) async fn access_token(&self) -> Result<String> {
        match &self.credentials {
            Credentials::Provider(provider) => {
                let token = provider.token(&[ANDROID_PUBLISHER_SCOPE]).await?;
                Ok(token.as_str().to_string())
            }
            Credentials::Static(token) => Ok(token.clone()),
        }
    }

    /// `.../androidpublisher/v3/applications/{package}/reviews`
    pub(crate) fn reviews_url(&self, package_name: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config("Base URL cannot hold a path".to_string()))?
            .pop_if_empty()
            .extend(["androidpublisher", "v3", "applications", package_name, "reviews"]);
        Ok(url)
    }
}

impl std::fmt::Debug for PlayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let credentials = match self.credentials {
            Credentials::Provider(_) => "<TokenProvider>",
            Credentials::Static(_) => "<static token>",
        };
        f.debug_struct("PlayClient")
            .field("base_url", &self.base_url.as_str())
            .field("credentials", &credentials)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reviews_url() {
        let client = PlayClient::with_static_token("t").unwrap();
        assert_eq!(
            client.reviews_url("com.example.app").unwrap().as_str(),
            "https://androidpublisher.googleapis.com/androidpublisher/v3/applications/com.example.app/reviews"
        );
    }

    #[test]
    fn test_reviews_url_with_base_path() {
        let client = PlayClient::with_static_token("t")
            .unwrap()
            .with_base_url("http://127.0.0.1:9000/proxy/")
            .unwrap();
        assert_eq!(
            client.reviews_url("com.example").unwrap().as_str(),
            "http://127.0.0.1:9000/proxy/androidpublisher/v3/applications/com.example/reviews"
        );
    }

    #[test]
    fn test_package_name_is_escaped() {
        let client = PlayClient::with_static_token("t").unwrap();
        let url = client.reviews_url("a/b").unwrap();
        assert!(url.path().contains("/applications/a%2Fb/reviews"));
    }

    #[test]
    fn test_invalid_base_url() {
        let client = PlayClient::with_static_token("t").unwrap();
        assert!(client.with_base_url("not a url").is_err());
    }

    #[test]
    fn test_debug_hides_token() {
        let client = PlayClient::with_static_token("secret-token").unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("secret-token"));
    }
}
