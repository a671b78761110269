//! Application state shared across handlers.

use std::time::Duration;

use controller::AdmissionController;
use room_core::{Error, FailurePolicy, Result, RoomConfig};
use url::Url;

/// Upstream request timeout.
const ORIGIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the protected origin.
#[derive(Clone)]
pub struct OriginClient {
    /// Origin base URL (e.g., "http://app:3000")
    base_url: Url,
    http_client: reqwest::Client,
}

impl OriginClient {
    /// Creates a client for the origin at `base_url`.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::config(format!("Invalid origin_url '{}': {}", base_url, e)))?;

        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "origin_url must be http or https, got '{}'",
                base_url.scheme()
            )));
        }

        let http_client = reqwest::Client::builder()
            .timeout(ORIGIN_TIMEOUT)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| Error::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            http_client,
        })
    }

    /// Absolute upstream URL for a request path and optional query.
    pub fn target(&self, path_and_query: &str) -> Result<Url> {
        self.base_url
            .join(&format!("./{}", path_and_query.trim_start_matches('/')))
            .map_err(|e| Error::internal(format!("Invalid upstream path: {}", e)))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http_client
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Admission controller over the shared store
    pub controller: AdmissionController,
    /// What to do when the store is unreachable
    pub failure_policy: FailurePolicy,
    /// Protected origin
    pub origin: OriginClient,
}

impl AppState {
    pub fn new(
        controller: AdmissionController,
        failure_policy: FailurePolicy,
        origin: OriginClient,
    ) -> Self {
        Self {
            controller,
            failure_policy,
            origin,
        }
    }

    pub fn room(&self) -> &RoomConfig {
        self.controller.config()
    }
}
