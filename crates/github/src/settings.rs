//! Connection settings for the GitHub adapter.

use std::time::Duration;

use labels::RepositoryId;
use thiserror::Error;

/// Public GitHub REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// REST API version requested on every call.
pub const API_VERSION: &str = "2022-11-28";

const DEFAULT_USER_AGENT: &str = concat!("ghlabels/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything needed to talk to one repository.
#[derive(Clone)]
pub struct GithubSettings {
    /// Base URL of the REST API (GitHub Enterprise uses `https://host/api/v3`).
    pub api_url: String,
    /// Personal access token or installation token.
    pub token: String,
    /// Repository whose labels are managed.
    pub repository: RepositoryId,
    /// `User-Agent` header; GitHub rejects requests without one.
    pub user_agent: String,
    /// Per-request timeout enforced by the HTTP client.
    pub timeout: Duration,
}

impl GithubSettings {
    /// Settings for the public API with the default user agent and timeout.
    pub fn new(repository: RepositoryId, token: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: token.into(),
            repository,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Overrides the API base URL.
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Overrides the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// The token must never reach logs.
impl std::fmt::Debug for GithubSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubSettings")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .field("repository", &self.repository)
            .field("user_agent", &self.user_agent)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Errors raised while constructing a [`crate::GithubLabelDirectory`].
#[derive(Debug, Error)]
pub enum GithubSetupError {
    /// The API base URL could not be used as a base for request paths.
    #[error("invalid GitHub API URL '{url}': {reason}")]
    InvalidApiUrl {
        /// The rejected URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The HTTP client could not be built (TLS backend initialisation).
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
