//! REST client implementing the label directory for one repository.

use async_trait::async_trait;
use labels::{
    DirectoryError, LabelDirectory, LabelName, LabelUpdate, LookupError, NewLabel, RemoteLabel,
    RepositoryId, RepositoryProbe,
};
use reqwest::{header, Client as HttpClient, Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{GithubSettings, GithubSetupError, API_VERSION};

/// Error payload GitHub returns alongside non-success statuses.
#[derive(Debug, Deserialize)]
struct GithubErrorBody {
    message: String,
}

/// [`LabelDirectory`] backed by the GitHub REST API.
#[derive(Clone)]
pub struct GithubLabelDirectory {
    http: HttpClient,
    base_url: Url,
    token: String,
    repository: RepositoryId,
}

impl std::fmt::Debug for GithubLabelDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubLabelDirectory")
            .field("base_url", &self.base_url.as_str())
            .field("repository", &self.repository)
            .finish_non_exhaustive()
    }
}

impl GithubLabelDirectory {
    /// Builds the HTTP client and validates the API base URL.
    pub fn new(settings: GithubSettings) -> Result<Self, GithubSetupError> {
        let base_url = Url::parse(&settings.api_url).map_err(|e| GithubSetupError::InvalidApiUrl {
            url: settings.api_url.clone(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(GithubSetupError::InvalidApiUrl {
                url: settings.api_url,
                reason: "not a hierarchical URL".to_string(),
            });
        }

        let http = HttpClient::builder()
            .user_agent(settings.user_agent)
            .timeout(settings.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url,
            token: settings.token,
            repository: settings.repository,
        })
    }

    /// `{base}/repos/{owner}/{repo}/{extra...}`, each extra segment percent-encoded.
    ///
    /// Label names may contain `/`, spaces, or `:`; every name is pushed as a
    /// single segment so it cannot alter the path structure.
    fn repo_url(&self, extra: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // `new` rejects cannot-be-a-base URLs, so this always succeeds.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["repos", self.repository.owner(), self.repository.name()])
                .extend(extra);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(&self.token)
            .header(header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, reqwest::Error> {
        let request = builder.build()?;
        let method = request.method().clone();
        let path = request.url().path().to_string();

        let response = self.http.execute(request).await?;

        let remaining = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|h| h.to_str().ok())
            .map(str::to_string);
        debug!(
            %method,
            %path,
            status = response.status().as_u16(),
            rate_limit_remaining = remaining.as_deref(),
            "GitHub API call"
        );
        Ok(response)
    }

    /// Sends a mutating request and decodes the label it returns.
    async fn mutate<B: serde::Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: &B,
    ) -> Result<RemoteLabel, DirectoryError> {
        let response = self
            .send(self.request(method, url).json(body))
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::Api {
                status: status.as_u16(),
                message: error_message(response).await,
            });
        }

        response
            .json::<RemoteLabel>()
            .await
            .map_err(|e| DirectoryError::Decode {
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl LabelDirectory for GithubLabelDirectory {
    #[instrument(skip(self), fields(repository = %self.repository))]
    async fn get_label(&self, name: &LabelName) -> Result<RemoteLabel, LookupError> {
        let unavailable = |message: String| LookupError::Unavailable {
            name: name.clone(),
            message,
        };

        let url = self.repo_url(&["labels", name.as_str()]);
        let response = self
            .send(self.request(Method::GET, url))
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(LookupError::NotFound { name: name.clone() }),
            status if status.is_success() => response
                .json::<RemoteLabel>()
                .await
                .map_err(|e| unavailable(format!("unreadable label payload: {e}"))),
            status => {
                let message = error_message(response).await;
                Err(unavailable(format!("{}: {message}", status.as_u16())))
            }
        }
    }

    #[instrument(skip(self, label), fields(repository = %self.repository, label = %label.name))]
    async fn create_label(&self, label: &NewLabel) -> Result<RemoteLabel, DirectoryError> {
        let url = self.repo_url(&["labels"]);
        self.mutate(Method::POST, url, label).await
    }

    #[instrument(
        skip(self, update),
        fields(repository = %self.repository, new_name = %update.new_name)
    )]
    async fn update_label(
        &self,
        current_name: &LabelName,
        update: &LabelUpdate,
    ) -> Result<RemoteLabel, DirectoryError> {
        let url = self.repo_url(&["labels", current_name.as_str()]);
        self.mutate(Method::PATCH, url, update).await
    }
}

#[async_trait]
impl RepositoryProbe for GithubLabelDirectory {
    #[instrument(skip(self), fields(repository = %self.repository))]
    async fn ensure_repository(&self) -> Result<(), DirectoryError> {
        let url = self.repo_url(&[]);
        let response = self
            .send(self.request(Method::GET, url))
            .await
            .map_err(request_error)?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(DirectoryError::Api {
                status: status.as_u16(),
                message: error_message(response).await,
            })
        }
    }
}

fn request_error(err: reqwest::Error) -> DirectoryError {
    DirectoryError::Request {
        message: err.to_string(),
    }
}

/// GitHub's `message` field when the body carries one, otherwise the raw body.
async fn error_message(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<GithubErrorBody>(&body) {
        Ok(parsed) => parsed.message,
        Err(_) if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("no response body")
            .to_string(),
        Err(_) => body.trim().to_string(),
    }
}
