use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Url};

use crate::error::{AppError, Result};
use crate::models::{ContentListing, LocationParams, RemoteEntry};

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";
const USER_AGENT: &str = concat!("mdpost/", env!("CARGO_PKG_VERSION"));

/// Lists the contents of one directory of a remote repository.
#[async_trait]
pub trait ContentLister: Send + Sync {
    async fn list(&self, params: &LocationParams) -> Result<Vec<RemoteEntry>>;
}

/// Client for the GitHub "repository contents" endpoint.
pub struct GithubClient {
    client: Client,
    api_url: Url,
}

impl GithubClient {
    pub fn new(api_url: &str, token: Option<&str>, timeout: Duration) -> Result<Self> {
        let api_url = Url::parse(api_url)
            .map_err(|e| AppError::RemoteFetch(format!("invalid API url {}: {}", api_url, e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("token {}", token))
                .map_err(|e| AppError::RemoteFetch(format!("invalid token: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, api_url })
    }

    fn contents_url(&self, params: &LocationParams) -> Result<Url> {
        let mut url = self.api_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| AppError::RemoteFetch(format!("{} cannot be a base url", self.api_url)))?;
            segments
                .pop_if_empty()
                .extend(["repos", params.owner.as_str(), params.repo.as_str(), "contents"])
                .extend(params.path.split('/').filter(|s| !s.is_empty()));
        }
        if let Some(reference) = &params.reference {
            url.query_pairs_mut().append_pair("ref", reference);
        }
        Ok(url)
    }
}

#[async_trait]
impl ContentLister for GithubClient {
    async fn list(&self, params: &LocationParams) -> Result<Vec<RemoteEntry>> {
        let url = self.contents_url(params)?;
        tracing::debug!("GET {}", url);

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::RemoteFetch(format!(
                "{}/{}/{}: HTTP {}: {}",
                params.owner, params.repo, params.path, status, error_text
            )));
        }

        let listing: ContentListing = response.json().await?;
        Ok(listing.into_entries())
    }
}
