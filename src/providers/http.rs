//! HTTP ranking provider implementation

use crate::{
    config::TrackerConfig,
    constants::{HEALTH_ENDPOINT, TOP_TOKENS_ENDPOINT, USER_AGENT},
    error::ProviderError,
    provider::RankingProvider,
    types::{Asset, BackendHealth},
};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;

/// Error body sent by the backend on failure
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Provider backed by the dashboard's REST backend
pub struct HttpRankingProvider {
    client: Client,
    ranking_url: String,
    health_url: String,
}

impl HttpRankingProvider {
    /// Creates a new provider for the backend described by `config`
    pub fn new(config: &TrackerConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(ProviderError::Network)?;

        Ok(Self::with_client(client, config))
    }

    /// Creates a provider that sends its requests through `client`
    pub fn with_client(client: Client, config: &TrackerConfig) -> Self {
        let base = config.api_base_url.trim_end_matches('/');

        Self {
            client,
            ranking_url: format!("{}{}", base, TOP_TOKENS_ENDPOINT),
            health_url: format!("{}{}", base, HEALTH_ENDPOINT),
        }
    }

    /// URL of the ranking endpoint
    pub fn ranking_url(&self) -> &str {
        &self.ranking_url
    }

    /// Queries the backend health endpoint
    ///
    /// Used by the embedding shell at startup, not by the poller.
    pub async fn fetch_health(&self) -> Result<BackendHealth, ProviderError> {
        let response = self.client.get(&self.health_url).send().await?;
        let status = response.status().as_u16();
        let body = read_body(response, status).await?;

        if !(200..300).contains(&status) {
            return Err(error_from_body(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::response(status, format!("Malformed health response: {}", e))
        })
    }
}

impl Default for HttpRankingProvider {
    fn default() -> Self {
        Self::new(&TrackerConfig::default()).expect("Failed to create HTTP ranking provider")
    }
}

/// Turns a received status and body into the ranking or a response error
///
/// Non-2xx: the body's `error` field, else `HTTP error <status>`.
/// 2xx with a body that is not a ranking: the body's `error` field if it has
/// one, else the parse failure.
pub(crate) fn interpret_response(status: u16, body: &str) -> Result<Vec<Asset>, ProviderError> {
    if !(200..300).contains(&status) {
        return Err(error_from_body(status, body));
    }

    serde_json::from_str::<Vec<Asset>>(body).map_err(|e| {
        match backend_error_message(body) {
            Some(message) => ProviderError::response(status, message),
            None => ProviderError::response(status, format!("Malformed response body: {}", e)),
        }
    })
}

/// Reads the body; once a status has arrived, a broken body is a response error
async fn read_body(response: Response, status: u16) -> Result<String, ProviderError> {
    response.text().await.map_err(|e| {
        ProviderError::response(status, format!("Failed to read response body: {}", e))
    })
}

fn error_from_body(status: u16, body: &str) -> ProviderError {
    let message =
        backend_error_message(body).unwrap_or_else(|| format!("HTTP error {}", status));
    ProviderError::response(status, message)
}

fn backend_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.trim().is_empty())
}

#[async_trait]
impl RankingProvider for HttpRankingProvider {
    async fn fetch_ranking(&self) -> Result<Vec<Asset>, ProviderError> {
        tracing::debug!(url = %self.ranking_url, "Fetching top tokens");

        let response = self.client.get(&self.ranking_url).send().await?;
        let status = response.status().as_u16();
        let body = read_body(response, status).await?;

        let assets = interpret_response(status, &body)?;

        tracing::debug!(count = assets.len(), "Fetched top tokens");

        Ok(assets)
    }

    fn provider_name(&self) -> &'static str {
        "http"
    }
}
