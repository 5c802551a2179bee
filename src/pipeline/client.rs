use bytes::Bytes;
use reqwest::{StatusCode, Url};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

/// Longest backend error body kept in a [`RequestError::Status`].
const MAX_ERROR_BODY: usize = 500;

/// Thin JSON-over-HTTP client shared by both backends.
///
/// Every call is a single attempt: no retries, no rate limiting.
#[derive(Clone)]
pub struct Client {
    client: reqwest::Client,
    bearer: Option<String>,
}

#[derive(Error, Debug)]
pub enum RequestError {
    #[error("Invalid request URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Network error while calling {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Backend answered {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("Decoding error while decoding JSON {0}")]
    DecodeError(#[from] serde_json::Error),
}

impl Client {
    pub fn new() -> Self {
        Client::from_reqwest(reqwest::Client::new())
    }

    pub fn from_reqwest(client: reqwest::Client) -> Self {
        Client {
            client,
            bearer: None,
        }
    }

    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<Bytes, RequestError> {
        let url = Url::parse(url).map_err(|source| RequestError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        let network = |source: reqwest::Error| RequestError::NetworkError {
            url: url.to_string(),
            source,
        };

        let mut request = self.client.post(url.clone()).json(body);
        if let Some(token) = &self.bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(network)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RequestError::Status {
                status,
                body: truncate(body.trim(), MAX_ERROR_BODY),
            });
        }

        response.bytes().await.map_err(network)
    }

    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, RequestError> {
        let response = self.post(url, body).await?;
        serde_json::from_slice(&response).map_err(RequestError::DecodeError)
    }
}

impl Default for Client {
    fn default() -> Self {
        Client::new()
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{truncated}...")
    }
}
