use thiserror::Error;

use crate::pipeline::client::RequestError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("API key not found. Tried: {}. Please check your .env file", .tried.join(" and "))]
    MissingCredential { tried: Vec<&'static str> },
    #[error("Could not read {path}: {source}")]
    EnvFile {
        path: String,
        #[source]
        source: dotenvy::Error,
    },
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Not an absolute URL: {0}")]
    InvalidUrl(String),
    #[error("Scraping request failed: {0}")]
    Request(#[from] RequestError),
    #[error("Scraping backend reported failure: {0}")]
    Unsuccessful(String),
    #[error("Scraping backend returned no usable content for {0}")]
    EmptyContent(String),
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Refusing to extract events from empty page content")]
    EmptyContent,
    #[error("Completion request failed: {0}")]
    Request(#[from] RequestError),
    #[error("Completion backend returned no content")]
    EmptyResponse,
    #[error("Completion backend refused the request: {0}")]
    Refused(String),
    #[error("Completion does not match the event schema: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Event {index} violates the event schema: {reason}")]
    SchemaViolation { index: usize, reason: &'static str },
}

/// Every way a run can end early.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),
    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),
    #[error("Could not write events: {0}")]
    Output(#[from] std::io::Error),
}
