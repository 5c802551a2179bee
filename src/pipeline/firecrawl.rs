use std::sync::LazyLock;

use regex::Regex;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{PageContent, PageFetcher, client::Client};
use crate::error::FetchError;

pub const FIRECRAWL_API_URL: &str = "https://api.firecrawl.dev";

static IMAGES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").expect("valid image pattern"));
static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid blank-line pattern"));

#[derive(Serialize, Debug)]
struct ScrapeRequest<'a> {
    url: &'a str,
    formats: [&'a str; 1],
}

#[derive(Deserialize, Debug)]
struct ScrapeResponse {
    success: bool,
    data: Option<ScrapeData>,
    error: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ScrapeData {
    markdown: Option<String>,
    metadata: Option<ScrapeMetadata>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ScrapeMetadata {
    #[serde(rename = "sourceURL")]
    source_url: Option<String>,
    url: Option<String>,
}

/// [`PageFetcher`] backed by the Firecrawl scrape endpoint.
pub struct FirecrawlFetcher {
    client: Client,
    base_url: String,
}

impl FirecrawlFetcher {
    pub fn new(api_key: &str) -> Self {
        FirecrawlFetcher::with_client(Client::new(), FIRECRAWL_API_URL, api_key)
    }

    pub fn with_client(client: Client, base_url: &str, api_key: &str) -> Self {
        FirecrawlFetcher {
            client: client.with_bearer(api_key),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl PageFetcher for FirecrawlFetcher {
    async fn fetch(&self, url: &str) -> Result<PageContent, FetchError> {
        let requested = Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;

        let response: ScrapeResponse = self
            .client
            .post_json(
                &format!("{}/v1/scrape", self.base_url),
                &ScrapeRequest {
                    url,
                    formats: ["markdown"],
                },
            )
            .await?;

        if !response.success {
            return Err(FetchError::Unsuccessful(
                response
                    .error
                    .unwrap_or_else(|| "no error message given".to_string()),
            ));
        }

        let data = response
            .data
            .ok_or_else(|| FetchError::EmptyContent(url.to_string()))?;
        let markdown = data
            .markdown
            .map(|md| strip_images(&md))
            .filter(|md| !md.trim().is_empty())
            .ok_or_else(|| FetchError::EmptyContent(url.to_string()))?;

        let source_url = data
            .metadata
            .and_then(|meta| meta.source_url.or(meta.url));
        if let Some(source) = &source_url
            && !same_page(&requested, source)
        {
            warn!("Scraped content came from {source}, not {url}");
        }
        debug!(source_url = ?source_url, "Firecrawl scrape finished");

        Ok(PageContent {
            markdown,
            source_url,
        })
    }
}

fn same_page(requested: &Url, source: &str) -> bool {
    match Url::parse(source) {
        Ok(source) => {
            source.host_str() == requested.host_str()
                && source.path().trim_end_matches('/') == requested.path().trim_end_matches('/')
        }
        Err(_) => false,
    }
}

/// Remove markdown image syntax and collapse the blank runs it leaves.
fn strip_images(md: &str) -> String {
    let cleaned = IMAGES.replace_all(md, "");
    BLANK_RUNS.replace_all(&cleaned, "\n\n").into_owned()
}
