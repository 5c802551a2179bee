use std::io::Write;

use tracing::info;

pub mod client;
pub mod event;
pub mod firecrawl;
pub mod openai;

use crate::error::{Error, ExtractError, FetchError};
use event::{EventRecord, EventSchema};

/// Page text as returned by the scraping backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContent {
    pub markdown: String,
    /// Page the backend actually rendered, when it reports one.
    pub source_url: Option<String>,
}

impl PageContent {
    pub fn new(markdown: impl Into<String>) -> Self {
        PageContent {
            markdown: markdown.into(),
            source_url: None,
        }
    }
}

/// Turns a URL into page text with exactly one backend call.
#[allow(async_fn_in_trait)]
pub trait PageFetcher {
    async fn fetch(&self, url: &str) -> Result<PageContent, FetchError>;
}

/// Turns page text into records conforming to `schema` with exactly one
/// backend call. Classification is left to the backend.
#[allow(async_fn_in_trait)]
pub trait EventExtractor {
    async fn extract(
        &self,
        content: &PageContent,
        schema: &EventSchema,
    ) -> Result<Vec<EventRecord>, ExtractError>;
}

/// Fetch `url`, extract its events and write them to `out` as a JSON array.
///
/// `out` is only touched once both backend calls have succeeded, so a failed
/// run never leaves a partial list behind.
pub async fn run<F, E, W>(
    fetcher: &F,
    extractor: &E,
    url: &str,
    out: &mut W,
) -> Result<Vec<EventRecord>, Error>
where
    F: PageFetcher,
    E: EventExtractor,
    W: Write,
{
    info!("Scraping {url}");
    let content = fetcher.fetch(url).await?;
    info!("Scraped {} characters", content.markdown.chars().count());

    let events = extractor.extract(&content, &EventRecord::schema()).await?;
    let special = events.iter().filter(|e| e.is_special_event).count();
    info!(
        "Found {} special events out of {} total screenings",
        special,
        events.len()
    );

    write_events(&events, out)?;
    Ok(events)
}

/// Pretty-printed JSON array followed by a newline.
pub fn write_events<W: Write>(events: &[EventRecord], out: &mut W) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(events).map_err(std::io::Error::from)?;
    out.write_all(json.as_bytes())?;
    out.write_all(b"\n")?;
    out.flush()
}
