use anyhow::Result;
use palit::{
    config::{CALENDAR_URL, Config, THEATER_NAME},
    error::Error,
    pipeline::{self, firecrawl::FirecrawlFetcher, openai::OpenAiExtractor},
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load().map_err(Error::from)?;
    let fetcher = FirecrawlFetcher::new(&config.firecrawl_api_key);
    let extractor = OpenAiExtractor::new(&config.openai_api_key);

    info!("Scraping the {THEATER_NAME} calendar");
    let mut stdout = std::io::stdout().lock();
    pipeline::run(&fetcher, &extractor, CALENDAR_URL, &mut stdout).await?;
    Ok(())
}
