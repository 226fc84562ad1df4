use anyhow::Result;
use tracing::{error, info};
use url::Url;

use crate::config::Config;
use crate::detail::DETAIL_RETRY;
use crate::fetch::{PageFetcher, ZenRowsClient};
use crate::listing::{listing_url, ListingScraper};
use crate::retry::RetryPolicy;
use crate::store::CsvStore;

/// What one run did to the store
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub known: usize,
    pub skipped: usize,
    pub appended: usize,
    pub blank_details: usize,
    pub page_failed: bool,
}

/// Load known names, scrape one listing page and append its new rows.
///
/// The index is fully loaded before any fetch starts. A failed listing fetch
/// is logged and nothing is appended; store errors are returned.
pub async fn scrape_into_store(
    fetcher: &dyn PageFetcher,
    store: &CsvStore,
    catalog_url: &str,
    origin: Url,
    page: u32,
    retry: RetryPolicy,
) -> Result<RunSummary> {
    let known = store.load_known_names()?;
    let mut summary = RunSummary {
        known: known.len(),
        ..Default::default()
    };

    let scraper = ListingScraper::new(fetcher, origin, retry)?;
    let url = listing_url(catalog_url, page);

    match scraper.scrape_page(&url, &known).await {
        Ok(outcome) => {
            summary.skipped = outcome.skipped;
            summary.blank_details = outcome.blank_details;
            summary.appended = store.append(&outcome.records)?;
            info!(
                "Page {} scraped successfully: {} new ({} without specs), {} already known.",
                page, summary.appended, summary.blank_details, summary.skipped
            );
        }
        Err(e) => {
            error!("Failed to scrape page {}: {}", page, e);
            summary.page_failed = true;
        }
    }

    Ok(summary)
}

pub async fn run_scrape(config: Config) -> Result<()> {
    let client = ZenRowsClient::new(&config.api_key, config.request_timeout)?;
    let store = CsvStore::new(&config.output);

    info!("Scraping page {} into {}", config.page, store.path().display());
    let summary = scrape_into_store(
        &client,
        &store,
        &config.catalog_url,
        config.origin.clone(),
        config.page,
        DETAIL_RETRY,
    )
    .await?;

    if !summary.page_failed {
        info!("Data has been written to {}.", store.path().display());
    }
    Ok(())
}
