//! Catalog listing page: row extraction and per-row detail enrichment

use anyhow::Result;
use scraper::{ElementRef, Html, Selector};
use tracing::{info, warn};
use url::Url;

use crate::detail::{fetch_cpu_details, DetailParser};
use crate::fetch::{FetchError, FetchOptions, PageFetcher};
use crate::retry::RetryPolicy;
use crate::store::KnownNames;
use crate::types::{CpuDetails, CpuRecord};
use crate::utils::{element_text, parse_selector};

const ROW_SELECTOR: &str = "#category_content > tr";
const NAME_SELECTOR: &str = "td.td__name > a > div.td__nameWrapper > p";
const IMAGE_SELECTOR: &str = "td.td__name > a > div.td__imageWrapper > div > img";
const LINK_SELECTOR: &str = "td.td__name > a";
const PRICE_SELECTOR: &str = "td.td__price";

/// Price cells end with an "Add" button label
const PRICE_CTA: &str = "Add";
pub const MISSING_PRICE: &str = "N/A";

/// Listing URL for a 1-based page index
pub fn listing_url(catalog_url: &str, page: u32) -> String {
    format!("{}#page={}", catalog_url, page)
}

/// Summary fields of one listing row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRow {
    pub name: String,
    pub image_url: String,
    /// Absolute product page URL, empty when the row has no link
    pub product_url: String,
    pub price: String,
}

impl ListingRow {
    pub fn into_record(self, details: CpuDetails) -> CpuRecord {
        CpuRecord {
            name: self.name,
            image_url: self.image_url,
            product_url: self.product_url,
            price: self.price,
            details,
        }
    }
}

/// Strip the trailing call-to-action from a price cell
fn clean_price(text: &str) -> String {
    text.split(PRICE_CTA).next().unwrap_or_default().trim().to_string()
}

/// Compiled selectors for the listing table
pub struct ListingParser {
    row: Selector,
    name: Selector,
    image: Selector,
    link: Selector,
    price: Selector,
}

impl ListingParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            row: parse_selector(ROW_SELECTOR)?,
            name: parse_selector(NAME_SELECTOR)?,
            image: parse_selector(IMAGE_SELECTOR)?,
            link: parse_selector(LINK_SELECTOR)?,
            price: parse_selector(PRICE_SELECTOR)?,
        })
    }

    /// Rows in document order. Rows without a name are dropped.
    pub fn parse(&self, body: &str, origin: &Url) -> Vec<ListingRow> {
        let document = Html::parse_document(body);
        document
            .select(&self.row)
            .filter_map(|row| {
                let parsed = self.parse_row(row, origin);
                if parsed.is_none() {
                    warn!("Skipping listing row without a name");
                }
                parsed
            })
            .collect()
    }

    fn parse_row(&self, row: ElementRef, origin: &Url) -> Option<ListingRow> {
        let name = row
            .select(&self.name)
            .next()
            .map(element_text)
            .filter(|name| !name.is_empty())?;

        let image_url = row
            .select(&self.image)
            .next()
            .and_then(|img| img.value().attr("src"))
            .unwrap_or_default()
            .to_string();

        let product_url = row
            .select(&self.link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(|href| {
                origin
                    .join(href)
                    .map(String::from)
                    .unwrap_or_else(|_| format!("{}{}", origin.as_str().trim_end_matches('/'), href))
            })
            .unwrap_or_default();

        let price = row
            .select(&self.price)
            .next()
            .map(|cell| clean_price(&element_text(cell)))
            .unwrap_or_else(|| MISSING_PRICE.to_string());

        Some(ListingRow {
            name,
            image_url,
            product_url,
            price,
        })
    }
}

/// Rows gathered from one listing page
#[derive(Debug, Default)]
pub struct PageOutcome {
    pub records: Vec<CpuRecord>,
    pub skipped: usize,
    /// New rows written with blank specs
    pub blank_details: usize,
}

/// Walks one listing page, enriching every unseen row with its detail specs
pub struct ListingScraper<'a> {
    fetcher: &'a dyn PageFetcher,
    rows: ListingParser,
    details: DetailParser,
    origin: Url,
    retry: RetryPolicy,
}

impl<'a> ListingScraper<'a> {
    pub fn new(fetcher: &'a dyn PageFetcher, origin: Url, retry: RetryPolicy) -> Result<Self> {
        Ok(Self {
            fetcher,
            rows: ListingParser::new()?,
            details: DetailParser::new()?,
            origin,
            retry,
        })
    }

    /// Fetch the listing and every new row's detail page, one at a time.
    ///
    /// Only a failed listing fetch is an error; detail failures degrade to
    /// blank specs and the row is kept.
    pub async fn scrape_page(&self, url: &str, known: &KnownNames) -> Result<PageOutcome, FetchError> {
        let body = self.fetcher.fetch(url, &FetchOptions::listing()).await?;
        let rows = self.rows.parse(&body, &self.origin);
        info!("Found {} rows on {}", rows.len(), url);

        let mut outcome = PageOutcome::default();
        for row in rows {
            if known.contains(&row.name) {
                info!("Skipping {} - already in CSV", row.name);
                outcome.skipped += 1;
                continue;
            }
            info!("Trying to fetch {}", row.name);

            let details = if row.product_url.is_empty() {
                warn!("No product link for {}, leaving specs blank", row.name);
                CpuDetails::default()
            } else {
                fetch_cpu_details(self.fetcher, &self.details, &row.product_url, self.retry).await
            };
            if details.is_empty() {
                outcome.blank_details += 1;
            }
            outcome.records.push(row.into_record(details));
        }

        Ok(outcome)
    }
}
