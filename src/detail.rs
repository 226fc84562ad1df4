//! Product detail pages: spec group normalization and retrying fetch

use anyhow::Result;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::fetch::{FetchError, FetchOptions, PageFetcher};
use crate::retry::{attempt, RetryPolicy};
use crate::types::{CpuDetails, DetailField};
use crate::utils::{element_text, parse_selector};

/// Mobile-layout specs block of a product page
const SPECS_SELECTOR: &str = "#product-page > div.main-wrapper.xs-col-12 > div.wrapper.wrapper__pageContent > section > div > div.main-content.col.xs-col-12.md-col-8.lg-col-8.xl-col-9 > div.block.xs-block.md-hide.specs";
const GROUP_SELECTOR: &str = "div.group";
const TITLE_SELECTOR: &str = "h3";
const PARAGRAPH_SELECTOR: &str = "div > p";
const LIST_ITEM_SELECTOR: &str = "div > ul > li";

/// Status the proxy answers with when a render hiccups; worth another try
pub const TRANSIENT_STATUS: u16 = 422;

/// Three attempts per detail page, three seconds apart
pub const DETAIL_RETRY: RetryPolicy = RetryPolicy::new(3, Duration::from_secs(3));

/// Compiled selectors for the detail page specs block
pub struct DetailParser {
    specs: Selector,
    group: Selector,
    title: Selector,
    paragraph: Selector,
    list_item: Selector,
}

impl DetailParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            specs: parse_selector(SPECS_SELECTOR)?,
            group: parse_selector(GROUP_SELECTOR)?,
            title: parse_selector(TITLE_SELECTOR)?,
            paragraph: parse_selector(PARAGRAPH_SELECTOR)?,
            list_item: parse_selector(LIST_ITEM_SELECTOR)?,
        })
    }

    /// Normalize the spec groups of a detail page.
    ///
    /// Returns `None` when the specs block is missing from the page. Every
    /// group counts toward `specs_num`; only headings found in
    /// `DETAIL_LABELS` fill a field.
    pub fn parse(&self, body: &str) -> Option<CpuDetails> {
        let document = Html::parse_document(body);
        let specs = document.select(&self.specs).next()?;

        let mut details = CpuDetails::default();
        for group in specs.select(&self.group) {
            details.specs_num += 1;

            let Some(title) = group.select(&self.title).next().map(element_text) else {
                continue;
            };

            // A non-empty paragraph wins, otherwise the list items joined
            let value = group
                .select(&self.paragraph)
                .next()
                .map(element_text)
                .filter(|text| !text.is_empty())
                .unwrap_or_else(|| {
                    group
                        .select(&self.list_item)
                        .map(element_text)
                        .collect::<Vec<_>>()
                        .join(", ")
                });

            match DetailField::from_label(&title) {
                Some(field) => details.set(field, value),
                None => debug!("Ignoring unrecognized spec '{}'", title),
            }
        }

        Some(details)
    }
}

fn is_transient(err: &FetchError) -> bool {
    err.status() == Some(TRANSIENT_STATUS)
}

/// Fetch and normalize one product page.
///
/// Never fails: a missing specs block, a non-422 error, or running out of
/// attempts all yield blank details so the row is still written.
pub async fn fetch_cpu_details(
    fetcher: &dyn PageFetcher,
    parser: &DetailParser,
    url: &str,
    policy: RetryPolicy,
) -> CpuDetails {
    let options = FetchOptions::detail();
    let options = &options;

    let body = match attempt(policy, url, is_transient, move |_| fetcher.fetch(url, options)).await
    {
        Ok(body) => body,
        Err(e) => {
            error!("Final fail for {}: {}", url, e);
            return CpuDetails::default();
        }
    };

    parser.parse(&body).unwrap_or_else(|| {
        warn!("Specs section not found for {}", url);
        CpuDetails::default()
    })
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::fetch::mock::{Reply, ScriptedFetcher};
    use tokio::time::Instant;

    const URL: &str = "https://pcpartpicker.com/product/22XJ7P/amd-ryzen-9-7950x";

    #[test]
    fn test_parse_recognized_groups() {
        let groups = [
            group_p("Manufacturer", "AMD"),
            group_p("Part #", " 100-100000514WOF "),
            group_p("Core Count", "16"),
            group_p("TDP", "170 W"),
            group_p("Socket", "AM5"),
        ]
        .concat();
        let details = DetailParser::new().unwrap().parse(&detail_page(&groups)).unwrap();

        assert_eq!(details.manufacturer, "AMD");
        assert_eq!(details.part_number, "100-100000514WOF");
        assert_eq!(details.core_count, "16");
        assert_eq!(details.tdp, "170 W");
        assert_eq!(details.socket, "AM5");
        assert_eq!(details.series, "");
        assert_eq!(details.specs_num, 5);
    }

    #[test]
    fn test_parse_joins_list_items() {
        let groups = group_list("Part #", &["BX8071513600K", " BX8071513600KF "]);
        let details = DetailParser::new().unwrap().parse(&detail_page(&groups)).unwrap();
        assert_eq!(details.part_number, "BX8071513600K, BX8071513600KF");
    }

    #[test]
    fn test_parse_empty_paragraph_falls_back_to_list() {
        let groups = r#"<div class="group"><h3>Packaging</h3><div><p> </p><ul><li>Boxed</li><li>Tray</li></ul></div></div>"#;
        let details = DetailParser::new().unwrap().parse(&detail_page(groups)).unwrap();
        assert_eq!(details.packaging, "Boxed, Tray");
    }

    #[test]
    fn test_parse_counts_unrecognized_and_untitled_groups() {
        let groups = [
            group_p("Color", "Black"),
            group_p("L3 Cache", "64 MB"),
            r#"<div class="group"><div><p>orphan</p></div></div>"#.to_string(),
        ]
        .concat();
        let details = DetailParser::new().unwrap().parse(&detail_page(&groups)).unwrap();
        assert_eq!(details.l3_cache, "64 MB");
        assert_eq!(details.specs_num, 3);
    }

    #[test]
    fn test_parse_missing_specs_block() {
        let parser = DetailParser::new().unwrap();
        let body = "<html><body><div id=\"product-page\"><p>Access denied</p></div></body></html>";
        assert_eq!(parser.parse(body), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_details_success() {
        let body = detail_page(&group_p("Series", "AMD Ryzen 9"));
        let fetcher = ScriptedFetcher::new().reply(URL, Reply::Body(body));
        let parser = DetailParser::new().unwrap();

        let details = fetch_cpu_details(&fetcher, &parser, URL, DETAIL_RETRY).await;

        assert_eq!(details.series, "AMD Ryzen 9");
        assert_eq!(details.specs_num, 1);
        let calls = fetcher.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, FetchOptions::detail());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_details_gives_up_after_three_422s() {
        let fetcher = ScriptedFetcher::new().reply(URL, Reply::Status(422));
        let parser = DetailParser::new().unwrap();
        let start = Instant::now();

        let details = fetch_cpu_details(&fetcher, &parser, URL, DETAIL_RETRY).await;

        assert!(details.is_empty());
        assert_eq!(fetcher.calls_to(URL), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_details_does_not_retry_500() {
        let fetcher = ScriptedFetcher::new().reply(URL, Reply::Status(500));
        let parser = DetailParser::new().unwrap();
        let start = Instant::now();

        let details = fetch_cpu_details(&fetcher, &parser, URL, DETAIL_RETRY).await;

        assert!(details.is_empty());
        assert_eq!(fetcher.calls_to(URL), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_details_does_not_retry_transport_error() {
        let fetcher = ScriptedFetcher::new().reply(URL, Reply::Transport);
        let parser = DetailParser::new().unwrap();
        let start = Instant::now();

        let details = fetch_cpu_details(&fetcher, &parser, URL, DETAIL_RETRY).await;

        assert!(details.is_empty());
        assert_eq!(fetcher.calls_to(URL), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_details_recovers_after_422() {
        let body = detail_page(&group_p("Lithography", "TSMC 5nm"));
        let fetcher = ScriptedFetcher::new()
            .reply(URL, Reply::Status(422))
            .reply(URL, Reply::Body(body));
        let parser = DetailParser::new().unwrap();

        let details = fetch_cpu_details(&fetcher, &parser, URL, DETAIL_RETRY).await;

        assert_eq!(details.lithography, "TSMC 5nm");
        assert_eq!(fetcher.calls_to(URL), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_details_missing_block_is_not_retried() {
        let fetcher = ScriptedFetcher::new()
            .reply(URL, Reply::Body("<html><body>captcha</body></html>".to_string()));
        let parser = DetailParser::new().unwrap();

        let details = fetch_cpu_details(&fetcher, &parser, URL, DETAIL_RETRY).await;

        assert_eq!(details, CpuDetails::default());
        assert_eq!(details.specs_num, 0);
        assert_eq!(fetcher.calls_to(URL), 1);
    }
}
