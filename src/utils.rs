use anyhow::{anyhow, Result};
use scraper::{ElementRef, Selector};
use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

/// Install the global fmt subscriber. `RUST_LOG` overrides `default_filter`.
pub fn init_tracing(default_filter: &str) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("failed to initialize tracing: {}", e))
}

/// Compile a CSS selector, keeping the offending selector in the error
pub fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| anyhow!("invalid selector '{}': {}", selector, e))
}

/// All descendant text of an element, trimmed
pub fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}
