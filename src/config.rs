//! Run configuration from `.env`, environment variables and CLI flags

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::store::DEFAULT_OUTPUT_FILE;

pub const CATALOG_URL: &str = "https://pcpartpicker.com/products/cpu/";
pub const SITE_ORIGIN: &str = "https://pcpartpicker.com";

pub const API_KEY_VAR: &str = "ZENROWS_API_KEY";
pub const PAGE_VAR: &str = "CPU_SCRAPER_PAGE";
pub const OUTPUT_VAR: &str = "CPU_SCRAPER_OUTPUT";
pub const TIMEOUT_VAR: &str = "CPU_SCRAPER_TIMEOUT_SECS";

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Load `.env` from the working directory, falling back to the crate root
pub fn ensure_dotenv() {
    if dotenv::dotenv().is_ok() {
        return;
    }
    let candidate = format!("{}/.env", env!("CARGO_MANIFEST_DIR"));
    let _ = dotenv::from_filename(candidate);
}

/// Settings for one scrape run
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub page: u32,
    pub output: PathBuf,
    pub request_timeout: Duration,
    pub catalog_url: String,
    pub origin: Url,
}

/// Values given on the command line; they win over the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub page: Option<u32>,
    pub output: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

fn env_parsed<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, var: &str) -> Result<Option<T>>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(var)
        .filter(|v| !v.trim().is_empty())
        .map(|v| v.trim().parse::<T>())
        .transpose()
        .with_context(|| format!("{} is not a valid value", var))
}

fn resolve_output(flag: Option<PathBuf>, lookup: &impl Fn(&str) -> Option<String>) -> PathBuf {
    flag.or_else(|| lookup(OUTPUT_VAR).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE))
}

/// Store path from the flag, then the environment, then the default
pub fn output_path(flag: Option<PathBuf>) -> PathBuf {
    resolve_output(flag, &|var: &str| std::env::var(var).ok())
}

impl Config {
    pub fn load(overrides: Overrides) -> Result<Self> {
        Self::from_lookup(overrides, |var| std::env::var(var).ok())
    }

    fn from_lookup(overrides: Overrides, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup(API_KEY_VAR)
            .filter(|k| !k.trim().is_empty())
            .with_context(|| format!("{} environment variable must be set", API_KEY_VAR))?;

        let page = match overrides.page {
            Some(page) => page,
            None => env_parsed(&lookup, PAGE_VAR)?.unwrap_or(DEFAULT_PAGE),
        };
        if page == 0 {
            anyhow::bail!("page index starts at 1");
        }

        let output = resolve_output(overrides.output, &lookup);

        let timeout_secs = match overrides.timeout_secs {
            Some(secs) => secs,
            None => env_parsed(&lookup, TIMEOUT_VAR)?.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            api_key: api_key.trim().to_string(),
            page,
            output,
            request_timeout: Duration::from_secs(timeout_secs),
            catalog_url: CATALOG_URL.to_string(),
            origin: Url::parse(SITE_ORIGIN)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var: &str| map.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(Overrides::default(), env(&[(API_KEY_VAR, "secret")])).unwrap();
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.page, 1);
        assert_eq!(config.output, PathBuf::from("cpus_detailed.csv"));
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        assert_eq!(config.origin.as_str(), "https://pcpartpicker.com/");
    }

    #[test]
    fn test_missing_api_key() {
        let err = Config::from_lookup(Overrides::default(), env(&[])).unwrap_err();
        assert!(err.to_string().contains(API_KEY_VAR));
    }

    #[test]
    fn test_environment_values() {
        let lookup = env(&[
            (API_KEY_VAR, "secret"),
            (PAGE_VAR, "4"),
            (OUTPUT_VAR, "out/cpus.csv"),
            (TIMEOUT_VAR, "30"),
        ]);
        let config = Config::from_lookup(Overrides::default(), lookup).unwrap();
        assert_eq!(config.page, 4);
        assert_eq!(config.output, PathBuf::from("out/cpus.csv"));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_flags_win_over_environment() {
        let lookup = env(&[(API_KEY_VAR, "secret"), (PAGE_VAR, "4"), (TIMEOUT_VAR, "30")]);
        let overrides = Overrides {
            page: Some(7),
            output: Some(PathBuf::from("other.csv")),
            timeout_secs: Some(5),
        };
        let config = Config::from_lookup(overrides, lookup).unwrap();
        assert_eq!(config.page, 7);
        assert_eq!(config.output, PathBuf::from("other.csv"));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_rejects_bad_page() {
        let lookup = env(&[(API_KEY_VAR, "secret"), (PAGE_VAR, "four")]);
        assert!(Config::from_lookup(Overrides::default(), lookup).is_err());

        let lookup = env(&[(API_KEY_VAR, "secret")]);
        let overrides = Overrides {
            page: Some(0),
            ..Default::default()
        };
        assert!(Config::from_lookup(overrides, lookup).is_err());
    }
}
