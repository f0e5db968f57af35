use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use court_extraction::{florida_courts, CourtConfig, DEFAULT_MAX_DOCUMENT_BYTES};
use dotenvy::dotenv;
use secrecy::SecretString;
use std::collections::HashSet;
use std::env;
use std::fmt::{self, Display};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::feed::{
    FeedMeta, DEFAULT_FEED_DESCRIPTION, DEFAULT_FEED_LANGUAGE, DEFAULT_FEED_LINK,
    DEFAULT_FEED_TITLE, DEFAULT_GENERATOR,
};
use crate::summarize::{DEFAULT_MAX_PAGES, DEFAULT_MAX_SUMMARY_CHARS, DEFAULT_MODEL};

pub const DEFAULT_USER_AGENT: &str = "FloridaCourtOpinionScraper/1.0 (RSS Feed Generator)";

/// Upper bound on `LOOKBACK_DAYS` (ten years).
pub const MAX_LOOKBACK_DAYS: u32 = 3_650;

/// Upper bound on `RETENTION_DAYS` (a century).
pub const MAX_RETENTION_DAYS: u32 = 36_500;

/// How listing pages are fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ListingFetcher {
    /// Plain HTTP GET of the served HTML
    #[default]
    Http,
    /// Render in headless Chromium first (needs the `browser` feature)
    Browser,
}

impl ListingFetcher {
    /// Whether this build can construct the fetcher.
    pub fn is_available(&self) -> bool {
        match self {
            ListingFetcher::Http => true,
            ListingFetcher::Browser => cfg!(feature = "browser"),
        }
    }
}

impl FromStr for ListingFetcher {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true)
    }
}

impl Display for ListingFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ListingFetcher::Http => "http",
            ListingFetcher::Browser => "browser",
        })
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug)]
pub struct Config {
    pub lookback_days: u32,
    pub retention_days: u32,
    pub state_file: PathBuf,
    pub output_dir: PathBuf,
    pub feed: FeedMeta,

    /// Summaries are skipped when this is absent
    pub anthropic_api_key: Option<SecretString>,
    pub summary_model: String,
    pub max_summary_chars: usize,
    pub max_summary_attempts: u32,
    pub pdf_max_pages: usize,
    pub summarize: bool,

    pub court_delay: Duration,
    pub document_delay: Duration,
    pub summary_delay: Duration,
    pub user_agent: String,
    pub http_timeout: Duration,
    /// Largest opinion document downloaded for summarization
    pub max_document_bytes: usize,

    pub listing_fetcher: ListingFetcher,
    /// Chromium binary for the browser fetcher; `PATH` lookup when absent
    pub browser_executable: Option<PathBuf>,

    pub courts: Vec<CourtConfig>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let courts = match var("COURTS_FILE") {
            Some(path) => load_courts(&path)?,
            None => florida_courts(),
        };

        let feed = FeedMeta {
            title: var("FEED_TITLE").unwrap_or_else(|| DEFAULT_FEED_TITLE.to_string()),
            description: var("FEED_DESCRIPTION")
                .unwrap_or_else(|| DEFAULT_FEED_DESCRIPTION.to_string()),
            link: var("FEED_LINK").unwrap_or_else(|| DEFAULT_FEED_LINK.to_string()),
            language: var("FEED_LANGUAGE").unwrap_or_else(|| DEFAULT_FEED_LANGUAGE.to_string()),
            site_url: var("SITE_URL").or_else(|| var("GITHUB_PAGES_URL")),
            generator: DEFAULT_GENERATOR.to_string(),
        };

        let config = Self {
            lookback_days: parse_or(&var, "LOOKBACK_DAYS", 7)?,
            retention_days: parse_or(&var, "RETENTION_DAYS", 30)?,
            state_file: var("STATE_FILE")
                .unwrap_or_else(|| "state.json".to_string())
                .into(),
            output_dir: var("OUTPUT_DIR").unwrap_or_else(|| "docs".to_string()).into(),
            feed,
            anthropic_api_key: var("ANTHROPIC_API_KEY")
                .map(|key| SecretString::new(key.into_boxed_str())),
            summary_model: var("SUMMARY_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_summary_chars: parse_or(&var, "MAX_SUMMARY_CHARS", DEFAULT_MAX_SUMMARY_CHARS)?,
            max_summary_attempts: parse_or(&var, "MAX_SUMMARY_ATTEMPTS", 3)?,
            pdf_max_pages: parse_or(&var, "PDF_MAX_PAGES", DEFAULT_MAX_PAGES)?,
            summarize: true,
            court_delay: Duration::from_millis(parse_or(&var, "COURT_DELAY_MS", 1000)?),
            document_delay: Duration::from_millis(parse_or(&var, "DOCUMENT_DELAY_MS", 1000)?),
            summary_delay: Duration::from_millis(parse_or(&var, "SUMMARY_DELAY_MS", 500)?),
            user_agent: var("USER_AGENT").unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            http_timeout: Duration::from_secs(parse_or(&var, "HTTP_TIMEOUT_SECS", 30)?),
            max_document_bytes: parse_or(&var, "MAX_DOCUMENT_BYTES", DEFAULT_MAX_DOCUMENT_BYTES)?,
            listing_fetcher: parse_or(&var, "LISTING_FETCHER", ListingFetcher::default())?,
            browser_executable: var("BROWSER_EXECUTABLE").map(PathBuf::from),
            courts,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check invariants that later stages rely on.
    pub fn validate(&self) -> Result<()> {
        if self.lookback_days == 0 {
            bail!("LOOKBACK_DAYS must be at least 1");
        }
        if self.lookback_days > MAX_LOOKBACK_DAYS {
            bail!("LOOKBACK_DAYS must be at most {MAX_LOOKBACK_DAYS}");
        }
        if self.retention_days > MAX_RETENTION_DAYS {
            bail!("RETENTION_DAYS must be at most {MAX_RETENTION_DAYS}");
        }
        if self.max_summary_chars == 0 {
            bail!("MAX_SUMMARY_CHARS must be at least 1");
        }
        if self.max_document_bytes == 0 {
            bail!("MAX_DOCUMENT_BYTES must be at least 1");
        }
        if !self.listing_fetcher.is_available() {
            bail!(
                "LISTING_FETCHER={} needs a build with the `browser` feature",
                self.listing_fetcher
            );
        }
        self.feed.validate().context("Invalid feed metadata")?;
        Ok(())
    }

    /// Whether a summary backend can be built.
    pub fn summaries_enabled(&self) -> bool {
        self.summarize && self.anthropic_api_key.is_some()
    }
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("{key} must be a valid number, got {raw:?}")),
        None => Ok(default),
    }
}

/// Read a court catalogue from a JSON array of court configs.
fn load_courts(path: &str) -> Result<Vec<CourtConfig>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read COURTS_FILE {path}"))?;
    let courts: Vec<CourtConfig> = serde_json::from_str(&raw)
        .with_context(|| format!("COURTS_FILE {path} is not a valid court list"))?;

    if courts.is_empty() {
        bail!("COURTS_FILE {path} lists no courts");
    }
    let mut seen = HashSet::new();
    for court in &courts {
        if !seen.insert(court.id) {
            bail!("COURTS_FILE {path} lists {} twice", court.id);
        }
        if court.listing_urls.is_empty() {
            bail!("COURTS_FILE {path}: {} has no listing URLs", court.id);
        }
    }
    Ok(courts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use court_extraction::CourtId;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.lookback_days, 7);
        assert_eq!(config.retention_days, 30);
        assert_eq!(config.state_file, PathBuf::from("state.json"));
        assert_eq!(config.output_dir, PathBuf::from("docs"));
        assert_eq!(config.max_summary_chars, 12_000);
        assert_eq!(config.max_summary_attempts, 3);
        assert_eq!(config.court_delay, Duration::from_secs(1));
        assert_eq!(config.summary_delay, Duration::from_millis(500));
        assert_eq!(config.courts.len(), 7);
        assert_eq!(config.max_document_bytes, DEFAULT_MAX_DOCUMENT_BYTES);
        assert_eq!(config.listing_fetcher, ListingFetcher::Http);
        assert_eq!(config.browser_executable, None);
        assert_eq!(config.feed, FeedMeta::default());
        assert!(!config.summaries_enabled());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("LOOKBACK_DAYS", "14"),
            ("ANTHROPIC_API_KEY", "sk-ant-test"),
            ("GITHUB_PAGES_URL", "https://example.github.io/opinions"),
            ("COURT_DELAY_MS", "0"),
            ("FEED_TITLE", "Opinions"),
        ]))
        .unwrap();

        assert_eq!(config.lookback_days, 14);
        assert_eq!(config.court_delay, Duration::ZERO);
        assert_eq!(config.feed.title, "Opinions");
        assert_eq!(
            config.feed.site_url.as_deref(),
            Some("https://example.github.io/opinions")
        );
        assert_eq!(
            config.anthropic_api_key.as_ref().map(|k| k.expose_secret()),
            Some("sk-ant-test")
        );
        assert!(config.summaries_enabled());
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = Config::from_lookup(lookup(&[("ANTHROPIC_API_KEY", "  "), ("LOOKBACK_DAYS", "")]))
            .unwrap();
        assert!(config.anthropic_api_key.is_none());
        assert_eq!(config.lookback_days, 7);
    }

    #[test]
    fn test_invalid_values_are_errors() {
        let err = Config::from_lookup(lookup(&[("LOOKBACK_DAYS", "seven")])).unwrap_err();
        assert!(format!("{err:#}").contains("LOOKBACK_DAYS"));

        assert!(Config::from_lookup(lookup(&[("LOOKBACK_DAYS", "0")])).is_err());
        assert!(Config::from_lookup(lookup(&[("SITE_URL", "not a url")])).is_err());
        assert!(Config::from_lookup(lookup(&[("LISTING_FETCHER", "carrier-pigeon")])).is_err());
    }

    #[test]
    fn test_window_bounds() {
        let err = Config::from_lookup(lookup(&[("LOOKBACK_DAYS", "100000000")])).unwrap_err();
        assert!(format!("{err:#}").contains("LOOKBACK_DAYS must be at most 3650"));
        let err = Config::from_lookup(lookup(&[("RETENTION_DAYS", "4294967295")])).unwrap_err();
        assert!(format!("{err:#}").contains("RETENTION_DAYS"));

        let config = Config::from_lookup(lookup(&[
            ("LOOKBACK_DAYS", "3650"),
            ("RETENTION_DAYS", "36500"),
        ]))
        .unwrap();
        assert_eq!(config.lookback_days, MAX_LOOKBACK_DAYS);
        assert_eq!(config.retention_days, MAX_RETENTION_DAYS);
    }

    #[test]
    fn test_listing_fetcher_parsing() {
        assert_eq!("HTTP".parse::<ListingFetcher>(), Ok(ListingFetcher::Http));
        assert_eq!("browser".parse::<ListingFetcher>(), Ok(ListingFetcher::Browser));
        assert_eq!(ListingFetcher::Browser.to_string(), "browser");
    }

    #[cfg(not(feature = "browser"))]
    #[test]
    fn test_browser_fetcher_needs_feature() {
        let err = Config::from_lookup(lookup(&[("LISTING_FETCHER", "browser")])).unwrap_err();
        assert!(format!("{err:#}").contains("`browser` feature"));
    }

    #[cfg(feature = "browser")]
    #[test]
    fn test_browser_fetcher_selected() {
        let config = Config::from_lookup(lookup(&[
            ("LISTING_FETCHER", "browser"),
            ("BROWSER_EXECUTABLE", "/usr/bin/chromium"),
        ]))
        .unwrap();
        assert_eq!(config.listing_fetcher, ListingFetcher::Browser);
        assert_eq!(config.browser_executable, Some(PathBuf::from("/usr/bin/chromium")));
    }

    #[test]
    fn test_courts_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("courts.json");
        std::fs::write(
            &path,
            r#"[{
                "id": "1dca",
                "base_url": "https://1dca.flcourts.gov",
                "listing_urls": [{"label": "recent", "url": "https://1dca.flcourts.gov/recent"}]
            }]"#,
        )
        .unwrap();

        let config =
            Config::from_lookup(lookup(&[("COURTS_FILE", path.to_str().unwrap())])).unwrap();
        assert_eq!(config.courts.len(), 1);
        assert_eq!(config.courts[0].id, CourtId::FirstDca);

        std::fs::write(&path, "[]").unwrap();
        assert!(Config::from_lookup(lookup(&[("COURTS_FILE", path.to_str().unwrap())])).is_err());
    }
}
