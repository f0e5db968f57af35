//! Command-line interface.

use clap::{Args, Parser, Subcommand};
use court_extraction::CourtId;
use secrecy::SecretString;
use std::path::PathBuf;

use crate::config::{Config, ListingFetcher};

#[derive(Debug, Parser)]
#[command(name = "opinion-feed")]
#[command(about = "Scrape Florida appellate opinions, summarize them and publish feeds")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// The subcommand, defaulting to a plain `run`.
    pub fn into_command(self) -> Commands {
        self.command.unwrap_or(Commands::Run(RunArgs::default()))
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scrape, reconcile, summarize and write the feeds (default)
    Run(RunArgs),

    /// Print the structure of each court's listing pages
    Inspect(InspectArgs),
}

#[derive(Debug, Default, Args)]
pub struct RunArgs {
    /// Skip summarization; records keep empty summaries
    #[arg(long)]
    pub no_summarize: bool,

    /// Days back to look for new opinions
    #[arg(long, value_name = "DAYS")]
    pub lookback: Option<u32>,

    /// Days a record stays in the feeds after first being seen
    #[arg(long, value_name = "DAYS")]
    pub retention: Option<u32>,

    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    #[arg(long, value_name = "FILE")]
    pub state_file: Option<PathBuf>,

    /// Public URL the feeds are served from
    #[arg(long, value_name = "URL")]
    pub site_url: Option<String>,

    /// Anthropic API key (overrides ANTHROPIC_API_KEY)
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// How listing pages are fetched (overrides LISTING_FETCHER)
    #[arg(long, value_enum)]
    pub fetcher: Option<ListingFetcher>,
}

impl RunArgs {
    /// Layer command-line overrides on top of the environment.
    pub fn apply(self, config: &mut Config) -> anyhow::Result<()> {
        if self.no_summarize {
            config.summarize = false;
        }
        if let Some(days) = self.lookback {
            config.lookback_days = days;
        }
        if let Some(days) = self.retention {
            config.retention_days = days;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if let Some(file) = self.state_file {
            config.state_file = file;
        }
        if let Some(url) = self.site_url {
            config.feed.site_url = Some(url);
        }
        if let Some(key) = self.api_key.filter(|k| !k.trim().is_empty()) {
            config.anthropic_api_key = Some(SecretString::new(key.into_boxed_str()));
        }
        if let Some(fetcher) = self.fetcher {
            config.listing_fetcher = fetcher;
        }
        config.validate()
    }
}

#[derive(Debug, Default, Args)]
pub struct InspectArgs {
    /// Only inspect this court (code such as `3dca` or short name such as `FLSC`)
    #[arg(long, value_name = "COURT")]
    pub court: Option<CourtId>,

    /// Save each fetched listing page here
    #[arg(long, value_name = "DIR")]
    pub dump_dir: Option<PathBuf>,

    /// How listing pages are fetched (overrides LISTING_FETCHER)
    #[arg(long, value_enum)]
    pub fetcher: Option<ListingFetcher>,
}

impl InspectArgs {
    pub fn apply(&self, config: &mut Config) -> anyhow::Result<()> {
        if let Some(fetcher) = self.fetcher {
            config.listing_fetcher = fetcher;
        }
        config.validate()
    }
}
