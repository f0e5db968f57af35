//! Scraping one court: listing URLs in priority order through the chain.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::error::{ListingMiss, ScrapeError};
use crate::pacing::Pacer;
use crate::strategies::{ChainOutcome, PageContext, StrategyChain, StrategyKind};
use crate::traits::ingestor::ListingSource;
use crate::types::candidate::ListedOpinion;
use crate::types::court::{CourtConfig, CourtId};

/// Plausible opinions read from the winning listing page of a court.
#[derive(Debug, Clone)]
pub struct CourtScrape {
    pub court: CourtId,
    /// Label of the listing URL that produced results
    pub listing_label: String,
    pub listing_url: String,
    pub strategy: StrategyKind,
    pub opinions: Vec<ListedOpinion>,
    /// Listing URLs tried before the winner
    pub misses: Vec<ListingMiss>,
}

impl CourtScrape {
    /// Opinions filed within the lookback window (edge inclusive).
    pub fn within_lookback(&self, today: NaiveDate, lookback_days: u32) -> Vec<ListedOpinion> {
        self.opinions
            .iter()
            .filter(|o| o.within_lookback(today, lookback_days))
            .cloned()
            .collect()
    }
}

/// Scrapes courts through a [`ListingSource`] and a [`StrategyChain`].
pub struct CourtScraper<'a> {
    source: &'a dyn ListingSource,
    chain: &'a StrategyChain,
    pacer: &'a Pacer,
}

impl<'a> CourtScraper<'a> {
    /// The pacer is waited on before every listing fetch.
    pub fn new(source: &'a dyn ListingSource, chain: &'a StrategyChain, pacer: &'a Pacer) -> Self {
        Self {
            source,
            chain,
            pacer,
        }
    }

    /// Try each listing URL in order; the first with plausible opinions wins.
    ///
    /// A fetch failure or a page with no match falls through to the next URL.
    pub async fn scrape(
        &self,
        court: &CourtConfig,
        today: NaiveDate,
    ) -> Result<CourtScrape, ScrapeError> {
        let mut misses = Vec::new();

        for listing in &court.listing_urls {
            self.pacer.wait().await;

            let page = match self.source.fetch_listing(&listing.url).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(
                        court = %court.id,
                        listing = %listing.label,
                        url = %listing.url,
                        error = %e,
                        "Listing fetch failed"
                    );
                    misses.push(ListingMiss::Fetch {
                        label: listing.label.clone(),
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            let ctx = PageContext::new(court, &page.final_url, today)?;
            match self.chain.extract(&page.html, &ctx) {
                ChainOutcome::Matched { strategy, opinions } => {
                    info!(
                        court = %court.id,
                        listing = %listing.label,
                        strategy = %strategy,
                        count = opinions.len(),
                        "Court scraped"
                    );
                    return Ok(CourtScrape {
                        court: court.id,
                        listing_label: listing.label.clone(),
                        listing_url: page.final_url,
                        strategy,
                        opinions,
                        misses,
                    });
                }
                ChainOutcome::NoMatch { case_numbers_seen } => {
                    debug!(
                        court = %court.id,
                        listing = %listing.label,
                        case_numbers_seen,
                        "No strategy matched listing page"
                    );
                    misses.push(ListingMiss::NoMatch {
                        label: listing.label.clone(),
                        case_numbers_seen,
                    });
                }
            }
        }

        Err(ScrapeError::NoResults {
            court: court.id.to_string(),
            misses,
        })
    }
}
