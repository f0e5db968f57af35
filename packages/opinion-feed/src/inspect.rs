//! Listing page diagnostics for the `inspect` command.

use chrono::NaiveDate;
use court_extraction::{CourtConfig, CourtId, ListingSource, Pacer, PageContext, PageReport};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Result of inspecting one listing URL.
#[derive(Debug, Clone)]
pub struct ListingInspection {
    pub court: CourtId,
    pub label: String,
    pub url: String,
    pub result: Result<InspectedPage, String>,
}

#[derive(Debug, Clone)]
pub struct InspectedPage {
    pub report: PageReport,
    pub html: String,
}

impl ListingInspection {
    /// `<court>_<label>.html`, used when dumping pages to disk.
    pub fn dump_file_name(&self) -> String {
        let label: String = self
            .label
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        format!("{}_{}.html", self.court, label)
    }
}

/// Fetch and analyze every listing URL of `court`.
///
/// Unlike a scrape this does not stop at the first page that matches.
pub async fn inspect_court(
    source: &dyn ListingSource,
    pacer: &Pacer,
    court: &CourtConfig,
    today: NaiveDate,
) -> Vec<ListingInspection> {
    let mut inspections = Vec::with_capacity(court.listing_urls.len());

    for listing in &court.listing_urls {
        pacer.wait().await;

        let result = match source.fetch_listing(&listing.url).await {
            Ok(page) => match PageContext::new(court, &page.final_url, today) {
                Ok(ctx) => {
                    let report = PageReport::analyze(&page.html, &ctx);
                    debug!(court = %court.id, listing = %listing.label, strategy = ?report.strategy, "Listing inspected");
                    Ok(InspectedPage {
                        report,
                        html: page.html,
                    })
                }
                Err(e) => Err(e.to_string()),
            },
            Err(e) => {
                warn!(court = %court.id, url = %listing.url, error = %e, "Listing fetch failed");
                Err(e.to_string())
            }
        };

        inspections.push(ListingInspection {
            court: court.id,
            label: listing.label.clone(),
            url: listing.url.clone(),
            result,
        });
    }

    inspections
}

/// Write the fetched HTML of each inspection into `dir`.
pub async fn dump_pages(
    dir: &Path,
    inspections: &[ListingInspection],
) -> std::io::Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(dir).await?;

    let mut written = Vec::new();
    for inspection in inspections {
        if let Ok(page) = &inspection.result {
            let path = dir.join(inspection.dump_file_name());
            tokio::fs::write(&path, &page.html).await?;
            written.push(path);
        }
    }
    Ok(written)
}
