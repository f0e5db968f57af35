//! Candidate opinion rows produced by the extraction strategies.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::court::CourtId;

/// Earliest filing year considered sane.
const MIN_FILING_YEAR: i32 = 1950;

/// A loosely-typed row pulled out of a listing page.
///
/// Strategies produce these without judging them; the chain decides
/// plausibility via [`Candidate::into_listed`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidate {
    pub case_number: String,
    pub case_name: String,
    pub date_filed: Option<NaiveDate>,
    /// Absolute document URL, if the row linked one
    pub document_url: Option<String>,
    pub opinion_type: Option<String>,
    pub lower_tribunal: Option<String>,
}

/// A plausible opinion listing: every required field is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedOpinion {
    pub court_id: CourtId,
    pub case_number: String,
    pub case_name: String,
    pub date_filed: NaiveDate,
    pub document_url: String,
    pub opinion_type: Option<String>,
    pub lower_tribunal: Option<String>,
    /// Listing page the row came from
    pub page_url: String,
}

impl Candidate {
    /// Check required fields and date sanity relative to `today`.
    pub fn is_plausible(&self, today: NaiveDate) -> bool {
        if self.case_number.trim().is_empty() {
            return false;
        }

        let has_document = self
            .document_url
            .as_deref()
            .and_then(|u| url::Url::parse(u).ok())
            .map(|u| matches!(u.scheme(), "http" | "https"))
            .unwrap_or(false);
        if !has_document {
            return false;
        }

        match self.date_filed {
            Some(date) => {
                date.year() >= MIN_FILING_YEAR
                    && today
                        .checked_add_days(Days::new(1))
                        .map_or(true, |latest| date <= latest)
            }
            None => false,
        }
    }

    /// Promote to a [`ListedOpinion`] if plausible.
    pub fn into_listed(
        self,
        court_id: CourtId,
        page_url: &str,
        today: NaiveDate,
    ) -> Option<ListedOpinion> {
        if !self.is_plausible(today) {
            return None;
        }

        let case_number = self.case_number.trim().to_string();
        let case_name = if self.case_name.trim().is_empty() {
            case_number.clone()
        } else {
            self.case_name.trim().to_string()
        };

        Some(ListedOpinion {
            court_id,
            case_number,
            case_name,
            date_filed: self.date_filed?,
            document_url: self.document_url?,
            opinion_type: self.opinion_type.filter(|s| !s.trim().is_empty()),
            lower_tribunal: self.lower_tribunal.filter(|s| !s.trim().is_empty()),
            page_url: page_url.to_string(),
        })
    }
}

impl ListedOpinion {
    /// Whether the filing date is inside the lookback window (edge inclusive).
    ///
    /// A window reaching past the earliest representable date has no cutoff.
    pub fn within_lookback(&self, today: NaiveDate, lookback_days: u32) -> bool {
        today
            .checked_sub_days(Days::new(u64::from(lookback_days)))
            .map_or(true, |cutoff| self.date_filed >= cutoff)
    }
}
