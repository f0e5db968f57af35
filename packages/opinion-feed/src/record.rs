//! The opinion record and its dedup key.

use chrono::{DateTime, Days, NaiveDate, Utc};
use court_extraction::{CourtId, ListedOpinion};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Natural dedup key: court plus court-assigned case number.
///
/// Ordering follows court catalogue order, then case number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OpinionKey {
    pub court_id: CourtId,
    pub case_number: String,
}

impl OpinionKey {
    pub fn new(court_id: CourtId, case_number: impl Into<String>) -> Self {
        Self {
            court_id,
            case_number: case_number.into(),
        }
    }
}

impl fmt::Display for OpinionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.court_id, self.case_number)
    }
}

/// An opinion recorded by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpinionRecord {
    pub court_id: CourtId,
    pub case_number: String,
    pub case_name: String,
    pub date_filed: NaiveDate,
    pub document_url: String,

    /// Absent when summarization was off, failed, or is pending
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    pub first_seen_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opinion_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower_tribunal: Option<String>,

    /// Listing page the opinion was found on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,

    /// Summarization attempts made so far
    #[serde(default)]
    pub summary_attempts: u32,
}

impl OpinionRecord {
    /// Record a freshly listed opinion.
    pub fn from_listing(listing: ListedOpinion, first_seen_at: DateTime<Utc>) -> Self {
        Self {
            court_id: listing.court_id,
            case_number: listing.case_number,
            case_name: listing.case_name,
            date_filed: listing.date_filed,
            document_url: listing.document_url,
            summary: None,
            first_seen_at,
            opinion_type: listing.opinion_type,
            lower_tribunal: listing.lower_tribunal,
            page_url: Some(listing.page_url),
            summary_attempts: 0,
        }
    }

    pub fn key(&self) -> OpinionKey {
        OpinionKey::new(self.court_id, self.case_number.clone())
    }

    pub fn court_name(&self) -> &'static str {
        self.court_id.name()
    }

    /// Whether the record is inside the feed window at `now`.
    ///
    /// A window reaching past the earliest representable instant keeps everything.
    pub fn in_feed_window(&self, now: DateTime<Utc>, retention_days: u32) -> bool {
        now.checked_sub_days(Days::new(u64::from(retention_days)))
            .map_or(true, |cutoff| self.first_seen_at >= cutoff)
    }

    /// Whether another summarization attempt is due.
    pub fn needs_summary(&self, max_attempts: u32) -> bool {
        self.summary.is_none() && self.summary_attempts < max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn listing() -> ListedOpinion {
        ListedOpinion {
            court_id: CourtId::ThirdDca,
            case_number: "3D2024-0100".into(),
            case_name: "Ruiz v. Miami-Dade County".into(),
            date_filed: NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(),
            document_url: "https://3dca.flcourts.gov/content/download/1/op.pdf".into(),
            opinion_type: Some("Written".into()),
            lower_tribunal: None,
            page_url: "https://3dca.flcourts.gov/Opinions".into(),
        }
    }

    #[test]
    fn test_key_display() {
        let record = OpinionRecord::from_listing(listing(), Utc::now());
        assert_eq!(record.key().to_string(), "3dca:3D2024-0100");
    }

    #[test]
    fn test_feed_window_edge_is_inclusive() {
        let seen = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let record = OpinionRecord::from_listing(listing(), seen);

        assert!(record.in_feed_window(seen + Duration::days(30), 30));
        assert!(!record.in_feed_window(seen + Duration::days(30) + Duration::seconds(1), 30));
    }

    #[test]
    fn test_huge_retention_keeps_record() {
        let seen = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let record = OpinionRecord::from_listing(listing(), seen);

        assert!(record.in_feed_window(seen + Duration::days(1), 100_000_000));
        assert!(record.in_feed_window(seen, u32::MAX));
    }

    #[test]
    fn test_needs_summary() {
        let mut record = OpinionRecord::from_listing(listing(), Utc::now());
        assert!(record.needs_summary(3));

        record.summary_attempts = 3;
        assert!(!record.needs_summary(3));

        record.summary_attempts = 1;
        record.summary = Some("Affirmed.".into());
        assert!(!record.needs_summary(3));
    }

    #[test]
    fn test_optional_fields_default_when_missing() {
        let json = r#"{
            "court_id": "1dca",
            "case_number": "1D2024-0001",
            "case_name": "A v. B",
            "date_filed": "2024-05-01",
            "document_url": "https://1dca.flcourts.gov/a.pdf",
            "first_seen_at": "2024-05-02T10:00:00Z"
        }"#;
        let record: OpinionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.summary, None);
        assert_eq!(record.summary_attempts, 0);
        assert_eq!(record.page_url, None);
    }
}
