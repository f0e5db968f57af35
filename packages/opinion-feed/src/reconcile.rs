//! Merge freshly listed opinions into the state store.

use chrono::{DateTime, Utc};
use court_extraction::ListedOpinion;
use tracing::debug;

use crate::record::{OpinionKey, OpinionRecord};
use crate::state::StateStore;

/// Outcome of reconciling one court's listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Records that were not in the store and have now been inserted
    pub new_records: Vec<OpinionRecord>,

    /// Keys that were already recorded
    pub skipped_records: Vec<OpinionKey>,
}

impl Reconciliation {
    pub fn new_keys(&self) -> Vec<OpinionKey> {
        self.new_records.iter().map(OpinionRecord::key).collect()
    }
}

/// Partition `listings` into new and already-seen opinions.
///
/// New records go into the store immediately, before any summarization,
/// so a later failure can leave the summary empty but never makes the
/// opinion look new again. Matching is exact on `(court_id, case_number)`.
pub fn reconcile(
    store: &mut StateStore,
    listings: impl IntoIterator<Item = ListedOpinion>,
    first_seen_at: DateTime<Utc>,
) -> Reconciliation {
    let mut outcome = Reconciliation::default();

    for listing in listings {
        let record = OpinionRecord::from_listing(listing, first_seen_at);
        let key = record.key();

        if store.insert(record.clone()) {
            debug!(key = %key, "New opinion recorded");
            outcome.new_records.push(record);
        } else {
            outcome.skipped_records.push(key);
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use court_extraction::CourtId;

    fn listing(case: &str) -> ListedOpinion {
        ListedOpinion {
            court_id: CourtId::FifthDca,
            case_number: case.into(),
            case_name: "Taylor v. Hall".into(),
            date_filed: NaiveDate::from_ymd_opt(2024, 5, 6).unwrap(),
            document_url: format!("https://5dca.flcourts.gov/{case}.pdf"),
            opinion_type: None,
            lower_tribunal: None,
            page_url: "https://5dca.flcourts.gov/Opinions".into(),
        }
    }

    #[test]
    fn test_second_pass_is_all_skipped() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 6, 0, 0).unwrap();
        let mut store = StateStore::new("unused.json");
        let batch = vec![listing("5D2024-0001"), listing("5D2024-0002")];

        let first = reconcile(&mut store, batch.clone(), now);
        assert_eq!(first.new_records.len(), 2);
        assert!(first.skipped_records.is_empty());

        let second = reconcile(&mut store, batch, now);
        assert!(second.new_records.is_empty());
        assert_eq!(second.skipped_records.len(), 2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_duplicate_within_batch_counts_once() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 6, 0, 0).unwrap();
        let mut store = StateStore::new("unused.json");

        let outcome = reconcile(
            &mut store,
            vec![listing("5D2024-0001"), listing("5D2024-0001")],
            now,
        );
        assert_eq!(outcome.new_keys(), vec![OpinionKey::new(CourtId::FifthDca, "5D2024-0001")]);
        assert_eq!(outcome.skipped_records.len(), 1);
    }
}
