//! Persisted opinion state.
//!
//! Loaded once per run, mutated in memory, written back with a
//! temp-file-and-rename so a crash never leaves a half-written file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::atomic::write_atomic;
use crate::error::StateError;
use crate::record::{OpinionKey, OpinionRecord};

/// Current on-disk format version.
pub const STATE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
    version: u32,
    #[serde(default)]
    last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    records: Vec<OpinionRecord>,
}

/// All opinions recorded so far, keyed by `(court_id, case_number)`.
///
/// Keys are unique by construction: [`StateStore::insert`] never replaces
/// an existing record and loading rejects files with duplicate keys.
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    records: BTreeMap<OpinionKey, OpinionRecord>,
    last_updated: Option<DateTime<Utc>>,
}

impl StateStore {
    /// An empty store that will persist to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: BTreeMap::new(),
            last_updated: None,
        }
    }

    /// Load the store. A missing file is an empty store; anything unreadable
    /// or malformed is an error, and nothing is mutated.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, StateError> {
        let path = path.into();

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "No state file, starting empty");
                return Ok(Self::new(path));
            }
            Err(source) => return Err(StateError::Read { path, source }),
        };

        let file: StateFile =
            serde_json::from_slice(&bytes).map_err(|e| StateError::Corrupt {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        if file.version != STATE_VERSION {
            return Err(StateError::Version {
                path,
                found: file.version,
            });
        }

        let mut records = BTreeMap::new();
        for record in file.records {
            match records.entry(record.key()) {
                Entry::Occupied(entry) => {
                    return Err(StateError::Corrupt {
                        path,
                        reason: format!("duplicate key {}", entry.key()),
                    });
                }
                Entry::Vacant(entry) => {
                    entry.insert(record);
                }
            }
        }

        info!(path = %path.display(), records = records.len(), "State loaded");
        Ok(Self {
            path,
            records,
            last_updated: file.last_updated,
        })
    }

    /// Write the store atomically, stamping `now` as the update time.
    pub async fn persist(&mut self, now: DateTime<Utc>) -> Result<(), StateError> {
        let file = StateFile {
            version: STATE_VERSION,
            last_updated: Some(now),
            records: self.records.values().cloned().collect(),
        };
        let bytes = serde_json::to_vec_pretty(&file)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StateError::Write {
                    path: self.path.clone(),
                    source,
                })?;
        }

        write_atomic(&self.path, &bytes)
            .await
            .map_err(|source| StateError::Write {
                path: self.path.clone(),
                source,
            })?;

        self.last_updated = Some(now);
        debug!(path = %self.path.display(), records = self.records.len(), "State persisted");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, key: &OpinionKey) -> bool {
        self.records.contains_key(key)
    }

    pub fn get(&self, key: &OpinionKey) -> Option<&OpinionRecord> {
        self.records.get(key)
    }

    /// Insert a record if its key is new. Returns `false` (and keeps the
    /// existing record) when the key is already present.
    pub fn insert(&mut self, record: OpinionRecord) -> bool {
        match self.records.entry(record.key()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(record);
                true
            }
        }
    }

    /// Count one summarization attempt and store the summary if there is one.
    pub fn record_summary_attempt(&mut self, key: &OpinionKey, summary: Option<String>) -> bool {
        match self.records.get_mut(key) {
            Some(record) => {
                record.summary_attempts = record.summary_attempts.saturating_add(1);
                if summary.is_some() {
                    record.summary = summary;
                }
                true
            }
            None => false,
        }
    }

    /// All records in key order.
    pub fn records(&self) -> impl Iterator<Item = &OpinionRecord> {
        self.records.values()
    }

    /// Records first seen within `retention_days` of `now`.
    pub fn feed_window(&self, now: DateTime<Utc>, retention_days: u32) -> Vec<&OpinionRecord> {
        self.records
            .values()
            .filter(|r| r.in_feed_window(now, retention_days))
            .collect()
    }

    /// Keys of in-window records still owed a summary, oldest first.
    pub fn pending_summaries(
        &self,
        now: DateTime<Utc>,
        retention_days: u32,
        max_attempts: u32,
    ) -> Vec<OpinionKey> {
        let mut pending: Vec<&OpinionRecord> = self
            .feed_window(now, retention_days)
            .into_iter()
            .filter(|r| r.needs_summary(max_attempts))
            .collect();
        pending.sort_by(|a, b| {
            a.first_seen_at
                .cmp(&b.first_seen_at)
                .then_with(|| a.key().cmp(&b.key()))
        });
        pending.into_iter().map(|r| r.key()).collect()
    }
}
