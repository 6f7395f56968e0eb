//! Persistent activity log using redb.
//!
//! # Table design
//!
//! ```text
//! events           [ practitioner utf-8 | 0x00 | seq: u64 big-endian ] -> JSON CompletionEvent
//! completion_keys  "practitioner/challenge/period"                      -> events key
//! meta             "next_seq"                                           -> u64
//! ```
//!
//! Practitioner ids never contain `0x00`, so a range scan over
//! `[prefix | 0x00 | 0..=u64::MAX]` returns exactly one practitioner's events,
//! in append order. `completion_keys` is the uniqueness constraint: the check
//! and both inserts happen inside one write transaction, and redb admits a
//! single writer at a time, so racing appends serialize on it.

use std::collections::BTreeSet;
use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition};

use crate::error::{KeikoError, Result};
use crate::event::{completion_key, sort_for_fold, CompletionEvent, NewCompletion};
use crate::period::Period;

use super::{ActivityLog, AppendOutcome};

// ---------------------------------------------------------------------------
// Table definitions
// ---------------------------------------------------------------------------

const EVENTS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("events");
const COMPLETION_KEYS: TableDefinition<&str, &[u8]> = TableDefinition::new("completion_keys");
const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

const NEXT_SEQ: &str = "next_seq";

// ---------------------------------------------------------------------------
// Key helpers
// ---------------------------------------------------------------------------

fn event_key(practitioner: &str, seq: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(practitioner.len() + 9);
    key.extend_from_slice(practitioner.as_bytes());
    key.push(0);
    key.extend_from_slice(&seq.to_be_bytes());
    key
}

fn practitioner_of(key: &[u8]) -> Option<&str> {
    let split = key.len().checked_sub(9)?;
    std::str::from_utf8(&key[..split]).ok()
}

fn unavailable(e: impl std::fmt::Display) -> KeikoError {
    KeikoError::LogUnavailable(e.to_string())
}

fn decode(bytes: &[u8]) -> Result<CompletionEvent> {
    serde_json::from_slice(bytes).map_err(unavailable)
}

// ---------------------------------------------------------------------------
// RedbLog
// ---------------------------------------------------------------------------

pub struct RedbLog {
    db: Database,
}

impl RedbLog {
    /// Open or create the redb database at `path`, creating tables on first use.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path).map_err(unavailable)?;
        let wt = db.begin_write().map_err(unavailable)?;
        wt.open_table(EVENTS).map_err(unavailable)?;
        wt.open_table(COMPLETION_KEYS).map_err(unavailable)?;
        wt.open_table(META).map_err(unavailable)?;
        wt.commit().map_err(unavailable)?;
        tracing::debug!("opened activity log at {}", path.display());
        Ok(Self { db })
    }

    fn event_at(&self, key: &[u8]) -> Result<Option<CompletionEvent>> {
        let rt = self.db.begin_read().map_err(unavailable)?;
        let events = rt.open_table(EVENTS).map_err(unavailable)?;
        let found = events.get(key).map_err(unavailable)?;
        found.map(|v| decode(v.value())).transpose()
    }
}

impl ActivityLog for RedbLog {
    fn append(&self, completion: NewCompletion) -> Result<AppendOutcome> {
        let unique = completion.unique_key();
        let wt = self.db.begin_write().map_err(unavailable)?;

        let outcome = {
            let mut keys = wt.open_table(COMPLETION_KEYS).map_err(unavailable)?;
            let mut events = wt.open_table(EVENTS).map_err(unavailable)?;
            let mut meta = wt.open_table(META).map_err(unavailable)?;

            let existing = keys
                .get(unique.as_str())
                .map_err(unavailable)?
                .map(|v| v.value().to_vec());

            match existing {
                Some(ekey) => {
                    let held = events
                        .get(ekey.as_slice())
                        .map_err(unavailable)?
                        .map(|v| decode(v.value()))
                        .transpose()?
                        .ok_or_else(|| {
                            KeikoError::LogUnavailable(format!(
                                "completion key '{unique}' points at a missing event"
                            ))
                        })?;
                    AppendOutcome::Duplicate(held)
                }
                None => {
                    let seq = meta
                        .get(NEXT_SEQ)
                        .map_err(unavailable)?
                        .map(|v| v.value())
                        .unwrap_or(1);
                    let event = completion.into_event(seq);
                    let ekey = event_key(&event.practitioner, seq);
                    let value = serde_json::to_vec(&event)?;
                    events
                        .insert(ekey.as_slice(), value.as_slice())
                        .map_err(unavailable)?;
                    keys.insert(unique.as_str(), ekey.as_slice())
                        .map_err(unavailable)?;
                    meta.insert(NEXT_SEQ, seq + 1).map_err(unavailable)?;
                    AppendOutcome::Inserted(event)
                }
            }
        };

        match &outcome {
            AppendOutcome::Inserted(_) => wt.commit().map_err(unavailable)?,
            AppendOutcome::Duplicate(_) => wt.abort().map_err(unavailable)?,
        }
        Ok(outcome)
    }

    fn query(
        &self,
        practitioner: &str,
        challenge: &str,
        period: &Period,
    ) -> Result<Vec<CompletionEvent>> {
        let key = completion_key(practitioner, challenge, period);
        let ekey = {
            let rt = self.db.begin_read().map_err(unavailable)?;
            let keys = rt.open_table(COMPLETION_KEYS).map_err(unavailable)?;
            let found = keys.get(key.as_str()).map_err(unavailable)?;
            found.map(|v| v.value().to_vec())
        };
        match ekey {
            Some(ekey) => Ok(self.event_at(&ekey)?.into_iter().collect()),
            None => Ok(Vec::new()),
        }
    }

    fn events_for(&self, practitioner: &str) -> Result<Vec<CompletionEvent>> {
        let lower = event_key(practitioner, 0);
        let upper = event_key(practitioner, u64::MAX);
        let rt = self.db.begin_read().map_err(unavailable)?;
        let table = rt.open_table(EVENTS).map_err(unavailable)?;

        let mut result = Vec::new();
        for entry in table
            .range(lower.as_slice()..=upper.as_slice())
            .map_err(unavailable)?
        {
            let (_, v) = entry.map_err(unavailable)?;
            result.push(decode(v.value())?);
        }
        sort_for_fold(&mut result);
        Ok(result)
    }

    fn practitioners(&self) -> Result<Vec<String>> {
        let rt = self.db.begin_read().map_err(unavailable)?;
        let table = rt.open_table(EVENTS).map_err(unavailable)?;

        let mut ids = BTreeSet::new();
        for entry in table.iter().map_err(unavailable)? {
            let (k, _) = entry.map_err(unavailable)?;
            if let Some(p) = practitioner_of(k.value()) {
                ids.insert(p.to_string());
            }
        }
        Ok(ids.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::contract;
    use crate::types::Scope;
    use chrono::NaiveDate;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn open_tmp() -> (TempDir, RedbLog) {
        let dir = TempDir::new().unwrap();
        let log = RedbLog::open(&dir.path().join("activity.redb")).unwrap();
        (dir, log)
    }

    #[test]
    fn rejects_second_append_in_period() {
        let (_dir, log) = open_tmp();
        contract::rejects_second_append_in_period(&log);
    }

    #[test]
    fn accepts_next_period() {
        let (_dir, log) = open_tmp();
        contract::accepts_next_period(&log);
    }

    #[test]
    fn keys_are_per_practitioner() {
        let (_dir, log) = open_tmp();
        contract::keys_are_per_practitioner(&log);
    }

    #[test]
    fn query_returns_period_events() {
        let (_dir, log) = open_tmp();
        contract::query_returns_period_events(&log);
    }

    #[test]
    fn events_come_back_in_fold_order() {
        let (_dir, log) = open_tmp();
        contract::events_come_back_in_fold_order(&log);
    }

    #[test]
    fn racing_appends_insert_once() {
        let (_dir, log) = open_tmp();
        contract::racing_appends_insert_once(Arc::new(log));
    }

    #[test]
    fn events_survive_reopen_and_seq_continues() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("activity.redb");
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        {
            let log = RedbLog::open(&path).unwrap();
            log.append(contract::completion("aiko", "meditation", Scope::Daily, date))
                .unwrap();
        }
        let log = RedbLog::open(&path).unwrap();
        let again = log
            .append(contract::completion("aiko", "meditation", Scope::Daily, date))
            .unwrap();
        assert!(matches!(again, AppendOutcome::Duplicate(_)));

        let next = log
            .append(contract::completion("aiko", "open_mat", Scope::Weekly, date))
            .unwrap();
        let AppendOutcome::Inserted(event) = next else {
            panic!("expected insert");
        };
        assert_eq!(event.seq, 2);
        assert_eq!(log.events_for("aiko").unwrap().len(), 2);
    }

    #[test]
    fn practitioner_prefix_is_exact() {
        assert_eq!(practitioner_of(&event_key("aiko", 7)), Some("aiko"));
        assert_eq!(practitioner_of(b"short"), None);
    }
}
