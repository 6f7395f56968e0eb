//! The Completion Service: the single entry point that writes to the
//! activity log.
//!
//! `complete_challenge` validates the request against the catalog, lets the
//! log perform the atomic per-period uniqueness check, and answers with the
//! refreshed snapshot plus a diff of what this one completion changed. Reads
//! go through a per-practitioner snapshot cache that is refreshed on every
//! successful append.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::activity::{ActivityLog, AppendOutcome};
use crate::catalog::Catalog;
use crate::error::Result;
use crate::event::{CompletionEvent, NewCompletion};
use crate::paths::validate_id;
use crate::period::Period;
use crate::projection::{project, ProgressDiff, ProgressSnapshot, RankView};

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

/// Result of a completion request. Both variants are successful calls;
/// `AlreadyCompleted` is the idempotent no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CompletionOutcome {
    Completed {
        event: CompletionEvent,
        snapshot: ProgressSnapshot,
        diff: ProgressDiff,
    },
    AlreadyCompleted {
        /// The event already holding the period.
        existing: CompletionEvent,
        snapshot: ProgressSnapshot,
    },
}

impl CompletionOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    pub fn snapshot(&self) -> &ProgressSnapshot {
        match self {
            Self::Completed { snapshot, .. } | Self::AlreadyCompleted { snapshot, .. } => snapshot,
        }
    }

    pub fn diff(&self) -> Option<&ProgressDiff> {
        match self {
            Self::Completed { diff, .. } => Some(diff),
            Self::AlreadyCompleted { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub practitioner: String,
    pub global_xp: u64,
    pub level: RankView,
    pub title: RankView,
    pub streak: u32,
}

// ---------------------------------------------------------------------------
// CompletionService
// ---------------------------------------------------------------------------

type Clock = Box<dyn Fn() -> NaiveDate + Send + Sync>;

pub struct CompletionService {
    catalog: Arc<Catalog>,
    log: Arc<dyn ActivityLog>,
    cache: RwLock<HashMap<String, ProgressSnapshot>>,
    today: Clock,
}

impl CompletionService {
    /// Validates the catalog; a service is never built over a broken one.
    pub fn new(catalog: Catalog, log: Arc<dyn ActivityLog>) -> Result<Self> {
        catalog.validate()?;
        Ok(Self {
            catalog: Arc::new(catalog),
            log,
            cache: RwLock::new(HashMap::new()),
            today: Box::new(|| Utc::now().date_naive()),
        })
    }

    /// Replace the source of "today" used when a completion has no date.
    pub fn with_clock(mut self, today: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.today = Box::new(today);
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn today(&self) -> NaiveDate {
        (self.today)()
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Record that `practitioner` completed `challenge` on `when` (today when
    /// omitted). At most one completion per challenge and reset period is
    /// ever credited, however many callers race.
    pub fn complete_challenge(
        &self,
        practitioner: &str,
        challenge: &str,
        when: Option<NaiveDate>,
    ) -> Result<CompletionOutcome> {
        validate_id(practitioner)?;
        let scope = self.catalog.challenge(challenge)?.scope;
        let date = when.unwrap_or_else(|| self.today());

        let completion = NewCompletion {
            practitioner: practitioner.to_string(),
            challenge: challenge.to_string(),
            date,
            period: Period::containing(scope, date),
        };

        let appended = self.log.append(completion).inspect_err(|e| {
            tracing::warn!(practitioner, challenge, "append failed: {e}");
        })?;

        match appended {
            AppendOutcome::Duplicate(existing) => {
                tracing::debug!(
                    practitioner,
                    challenge,
                    period = %existing.period,
                    "already completed this period"
                );
                let snapshot = self.snapshot(practitioner)?;
                Ok(CompletionOutcome::AlreadyCompleted { existing, snapshot })
            }
            AppendOutcome::Inserted(event) => {
                // Racing appends for the same practitioner may already be in
                // the log; the diff covers the log up to this event only.
                let events = self.log.events_for(practitioner)?;
                let through: Vec<CompletionEvent> = events
                    .iter()
                    .filter(|e| e.seq <= event.seq)
                    .cloned()
                    .collect();
                let prior: Vec<CompletionEvent> = through
                    .iter()
                    .filter(|e| e.seq < event.seq)
                    .cloned()
                    .collect();
                let before = project(practitioner, &prior, &self.catalog);
                let at_event = project(practitioner, &through, &self.catalog);
                let diff = ProgressDiff::between(&before, &at_event);
                let after = if through.len() == events.len() {
                    at_event
                } else {
                    project(practitioner, &events, &self.catalog)
                };

                tracing::info!(
                    practitioner,
                    challenge,
                    date = %event.date,
                    xp = diff.xp_added,
                    global_xp = after.global_xp,
                    "completion recorded"
                );
                if !diff.new_badges.is_empty() || !diff.new_trophies.is_empty() {
                    tracing::info!(
                        practitioner,
                        badges = ?diff.new_badges,
                        trophies = ?diff.new_trophies,
                        "unlocked"
                    );
                }

                self.store(after.clone());
                Ok(CompletionOutcome::Completed {
                    event,
                    snapshot: after,
                    diff,
                })
            }
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Current snapshot; the empty baseline for a practitioner with no events.
    pub fn snapshot(&self, practitioner: &str) -> Result<ProgressSnapshot> {
        validate_id(practitioner)?;
        if let Some(hit) = self.cached(practitioner) {
            return Ok(hit);
        }
        let events = self.log.events_for(practitioner)?;
        let snapshot = project(practitioner, &events, &self.catalog);
        tracing::debug!(practitioner, events = events.len(), "snapshot replayed");
        self.store(snapshot.clone());
        Ok(snapshot)
    }

    /// The practitioner's events, oldest first.
    pub fn history(&self, practitioner: &str) -> Result<Vec<CompletionEvent>> {
        validate_id(practitioner)?;
        self.log.events_for(practitioner)
    }

    /// Practitioners by total XP, highest first; ties broken by id.
    pub fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        let mut snapshots = self
            .log
            .practitioners()?
            .iter()
            .map(|p| self.snapshot(p))
            .collect::<Result<Vec<_>>>()?;
        snapshots.sort_by(|a, b| {
            b.global_xp
                .cmp(&a.global_xp)
                .then_with(|| a.practitioner.cmp(&b.practitioner))
        });
        Ok(snapshots
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(i, s)| LeaderboardEntry {
                rank: i + 1,
                practitioner: s.practitioner,
                global_xp: s.global_xp,
                level: s.global_level,
                title: s.title,
                streak: s.streak,
            })
            .collect())
    }

    /// Drop every cached snapshot and replay all practitioners from the log.
    /// Returns the number of practitioners replayed.
    pub fn rebuild(&self) -> Result<usize> {
        self.cache
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        let practitioners = self.log.practitioners()?;
        for p in &practitioners {
            self.snapshot(p)?;
        }
        tracing::info!(practitioners = practitioners.len(), "snapshot cache rebuilt");
        Ok(practitioners.len())
    }

    // -----------------------------------------------------------------------
    // Cache
    // -----------------------------------------------------------------------

    // The cache only holds derived data, so a poisoned lock is recovered.

    fn cached(&self, practitioner: &str) -> Option<ProgressSnapshot> {
        self.cache
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(practitioner)
            .cloned()
    }

    /// Never replaces an entry with one covering fewer events, so a slow
    /// replay cannot overwrite a fresher one.
    fn store(&self, snapshot: ProgressSnapshot) {
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        match cache.get(&snapshot.practitioner) {
            Some(current) if current.event_count > snapshot.event_count => {}
            _ => {
                cache.insert(snapshot.practitioner.clone(), snapshot);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
