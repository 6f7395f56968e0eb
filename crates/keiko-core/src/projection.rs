//! The projection engine: folds a practitioner's completion events and the
//! catalog into a [`ProgressSnapshot`].
//!
//! Projection is pure. Given the same events it always yields the same
//! snapshot, whatever order the slice arrives in: events are applied in log
//! order (`seq`), XP and completion counts are sums, and the streak is the run
//! of consecutive calendar days ending at the latest activity date, which does
//! not depend on application order.
//!
//! Badge and trophy conditions are evaluated after every applied event and
//! the unlocked sets accumulate. A snapshot of a longer log therefore always
//! contains every unlock of a shorter prefix of it, including for conditions
//! that can stop holding later (`all_levels_equal`).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::catalog::{next_after, reached, Catalog, Threshold};
use crate::condition::{Counters, Subject};
use crate::event::CompletionEvent;
use crate::types::StreakStatus;

// ---------------------------------------------------------------------------
// Snapshot types
// ---------------------------------------------------------------------------

/// A rank on some ladder, resolved for a given XP amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankView {
    pub rank: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    pub xp_required: u64,
    /// Threshold of the next rank; `None` at the top of the ladder.
    pub next_xp_required: Option<u64>,
}

impl RankView {
    pub fn at<T: Threshold>(ladder: &[T], xp: u64) -> Self {
        let next_xp_required = next_after(ladder, xp).map(|t| t.xp_required());
        match reached(ladder, xp) {
            Some(t) => Self {
                rank: t.rank(),
                name: t.name().to_string(),
                emoji: t.emoji().map(str::to_string),
                xp_required: t.xp_required(),
                next_xp_required,
            },
            // Only reachable with an unvalidated catalog.
            None => Self {
                rank: 0,
                name: String::new(),
                emoji: None,
                xp_required: 0,
                next_xp_required,
            },
        }
    }

    /// XP still missing for the next rank.
    pub fn xp_to_next(&self, xp: u64) -> Option<u64> {
        self.next_xp_required.map(|n| n.saturating_sub(xp))
    }
}

fn rank_at<T: Threshold>(ladder: &[T], xp: u64) -> u32 {
    reached(ladder, xp).map(|t| t.rank()).unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtueProgress {
    pub xp: u64,
    pub level: RankView,
    pub completions: u32,
}

/// Derived progression state of one practitioner. A cache of the fold, never
/// a source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub practitioner: String,
    pub virtues: BTreeMap<String, VirtueProgress>,
    pub global_xp: u64,
    pub global_level: RankView,
    pub title: RankView,
    pub streak: u32,
    pub best_streak: u32,
    pub last_activity: Option<NaiveDate>,
    pub unlocked_badges: BTreeSet<String>,
    pub unlocked_trophies: BTreeSet<String>,
    /// Completions per challenge id.
    pub completions: BTreeMap<String, u32>,
    pub event_count: u64,
}

impl ProgressSnapshot {
    /// Baseline for a practitioner with no events. Same catalog contract as
    /// [`project`].
    pub fn empty(practitioner: &str, catalog: &Catalog) -> Self {
        Projector::new(catalog).snapshot(practitioner)
    }

    pub fn virtue(&self, id: &str) -> Option<&VirtueProgress> {
        self.virtues.get(id)
    }

    pub fn virtue_xp(&self, id: &str) -> u64 {
        self.virtue(id).map(|v| v.xp).unwrap_or(0)
    }

    /// Whether the streak is still alive as of `today`.
    pub fn streak_status(&self, today: NaiveDate) -> StreakStatus {
        match self.last_activity {
            Some(last) if last >= today => StreakStatus::Active,
            Some(last) if today.pred_opt() == Some(last) => StreakStatus::AtRisk,
            _ => StreakStatus::Lapsed,
        }
    }
}

// ---------------------------------------------------------------------------
// Projector
// ---------------------------------------------------------------------------

/// Incremental fold state. Feed events in log order with [`Projector::apply`],
/// read the result with [`Projector::snapshot`]. Built only over catalogs that
/// went through [`Catalog::validate`]; see [`project`].
pub(crate) struct Projector<'c> {
    catalog: &'c Catalog,
    counters: Counters,
    dates: BTreeSet<NaiveDate>,
    best_streak: u32,
    badges: BTreeSet<String>,
    trophies: BTreeSet<String>,
    events: u64,
}

impl<'c> Projector<'c> {
    pub(crate) fn new(catalog: &'c Catalog) -> Self {
        let mut counters = Counters::default();
        for virtue in catalog.virtues() {
            counters.virtue_xp.insert(virtue.id.clone(), 0);
            counters
                .virtue_level
                .insert(virtue.id.clone(), rank_at(&virtue.levels, 0));
        }
        counters.global_level = rank_at(&catalog.global_levels, 0);
        Self {
            catalog,
            counters,
            dates: BTreeSet::new(),
            best_streak: 0,
            badges: BTreeSet::new(),
            trophies: BTreeSet::new(),
            events: 0,
        }
    }

    pub(crate) fn apply(&mut self, event: &CompletionEvent) {
        let catalog = self.catalog;
        let Ok(challenge) = catalog.challenge(&event.challenge) else {
            tracing::warn!(
                challenge = %event.challenge,
                seq = event.seq,
                "event references a challenge missing from the catalog, skipping"
            );
            return;
        };

        let c = &mut self.counters;
        // XP saturates; a huge catalog reward must not poison replays.
        c.global_xp = c.global_xp.saturating_add(challenge.xp);
        c.global_level = rank_at(&catalog.global_levels, c.global_xp);
        c.total_completions = c.total_completions.saturating_add(1);
        let count = c.completions.entry(challenge.id.clone()).or_insert(0);
        *count = count.saturating_add(1);

        if let Some(virtue_id) = &challenge.virtue {
            let xp = c.virtue_xp.entry(virtue_id.clone()).or_insert(0);
            *xp = xp.saturating_add(challenge.xp);
            let xp = *xp;
            let count = c.virtue_completions.entry(virtue_id.clone()).or_insert(0);
            *count = count.saturating_add(1);
            if let Ok(virtue) = catalog.get_virtue(virtue_id) {
                c.virtue_level
                    .insert(virtue_id.clone(), rank_at(&virtue.levels, xp));
            }
        }

        // Streak only moves on a new distinct day.
        if self.dates.insert(event.date) {
            c.streak = current_streak(&self.dates);
            self.best_streak = self.best_streak.max(c.streak);
        }

        self.events += 1;
        self.evaluate_unlocks();
    }

    fn evaluate_unlocks(&mut self) {
        let catalog = self.catalog;
        for badge in &catalog.badges {
            if !self.badges.contains(&badge.id)
                && badge
                    .condition
                    .holds(Subject::Virtue(&badge.virtue), &self.counters)
            {
                self.badges.insert(badge.id.clone());
            }
        }
        for trophy in catalog.list_trophies() {
            if !self.trophies.contains(&trophy.id)
                && trophy.condition.holds(Subject::Global, &self.counters)
            {
                self.trophies.insert(trophy.id.clone());
            }
        }
    }

    pub(crate) fn snapshot(&self, practitioner: &str) -> ProgressSnapshot {
        let catalog = self.catalog;
        let virtues = catalog
            .virtues()
            .iter()
            .map(|v| {
                let xp = self.counters.virtue_xp.get(&v.id).copied().unwrap_or(0);
                let progress = VirtueProgress {
                    xp,
                    level: RankView::at(&v.levels, xp),
                    completions: self
                        .counters
                        .virtue_completions
                        .get(&v.id)
                        .copied()
                        .unwrap_or(0),
                };
                (v.id.clone(), progress)
            })
            .collect();

        ProgressSnapshot {
            practitioner: practitioner.to_string(),
            virtues,
            global_xp: self.counters.global_xp,
            global_level: RankView::at(&catalog.global_levels, self.counters.global_xp),
            title: RankView::at(catalog.list_titles(), self.counters.global_xp),
            streak: self.counters.streak,
            best_streak: self.best_streak,
            last_activity: self.dates.last().copied(),
            unlocked_badges: self.badges.clone(),
            unlocked_trophies: self.trophies.clone(),
            completions: self.counters.completions.clone(),
            event_count: self.events,
        }
    }
}

/// Length of the run of consecutive days ending at the latest date.
fn current_streak(dates: &BTreeSet<NaiveDate>) -> u32 {
    let mut days = dates.iter().rev();
    let Some(mut prev) = days.next().copied() else {
        return 0;
    };
    let mut streak = 1;
    for day in days {
        if prev.pred_opt() != Some(*day) {
            break;
        }
        streak += 1;
        prev = *day;
    }
    streak
}

/// Fold `practitioner`'s events into a snapshot. Events of other
/// practitioners in the slice are ignored.
///
/// `catalog` must have passed [`Catalog::validate`]: against an empty ladder
/// every rank reads as 0.
pub fn project(practitioner: &str, events: &[CompletionEvent], catalog: &Catalog) -> ProgressSnapshot {
    let mut ordered: Vec<&CompletionEvent> = events
        .iter()
        .filter(|e| e.practitioner == practitioner)
        .collect();
    ordered.sort_by_key(|e| e.seq);

    let mut projector = Projector::new(catalog);
    for event in ordered {
        projector.apply(event);
    }
    projector.snapshot(practitioner)
}

// ---------------------------------------------------------------------------
// Diff
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelChange {
    pub from: u32,
    pub to: u32,
}

impl LevelChange {
    pub fn increased(&self) -> bool {
        self.to > self.from
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtueLevelChange {
    pub virtue: String,
    pub from: u32,
    pub to: u32,
}

/// What one completion changed, for driving XP pop-ups and unlock dialogs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressDiff {
    pub xp_added: u64,
    pub level_up: bool,
    pub global_level: LevelChange,
    /// Virtues whose level changed.
    pub virtue_levels: Vec<VirtueLevelChange>,
    /// Set when the title changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_title: Option<String>,
    pub streak: u32,
    pub new_badges: Vec<String>,
    pub new_trophies: Vec<String>,
}

impl ProgressDiff {
    pub fn between(before: &ProgressSnapshot, after: &ProgressSnapshot) -> Self {
        let global_level = LevelChange {
            from: before.global_level.rank,
            to: after.global_level.rank,
        };
        let virtue_levels: Vec<VirtueLevelChange> = after
            .virtues
            .iter()
            .filter_map(|(id, now)| {
                let was = before.virtues.get(id).map(|v| v.level.rank).unwrap_or(0);
                (was != now.level.rank).then(|| VirtueLevelChange {
                    virtue: id.clone(),
                    from: was,
                    to: now.level.rank,
                })
            })
            .collect();
        let level_up = global_level.increased() || virtue_levels.iter().any(|c| c.to > c.from);
        let new_title = (after.title.rank != before.title.rank).then(|| after.title.name.clone());

        Self {
            xp_added: after.global_xp.saturating_sub(before.global_xp),
            level_up,
            global_level,
            virtue_levels,
            new_title,
            streak: after.streak,
            new_badges: after
                .unlocked_badges
                .difference(&before.unlocked_badges)
                .cloned()
                .collect(),
            new_trophies: after
                .unlocked_trophies
                .difference(&before.unlocked_trophies)
                .cloned()
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
