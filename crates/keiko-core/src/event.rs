//! The canonical record of practitioner activity.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::period::Period;

/// Appended by the activity log when a completion is accepted. Never mutated
/// or deleted; every snapshot is a fold over these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionEvent {
    pub id: Uuid,
    /// Position in the log, assigned at append time. Breaks ties between
    /// events on the same date.
    pub seq: u64,
    pub practitioner: String,
    pub challenge: String,
    /// Calendar date the completion counts for.
    pub date: NaiveDate,
    pub period: Period,
    pub recorded_at: DateTime<Utc>,
}

impl CompletionEvent {
    /// Fold order: by completion date, then by log position.
    pub fn fold_key(&self) -> (NaiveDate, u64) {
        (self.date, self.seq)
    }
}

/// A completion that has passed catalog validation but has not been
/// appended yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCompletion {
    pub practitioner: String,
    pub challenge: String,
    pub date: NaiveDate,
    pub period: Period,
}

impl NewCompletion {
    /// Storage key enforcing at most one completion per period.
    pub fn unique_key(&self) -> String {
        completion_key(&self.practitioner, &self.challenge, &self.period)
    }

    pub(crate) fn into_event(self, seq: u64) -> CompletionEvent {
        CompletionEvent {
            id: Uuid::new_v4(),
            seq,
            practitioner: self.practitioner,
            challenge: self.challenge,
            date: self.date,
            period: self.period,
            recorded_at: Utc::now(),
        }
    }
}

/// `practitioner/challenge/period`. Ids cannot contain `/`.
pub fn completion_key(practitioner: &str, challenge: &str, period: &Period) -> String {
    format!("{practitioner}/{challenge}/{}", period.key())
}

/// Sort events into fold order in place.
pub fn sort_for_fold(events: &mut [CompletionEvent]) {
    events.sort_by_key(|e| e.fold_key());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Scope;

    #[test]
    fn unique_key_includes_period() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let nc = NewCompletion {
            practitioner: "aiko".into(),
            challenge: "respect_dojo_care".into(),
            date,
            period: Period::containing(Scope::Weekly, date),
        };
        assert_eq!(nc.unique_key(), "aiko/respect_dojo_care/2026-W42");
    }

    #[test]
    fn fold_order_is_date_then_seq() {
        let d1 = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2026, 10, 2).unwrap();
        let mk = |seq, date| {
            NewCompletion {
                practitioner: "p".into(),
                challenge: "c".into(),
                date,
                period: Period::containing(Scope::Daily, date),
            }
            .into_event(seq)
        };
        let mut events = vec![mk(3, d2), mk(2, d1), mk(1, d2)];
        sort_for_fold(&mut events);
        let order: Vec<u64> = events.iter().map(|e| e.seq).collect();
        assert_eq!(order, vec![2, 1, 3]);
    }
}
