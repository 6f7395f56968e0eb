//! The append-only activity log.
//!
//! The log is the only source of truth. It owns one invariant: at most one
//! completion of a challenge by a practitioner per reset period. Implementations
//! must make the uniqueness check and the insert a single indivisible step, so
//! that of several racing appends for the same key exactly one is inserted and
//! the rest observe [`AppendOutcome::Duplicate`].

pub mod db;
pub mod memory;

pub use db::RedbLog;
pub use memory::MemoryLog;

use crate::error::Result;
use crate::event::{CompletionEvent, NewCompletion};
use crate::period::Period;

/// Result of an append attempt. Both variants are successful log operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    Inserted(CompletionEvent),
    /// The key was already taken; carries the event that holds it.
    Duplicate(CompletionEvent),
}

pub trait ActivityLog: Send + Sync {
    /// Atomically insert `completion` unless its
    /// `(practitioner, challenge, period)` key is already recorded.
    fn append(&self, completion: NewCompletion) -> Result<AppendOutcome>;

    /// Events of `practitioner` for `challenge` within `period`.
    fn query(
        &self,
        practitioner: &str,
        challenge: &str,
        period: &Period,
    ) -> Result<Vec<CompletionEvent>>;

    /// Every event of `practitioner`, in fold order.
    fn events_for(&self, practitioner: &str) -> Result<Vec<CompletionEvent>>;

    /// Ids of every practitioner with at least one event, sorted.
    fn practitioners(&self) -> Result<Vec<String>>;
}

impl<L: ActivityLog + ?Sized> ActivityLog for std::sync::Arc<L> {
    fn append(&self, completion: NewCompletion) -> Result<AppendOutcome> {
        (**self).append(completion)
    }

    fn query(
        &self,
        practitioner: &str,
        challenge: &str,
        period: &Period,
    ) -> Result<Vec<CompletionEvent>> {
        (**self).query(practitioner, challenge, period)
    }

    fn events_for(&self, practitioner: &str) -> Result<Vec<CompletionEvent>> {
        (**self).events_for(practitioner)
    }

    fn practitioners(&self) -> Result<Vec<String>> {
        (**self).practitioners()
    }
}

impl<L: ActivityLog + ?Sized> ActivityLog for Box<L> {
    fn append(&self, completion: NewCompletion) -> Result<AppendOutcome> {
        (**self).append(completion)
    }

    fn query(
        &self,
        practitioner: &str,
        challenge: &str,
        period: &Period,
    ) -> Result<Vec<CompletionEvent>> {
        (**self).query(practitioner, challenge, period)
    }

    fn events_for(&self, practitioner: &str) -> Result<Vec<CompletionEvent>> {
        (**self).events_for(practitioner)
    }

    fn practitioners(&self) -> Result<Vec<String>> {
        (**self).practitioners()
    }
}
