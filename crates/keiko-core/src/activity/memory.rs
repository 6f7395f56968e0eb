//! In-process activity log, used for tests and throwaway servers.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use crate::error::{KeikoError, Result};
use crate::event::{completion_key, sort_for_fold, CompletionEvent, NewCompletion};
use crate::period::Period;

use super::{ActivityLog, AppendOutcome};

#[derive(Default)]
struct Inner {
    events: Vec<CompletionEvent>,
    /// Completion key -> index into `events`.
    keys: HashMap<String, usize>,
}

/// Both the uniqueness index and the event list sit behind one mutex, which
/// makes check-and-insert a single critical section.
#[derive(Default)]
pub struct MemoryLog {
    inner: Mutex<Inner>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| KeikoError::LogUnavailable("memory log lock poisoned".into()))
    }
}

impl ActivityLog for MemoryLog {
    fn append(&self, completion: NewCompletion) -> Result<AppendOutcome> {
        let mut inner = self.lock()?;
        let key = completion.unique_key();
        if let Some(&idx) = inner.keys.get(&key) {
            return Ok(AppendOutcome::Duplicate(inner.events[idx].clone()));
        }
        let seq = inner.events.len() as u64 + 1;
        let event = completion.into_event(seq);
        inner.events.push(event.clone());
        let idx = inner.events.len() - 1;
        inner.keys.insert(key, idx);
        Ok(AppendOutcome::Inserted(event))
    }

    fn query(
        &self,
        practitioner: &str,
        challenge: &str,
        period: &Period,
    ) -> Result<Vec<CompletionEvent>> {
        let inner = self.lock()?;
        let key = completion_key(practitioner, challenge, period);
        Ok(inner
            .keys
            .get(&key)
            .map(|&idx| vec![inner.events[idx].clone()])
            .unwrap_or_default())
    }

    fn events_for(&self, practitioner: &str) -> Result<Vec<CompletionEvent>> {
        let mut events: Vec<CompletionEvent> = self
            .lock()?
            .events
            .iter()
            .filter(|e| e.practitioner == practitioner)
            .cloned()
            .collect();
        sort_for_fold(&mut events);
        Ok(events)
    }

    fn practitioners(&self) -> Result<Vec<String>> {
        let inner = self.lock()?;
        let ids: BTreeSet<&str> = inner.events.iter().map(|e| e.practitioner.as_str()).collect();
        Ok(ids.into_iter().map(str::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::contract;
    use std::sync::Arc;

    #[test]
    fn rejects_second_append_in_period() {
        contract::rejects_second_append_in_period(&MemoryLog::new());
    }

    #[test]
    fn accepts_next_period() {
        contract::accepts_next_period(&MemoryLog::new());
    }

    #[test]
    fn keys_are_per_practitioner() {
        contract::keys_are_per_practitioner(&MemoryLog::new());
    }

    #[test]
    fn query_returns_period_events() {
        contract::query_returns_period_events(&MemoryLog::new());
    }

    #[test]
    fn events_come_back_in_fold_order() {
        contract::events_come_back_in_fold_order(&MemoryLog::new());
    }

    #[test]
    fn racing_appends_insert_once() {
        contract::racing_appends_insert_once(Arc::new(MemoryLog::new()));
    }
}
