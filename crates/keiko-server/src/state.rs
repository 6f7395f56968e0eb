use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use keiko_core::catalog::Catalog;
use keiko_core::config::Config;
use keiko_core::event::CompletionEvent;
use keiko_core::projection::ProgressDiff;
use keiko_core::service::CompletionService;
use serde::Serialize;
use tokio::sync::broadcast;

/// Broadcast on `/api/events` for every accepted completion.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionNotice {
    pub practitioner: String,
    pub challenge: String,
    pub date: NaiveDate,
    pub xp_added: u64,
    pub global_xp: u64,
    pub level_up: bool,
    pub new_badges: Vec<String>,
    pub new_trophies: Vec<String>,
}

impl CompletionNotice {
    pub fn new(event: &CompletionEvent, diff: &ProgressDiff, global_xp: u64) -> Self {
        Self {
            practitioner: event.practitioner.clone(),
            challenge: event.challenge.clone(),
            date: event.date,
            xp_added: diff.xp_added,
            global_xp,
            level_up: diff.level_up,
            new_badges: diff.new_badges.clone(),
            new_trophies: diff.new_trophies.clone(),
        }
    }
}

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CompletionService>,
    pub event_tx: broadcast::Sender<CompletionNotice>,
}

impl AppState {
    pub fn new(service: CompletionService) -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            service: Arc::new(service),
            event_tx: tx,
        }
    }

    /// Build the service from the data directory at `root`: config, catalog
    /// and activity log. Fails when the catalog does not validate.
    pub fn load(root: &Path) -> keiko_core::Result<Self> {
        let config = Config::load(root)?;
        let catalog = Catalog::load(root)?;
        let log = config.open_log(root)?;
        let service = CompletionService::new(catalog, log)?.with_clock(move || config.today());
        Ok(Self::new(service))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keiko_core::activity::MemoryLog;

    #[test]
    fn new_state_has_no_subscribers() {
        let service =
            CompletionService::new(Catalog::builtin().unwrap(), Arc::new(MemoryLog::new()))
                .unwrap();
        let state = AppState::new(service);
        assert_eq!(state.event_tx.receiver_count(), 0);
    }

    #[test]
    fn load_requires_init() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            AppState::load(dir.path()),
            Err(keiko_core::KeikoError::NotInitialized)
        ));
    }
}
