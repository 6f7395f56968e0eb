pub mod catalog;
pub mod complete;
pub mod config;
pub mod history;
pub mod init;
pub mod leaderboard;
pub mod serve;
pub mod snapshot;

use anyhow::Context;
use keiko_core::catalog::Catalog;
use keiko_core::config::Config;
use keiko_core::service::CompletionService;
use std::path::Path;

/// Build the completion service for the data directory at `root`.
pub fn open_service(root: &Path) -> anyhow::Result<CompletionService> {
    let config = Config::load(root).context("failed to load config")?;
    let catalog = Catalog::load(root).context("failed to load catalog")?;
    let log = config
        .open_log(root)
        .context("failed to open activity log")?;
    let service = CompletionService::new(catalog, log)?.with_clock(move || config.today());
    Ok(service)
}
