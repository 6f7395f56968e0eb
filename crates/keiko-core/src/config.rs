use crate::activity::{ActivityLog, MemoryLog, RedbLog};
use crate::error::{KeikoError, Result};
use crate::paths;
use chrono::{FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// DojoConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DojoConfig {
    pub name: String,
    /// Offset from UTC of the dojo's calendar day. Decides which day
    /// "today" is when a completion arrives without a date.
    #[serde(default)]
    pub timezone_offset_minutes: i32,
}

// ---------------------------------------------------------------------------
// StorageConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Redb,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_log_path")]
    pub path: PathBuf,
}

fn default_log_path() -> PathBuf {
    PathBuf::from(paths::DEFAULT_LOG_FILE)
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_log_path(),
        }
    }
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    7410
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    pub dojo: DojoConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

fn default_version() -> u32 {
    1
}

/// UTC offsets in use span -12:00 to +14:00.
const OFFSET_RANGE_MINUTES: std::ops::RangeInclusive<i32> = -12 * 60..=14 * 60;

impl Config {
    pub fn new(dojo_name: impl Into<String>) -> Self {
        Self {
            version: 1,
            dojo: DojoConfig {
                name: dojo_name.into(),
                timezone_offset_minutes: 0,
            },
            storage: StorageConfig::default(),
            server: ServerConfig::default(),
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(KeikoError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    /// The dojo's current calendar date.
    pub fn today(&self) -> NaiveDate {
        let now = Utc::now();
        let offset = self
            .dojo
            .timezone_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt);
        match offset {
            Some(offset) => now.with_timezone(&offset).date_naive(),
            None => now.date_naive(),
        }
    }

    pub fn log_path(&self, root: &Path) -> PathBuf {
        paths::resolve_in_root(root, &self.storage.path)
    }

    /// Open the configured activity log.
    pub fn open_log(&self, root: &Path) -> Result<Arc<dyn ActivityLog>> {
        match self.storage.backend {
            StorageBackend::Redb => Ok(Arc::new(RedbLog::open(&self.log_path(root))?)),
            StorageBackend::Memory => {
                tracing::warn!("using in-memory activity log; completions will not persist");
                Ok(Arc::new(MemoryLog::new()))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.dojo.name.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "dojo.name is empty".to_string(),
            });
        }

        if !OFFSET_RANGE_MINUTES.contains(&self.dojo.timezone_offset_minutes) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "dojo.timezone_offset_minutes {} is outside -720..=840",
                    self.dojo.timezone_offset_minutes
                ),
            });
        }

        if self.storage.backend == StorageBackend::Memory {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "storage.backend is 'memory': completions are lost on restart".to_string(),
            });
        } else if self.storage.path.as_os_str().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "storage.path is empty".to_string(),
            });
        }

        if self.server.port == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "server.port is 0: an ephemeral port will be chosen".to_string(),
            });
        }

        warnings
    }
}
