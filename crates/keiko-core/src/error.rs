use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeikoError {
    #[error("not initialized: run 'keiko init'")]
    NotInitialized,

    #[error("unknown challenge: {0}")]
    UnknownChallenge(String),

    #[error("unknown virtue: {0}")]
    UnknownVirtue(String),

    #[error("invalid id '{0}': must be alphanumeric with '-', '_' or '.'")]
    InvalidId(String),

    #[error("invalid scope '{0}': expected 'daily' or 'weekly'")]
    InvalidScope(String),

    #[error("activity log unavailable: {0}")]
    LogUnavailable(String),

    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl KeikoError {
    /// Only storage failures leave domain state untouched and are worth a retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LogUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, KeikoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_log_unavailable_is_retryable() {
        assert!(KeikoError::LogUnavailable("disk".into()).is_retryable());
        assert!(!KeikoError::UnknownChallenge("x".into()).is_retryable());
        assert!(!KeikoError::InvalidCatalog("x".into()).is_retryable());
    }
}
