use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

/// Reset period of a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Daily,
    Weekly,
}

impl Scope {
    pub fn all() -> &'static [Scope] {
        &[Scope::Daily, Scope::Weekly]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Daily => "daily",
            Scope::Weekly => "weekly",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Scope {
    type Err = crate::error::KeikoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Scope::Daily),
            "weekly" => Ok(Scope::Weekly),
            _ => Err(crate::error::KeikoError::InvalidScope(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// StreakStatus
// ---------------------------------------------------------------------------

/// Read-time view of a streak relative to "today".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakStatus {
    /// Practiced today.
    Active,
    /// Practiced yesterday; today's completion keeps the streak alive.
    AtRisk,
    /// No activity yesterday or today, or no activity at all.
    Lapsed,
}

impl StreakStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StreakStatus::Active => "active",
            StreakStatus::AtRisk => "at_risk",
            StreakStatus::Lapsed => "lapsed",
        }
    }
}

impl fmt::Display for StreakStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_round_trips_through_str() {
        for scope in Scope::all() {
            let parsed: Scope = scope.as_str().parse().unwrap();
            assert_eq!(parsed, *scope);
        }
    }

    #[test]
    fn unknown_scope_is_rejected() {
        let err = "monthly".parse::<Scope>().unwrap_err();
        assert!(err.to_string().contains("monthly"));
    }

    #[test]
    fn scope_serializes_snake_case() {
        let json = serde_json::to_string(&Scope::Weekly).unwrap();
        assert_eq!(json, "\"weekly\"");
        let status = serde_json::to_string(&StreakStatus::AtRisk).unwrap();
        assert_eq!(status, "\"at_risk\"");
    }
}
