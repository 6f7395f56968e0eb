//! Immutable reference data: virtues, levels, challenges, badges, trophies
//! and titles.
//!
//! The catalog is loaded once at process start (from `.keiko/catalog.yaml`
//! or the built-in dataset) and must pass [`Catalog::validate`] before the
//! engine serves anything. After that, lookups never fail for ids that come
//! from the catalog itself; an unknown id from a caller is an input error.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::condition::Condition;
use crate::error::{KeikoError, Result};
use crate::paths;
use crate::types::Scope;

/// Source of the built-in catalog, as shipped.
pub const BUILTIN_CATALOG: &str = include_str!("../data/catalog.yaml");

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub rank: u32,
    pub name: String,
    pub xp_required: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Title {
    pub rank: u32,
    pub name: String,
    pub xp_required: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Virtue {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(default)]
    pub description: String,
    pub levels: Vec<Level>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: String,
    pub scope: Scope,
    pub xp: u64,
    /// `None` for global challenges.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtue: Option<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub id: String,
    pub virtue: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub condition: Condition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trophy {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub condition: Condition,
}

// ---------------------------------------------------------------------------
// Threshold ladders
// ---------------------------------------------------------------------------

/// An entry of an ordered XP ladder (virtue levels, global levels, titles).
pub trait Threshold {
    fn rank(&self) -> u32;
    fn name(&self) -> &str;
    fn emoji(&self) -> Option<&str>;
    fn xp_required(&self) -> u64;
}

impl Threshold for Level {
    fn rank(&self) -> u32 {
        self.rank
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn emoji(&self) -> Option<&str> {
        self.emoji.as_deref()
    }
    fn xp_required(&self) -> u64 {
        self.xp_required
    }
}

impl Threshold for Title {
    fn rank(&self) -> u32 {
        self.rank
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn emoji(&self) -> Option<&str> {
        self.emoji.as_deref()
    }
    fn xp_required(&self) -> u64 {
        self.xp_required
    }
}

/// Highest entry whose `xp_required <= xp`. Ladders are strictly increasing
/// after validation, so a binary search is enough.
pub fn reached<T: Threshold>(ladder: &[T], xp: u64) -> Option<&T> {
    let idx = ladder.partition_point(|t| t.xp_required() <= xp);
    idx.checked_sub(1).and_then(|i| ladder.get(i))
}

/// The entry after the one reached at `xp`, or `None` at the top of the ladder.
pub fn next_after<T: Threshold>(ladder: &[T], xp: u64) -> Option<&T> {
    let idx = ladder.partition_point(|t| t.xp_required() <= xp);
    ladder.get(idx)
}

fn validate_ladder<T: Threshold>(what: &str, ladder: &[T]) -> Result<()> {
    let Some(first) = ladder.first() else {
        return Err(KeikoError::InvalidCatalog(format!("{what}: no thresholds")));
    };
    if first.xp_required() != 0 {
        return Err(KeikoError::InvalidCatalog(format!(
            "{what}: first threshold must be 0, got {}",
            first.xp_required()
        )));
    }
    for pair in ladder.windows(2) {
        if pair[1].xp_required() <= pair[0].xp_required() {
            return Err(KeikoError::InvalidCatalog(format!(
                "{what}: thresholds must be strictly increasing ({} then {})",
                pair[0].xp_required(),
                pair[1].xp_required()
            )));
        }
    }
    for (i, t) in ladder.iter().enumerate() {
        let expected = i as u32 + 1;
        if t.rank() != expected {
            return Err(KeikoError::InvalidCatalog(format!(
                "{what}: rank {} at position {}, expected {expected}",
                t.rank(),
                i + 1
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default = "default_version")]
    pub version: u32,
    pub virtues: Vec<Virtue>,
    /// Ladder applied to total XP across all virtues.
    pub global_levels: Vec<Level>,
    pub challenges: Vec<Challenge>,
    #[serde(default)]
    pub badges: Vec<Badge>,
    #[serde(default)]
    pub trophies: Vec<Trophy>,
    pub titles: Vec<Title>,
}

fn default_version() -> u32 {
    1
}

impl Catalog {
    /// The dataset shipped with keiko.
    pub fn builtin() -> Result<Self> {
        Self::from_yaml(BUILTIN_CATALOG)
    }

    /// Parse and validate a catalog document.
    pub fn from_yaml(data: &str) -> Result<Self> {
        let catalog: Catalog = serde_yaml::from_str(data)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load `.keiko/catalog.yaml` if present, otherwise the built-in catalog.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::catalog_path(root);
        if !path.exists() {
            tracing::debug!("no catalog at {}, using built-in", path.display());
            return Self::builtin();
        }
        let data = std::fs::read_to_string(&path)?;
        Self::from_yaml(&data)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::catalog_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    pub fn virtues(&self) -> &[Virtue] {
        &self.virtues
    }

    pub fn get_virtue(&self, id: &str) -> Result<&Virtue> {
        self.virtues
            .iter()
            .find(|v| v.id == id)
            .ok_or_else(|| KeikoError::UnknownVirtue(id.to_string()))
    }

    pub fn challenge(&self, id: &str) -> Result<&Challenge> {
        self.challenges
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| KeikoError::UnknownChallenge(id.to_string()))
    }

    pub fn list_challenges(&self, scope: Scope) -> Vec<&Challenge> {
        self.challenges.iter().filter(|c| c.scope == scope).collect()
    }

    pub fn list_badges(&self, virtue_id: &str) -> Result<Vec<&Badge>> {
        self.get_virtue(virtue_id)?;
        Ok(self
            .badges
            .iter()
            .filter(|b| b.virtue == virtue_id)
            .collect())
    }

    pub fn list_trophies(&self) -> &[Trophy] {
        &self.trophies
    }

    pub fn list_titles(&self) -> &[Title] {
        &self.titles
    }

    // -----------------------------------------------------------------------
    // Derived ranks
    // -----------------------------------------------------------------------

    /// The level borrows from `virtue`, which need not belong to this catalog.
    pub fn virtue_level<'a>(&self, virtue: &'a Virtue, xp: u64) -> Option<&'a Level> {
        reached(&virtue.levels, xp)
    }

    pub fn global_level(&self, xp: u64) -> Option<&Level> {
        reached(&self.global_levels, xp)
    }

    pub fn title_for(&self, xp: u64) -> Option<&Title> {
        reached(&self.titles, xp)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    /// Startup-time contract check. A catalog that fails here must not be
    /// served.
    pub fn validate(&self) -> Result<()> {
        if self.virtues.is_empty() {
            return Err(KeikoError::InvalidCatalog("no virtues defined".into()));
        }

        let mut ids: HashSet<&str> = HashSet::new();
        let all_ids = self
            .virtues
            .iter()
            .map(|v| v.id.as_str())
            .chain(self.challenges.iter().map(|c| c.id.as_str()))
            .chain(self.badges.iter().map(|b| b.id.as_str()))
            .chain(self.trophies.iter().map(|t| t.id.as_str()));
        for id in all_ids {
            paths::validate_id(id)
                .map_err(|_| KeikoError::InvalidCatalog(format!("malformed id '{id}'")))?;
            if !ids.insert(id) {
                return Err(KeikoError::InvalidCatalog(format!("duplicate id '{id}'")));
            }
        }

        for virtue in &self.virtues {
            validate_ladder(&format!("virtue '{}' levels", virtue.id), &virtue.levels)?;
        }
        validate_ladder("global levels", &self.global_levels)?;
        validate_ladder("titles", &self.titles)?;

        let virtue_ids: HashSet<&str> = self.virtues.iter().map(|v| v.id.as_str()).collect();
        let challenge_ids: HashSet<&str> = self.challenges.iter().map(|c| c.id.as_str()).collect();

        for c in &self.challenges {
            if c.xp == 0 {
                return Err(KeikoError::InvalidCatalog(format!(
                    "challenge '{}' must award positive XP",
                    c.id
                )));
            }
            if let Some(v) = &c.virtue {
                if !virtue_ids.contains(v.as_str()) {
                    return Err(KeikoError::InvalidCatalog(format!(
                        "challenge '{}' references unknown virtue '{v}'",
                        c.id
                    )));
                }
            }
        }

        for b in &self.badges {
            if !virtue_ids.contains(b.virtue.as_str()) {
                return Err(KeikoError::InvalidCatalog(format!(
                    "badge '{}' references unknown virtue '{}'",
                    b.id, b.virtue
                )));
            }
        }

        let conditions = self
            .badges
            .iter()
            .map(|b| (b.id.as_str(), &b.condition))
            .chain(self.trophies.iter().map(|t| (t.id.as_str(), &t.condition)));
        for (owner, condition) in conditions {
            if let Some(c) = condition.referenced_challenge() {
                if !challenge_ids.contains(c) {
                    return Err(KeikoError::InvalidCatalog(format!(
                        "'{owner}' condition references unknown challenge '{c}'"
                    )));
                }
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
