//! Badge and trophy unlock conditions.
//!
//! A [`Condition`] is a named predicate over a practitioner's aggregate
//! [`Counters`]. The same condition means slightly different things depending
//! on the [`Subject`] it is evaluated for: a badge is scoped to its virtue, a
//! trophy to the practitioner as a whole.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Condition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    /// Current streak reached `days` consecutive days.
    StreakAtLeast { days: u32 },
    /// Subject XP (virtue XP for badges, total XP for trophies).
    XpAtLeast { xp: u64 },
    /// Subject level (virtue level for badges, global level for trophies).
    LevelAtLeast { level: u32 },
    /// Completion count of one challenge, or of every challenge in scope
    /// when `challenge` is omitted.
    CompletionsAtLeast {
        count: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        challenge: Option<String>,
    },
    /// Every virtue is at `level` or above.
    AllLevelsAtLeast { level: u32 },
    /// Every virtue sits on the same level, and that level is at least `min_level`.
    AllLevelsEqual { min_level: u32 },
}

/// What a condition is evaluated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject<'a> {
    Virtue(&'a str),
    Global,
}

impl Condition {
    pub fn holds(&self, subject: Subject<'_>, counters: &Counters) -> bool {
        match self {
            Condition::StreakAtLeast { days } => counters.streak >= *days,
            Condition::XpAtLeast { xp } => counters.xp(subject) >= *xp,
            Condition::LevelAtLeast { level } => counters.level(subject) >= *level,
            Condition::CompletionsAtLeast { count, challenge } => {
                let done = match (challenge, subject) {
                    (Some(c), _) => counters.completions.get(c).copied().unwrap_or(0),
                    (None, Subject::Virtue(v)) => {
                        counters.virtue_completions.get(v).copied().unwrap_or(0)
                    }
                    (None, Subject::Global) => counters.total_completions,
                };
                done >= *count
            }
            Condition::AllLevelsAtLeast { level } => {
                !counters.virtue_level.is_empty()
                    && counters.virtue_level.values().all(|l| l >= level)
            }
            Condition::AllLevelsEqual { min_level } => {
                let mut levels = counters.virtue_level.values();
                match levels.next() {
                    Some(first) => *first >= *min_level && levels.all(|l| l == first),
                    None => false,
                }
            }
        }
    }

    /// Challenge id this condition depends on, if any.
    pub fn referenced_challenge(&self) -> Option<&str> {
        match self {
            Condition::CompletionsAtLeast {
                challenge: Some(c), ..
            } => Some(c),
            _ => None,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::StreakAtLeast { days } => write!(f, "streak >= {days}"),
            Condition::XpAtLeast { xp } => write!(f, "xp >= {xp}"),
            Condition::LevelAtLeast { level } => write!(f, "level >= {level}"),
            Condition::CompletionsAtLeast {
                count,
                challenge: Some(c),
            } => write!(f, "{c} completed >= {count}"),
            Condition::CompletionsAtLeast {
                count,
                challenge: None,
            } => write!(f, "completions >= {count}"),
            Condition::AllLevelsAtLeast { level } => write!(f, "all virtue levels >= {level}"),
            Condition::AllLevelsEqual { min_level } => {
                write!(f, "all virtue levels equal (>= {min_level})")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Counters
// ---------------------------------------------------------------------------

/// Aggregate facts about a practitioner that conditions are evaluated against.
///
/// Every field only grows as events are appended, except `streak` (reset on a
/// gap) and `virtue_level` equality.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Counters {
    pub virtue_xp: BTreeMap<String, u64>,
    pub virtue_level: BTreeMap<String, u32>,
    pub global_xp: u64,
    pub global_level: u32,
    pub streak: u32,
    pub completions: BTreeMap<String, u32>,
    pub virtue_completions: BTreeMap<String, u32>,
    pub total_completions: u32,
}

impl Counters {
    fn xp(&self, subject: Subject<'_>) -> u64 {
        match subject {
            Subject::Virtue(v) => self.virtue_xp.get(v).copied().unwrap_or(0),
            Subject::Global => self.global_xp,
        }
    }

    fn level(&self, subject: Subject<'_>) -> u32 {
        match subject {
            Subject::Virtue(v) => self.virtue_level.get(v).copied().unwrap_or(0),
            Subject::Global => self.global_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counters() -> Counters {
        let mut c = Counters {
            global_xp: 420,
            global_level: 3,
            streak: 7,
            total_completions: 12,
            ..Default::default()
        };
        c.virtue_xp.insert("courage".into(), 160);
        c.virtue_xp.insert("respect".into(), 60);
        c.virtue_level.insert("courage".into(), 3);
        c.virtue_level.insert("respect".into(), 2);
        c.completions.insert("courage_ukemi".into(), 10);
        c.virtue_completions.insert("courage".into(), 11);
        c
    }

    #[test]
    fn xp_and_level_follow_subject() {
        let c = counters();
        let xp = Condition::XpAtLeast { xp: 150 };
        assert!(xp.holds(Subject::Virtue("courage"), &c));
        assert!(!xp.holds(Subject::Virtue("respect"), &c));
        assert!(xp.holds(Subject::Global, &c));

        let lvl = Condition::LevelAtLeast { level: 3 };
        assert!(lvl.holds(Subject::Virtue("courage"), &c));
        assert!(!lvl.holds(Subject::Virtue("respect"), &c));
        assert!(lvl.holds(Subject::Global, &c));
    }

    #[test]
    fn completions_by_challenge_or_scope() {
        let c = counters();
        let helped = Condition::CompletionsAtLeast {
            count: 10,
            challenge: Some("courage_ukemi".into()),
        };
        assert!(helped.holds(Subject::Global, &c));

        let any = Condition::CompletionsAtLeast {
            count: 11,
            challenge: None,
        };
        assert!(any.holds(Subject::Virtue("courage"), &c));
        assert!(!any.holds(Subject::Virtue("respect"), &c));
        assert!(any.holds(Subject::Global, &c));
    }

    #[test]
    fn streak_condition() {
        let c = counters();
        assert!(Condition::StreakAtLeast { days: 7 }.holds(Subject::Global, &c));
        assert!(!Condition::StreakAtLeast { days: 8 }.holds(Subject::Global, &c));
    }

    #[test]
    fn all_levels_equal_requires_min_level() {
        let mut c = counters();
        assert!(!Condition::AllLevelsEqual { min_level: 2 }.holds(Subject::Global, &c));
        c.virtue_level.insert("respect".into(), 3);
        assert!(Condition::AllLevelsEqual { min_level: 2 }.holds(Subject::Global, &c));
        assert!(!Condition::AllLevelsEqual { min_level: 4 }.holds(Subject::Global, &c));
        assert!(Condition::AllLevelsAtLeast { level: 3 }.holds(Subject::Global, &c));
    }

    #[test]
    fn no_virtues_never_satisfies_all_levels() {
        let c = Counters::default();
        assert!(!Condition::AllLevelsEqual { min_level: 0 }.holds(Subject::Global, &c));
        assert!(!Condition::AllLevelsAtLeast { level: 0 }.holds(Subject::Global, &c));
    }

    #[test]
    fn yaml_uses_kind_tag() {
        let c: Condition =
            serde_yaml::from_str("kind: completions_at_least\ncount: 10\nchallenge: x").unwrap();
        assert_eq!(
            c,
            Condition::CompletionsAtLeast {
                count: 10,
                challenge: Some("x".into())
            }
        );
        assert_eq!(c.referenced_challenge(), Some("x"));
        assert_eq!(c.to_string(), "x completed >= 10");
    }
}
