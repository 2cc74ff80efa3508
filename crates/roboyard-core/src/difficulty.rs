//! Difficulty tiers and their accepted solution lengths.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Inclusive range of optimal solution lengths a tier accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyBand {
    /// Fewest moves accepted.
    pub min_moves: usize,
    /// Most moves accepted, `None` for unbounded.
    pub max_moves: Option<usize>,
}

impl DifficultyBand {
    /// Returns `true` if a solution of `moves` moves falls inside the band.
    #[must_use]
    pub fn contains(&self, moves: usize) -> bool {
        moves >= self.min_moves && self.max_moves.map_or(true, |max| moves <= max)
    }
}

impl fmt::Display for DifficultyBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max_moves {
            Some(max) => write!(f, "[{}, {max}]", self.min_moves),
            None => write!(f, "[{}, inf)", self.min_moves),
        }
    }
}

/// Difficulty tiers, numbered 1 to 4.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DifficultyTier {
    /// Tier 1, 4 to 6 moves.
    #[default]
    Beginner,
    /// Tier 2, 6 to 8 moves.
    Advanced,
    /// Tier 3, at least 10 moves.
    Insane,
    /// Tier 4, at least 17 moves.
    Impossible,
}

impl DifficultyTier {
    /// All tiers from easiest to hardest.
    pub const ALL: [Self; 4] = [Self::Beginner, Self::Advanced, Self::Insane, Self::Impossible];

    /// The band of optimal solution lengths this tier accepts.
    #[must_use]
    pub const fn band(self) -> DifficultyBand {
        let (min_moves, max_moves) = match self {
            Self::Beginner => (4, Some(6)),
            Self::Advanced => (6, Some(8)),
            Self::Insane => (10, None),
            Self::Impossible => (17, None),
        };
        DifficultyBand {
            min_moves,
            max_moves,
        }
    }

    /// Tier number, 1 for beginner through 4 for impossible.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Beginner => 1,
            Self::Advanced => 2,
            Self::Insane => 3,
            Self::Impossible => 4,
        }
    }

    /// Looks a tier up by number.
    #[must_use]
    pub const fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Beginner),
            2 => Some(Self::Advanced),
            3 => Some(Self::Insane),
            4 => Some(Self::Impossible),
            _ => None,
        }
    }

    /// Lower-case tier name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Advanced => "advanced",
            Self::Insane => "insane",
            Self::Impossible => "impossible",
        }
    }

    /// Parses a tier name or number, case-insensitively.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "beginner" | "1" => Some(Self::Beginner),
            "advanced" | "2" => Some(Self::Advanced),
            "insane" | "3" => Some(Self::Insane),
            "impossible" | "4" => Some(Self::Impossible),
            _ => None,
        }
    }
}

impl fmt::Display for DifficultyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl<'de> Deserialize<'de> for DifficultyTier {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str_case_insensitive(&s).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid difficulty '{s}': expected one of 'beginner', 'advanced', 'insane', 'impossible'"
            ))
        })
    }
}

impl Serialize for DifficultyTier {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.name())
    }
}
