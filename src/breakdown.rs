//! Breakdown generators, difficulty levels and breakdown naming.
//!
//! A breakdown generator splits the evaluated boxes into shards (e.g. by
//! object type and range). Each shard is evaluated once per difficulty
//! level, and every (generator, shard, level) triple is one [`Breakdown`]
//! with its own AP, APH and PR curves.

use crate::error::{Result, WaymoEvalError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const OBJECT_TYPES: [&str; 4] = ["TYPE_VEHICLE", "TYPE_PEDESTRIAN", "TYPE_SIGN", "TYPE_CYCLIST"];
const RANGE_BUCKETS: [&str; 3] = ["[0, 30)", "[30, 50)", "[50, +inf)"];
const VELOCITY_BUCKETS: [&str; 5] = ["STATIONARY", "SLOW", "MEDIUM", "FAST", "VERY_FAST"];

/// Breakdown generators supported by the detection matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakdownGeneratorId {
    /// All boxes in a single shard.
    OneShard,
    /// One shard per object type.
    ObjectType,
    /// Object type crossed with distance from the sensor.
    Range,
    /// Object type crossed with ground truth speed.
    Velocity,
}

impl BreakdownGeneratorId {
    pub const ALL: [BreakdownGeneratorId; 4] = [
        BreakdownGeneratorId::OneShard,
        BreakdownGeneratorId::ObjectType,
        BreakdownGeneratorId::Range,
        BreakdownGeneratorId::Velocity,
    ];

    /// Enumeration name, as used in configs.
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakdownGeneratorId::OneShard => "ONE_SHARD",
            BreakdownGeneratorId::ObjectType => "OBJECT_TYPE",
            BreakdownGeneratorId::Range => "RANGE",
            BreakdownGeneratorId::Velocity => "VELOCITY",
        }
    }

    /// Number of shards this generator produces.
    pub fn num_shards(&self) -> usize {
        match self {
            BreakdownGeneratorId::OneShard => 1,
            BreakdownGeneratorId::ObjectType => OBJECT_TYPES.len(),
            BreakdownGeneratorId::Range => OBJECT_TYPES.len() * RANGE_BUCKETS.len(),
            BreakdownGeneratorId::Velocity => OBJECT_TYPES.len() * VELOCITY_BUCKETS.len(),
        }
    }

    /// Name of one shard, without the difficulty suffix, or `None` past
    /// the last shard.
    ///
    /// Shards of the type-crossed generators are ordered type-major.
    pub fn shard_name(&self, shard: usize) -> Option<String> {
        match self {
            BreakdownGeneratorId::OneShard => (shard == 0).then(|| self.as_str().to_string()),
            BreakdownGeneratorId::ObjectType => OBJECT_TYPES
                .get(shard)
                .map(|object_type| format!("{}_{}", self.as_str(), object_type)),
            BreakdownGeneratorId::Range => self.crossed_shard_name(shard, &RANGE_BUCKETS),
            BreakdownGeneratorId::Velocity => self.crossed_shard_name(shard, &VELOCITY_BUCKETS),
        }
    }

    fn crossed_shard_name(&self, shard: usize, buckets: &[&str]) -> Option<String> {
        let object_type = OBJECT_TYPES.get(shard / buckets.len())?;
        let bucket = buckets[shard % buckets.len()];
        Some(format!("{}_{}_{}", self.as_str(), object_type, bucket))
    }
}

impl FromStr for BreakdownGeneratorId {
    type Err = WaymoEvalError;

    fn from_str(s: &str) -> Result<Self> {
        BreakdownGeneratorId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| WaymoEvalError::UnknownBreakdown(s.to_string()))
    }
}

impl fmt::Display for BreakdownGeneratorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label difficulty level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DifficultyLevel {
    #[serde(rename = "LEVEL_1")]
    Level1,
    #[serde(rename = "LEVEL_2")]
    Level2,
}

impl DifficultyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyLevel::Level1 => "LEVEL_1",
            DifficultyLevel::Level2 => "LEVEL_2",
        }
    }
}

/// Difficulty levels evaluated for one breakdown generator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Difficulty {
    pub levels: Vec<DifficultyLevel>,
}

impl Difficulty {
    /// Levels actually evaluated. An empty list means `LEVEL_2` only.
    pub fn resolved_levels(&self) -> Vec<DifficultyLevel> {
        if self.levels.is_empty() {
            vec![DifficultyLevel::Level2]
        } else {
            self.levels.clone()
        }
    }
}

/// One evaluated slice of the data: a generator shard at a difficulty level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Breakdown {
    generator: BreakdownGeneratorId,
    shard: usize,
    level: DifficultyLevel,
}

impl Breakdown {
    /// The overall breakdown: all data, default difficulty.
    pub fn overall() -> Self {
        Self {
            generator: BreakdownGeneratorId::OneShard,
            shard: 0,
            level: DifficultyLevel::Level2,
        }
    }

    pub fn generator(&self) -> BreakdownGeneratorId {
        self.generator
    }

    pub fn shard(&self) -> usize {
        self.shard
    }

    pub fn level(&self) -> DifficultyLevel {
        self.level
    }

    /// Display name, e.g. `RANGE_TYPE_VEHICLE_[0, 30)_LEVEL_2`.
    pub fn name(&self) -> String {
        // Fields are private, so the shard is always in range.
        let shard_name = self
            .generator
            .shard_name(self.shard)
            .unwrap_or_else(|| self.generator.as_str().to_string());
        format!("{}_{}", shard_name, self.level.as_str())
    }
}

impl fmt::Display for Breakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Expand generator ids and their difficulties into the ordered breakdown list.
///
/// This is the order of every per-breakdown array returned by the matcher:
/// generators in config order, then shards, then difficulty levels.
pub fn expand_breakdowns(
    generator_ids: &[BreakdownGeneratorId],
    difficulties: &[Difficulty],
) -> Vec<Breakdown> {
    let mut breakdowns = Vec::new();
    for (generator, difficulty) in generator_ids.iter().zip(difficulties) {
        let levels = difficulty.resolved_levels();
        for shard in 0..generator.num_shards() {
            for &level in &levels {
                breakdowns.push(Breakdown {
                    generator: *generator,
                    shard,
                    level,
                });
            }
        }
    }
    breakdowns
}
