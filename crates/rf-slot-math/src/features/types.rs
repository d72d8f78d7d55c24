//! Feature events

use serde::{Deserialize, Serialize};

use crate::grid::Position;
use crate::symbols::SymbolId;

/// Free spins granted by a scatter trigger
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FreeSpinsAward {
    pub scatter_count: usize,
    pub spins: u32,
    /// Applied to every win of the session
    pub multiplier: f64,
}

/// Cascade parameters carried by a cascade trigger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadePlan {
    /// Win multiplier per cascade step; the last value repeats
    pub multipliers: Vec<f64>,
    pub max_cascades: usize,
}

impl CascadePlan {
    /// Multiplier for a step (0 = the initial evaluation)
    pub fn multiplier_for_step(&self, step: usize) -> f64 {
        match self.multipliers.get(step) {
            Some(&m) => m,
            None => self.multipliers.last().copied().unwrap_or(1.0),
        }
    }
}

/// A feature triggered by one spin. Emitted, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BonusFeature {
    FreeSpins(FreeSpinsAward),
    /// Scatter hit inside a running session; extends it by `spins`
    Retrigger { scatter_count: usize, spins: u32 },
    Cascade(CascadePlan),
    ExpandingWild { reels: Vec<usize> },
    Multiplier { value: f64 },
    BonusGame {
        symbol_count: usize,
        positions: Vec<Position>,
    },
}

impl BonusFeature {
    /// Wire name of the feature kind
    pub fn kind(&self) -> &'static str {
        match self {
            BonusFeature::FreeSpins(_) => "freespins",
            BonusFeature::Retrigger { .. } => "retrigger",
            BonusFeature::Cascade(_) => "cascade",
            BonusFeature::ExpandingWild { .. } => "expanding_wild",
            BonusFeature::Multiplier { .. } => "multiplier",
            BonusFeature::BonusGame { .. } => "bonus_game",
        }
    }
}

/// A grid change made by outcome forcing before evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ForcedOutcome {
    /// Scatters placed to reach the trigger count
    Scatter { positions: Vec<Position> },
    /// A row filled with the jackpot symbol
    Jackpot { row: usize, symbol: SymbolId },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progression_clamps_to_last() {
        let plan = CascadePlan {
            multipliers: vec![1.0, 2.0, 3.0, 5.0, 8.0, 10.0],
            max_cascades: 6,
        };
        assert_eq!(plan.multiplier_for_step(0), 1.0);
        assert_eq!(plan.multiplier_for_step(4), 8.0);
        assert_eq!(plan.multiplier_for_step(6), 10.0);
        assert_eq!(plan.multiplier_for_step(40), 10.0);
    }

    #[test]
    fn test_feature_is_tagged() {
        let json = serde_json::to_value(BonusFeature::Multiplier { value: 3.0 }).unwrap();
        assert_eq!(json["type"], "multiplier");
        assert_eq!(json["value"], 3.0);

        let fs = BonusFeature::FreeSpins(FreeSpinsAward {
            scatter_count: 4,
            spins: 15,
            multiplier: 2.0,
        });
        let json = serde_json::to_value(&fs).unwrap();
        assert_eq!(json["type"], "free_spins");
        assert_eq!(json["spins"], 15);
        assert_eq!(fs.kind(), "freespins");
    }
}
