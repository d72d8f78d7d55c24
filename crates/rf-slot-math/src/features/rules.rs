//! Bonus trigger rules and outcome forcing

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{BonusFeature, CascadePlan, ForcedOutcome, FreeSpinsAward};
use crate::config::RtConfig;
use crate::error::{ConfigurationError, SlotResult};
use crate::grid::{Grid, Position};
use crate::paytable::WinEvaluation;
use crate::random::RandomSource;
use crate::symbols::SymbolSet;

/// One entry of the random multiplier distribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedMultiplier {
    pub value: f64,
    pub weight: u32,
}

/// Feature constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BonusRules {
    /// Scatters needed to trigger or retrigger free spins
    pub scatter_trigger: usize,
    /// Scatter count → spins on trigger
    pub free_spin_awards: BTreeMap<usize, u32>,
    /// Spins for a trigger count missing from the table
    pub default_free_spins: u32,
    /// Scatter count → extra spins on retrigger
    pub retrigger_awards: BTreeMap<usize, u32>,
    /// Extra spins for a retrigger count missing from the table
    pub default_retrigger_spins: u32,
    /// Scatters from which the session multiplier is boosted
    pub boosted_multiplier_scatters: usize,
    pub boosted_multiplier: f64,
    pub cascades_enabled: bool,
    pub cascade_progression: Vec<f64>,
    pub max_cascades: usize,
    /// Per-reel chance a reel holding a wild expands
    pub expanding_wild_probability: f64,
    /// Per-spin chance of a random multiplier
    pub random_multiplier_probability: f64,
    pub random_multipliers: Vec<WeightedMultiplier>,
    /// Bonus symbols needed for the bonus game
    pub bonus_game_trigger: usize,
}

impl Default for BonusRules {
    fn default() -> Self {
        Self {
            scatter_trigger: 3,
            free_spin_awards: BTreeMap::from([(3, 10), (4, 15), (5, 25)]),
            default_free_spins: 10,
            retrigger_awards: BTreeMap::from([(3, 5), (4, 10), (5, 15)]),
            default_retrigger_spins: 5,
            boosted_multiplier_scatters: 4,
            boosted_multiplier: 2.0,
            cascades_enabled: true,
            cascade_progression: vec![1.0, 2.0, 3.0, 5.0, 8.0, 10.0],
            max_cascades: 6,
            expanding_wild_probability: 0.3,
            random_multiplier_probability: 0.02,
            random_multipliers: vec![
                WeightedMultiplier { value: 2.0, weight: 50 },
                WeightedMultiplier { value: 3.0, weight: 30 },
                WeightedMultiplier { value: 5.0, weight: 15 },
                WeightedMultiplier { value: 10.0, weight: 5 },
            ],
            bonus_game_trigger: 3,
        }
    }
}

impl BonusRules {
    /// Free spins for a triggering scatter count
    pub fn trigger_award(&self, scatter_count: usize) -> FreeSpinsAward {
        let spins = self
            .free_spin_awards
            .get(&scatter_count)
            .copied()
            .unwrap_or(self.default_free_spins);
        let multiplier = if scatter_count >= self.boosted_multiplier_scatters {
            self.boosted_multiplier
        } else {
            1.0
        };
        FreeSpinsAward {
            scatter_count,
            spins,
            multiplier,
        }
    }

    /// Extra spins for a retriggering scatter count
    pub fn retrigger_award(&self, scatter_count: usize) -> u32 {
        self.retrigger_awards
            .get(&scatter_count)
            .copied()
            .unwrap_or(self.default_retrigger_spins)
    }

    pub fn cascade_plan(&self) -> CascadePlan {
        CascadePlan {
            multipliers: self.cascade_progression.clone(),
            max_cascades: self.max_cascades,
        }
    }

    pub fn validate(&self) -> SlotResult<()> {
        if self.scatter_trigger == 0 {
            return Err(invalid("scatter_trigger", "must be at least 1"));
        }
        if self.bonus_game_trigger == 0 {
            return Err(invalid("bonus_game_trigger", "must be at least 1"));
        }
        for (name, p) in [
            ("expanding_wild_probability", self.expanding_wild_probability),
            ("random_multiplier_probability", self.random_multiplier_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(invalid(name, format!("{} outside [0, 1]", p)));
            }
        }
        if self.cascade_progression.is_empty() {
            return Err(invalid("cascade_progression", "empty"));
        }
        if self.cascade_progression.iter().any(|m| !(m.is_finite() && *m > 0.0)) {
            return Err(invalid("cascade_progression", "multipliers must be positive"));
        }
        if !(self.boosted_multiplier.is_finite() && self.boosted_multiplier > 0.0) {
            return Err(invalid("boosted_multiplier", "must be positive"));
        }
        if self.random_multipliers.is_empty()
            || self.random_multipliers.iter().all(|m| m.weight == 0)
        {
            return Err(invalid("random_multipliers", "needs a positive weight"));
        }
        if self.random_multipliers.iter().any(|m| !(m.value.is_finite() && m.value > 0.0)) {
            return Err(invalid("random_multipliers", "values must be positive"));
        }
        Ok(())
    }
}

fn invalid(name: &'static str, reason: impl Into<String>) -> crate::error::SlotError {
    ConfigurationError::InvalidRule {
        name,
        reason: reason.into(),
    }
    .into()
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENGINE
// ═══════════════════════════════════════════════════════════════════════════════

/// Decides which features a spin triggers.
///
/// Draw order is fixed: forcing (before evaluation), then scatter, bonus game,
/// cascade, expanding wild per reel, random multiplier. Scatter, bonus game
/// and cascade consume no randomness.
#[derive(Debug, Clone)]
pub struct BonusRuleEngine {
    rules: BonusRules,
    symbols: SymbolSet,
}

impl BonusRuleEngine {
    pub fn new(rules: BonusRules, symbols: SymbolSet) -> Self {
        Self { rules, symbols }
    }

    pub fn rules(&self) -> &BonusRules {
        &self.rules
    }

    /// Scatters on the grid
    pub fn scatter_count(&self, grid: &Grid) -> usize {
        self.symbols.scatter_id().map_or(0, |id| grid.count(id))
    }

    /// Features triggered by an evaluated grid.
    ///
    /// Inside a free-spins session a scatter hit is reported as a retrigger
    /// carrying the retrigger award, never as a new session.
    pub fn evaluate<R: RandomSource + ?Sized>(
        &self,
        grid: &Grid,
        wins: &WinEvaluation,
        in_session: bool,
        rng: &mut R,
    ) -> SlotResult<Vec<BonusFeature>> {
        let mut features = Vec::new();

        let scatters = self.scatter_count(grid);
        if scatters >= self.rules.scatter_trigger {
            features.push(if in_session {
                BonusFeature::Retrigger {
                    scatter_count: scatters,
                    spins: self.rules.retrigger_award(scatters),
                }
            } else {
                BonusFeature::FreeSpins(self.rules.trigger_award(scatters))
            });
        }

        if let Some(bonus) = self.symbols.bonus_id() {
            let positions = grid.positions_of(bonus);
            if positions.len() >= self.rules.bonus_game_trigger {
                features.push(BonusFeature::BonusGame {
                    symbol_count: positions.len(),
                    positions,
                });
            }
        }

        if self.rules.cascades_enabled && wins.is_win() {
            features.push(BonusFeature::Cascade(self.rules.cascade_plan()));
        }

        let mut expanding = Vec::new();
        for reel in 0..grid.reels() {
            let has_wild = grid
                .column(reel)
                .iter()
                .flatten()
                .any(|&s| self.symbols.is_wild(s));
            if has_wild && rng.chance(self.rules.expanding_wild_probability)? {
                expanding.push(reel);
            }
        }
        if !expanding.is_empty() {
            features.push(BonusFeature::ExpandingWild { reels: expanding });
        }

        if let Some(value) = self.roll_random_multiplier(rng)? {
            features.push(BonusFeature::Multiplier { value });
        }

        for feature in &features {
            log::debug!("Feature triggered: {}", feature.kind());
        }
        Ok(features)
    }

    /// One Bernoulli trial, then a weighted pick of the multiplier value
    pub fn roll_random_multiplier<R: RandomSource + ?Sized>(&self, rng: &mut R) -> SlotResult<Option<f64>> {
        if !rng.chance(self.rules.random_multiplier_probability)? {
            return Ok(None);
        }
        let weights: Vec<u32> = self.rules.random_multipliers.iter().map(|m| m.weight).collect();
        let index = rng.pick_weighted(&weights)?;
        Ok(self.rules.random_multipliers.get(index).map(|m| m.value))
    }

    /// Force scatter and jackpot outcomes at the configured frequencies.
    ///
    /// Always draws the scatter trial, then the jackpot trial; placement
    /// draws follow only on success. A forced jackpot row is laid first and
    /// forced scatters stay off it, so both outcomes survive the same spin.
    pub fn force_outcomes<R: RandomSource + ?Sized>(
        &self,
        grid: &mut Grid,
        rt: &RtConfig,
        rng: &mut R,
    ) -> SlotResult<Vec<ForcedOutcome>> {
        let force_scatter = rng.chance(rt.bonus_probability())?;
        let force_jackpot = rng.chance(rt.jackpot_probability())?;
        let mut forced = Vec::new();

        let mut jackpot_row = None;
        if force_jackpot {
            if let Some(jackpot) = self.symbols.jackpot_id() {
                let row = grid.rows() / 2;
                for reel in 0..grid.reels() {
                    grid.set(Position::new(reel, row), jackpot);
                }
                jackpot_row = Some(row);
                log::debug!("Forced jackpot row {}", row);
                forced.push(ForcedOutcome::Jackpot {
                    row,
                    symbol: jackpot,
                });
            }
        }

        if force_scatter {
            if let Some(scatter) = self.symbols.scatter_id() {
                let rows: Vec<usize> = (0..grid.rows())
                    .filter(|&row| Some(row) != jackpot_row)
                    .collect();
                let mut candidates: Vec<usize> = (0..grid.reels())
                    .filter(|&reel| !grid.reel_contains(reel, scatter))
                    .collect();
                let mut placed = Vec::new();
                while grid.count(scatter) < self.rules.scatter_trigger
                    && !candidates.is_empty()
                    && !rows.is_empty()
                {
                    let reel = candidates.remove(rng.next_index(candidates.len())?);
                    let row = rows[rng.next_index(rows.len())?];
                    let pos = Position::new(reel, row);
                    grid.set(pos, scatter);
                    placed.push(pos);
                }
                if !placed.is_empty() {
                    log::debug!("Forced {} scatters", placed.len());
                    forced.push(ForcedOutcome::Scatter { positions: placed });
                }
            }
        }

        Ok(forced)
    }
}
