//! Spin orchestration
//!
//! ```text
//! strips ─▶ sample ─▶ force ─▶ evaluate ─▶ bonus rules ─▶ expand wilds
//!                                                             │
//!   free-spin advance / activation ◀─ random multiplier ◀─ cascade loop
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{GameConfig, Volatility};
use crate::error::{ConfigurationError, SlotResult};
use crate::features::{
    AdvanceOutcome, BonusFeature, BonusRuleEngine, CascadePlan, CascadeProcessor,
    FeatureStateMachine, ForcedOutcome, FreeSpinsAward, FreeSpinsSummary,
};
use crate::grid::Grid;
use crate::paytable::{WinEvaluation, WinEvaluator, evaluator_for};
use crate::random::RandomSource;
use crate::rtp::RtpEstimator;
use crate::sampler::SpinSampler;
use crate::strip::{ReelStrip, StripCache};
use crate::weights::WeightTable;

/// One refill of a cascade sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeStep {
    /// 1-based step number
    pub step: usize,
    pub multiplier: f64,
    pub grid: Grid,
    pub wins: WinEvaluation,
    /// `wins.total × multiplier`
    pub win: f64,
}

/// Everything one spin produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinOutcome {
    /// Played inside a free-spins session
    pub free_spin: bool,
    pub bet: f64,
    /// Amount taken from the player (zero for free spins)
    pub wagered: f64,
    pub stops: Vec<usize>,
    /// Grid after forcing, before any feature touched it
    pub grid: Grid,
    pub forced: Vec<ForcedOutcome>,
    pub features: Vec<BonusFeature>,
    /// Evaluation of the grid after wild expansion
    pub wins: WinEvaluation,
    pub cascades: Vec<CascadeStep>,
    /// Grid left on screen at the end of the spin
    pub final_grid: Grid,
    pub scatter_count: usize,
    /// 1 when no random multiplier fired
    pub random_multiplier: f64,
    /// Win before the free-spins session multiplier
    pub raw_win: f64,
    /// Win handed upstream
    pub reported_win: f64,
    /// Session bookkeeping when this was a free spin
    pub free_spins: Option<AdvanceOutcome>,
    /// Award when this spin started a session
    pub free_spins_started: Option<FreeSpinsAward>,
}

/// Totals for one paid spin plus the session it triggered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub wagered: f64,
    pub won: f64,
    pub free_spins_played: u32,
    pub session: Option<FreeSpinsSummary>,
}

/// Owns a validated configuration and everything derived from it
pub struct SpinEngine {
    config: GameConfig,
    cache: StripCache,
    evaluator: Box<dyn WinEvaluator>,
    rules: BonusRuleEngine,
    cascades: CascadeProcessor,
}

impl SpinEngine {
    /// Free spins one round may play before it is cut short
    pub const MAX_FREE_SPINS_PER_ROUND: u32 = 10_000;

    pub fn new(config: GameConfig) -> SlotResult<Self> {
        config.validate()?;
        log::info!(
            "Slot engine ready: {} ({}x{}, {:?} volatility)",
            config.name,
            config.grid.reels,
            config.grid.rows,
            config.rt.volatility
        );
        Ok(Self {
            cache: StripCache::new(),
            evaluator: evaluator_for(&config),
            rules: BonusRuleEngine::new(config.rules.clone(), config.symbols.clone()),
            cascades: CascadeProcessor::new(config.cascade_fill.clone())?,
            config,
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Fresh idle session for this game
    pub fn new_session(&self) -> FeatureStateMachine {
        FeatureStateMachine::new(self.config.rules.clone())
    }

    /// Current strips, built on first use
    pub fn strips(&self) -> SlotResult<Vec<Arc<ReelStrip>>> {
        self.cache
            .strips_for(&self.config.weights, self.config.rt.volatility)
    }

    /// Cached strip count
    pub fn cached_strips(&self) -> usize {
        self.cache.len()
    }

    /// Replace the weight table. Rejected tables leave the engine untouched.
    pub fn set_weights(&mut self, weights: WeightTable) -> SlotResult<()> {
        let mut next = self.config.clone();
        next.weights = weights;
        next.validate()?;
        self.config = next;
        self.cache.invalidate();
        log::info!("Weight table replaced, strip cache cleared");
        Ok(())
    }

    pub fn set_volatility(&mut self, volatility: Volatility) {
        if self.config.rt.volatility != volatility {
            self.config.rt.volatility = volatility;
            self.cache.invalidate();
            log::info!("Volatility set to {:?}, strip cache cleared", volatility);
        }
    }

    /// Theoretical RTP in percent
    pub fn theoretical_rtp(&self) -> f64 {
        RtpEstimator::estimate(&self.config.rt)
    }

    /// Play one spin.
    ///
    /// With an active session the spin is free and advances it; otherwise the
    /// spin is paid and may start a session.
    pub fn spin<R: RandomSource + ?Sized>(
        &self,
        session: &mut FeatureStateMachine,
        bet: f64,
        rng: &mut R,
    ) -> SlotResult<SpinOutcome> {
        if !(bet.is_finite() && bet > 0.0) {
            return Err(ConfigurationError::InvalidBet(bet).into());
        }
        let free_spin = session.is_active();

        let strips = self.strips()?;
        let sampled = SpinSampler::sample_with_stops(&strips, self.config.grid.rows, rng)?;
        let mut grid = sampled.grid;

        let forced = if self.config.outcome_forcing && !free_spin {
            self.rules.force_outcomes(&mut grid, &self.config.rt, rng)?
        } else {
            Vec::new()
        };

        let initial_wins = self.evaluator.evaluate(&grid, bet);
        let features = self.rules.evaluate(&grid, &initial_wins, free_spin, rng)?;
        let scatter_count = self.rules.scatter_count(&grid);

        let mut board = grid.clone();
        let mut wins = initial_wins;
        if let Some(reels) = features.iter().find_map(|f| match f {
            BonusFeature::ExpandingWild { reels } => Some(reels),
            _ => None,
        }) {
            if let Some(wild) = self.config.symbols.wild_id() {
                for &reel in reels {
                    board.expand_reel(reel, wild);
                }
                wins = self.evaluator.evaluate(&board, bet);
            }
        }

        let plan = features.iter().find_map(|f| match f {
            BonusFeature::Cascade(plan) => Some(plan),
            _ => None,
        });
        let (mut raw_win, cascades) = match plan {
            Some(plan) => self.run_cascades(&mut board, &wins, plan, bet, rng)?,
            None => (wins.total, Vec::new()),
        };

        let random_multiplier = features
            .iter()
            .find_map(|f| match f {
                BonusFeature::Multiplier { value } => Some(*value),
                _ => None,
            })
            .unwrap_or(1.0);
        raw_win *= random_multiplier;

        let (reported_win, free_spins, free_spins_started) = if free_spin {
            let advance = session.advance(scatter_count, raw_win)?;
            (advance.reported_win, Some(advance), None)
        } else {
            let award = features.iter().find_map(|f| match f {
                BonusFeature::FreeSpins(award) => Some(*award),
                _ => None,
            });
            let started = award.filter(|a| session.activate(a));
            (raw_win, None, started)
        };

        Ok(SpinOutcome {
            free_spin,
            bet,
            wagered: if free_spin { 0.0 } else { bet },
            stops: sampled.stops,
            grid,
            forced,
            features,
            wins,
            cascades,
            final_grid: board,
            scatter_count,
            random_multiplier,
            raw_win,
            reported_win,
            free_spins,
            free_spins_started,
        })
    }

    /// Cascade until a refill stops winning or the plan's cap is reached.
    /// Returns the summed, progression-multiplied win.
    fn run_cascades<R: RandomSource + ?Sized>(
        &self,
        board: &mut Grid,
        initial: &WinEvaluation,
        plan: &CascadePlan,
        bet: f64,
        rng: &mut R,
    ) -> SlotResult<(f64, Vec<CascadeStep>)> {
        let mut total = initial.total * plan.multiplier_for_step(0);
        let mut steps = Vec::new();
        let mut positions = initial.winning_positions();

        for step in 1..=plan.max_cascades {
            if positions.is_empty() {
                break;
            }
            *board = self.cascades.cascade(board, &positions, rng)?;
            let wins = self.evaluator.evaluate(board, bet);
            let multiplier = plan.multiplier_for_step(step);
            let win = wins.total * multiplier;
            total += win;
            positions = wins.winning_positions();
            steps.push(CascadeStep {
                step,
                multiplier,
                grid: board.clone(),
                wins,
                win,
            });
        }
        Ok((total, steps))
    }

    /// One paid spin plus the complete free-spins session it triggers
    pub fn play_round<R: RandomSource + ?Sized>(&self, bet: f64, rng: &mut R) -> SlotResult<RoundSummary> {
        let mut session = self.new_session();
        let base = self.spin(&mut session, bet, rng)?;
        let mut won = base.reported_win;
        let mut free_spins_played = 0;
        let mut summary = None;

        while session.is_active() {
            if free_spins_played >= Self::MAX_FREE_SPINS_PER_ROUND {
                log::warn!(
                    "Free-spins session cut after {} spins",
                    Self::MAX_FREE_SPINS_PER_ROUND
                );
                break;
            }
            let outcome = self.spin(&mut session, bet, rng)?;
            free_spins_played += 1;
            won += outcome.reported_win;
            summary = outcome.free_spins.and_then(|a| a.summary);
        }

        Ok(RoundSummary {
            wagered: base.wagered,
            won,
            free_spins_played,
            session: summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PayMode;
    use crate::error::SlotError;
    use crate::random::{RecordingRandom, ScriptedRandom, SeededRandom};

    fn quiet_config() -> GameConfig {
        let mut config = GameConfig::standard_5x3();
        config.outcome_forcing = false;
        config
    }

    #[test]
    fn test_rejects_bad_bet() {
        let engine = SpinEngine::new(GameConfig::standard_5x3()).unwrap();
        let mut session = engine.new_session();
        let mut rng = SeededRandom::new(1);
        for bet in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                engine.spin(&mut session, bet, &mut rng),
                Err(SlotError::Configuration(ConfigurationError::InvalidBet(_)))
            ));
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = GameConfig::standard_5x3();
        config.grid.rows = 0;
        assert!(SpinEngine::new(config).is_err());
    }

    #[test]
    fn test_strips_cached_until_change() {
        let mut engine = SpinEngine::new(quiet_config()).unwrap();
        let a = engine.strips().unwrap();
        let b = engine.strips().unwrap();
        assert!(Arc::ptr_eq(&a[0], &b[0]));
        assert_eq!(engine.cached_strips(), 5);

        engine.set_volatility(Volatility::High);
        assert_eq!(engine.cached_strips(), 0);
        let c = engine.strips().unwrap();
        assert!(c[0].len() < a[0].len());

        let bad = WeightTable::new(5).with_uniform(1, 0);
        assert!(engine.set_weights(bad).is_err());
        assert_eq!(engine.config().rt.volatility, Volatility::High);
        assert_eq!(engine.cached_strips(), 5);

        engine
            .set_weights(WeightTable::standard_5_reel().with_uniform(8, 20))
            .unwrap();
        assert_eq!(engine.cached_strips(), 0);
    }

    #[test]
    fn test_recorded_spins_replay_exactly() {
        let engine = SpinEngine::new(GameConfig::standard_5x3()).unwrap();
        let mut recorder = RecordingRandom::new(SeededRandom::new(77));
        let mut session = engine.new_session();
        let live: Vec<SpinOutcome> = (0..50)
            .map(|_| engine.spin(&mut session, 1.0, &mut recorder).unwrap())
            .collect();

        let mut script = recorder.into_script().unwrap();
        let mut session = engine.new_session();
        let replay: Vec<SpinOutcome> = (0..50)
            .map(|_| engine.spin(&mut session, 1.0, &mut script).unwrap())
            .collect();
        assert_eq!(live, replay);
        assert_eq!(script.remaining(), 0);
    }

    #[test]
    fn test_short_script_fails_loudly() {
        let engine = SpinEngine::new(quiet_config()).unwrap();
        let mut session = engine.new_session();
        let mut rng = ScriptedRandom::new([0.1, 0.2, 0.3]).unwrap();
        assert!(matches!(
            engine.spin(&mut session, 1.0, &mut rng),
            Err(SlotError::RandomSourceExhausted { drawn: 3 })
        ));
    }

    #[test]
    fn test_grid_matches_stops() {
        let engine = SpinEngine::new(quiet_config()).unwrap();
        let strips = engine.strips().unwrap();
        let mut session = engine.new_session();
        let mut rng = SeededRandom::new(3);
        for _ in 0..100 {
            let outcome = engine.spin(&mut session, 1.0, &mut rng).unwrap();
            assert_eq!(
                SpinSampler::window(&strips, &outcome.stops, 3).unwrap(),
                outcome.grid
            );
            if session.is_active() {
                break;
            }
        }
    }

    #[test]
    fn test_cascade_cap_respected() {
        let mut config = GameConfig::cluster_6x5();
        config.outcome_forcing = false;
        // a single regular symbol always clusters
        config.weights = WeightTable::new(6).with_uniform(1, 1).with_uniform(12, 0);
        config.cascade_fill = vec![1];
        config.pay_mode = PayMode::Cluster { min_cluster: 5 };
        let engine = SpinEngine::new(config).unwrap();

        let mut session = engine.new_session();
        let outcome = engine
            .spin(&mut session, 1.0, &mut SeededRandom::new(8))
            .unwrap();
        assert_eq!(outcome.cascades.len(), 6);
        let multipliers: Vec<f64> = outcome.cascades.iter().map(|s| s.multiplier).collect();
        assert_eq!(multipliers, vec![2.0, 3.0, 5.0, 8.0, 10.0, 10.0]);
        // every board is the same full cluster
        let base = outcome.wins.total;
        let expected = base * (1.0 + 2.0 + 3.0 + 5.0 + 8.0 + 10.0 + 10.0) * outcome.random_multiplier;
        assert!((outcome.raw_win - expected).abs() < 1e-9);
    }

    #[test]
    fn test_forced_bonus_survives_forced_jackpot() {
        let mut config = GameConfig::standard_5x3();
        config.rt.bonus_frequency = 1.0;
        config.rt.jackpot_frequency = 1.0;
        let engine = SpinEngine::new(config).unwrap();
        let mut rng = SeededRandom::new(17);

        for _ in 0..200 {
            let mut session = engine.new_session();
            let outcome = engine.spin(&mut session, 1.0, &mut rng).unwrap();
            assert!(
                outcome
                    .forced
                    .iter()
                    .any(|f| matches!(f, ForcedOutcome::Jackpot { .. }))
            );
            assert!(outcome.scatter_count >= engine.config().rules.scatter_trigger);
            assert!(outcome.free_spins_started.is_some());
        }
    }

    #[test]
    fn test_play_round_accounts_only_paid_spin() {
        let engine = SpinEngine::new(GameConfig::standard_5x3()).unwrap();
        let mut rng = SeededRandom::new(99);
        let mut sessions = 0;
        for _ in 0..2_000 {
            let round = engine.play_round(2.0, &mut rng).unwrap();
            assert_eq!(round.wagered, 2.0);
            assert!(round.won >= 0.0);
            if let Some(summary) = round.session {
                sessions += 1;
                assert_eq!(summary.spins_played, round.free_spins_played);
                assert_eq!(summary.spins_played, summary.spins_awarded);
            }
        }
        assert!(sessions > 0);
    }
}
