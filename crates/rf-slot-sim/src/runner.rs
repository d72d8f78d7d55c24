//! Batched parallel trial runner
//!
//! ```text
//! batch b ──▶ worker 0 (stream b:0) ──┐
//!         ──▶ worker 1 (stream b:1) ──┼──▶ merge ──▶ stop check ──▶ batch b+1
//!         ──▶ worker n (stream b:n) ──┘
//! ```

use std::time::Instant;

use rayon::prelude::*;
use rf_slot_math::{ReturnStats, SeededRandom, SpinEngine};

use crate::cancel::CancelToken;
use crate::config::SimulationConfig;
use crate::error::SimResult;
use crate::report::{SimulationReport, StopReason};

/// Random stream for one worker of one batch
pub fn worker_stream(batch: u64, worker: usize) -> u64 {
    (batch << 32) | worker as u64
}

/// Runs empirical RTP measurements against one engine
pub struct Simulator {
    engine: SpinEngine,
}

impl Simulator {
    pub fn new(engine: SpinEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &SpinEngine {
        &self.engine
    }

    /// Play trials until converged, limited or cancelled.
    ///
    /// Cancellation is honoured between trials; the report then holds
    /// everything completed so far.
    pub fn run(&self, config: &SimulationConfig, cancel: &CancelToken) -> SimResult<SimulationReport> {
        config.validate()?;
        let started = Instant::now();
        log::info!(
            "Simulating {}: {} workers, {}..{} trials",
            self.engine.config().name,
            config.workers,
            config.min_trials,
            config.max_trials
        );

        let mut stats = ReturnStats::new();
        let mut batches = 0u64;

        let stop_reason = loop {
            if cancel.is_cancelled() {
                break StopReason::Cancelled;
            }
            if stats.trials >= config.max_trials {
                break StopReason::TrialLimit;
            }
            if stats.trials >= config.min_trials
                && stats.interval_width(config.confidence_z) < config.target_ci_width
            {
                break StopReason::Converged;
            }

            let remaining = config.max_trials - stats.trials;
            let quotas = split_trials(remaining.min(config.trials_per_batch()), config.workers);
            let batch = batches;

            let results = quotas
                .into_par_iter()
                .enumerate()
                .map(|(worker, quota)| {
                    let mut rng = SeededRandom::with_stream(config.seed, worker_stream(batch, worker));
                    self.run_worker(quota, config.bet, &mut rng, cancel)
                })
                .collect::<SimResult<Vec<ReturnStats>>>()?;

            for worker_stats in &results {
                stats.merge(worker_stats);
            }
            batches += 1;
            log::debug!("Batch {} done: {} trials, RTP {:.4}", batch, stats.trials, stats.rtp());
        };

        let report = SimulationReport {
            game: self.engine.config().name.clone(),
            seed: config.seed,
            workers: config.workers,
            batches,
            trials_completed: stats.trials,
            cancelled: stop_reason == StopReason::Cancelled,
            stop_reason,
            rtp: stats.rtp(),
            hit_frequency: stats.hit_frequency(),
            confidence_interval: stats.confidence_interval(config.confidence_z),
            theoretical_rtp: self.engine.theoretical_rtp(),
            elapsed_ms: started.elapsed().as_millis() as u64,
            stats,
        };

        if report.cancelled {
            log::warn!(
                "Simulation cancelled after {} trials",
                report.trials_completed
            );
        }
        log::info!("{}", report.summary());
        Ok(report)
    }

    fn run_worker(
        &self,
        quota: u64,
        bet: f64,
        rng: &mut SeededRandom,
        cancel: &CancelToken,
    ) -> SimResult<ReturnStats> {
        let mut stats = ReturnStats::new();
        for _ in 0..quota {
            if cancel.is_cancelled() {
                break;
            }
            let round = self.engine.play_round(bet, rng)?;
            stats.record(round.wagered, round.won, round.free_spins_played > 0);
        }
        Ok(stats)
    }
}

/// Split `total` trials over `workers` as evenly as possible
fn split_trials(total: u64, workers: usize) -> Vec<u64> {
    let workers = workers.max(1) as u64;
    let base = total / workers;
    let extra = total % workers;
    (0..workers).map(|w| base + u64::from(w < extra)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rf_slot_math::GameConfig;

    fn simulator() -> Simulator {
        Simulator::new(SpinEngine::new(GameConfig::standard_5x3()).unwrap())
    }

    #[test]
    fn test_split_trials() {
        assert_eq!(split_trials(10, 3), vec![4, 3, 3]);
        assert_eq!(split_trials(2, 4), vec![1, 1, 0, 0]);
        assert_eq!(split_trials(8, 1), vec![8]);
    }

    #[test]
    fn test_worker_streams_are_distinct() {
        assert_ne!(worker_stream(0, 1), worker_stream(1, 0));
        assert_ne!(worker_stream(2, 3), worker_stream(3, 2));
    }

    #[test]
    fn test_cancel_before_start_reports_empty() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let report = simulator()
            .run(&SimulationConfig::quick().with_workers(2), &cancel)
            .unwrap();
        assert!(report.cancelled);
        assert_eq!(report.trials_completed, 0);
        assert_eq!(report.batches, 0);
    }

    #[test]
    fn test_trial_limit() {
        let config = SimulationConfig::quick()
            .with_workers(3)
            .with_batch_trials(100)
            .with_trial_limits(0, 1_000)
            .with_target_ci_width(1e-9);
        let report = simulator().run(&config, &CancelToken::new()).unwrap();
        assert_eq!(report.trials_completed, 1_000);
        assert_eq!(report.stop_reason, StopReason::TrialLimit);
        assert_eq!(report.stats.wagered, 1_000.0);
    }

    #[test]
    fn test_same_seed_same_report() {
        let config = SimulationConfig::quick()
            .with_seed(12)
            .with_workers(2)
            .with_batch_trials(250)
            .with_trial_limits(1_000, 1_000);
        let sim = simulator();
        let a = sim.run(&config, &CancelToken::new()).unwrap();
        let b = sim.run(&config, &CancelToken::new()).unwrap();
        assert_eq!(a.stats, b.stats);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let config = SimulationConfig::quick().with_workers(0);
        assert!(simulator().run(&config, &CancelToken::new()).is_err());
    }
}
