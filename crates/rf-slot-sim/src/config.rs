//! Simulation settings

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Settings for an RTP simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Base seed; every worker stream is derived from it
    pub seed: u64,

    /// Stake per paid spin
    pub bet: f64,

    /// Parallel workers per batch
    pub workers: usize,

    /// Trials each worker plays per batch
    pub batch_trials: u64,

    /// Never stop on convergence before this many trials
    pub min_trials: u64,

    /// Hard stop
    pub max_trials: u64,

    /// Stop once the interval is narrower than this (RTP fraction)
    pub target_ci_width: f64,

    /// Interval z-score (1.96 = 95%)
    pub confidence_z: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0x5107_5EED,
            bet: 1.0,
            workers: num_cpus::get().max(1),
            batch_trials: 10_000,
            min_trials: 100_000,
            max_trials: 50_000_000,
            target_ci_width: 0.01,
            confidence_z: 1.96,
        }
    }
}

impl SimulationConfig {
    /// Short run for smoke checks
    pub fn quick() -> Self {
        Self {
            batch_trials: 2_000,
            min_trials: 10_000,
            max_trials: 200_000,
            target_ci_width: 0.05,
            ..Default::default()
        }
    }

    /// Run until the 95% interval is under one percentage point
    pub fn thorough() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_bet(mut self, bet: f64) -> Self {
        self.bet = bet;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_batch_trials(mut self, batch_trials: u64) -> Self {
        self.batch_trials = batch_trials;
        self
    }

    pub fn with_trial_limits(mut self, min_trials: u64, max_trials: u64) -> Self {
        self.min_trials = min_trials;
        self.max_trials = max_trials;
        self
    }

    pub fn with_target_ci_width(mut self, width: f64) -> Self {
        self.target_ci_width = width;
        self
    }

    /// Trials one batch plays across all workers
    pub fn trials_per_batch(&self) -> u64 {
        self.batch_trials * self.workers as u64
    }

    pub fn validate(&self) -> SimResult<()> {
        if !(self.bet.is_finite() && self.bet > 0.0) {
            return Err(SimError::InvalidSettings(format!("bet {} must be positive", self.bet)));
        }
        if self.workers == 0 {
            return Err(SimError::InvalidSettings("workers must be at least 1".into()));
        }
        if self.batch_trials == 0 {
            return Err(SimError::InvalidSettings("batch_trials must be at least 1".into()));
        }
        if self.max_trials == 0 || self.min_trials > self.max_trials {
            return Err(SimError::InvalidSettings(format!(
                "trial limits {}..{} are empty",
                self.min_trials, self.max_trials
            )));
        }
        if !(self.target_ci_width.is_finite() && self.target_ci_width > 0.0) {
            return Err(SimError::InvalidSettings("target_ci_width must be positive".into()));
        }
        if !(self.confidence_z.is_finite() && self.confidence_z > 0.0) {
            return Err(SimError::InvalidSettings("confidence_z must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        SimulationConfig::quick().validate().unwrap();
        SimulationConfig::thorough().validate().unwrap();
        assert!(SimulationConfig::thorough().min_trials >= 100_000);
    }

    #[test]
    fn test_builders() {
        let config = SimulationConfig::quick()
            .with_seed(9)
            .with_workers(3)
            .with_batch_trials(100)
            .with_trial_limits(300, 900)
            .with_bet(2.5);
        assert_eq!(config.seed, 9);
        assert_eq!(config.trials_per_batch(), 300);
        assert_eq!(config.bet, 2.5);
        config.validate().unwrap();
    }

    #[test]
    fn test_invalid_settings() {
        assert!(SimulationConfig::quick().with_workers(0).validate().is_err());
        assert!(SimulationConfig::quick().with_bet(0.0).validate().is_err());
        assert!(SimulationConfig::quick().with_trial_limits(10, 5).validate().is_err());
        assert!(SimulationConfig::quick().with_target_ci_width(0.0).validate().is_err());
    }
}
