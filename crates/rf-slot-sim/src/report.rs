//! Simulation report

use rf_slot_math::ReturnStats;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Interval narrower than the target after the minimum trial count
    Converged,
    /// Reached `max_trials`
    TrialLimit,
    Cancelled,
}

/// Outcome of a simulation run, partial when cancelled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub game: String,
    pub seed: u64,
    pub workers: usize,
    pub batches: u64,
    pub trials_completed: u64,
    pub cancelled: bool,
    pub stop_reason: StopReason,
    pub stats: ReturnStats,
    /// Measured RTP as a fraction
    pub rtp: f64,
    pub hit_frequency: f64,
    pub confidence_interval: (f64, f64),
    /// Closed-form estimate in percent
    pub theoretical_rtp: f64,
    pub elapsed_ms: u64,
}

impl SimulationReport {
    /// Interval width as an RTP fraction
    pub fn interval_width(&self) -> f64 {
        self.confidence_interval.1 - self.confidence_interval.0
    }

    pub fn to_json(&self) -> SimResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| SimError::Report(e.to_string()))
    }

    /// One-line human summary
    pub fn summary(&self) -> String {
        format!(
            "{}: RTP {:.3}% [{:.3}%, {:.3}%] over {} trials, hit rate {:.2}%, theoretical {:.1}% ({:?})",
            self.game,
            self.rtp * 100.0,
            self.confidence_interval.0 * 100.0,
            self.confidence_interval.1 * 100.0,
            self.trials_completed,
            self.hit_frequency * 100.0,
            self.theoretical_rtp,
            self.stop_reason
        )
    }
}
