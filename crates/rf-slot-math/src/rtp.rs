//! RTP estimation and return statistics

use serde::{Deserialize, Serialize};

use crate::config::RtConfig;

/// Closed-form RTP estimate
pub struct RtpEstimator;

impl RtpEstimator {
    /// Base estimate in percent
    pub const BASE_RTP: f64 = 92.0;
    pub const MIN_RTP: f64 = 85.0;
    pub const MAX_RTP: f64 = 98.0;

    /// Theoretical RTP in percent: base plus the volatility adjustment, clamped
    pub fn estimate(rt: &RtConfig) -> f64 {
        (Self::BASE_RTP + rt.volatility.rtp_adjustment()).clamp(Self::MIN_RTP, Self::MAX_RTP)
    }
}

/// Aggregated outcome of many trials.
///
/// A trial is one paid spin plus whatever free spins it triggered; its
/// return is everything it won divided by what it wagered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnStats {
    pub trials: u64,
    pub wagered: f64,
    pub won: f64,
    /// Σ per-trial return
    pub sum_returns: f64,
    /// Σ per-trial return²
    pub sum_sq_returns: f64,
    /// Trials that won anything
    pub hits: u64,
    /// Trials that started a free-spins session
    pub free_spin_sessions: u64,
    /// Largest single-trial return
    pub max_return: f64,
}

impl ReturnStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one trial
    pub fn record(&mut self, wagered: f64, won: f64, free_spins: bool) {
        let ret = if wagered > 0.0 { won / wagered } else { 0.0 };
        self.trials += 1;
        self.wagered += wagered;
        self.won += won;
        self.sum_returns += ret;
        self.sum_sq_returns += ret * ret;
        if won > 0.0 {
            self.hits += 1;
        }
        if free_spins {
            self.free_spin_sessions += 1;
        }
        self.max_return = self.max_return.max(ret);
    }

    /// Fold another aggregate into this one
    pub fn merge(&mut self, other: &ReturnStats) {
        self.trials += other.trials;
        self.wagered += other.wagered;
        self.won += other.won;
        self.sum_returns += other.sum_returns;
        self.sum_sq_returns += other.sum_sq_returns;
        self.hits += other.hits;
        self.free_spin_sessions += other.free_spin_sessions;
        self.max_return = self.max_return.max(other.max_return);
    }

    /// Won / wagered, as a fraction
    pub fn rtp(&self) -> f64 {
        if self.wagered > 0.0 {
            self.won / self.wagered
        } else {
            0.0
        }
    }

    /// Fraction of trials with a win
    pub fn hit_frequency(&self) -> f64 {
        if self.trials > 0 {
            self.hits as f64 / self.trials as f64
        } else {
            0.0
        }
    }

    /// Sample variance of per-trial returns
    pub fn variance(&self) -> f64 {
        if self.trials < 2 {
            return 0.0;
        }
        let n = self.trials as f64;
        let mean = self.sum_returns / n;
        ((self.sum_sq_returns - n * mean * mean) / (n - 1.0)).max(0.0)
    }

    /// Standard error of the mean return
    pub fn standard_error(&self) -> f64 {
        if self.trials < 2 {
            return f64::INFINITY;
        }
        (self.variance() / self.trials as f64).sqrt()
    }

    /// `rtp ± z·se`
    pub fn confidence_interval(&self, z: f64) -> (f64, f64) {
        let half = z * self.standard_error();
        (self.rtp() - half, self.rtp() + half)
    }

    /// Width of the `z` interval
    pub fn interval_width(&self, z: f64) -> f64 {
        2.0 * z * self.standard_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Volatility;
    use approx::assert_relative_eq;

    #[test]
    fn test_estimate_by_volatility() {
        let mut rt = RtConfig::default();
        rt.volatility = Volatility::High;
        assert_eq!(RtpEstimator::estimate(&rt), 90.0);
        rt.volatility = Volatility::Medium;
        assert_eq!(RtpEstimator::estimate(&rt), 92.0);
        rt.volatility = Volatility::Low;
        assert_eq!(RtpEstimator::estimate(&rt), 94.0);
    }

    #[test]
    fn test_record_and_rtp() {
        let mut stats = ReturnStats::new();
        stats.record(1.0, 0.0, false);
        stats.record(1.0, 2.0, true);
        stats.record(1.0, 0.5, false);
        stats.record(1.0, 0.0, false);
        assert_eq!(stats.trials, 4);
        assert_relative_eq!(stats.rtp(), 0.625);
        assert_relative_eq!(stats.hit_frequency(), 0.5);
        assert_eq!(stats.free_spin_sessions, 1);
        assert_relative_eq!(stats.max_return, 2.0);
    }

    #[test]
    fn test_standard_error() {
        let mut stats = ReturnStats::new();
        for won in [0.0, 2.0, 0.0, 2.0] {
            stats.record(1.0, won, false);
        }
        // mean 1, sample variance 4/3
        assert_relative_eq!(stats.variance(), 4.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(stats.standard_error(), (1.0f64 / 3.0).sqrt(), epsilon = 1e-12);
        let (lo, hi) = stats.confidence_interval(1.96);
        assert_relative_eq!(hi - lo, stats.interval_width(1.96), epsilon = 1e-12);
        assert_relative_eq!((lo + hi) / 2.0, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_merge_equals_sequential() {
        let outcomes = [(1.0, 0.0), (1.0, 3.0), (1.0, 0.25), (1.0, 1.0), (1.0, 0.0)];
        let mut all = ReturnStats::new();
        let mut a = ReturnStats::new();
        let mut b = ReturnStats::new();
        for (i, &(bet, won)) in outcomes.iter().enumerate() {
            all.record(bet, won, false);
            if i < 2 {
                a.record(bet, won, false);
            } else {
                b.record(bet, won, false);
            }
        }
        a.merge(&b);
        assert_eq!(a.trials, all.trials);
        assert_relative_eq!(a.rtp(), all.rtp());
        assert_relative_eq!(a.variance(), all.variance(), epsilon = 1e-12);
        assert_relative_eq!(a.max_return, 3.0);
    }

    #[test]
    fn test_empty_stats() {
        let stats = ReturnStats::new();
        assert_eq!(stats.rtp(), 0.0);
        assert_eq!(stats.hit_frequency(), 0.0);
        assert!(stats.standard_error().is_infinite());
    }
}
