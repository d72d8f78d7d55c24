//! Free-spins session state machine
//!
//! ```text
//! Idle ──activate(award)──▶ FreeSpins ──advance × N──▶ Idle
//!                               ▲   │
//!                               └───┘ retrigger adds spins
//! ```
//!
//! One machine per player session, passed explicitly into every spin.

use serde::{Deserialize, Serialize};

use super::{BonusRules, FreeSpinsAward};
use crate::error::{SlotError, SlotResult};

/// Live free-spins bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeSpinsState {
    pub spins_remaining: u32,
    pub total_spins_awarded: u32,
    pub spins_played: u32,
    pub win_multiplier: f64,
    pub retrigger_count: u32,
    /// Sum of reported (multiplied) wins so far
    pub total_win: f64,
}

/// Persistent feature state of one session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FeatureState {
    #[default]
    Idle,
    FreeSpins(FreeSpinsState),
}

/// Final tally of a finished session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeSpinsSummary {
    pub spins_awarded: u32,
    pub spins_played: u32,
    pub retriggers: u32,
    pub multiplier: f64,
    pub total_win: f64,
}

/// Result of playing one free spin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvanceOutcome {
    /// Session still active after this spin
    pub continues: bool,
    pub retriggered: bool,
    /// The spin's win after the session multiplier
    pub reported_win: f64,
    pub spins_remaining: u32,
    /// Present on the terminating spin only
    pub summary: Option<FreeSpinsSummary>,
}

/// Owns the free-spins lifecycle of one session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureStateMachine {
    state: FeatureState,
    rules: BonusRules,
}

impl FeatureStateMachine {
    pub fn new(rules: BonusRules) -> Self {
        Self {
            state: FeatureState::Idle,
            rules,
        }
    }

    pub fn state(&self) -> &FeatureState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, FeatureState::FreeSpins(_))
    }

    pub fn spins_remaining(&self) -> u32 {
        match &self.state {
            FeatureState::FreeSpins(fs) => fs.spins_remaining,
            FeatureState::Idle => 0,
        }
    }

    /// Current session multiplier (1 when idle)
    pub fn win_multiplier(&self) -> f64 {
        match &self.state {
            FeatureState::FreeSpins(fs) => fs.win_multiplier,
            FeatureState::Idle => 1.0,
        }
    }

    /// Start a session. Ignored unless idle; returns whether it started.
    pub fn activate(&mut self, award: &FreeSpinsAward) -> bool {
        if self.is_active() || award.spins == 0 {
            return false;
        }
        log::debug!(
            "Free spins started: {} spins at {}x ({} scatters)",
            award.spins,
            award.multiplier,
            award.scatter_count
        );
        self.state = FeatureState::FreeSpins(FreeSpinsState {
            spins_remaining: award.spins,
            total_spins_awarded: award.spins,
            spins_played: 0,
            win_multiplier: award.multiplier,
            retrigger_count: 0,
            total_win: 0.0,
        });
        true
    }

    /// Play one free spin: consume it, apply any retrigger, multiply the win.
    ///
    /// The session ends exactly when no spins remain after a spin that did
    /// not retrigger. The win is multiplied before the state is dropped.
    pub fn advance(&mut self, scatter_count: usize, raw_win: f64) -> SlotResult<AdvanceOutcome> {
        let FeatureState::FreeSpins(fs) = &mut self.state else {
            return Err(SlotError::NoActiveSession);
        };

        fs.spins_remaining = fs.spins_remaining.saturating_sub(1);
        fs.spins_played += 1;

        let retriggered = scatter_count >= self.rules.scatter_trigger;
        if retriggered {
            let extra = self.rules.retrigger_award(scatter_count);
            fs.spins_remaining += extra;
            fs.total_spins_awarded += extra;
            fs.retrigger_count += 1;
            log::debug!("Free spins retriggered: +{} ({} left)", extra, fs.spins_remaining);
        }

        let reported_win = raw_win * fs.win_multiplier;
        fs.total_win += reported_win;
        let spins_remaining = fs.spins_remaining;

        if spins_remaining > 0 {
            return Ok(AdvanceOutcome {
                continues: true,
                retriggered,
                reported_win,
                spins_remaining,
                summary: None,
            });
        }

        let summary = FreeSpinsSummary {
            spins_awarded: fs.total_spins_awarded,
            spins_played: fs.spins_played,
            retriggers: fs.retrigger_count,
            multiplier: fs.win_multiplier,
            total_win: fs.total_win,
        };
        self.state = FeatureState::Idle;
        log::debug!(
            "Free spins finished: {} played, total win {:.2}",
            summary.spins_played,
            summary.total_win
        );

        Ok(AdvanceOutcome {
            continues: false,
            retriggered,
            reported_win,
            spins_remaining: 0,
            summary: Some(summary),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn machine() -> FeatureStateMachine {
        FeatureStateMachine::new(BonusRules::default())
    }

    #[test]
    fn test_activation_from_award() {
        let mut fsm = machine();
        let award = BonusRules::default().trigger_award(4);
        assert!(fsm.activate(&award));
        assert_eq!(fsm.spins_remaining(), 15);
        assert_eq!(fsm.win_multiplier(), 2.0);

        // a second trigger while active is not an activation
        assert!(!fsm.activate(&BonusRules::default().trigger_award(5)));
        assert_eq!(fsm.spins_remaining(), 15);
    }

    #[test]
    fn test_advance_when_idle_is_an_error() {
        assert_eq!(machine().advance(0, 1.0), Err(SlotError::NoActiveSession));
    }

    #[test]
    fn test_session_runs_to_idle_exactly_once() {
        let mut fsm = machine();
        fsm.activate(&BonusRules::default().trigger_award(3));

        let mut summaries = 0;
        let mut played = 0;
        while fsm.is_active() {
            let out = fsm.advance(0, 1.0).unwrap();
            played += 1;
            if out.summary.is_some() {
                summaries += 1;
                assert!(!out.continues);
            }
        }
        assert_eq!(played, 10);
        assert_eq!(summaries, 1);
        assert_eq!(fsm.state(), &FeatureState::Idle);
    }

    #[test]
    fn test_retrigger_sequence() {
        let mut fsm = machine();
        fsm.activate(&BonusRules::default().trigger_award(3));

        let remaining: Vec<u32> = [3, 4, 5]
            .iter()
            .map(|&scatters| fsm.advance(scatters, 0.0).unwrap().spins_remaining)
            .collect();
        // 10 → 9+5 → 13+10 → 22+15
        assert_eq!(remaining, vec![14, 23, 37]);

        let FeatureState::FreeSpins(fs) = fsm.state() else {
            panic!("session should be active");
        };
        assert_eq!(fs.retrigger_count, 3);
        assert_eq!(fs.total_spins_awarded, 40);
        assert_eq!(fs.win_multiplier, 1.0);
    }

    #[test]
    fn test_retrigger_on_last_spin_keeps_session() {
        let mut fsm = machine();
        fsm.activate(&FreeSpinsAward {
            scatter_count: 3,
            spins: 1,
            multiplier: 1.0,
        });
        let out = fsm.advance(3, 0.0).unwrap();
        assert!(out.continues);
        assert!(out.retriggered);
        assert_eq!(out.spins_remaining, 5);
    }

    #[test]
    fn test_last_spin_win_is_multiplied() {
        let mut fsm = machine();
        fsm.activate(&FreeSpinsAward {
            scatter_count: 4,
            spins: 2,
            multiplier: 2.0,
        });
        let first = fsm.advance(0, 3.0).unwrap();
        assert_relative_eq!(first.reported_win, 6.0);

        let last = fsm.advance(1, 4.5).unwrap();
        assert_relative_eq!(last.reported_win, 9.0);
        let summary = last.summary.unwrap();
        assert_eq!(summary.spins_played, 2);
        assert_eq!(summary.retriggers, 0);
        assert_relative_eq!(summary.total_win, 15.0);
        assert!(!fsm.is_active());
    }
}
