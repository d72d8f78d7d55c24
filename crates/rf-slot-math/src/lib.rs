//! # rf-slot-math — Slot game math engine
//!
//! Weighted reel strips, window sampling, win evaluation, bonus rules and the
//! free-spins state machine. Every random decision goes through an injected
//! [`RandomSource`], so any spin can be replayed bit-for-bit.
//!
//! ## Features
//!
//! - **Reel Strips**: built deterministically from per-reel weight tables, scaled by volatility
//! - **Sampling**: one stop per reel, visible window read with wraparound
//! - **Evaluation**: paylines with wild substitution, or orthogonal clusters
//! - **Bonus Rules**: free spins, cascades, expanding wilds, random multipliers, forced outcomes
//! - **Sessions**: free spins with retriggers, owned per player and passed explicitly
//!
//! ## Architecture
//!
//! ```text
//! GameConfig
//!     │
//!     ├── WeightTable ──▶ StripCache ──▶ SpinSampler ──▶ Grid
//!     ├── WinEvaluator (lines | clusters)
//!     └── BonusRules ──▶ BonusRuleEngine ──▶ [BonusFeature]
//!           │
//!           v
//!     SpinEngine::spin(session, bet, rng) → SpinOutcome
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod features;
pub mod grid;
pub mod paytable;
pub mod random;
pub mod rtp;
pub mod sampler;
pub mod strip;
pub mod symbols;
pub mod weights;

pub use config::*;
pub use engine::*;
pub use error::*;
pub use features::*;
pub use grid::*;
pub use paytable::*;
pub use random::*;
pub use rtp::*;
pub use sampler::*;
pub use strip::*;
pub use symbols::*;
pub use weights::*;
