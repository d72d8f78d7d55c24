//! Bonus features
//!
//! ```text
//! grid + wins ──▶ BonusRuleEngine ──▶ [BonusFeature]
//!                                         │
//!                 FreeSpins ──▶ FeatureStateMachine (per session)
//!                 Cascade   ──▶ CascadeProcessor (looped by the engine)
//! ```

mod cascades;
mod free_spins;
mod rules;
mod types;

pub use cascades::*;
pub use free_spins::*;
pub use rules::*;
pub use types::*;
