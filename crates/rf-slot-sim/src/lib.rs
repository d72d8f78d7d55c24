//! # rf-slot-sim — Empirical RTP measurement
//!
//! Plays independent trials of an [`rf_slot_math::SpinEngine`] across rayon
//! workers, each with its own ChaCha stream, and merges the results until the
//! confidence interval is tight enough.
//!
//! A trial is one paid spin plus the complete free-spins session it
//! triggers, so session wins are credited to the spin that paid for them.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let engine = SpinEngine::new(GameConfig::standard_5x3())?;
//! let report = Simulator::new(engine).run(&SimulationConfig::quick(), &CancelToken::new())?;
//! println!("{}", report.summary());
//! ```

pub mod cancel;
pub mod config;
pub mod error;
pub mod report;
pub mod runner;

pub use cancel::*;
pub use config::*;
pub use error::*;
pub use report::*;
pub use runner::*;
