//! Error types for simulation runs

use rf_slot_math::SlotError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Engine error: {0}")]
    Engine(#[from] SlotError),

    #[error("Invalid simulation settings: {0}")]
    InvalidSettings(String),

    #[error("Report serialization failed: {0}")]
    Report(String),
}

pub type SimResult<T> = Result<T, SimError>;
