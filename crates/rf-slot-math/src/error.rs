//! Error types for the slot math engine

use thiserror::Error;

/// A game configuration the engine refuses to run with.
///
/// Always fatal to the spin that hit it. The engine never corrects or
/// defaults a malformed configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Invalid weight table: {0}")]
    InvalidWeightTable(String),

    #[error("Reel {reel} has zero total weight")]
    ZeroWeightReel { reel: usize },

    #[error("Symbol {symbol} has {found} reel weights, expected {expected}")]
    ReelWeightCount {
        symbol: u32,
        expected: usize,
        found: usize,
    },

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(u32),

    #[error("Invalid grid geometry: {reels} reels x {rows} rows")]
    InvalidGeometry { reels: usize, rows: usize },

    #[error("Target RTP {0} outside [0.85, 0.98]")]
    TargetRtpOutOfRange(f64),

    #[error("{name} must be positive, got {value}")]
    NonPositiveFrequency { name: &'static str, value: f64 },

    #[error("Invalid bet: {0}")]
    InvalidBet(f64),

    #[error("Invalid rule parameter {name}: {reason}")]
    InvalidRule { name: &'static str, reason: String },

    #[error("Malformed configuration document: {0}")]
    Document(String),
}

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SlotError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Random source exhausted after {drawn} draws")]
    RandomSourceExhausted { drawn: usize },

    #[error("Scripted random value {value} at index {index} is outside [0, 1)")]
    InvalidRandomValue { index: usize, value: f64 },

    #[error("No active feature session")]
    NoActiveSession,
}

/// Result type alias
pub type SlotResult<T> = Result<T, SlotError>;
