//! Error types for the slot model

use thiserror::Error;

/// Slot model errors
#[derive(Error, Debug)]
pub enum SlotError {
    #[error("Session is over: no credits left, start a new session")]
    SessionOver,

    #[error("Draw out of range: {0} (expected 0..=7)")]
    InvalidDraw(u8),

    #[error("Starting credits must be positive, got {0}")]
    InvalidStartingCredits(i64),

    #[error("Invalid paytable: {0}")]
    InvalidPaytable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for slot model operations
pub type SlotResult<T> = Result<T, SlotError>;
