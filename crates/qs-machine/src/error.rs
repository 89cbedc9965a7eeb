//! Error types for the slot machine

use thiserror::Error;

use qs_entropy::EntropyError;
use qs_slot::SlotError;

/// Slot machine errors
#[derive(Error, Debug)]
pub enum MachineError {
    #[error(transparent)]
    Slot(#[from] SlotError),

    #[error(transparent)]
    Entropy(#[from] EntropyError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MachineError {
    /// The pull can be attempted again without changing anything
    pub fn is_retryable(&self) -> bool {
        matches!(self, MachineError::Entropy(e) if e.is_retryable())
    }

    /// No credits left
    pub fn is_session_over(&self) -> bool {
        matches!(self, MachineError::Slot(SlotError::SessionOver))
    }
}

/// Result type for slot machine operations
pub type MachineResult<T> = Result<T, MachineError>;
