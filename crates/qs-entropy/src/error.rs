//! Error types for random sources

use thiserror::Error;

/// Random source errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EntropyError {
    #[error("Invalid source: '{0}' (expected local-simulator, remote-device or external-rng)")]
    InvalidSource(String),

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("No eligible device with at least {min_qubits} qubits")]
    NoEligibleProvider { min_qubits: usize },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Not ready: {buffered} draws buffered, {needed} needed; refill still in flight")]
    NotReady { buffered: usize, needed: usize },
}

impl EntropyError {
    /// Worth retrying automatically with backoff
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            EntropyError::ProviderUnavailable(_) | EntropyError::Network(_)
        )
    }

    /// The caller may try again later (or fall back to another source)
    pub fn is_retryable(&self) -> bool {
        self.is_transient() || matches!(self, EntropyError::NotReady { .. })
    }
}

impl From<reqwest::Error> for EntropyError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            EntropyError::Decode(e.to_string())
        } else {
            EntropyError::Network(e.to_string())
        }
    }
}

/// Result type for random source operations
pub type EntropyResult<T> = Result<T, EntropyError>;
