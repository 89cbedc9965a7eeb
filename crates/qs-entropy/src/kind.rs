//! Source selector

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EntropyError;

/// Which provider fills the reels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// In-process quantum register sampler
    #[default]
    LocalSimulator,
    /// Pre-fetched batches from a remote quantum device
    RemoteDevice,
    /// Public quantum random number service over HTTP
    ExternalRng,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [
        SourceKind::LocalSimulator,
        SourceKind::RemoteDevice,
        SourceKind::ExternalRng,
    ];

    /// Selector string
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::LocalSimulator => "local-simulator",
            SourceKind::RemoteDevice => "remote-device",
            SourceKind::ExternalRng => "external-rng",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = EntropyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| EntropyError::InvalidSource(s.to_string()))
    }
}
