//! Slot configuration
//!
//! Loaded from YAML or JSON; every field has a default so an empty document
//! yields the classic 20-credit machine.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SlotError, SlotResult};
use crate::paytable::PayTable;
use crate::session::{DEFAULT_STARTING_CREDITS, SessionState};

/// Game rules for one machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotConfig {
    /// Balance of a fresh session
    pub starting_credits: i64,
    /// Paytable in precedence order
    pub paytable: PayTable,
}

impl SlotConfig {
    /// Parse from a YAML document
    pub fn from_yaml_str(yaml: &str) -> SlotResult<Self> {
        let config: Self =
            serde_yml::from_str(yaml).map_err(|e| SlotError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from a JSON document
    pub fn from_json_str(json: &str) -> SlotResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SlotError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.yaml`/`.yml`/`.json` file
    pub fn load(path: impl AsRef<Path>) -> SlotResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&text),
            other => Err(SlotError::Config(format!(
                "unsupported config extension: {:?}",
                other
            ))),
        }
    }

    /// Check invariants serde cannot express
    pub fn validate(&self) -> SlotResult<()> {
        if self.starting_credits <= 0 {
            return Err(SlotError::InvalidStartingCredits(self.starting_credits));
        }
        Ok(())
    }

    /// Open a fresh session with this config's balance
    pub fn new_session(&self) -> SlotResult<SessionState> {
        SessionState::new(self.starting_credits)
    }
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            starting_credits: DEFAULT_STARTING_CREDITS,
            paytable: PayTable::classic(),
        }
    }
}
