//! Machine configuration
//!
//! One file describes the game rules and every reel provider:
//!
//! ```yaml
//! slot:
//!   starting_credits: 20
//! source: local-simulator
//! fallback: local-simulator
//! seed: 42
//! remote:
//!   enabled: true
//!   batch_size: 300
//!   starvation_timeout_ms: 2000
//!   job_timeout_ms: 30000
//!   devices:
//!     - { name: ibmqx4, qubits: 5, pending_jobs: 3 }
//!     - { name: ibmq_16_melbourne, qubits: 14, pending_jobs: 12 }
//! qrng:
//!   enabled: true
//!   endpoint: https://qrng.anu.edu.au/API/jsonI.php
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use qs_entropy::{
    DeviceRegistry, EmulatedDevice, EmulatedDeviceSpec, ExternalHttpRng, FallbackPolicy,
    LocalSampler, QrngConfig, RemoteConfig, RemoteDeviceBatch, SourceKind, TripleSource,
};
use qs_slot::SlotConfig;

use crate::display::DisplaySink;
use crate::error::{MachineError, MachineResult};
use crate::machine::SlotMachine;

/// Remote device provider section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteSection {
    pub enabled: bool,
    #[serde(flatten)]
    pub batch: RemoteConfig,
    /// Devices registered at startup
    pub devices: Vec<EmulatedDeviceSpec>,
}

impl Default for RemoteSection {
    fn default() -> Self {
        Self {
            enabled: true,
            batch: RemoteConfig::default(),
            devices: vec![EmulatedDeviceSpec::default()],
        }
    }
}

/// External QRNG provider section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QrngSection {
    pub enabled: bool,
    #[serde(flatten)]
    pub client: QrngConfig,
}

impl Default for QrngSection {
    fn default() -> Self {
        Self {
            enabled: true,
            client: QrngConfig::default(),
        }
    }
}

/// Everything needed to assemble a machine
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    pub slot: SlotConfig,
    /// Provider selected at startup
    pub source: SourceKind,
    pub fallback: FallbackPolicy,
    /// Seed for the local sampler and emulated devices
    pub seed: Option<u64>,
    pub remote: RemoteSection,
    pub qrng: QrngSection,
}

impl MachineConfig {
    /// Parse from a YAML document
    pub fn from_yaml_str(yaml: &str) -> MachineResult<Self> {
        let config: Self =
            serde_yml::from_str(yaml).map_err(|e| MachineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from a JSON document
    pub fn from_json_str(json: &str) -> MachineResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| MachineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.yaml`/`.yml`/`.json` file
    pub fn load(path: impl AsRef<Path>) -> MachineResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        log::info!("[MachineConfig] loading {}", path.display());
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&text),
            other => Err(MachineError::Config(format!(
                "unsupported config extension: {:?}",
                other
            ))),
        }
    }

    /// Check cross-field rules
    pub fn validate(&self) -> MachineResult<()> {
        self.slot.validate()?;
        if !self.is_enabled(self.source) {
            return Err(MachineError::Config(format!(
                "selected source {} is disabled",
                self.source
            )));
        }
        if self.remote.enabled && self.remote.batch.batch_size == 0 {
            return Err(MachineError::Config("remote batch_size must be positive".into()));
        }
        if self.remote.enabled && self.remote.devices.is_empty() {
            log::warn!("[MachineConfig] remote source enabled without devices");
        }
        Ok(())
    }

    /// Is a provider switched on?
    pub fn is_enabled(&self, kind: SourceKind) -> bool {
        match kind {
            SourceKind::LocalSimulator => true,
            SourceKind::RemoteDevice => self.remote.enabled,
            SourceKind::ExternalRng => self.qrng.enabled,
        }
    }

    /// Registry holding the configured devices
    pub fn device_registry(&self) -> DeviceRegistry {
        let registry = DeviceRegistry::new();
        for (i, spec) in self.remote.devices.iter().enumerate() {
            let mut device = EmulatedDevice::from_spec(spec);
            if let Some(seed) = self.seed {
                device = device.with_seed(seed.wrapping_add(i as u64 + 1));
            }
            registry.register(Arc::new(device));
        }
        registry
    }

    /// Assemble the provider set
    ///
    /// Must run inside a tokio runtime when the remote source is enabled,
    /// since its refill worker starts immediately.
    pub fn build_source(&self) -> MachineResult<TripleSource> {
        let local = match self.seed {
            Some(seed) => LocalSampler::seeded(seed),
            None => LocalSampler::new(),
        };
        let mut builder = TripleSource::builder(local).fallback(self.fallback);

        if self.remote.enabled {
            let registry = Arc::new(self.device_registry());
            log::info!(
                "[MachineConfig] remote source: {} device(s), batches of {}",
                registry.len(),
                self.remote.batch.batch_size
            );
            builder = builder.provider(Arc::new(RemoteDeviceBatch::spawn(
                registry,
                self.remote.batch.clone(),
            )));
        }
        if self.qrng.enabled {
            log::info!("[MachineConfig] external QRNG at {}", self.qrng.client.endpoint);
            builder = builder.provider(Arc::new(ExternalHttpRng::new(self.qrng.client.clone())?));
        }
        Ok(builder.build())
    }

    /// Assemble a ready-to-play machine
    pub fn build_machine(
        &self,
        display: Box<dyn DisplaySink>,
    ) -> MachineResult<SlotMachine<TripleSource>> {
        let source = self.build_source()?;
        Ok(SlotMachine::new(source, &self.slot, display)?.with_source(self.source))
    }
}
