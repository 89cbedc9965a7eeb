//! Remote quantum devices and least-busy selection
//!
//! The execution engine behind a device is external; this module only knows
//! how to ask a device for uniformly random register readouts and how to
//! pick which device to ask.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{EntropyError, EntropyResult};

/// Device-level failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    #[error("Device not available")]
    NotAvailable,

    #[error("Register too large: requires {required} qubits, device has {available}")]
    RegisterTooLarge { required: usize, available: usize },

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

/// A quantum execution resource that can sample a uniform register
#[async_trait]
pub trait QuantumDevice: Send + Sync {
    /// Backend name
    fn name(&self) -> &str;

    /// Qubits on the device
    fn num_qubits(&self) -> usize;

    /// Simulators never count as remote devices
    fn is_simulator(&self) -> bool;

    /// Accepting jobs right now
    fn is_operational(&self) -> bool {
        true
    }

    /// Jobs queued ahead of a new submission
    fn pending_jobs(&self) -> usize;

    /// Put `width` qubits in equal superposition, measure, repeat `shots` times
    ///
    /// Each returned value is one shot's register readout in `0..2^width`.
    async fn sample_uniform(&self, width: usize, shots: usize) -> Result<Vec<u64>, DeviceError>;
}

/// Known devices
#[derive(Default)]
pub struct DeviceRegistry {
    devices: RwLock<Vec<Arc<dyn QuantumDevice>>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a device
    pub fn register(&self, device: Arc<dyn QuantumDevice>) {
        log::debug!(
            "[Devices] registered '{}' ({} qubits, simulator: {})",
            device.name(),
            device.num_qubits(),
            device.is_simulator()
        );
        self.devices.write().push(device);
    }

    /// Number of registered devices
    pub fn len(&self) -> usize {
        self.devices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.read().is_empty()
    }

    /// Names of every registered device
    pub fn names(&self) -> Vec<String> {
        self.devices
            .read()
            .iter()
            .map(|d| d.name().to_string())
            .collect()
    }

    /// Pick the operational, non-simulator device with the shortest queue
    ///
    /// Ties go to the device registered first.
    pub fn least_busy(&self, min_qubits: usize) -> EntropyResult<Arc<dyn QuantumDevice>> {
        let devices = self.devices.read();
        devices
            .iter()
            .filter(|d| d.num_qubits() >= min_qubits && !d.is_simulator() && d.is_operational())
            .min_by_key(|d| d.pending_jobs())
            .cloned()
            .ok_or(EntropyError::NoEligibleProvider { min_qubits })
    }
}

/// Description of an emulated device, as found in config files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulatedDeviceSpec {
    pub name: String,
    pub qubits: usize,
    pub simulator: bool,
    pub pending_jobs: usize,
    pub latency_ms: u64,
}

impl Default for EmulatedDeviceSpec {
    fn default() -> Self {
        Self {
            name: "emulated_5q".into(),
            qubits: 5,
            simulator: false,
            pending_jobs: 0,
            latency_ms: 250,
        }
    }
}

/// In-process stand-in for a cloud device
///
/// Behaves like a remote backend (queue length, latency, availability) while
/// drawing its readouts from a local PRNG.
pub struct EmulatedDevice {
    name: String,
    qubits: usize,
    simulator: bool,
    pending: AtomicUsize,
    operational: AtomicBool,
    latency: Duration,
    rng: Mutex<StdRng>,
}

impl EmulatedDevice {
    pub fn new(name: impl Into<String>, qubits: usize) -> Self {
        Self {
            name: name.into(),
            qubits,
            simulator: false,
            pending: AtomicUsize::new(0),
            operational: AtomicBool::new(true),
            latency: Duration::ZERO,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Build from a config entry
    pub fn from_spec(spec: &EmulatedDeviceSpec) -> Self {
        Self::new(spec.name.clone(), spec.qubits)
            .simulator(spec.simulator)
            .with_pending_jobs(spec.pending_jobs)
            .with_latency(Duration::from_millis(spec.latency_ms))
    }

    /// Mark as a simulator
    pub fn simulator(mut self, simulator: bool) -> Self {
        self.simulator = simulator;
        self
    }

    /// Jobs already queued
    pub fn with_pending_jobs(self, pending: usize) -> Self {
        self.pending.store(pending, Ordering::Relaxed);
        self
    }

    /// Time a job spends on the device
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Reproducible readouts
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Take the device offline or bring it back
    pub fn set_operational(&self, operational: bool) {
        self.operational.store(operational, Ordering::Relaxed);
    }
}

#[async_trait]
impl QuantumDevice for EmulatedDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_qubits(&self) -> usize {
        self.qubits
    }

    fn is_simulator(&self) -> bool {
        self.simulator
    }

    fn is_operational(&self) -> bool {
        self.operational.load(Ordering::Relaxed)
    }

    fn pending_jobs(&self) -> usize {
        self.pending.load(Ordering::Relaxed)
    }

    async fn sample_uniform(&self, width: usize, shots: usize) -> Result<Vec<u64>, DeviceError> {
        if !self.is_operational() {
            return Err(DeviceError::NotAvailable);
        }
        if width > self.qubits || width >= u64::BITS as usize {
            return Err(DeviceError::RegisterTooLarge {
                required: width,
                available: self.qubits,
            });
        }

        self.pending.fetch_add(1, Ordering::Relaxed);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let readouts = {
            let mut rng = self.rng.lock();
            (0..shots).map(|_| rng.random_range(0..1u64 << width)).collect()
        };
        self.pending.fetch_sub(1, Ordering::Relaxed);

        Ok(readouts)
    }
}
