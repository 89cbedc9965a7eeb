//! Remote device batches
//!
//! Remote jobs are slow, so draws are fetched in batches and buffered. A
//! single background worker owns device access; it receives refill requests
//! and hands finished batches back over bounded channels. Draining and
//! absorbing batches both happen under one lock, so a pull never observes a
//! half-applied refill.
//!
//! ```text
//!  draw() ──request (cap 1)──▶ refill worker ──least_busy──▶ QuantumDevice
//!    ▲                              │
//!    └────── batch (cap 1) ◀────────┘
//! ```

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use qs_slot::{DRAW_BITS, DRAW_RANGE, REEL_COUNT};

use crate::device::DeviceRegistry;
use crate::error::{EntropyError, EntropyResult};
use crate::kind::SourceKind;
use crate::retry::{RetryPolicy, retry};
use crate::source::RandomSource;

/// Remote batch settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Shots per device job
    pub batch_size: usize,
    /// Smallest device worth using
    pub min_qubits: usize,
    /// How long a draw waits for an in-flight batch before giving up
    pub starvation_timeout_ms: u64,
    /// Upper bound on a single device job
    pub job_timeout_ms: u64,
    /// Retry policy for device jobs
    pub retry: RetryPolicy,
}

impl RemoteConfig {
    pub fn starvation_timeout(&self) -> Duration {
        Duration::from_millis(self.starvation_timeout_ms)
    }

    pub fn job_timeout(&self) -> Duration {
        Duration::from_millis(self.job_timeout_ms)
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            batch_size: 300,
            min_qubits: DRAW_BITS as usize,
            starvation_timeout_ms: 2_000,
            job_timeout_ms: 30_000,
            retry: RetryPolicy::default(),
        }
    }
}

type BatchResult = EntropyResult<Vec<u8>>;

struct BatchState {
    buffer: VecDeque<u8>,
    batches: mpsc::Receiver<BatchResult>,
    refill_in_flight: bool,
    /// Failed refill not yet reported to a draw
    last_failure: Option<EntropyError>,
}

impl BatchState {
    /// Move every finished batch into the buffer
    ///
    /// A failed refill is kept until a draw reports it; a later good batch
    /// supersedes it.
    fn absorb_ready(&mut self) {
        while let Ok(result) = self.batches.try_recv() {
            self.refill_in_flight = false;
            match result {
                Ok(batch) => {
                    self.buffer.extend(batch);
                    self.last_failure = None;
                }
                Err(e) => {
                    log::warn!("[RemoteBatch] refill failed: {}", e);
                    self.last_failure = Some(e);
                }
            }
        }
    }
}

/// Buffered draws from a remote quantum device
///
/// Must be created inside a tokio runtime: construction spawns the refill
/// worker and immediately requests the first batch.
pub struct RemoteDeviceBatch {
    config: RemoteConfig,
    state: Mutex<BatchState>,
    refill_tx: mpsc::Sender<()>,
    worker: JoinHandle<()>,
}

impl RemoteDeviceBatch {
    /// Spawn the refill worker and prefetch the first batch
    pub fn spawn(registry: Arc<DeviceRegistry>, config: RemoteConfig) -> Self {
        let (refill_tx, refill_rx) = mpsc::channel(1);
        let (batch_tx, batch_rx) = mpsc::channel(1);
        let worker = tokio::spawn(refill_worker(registry, config.clone(), refill_rx, batch_tx));

        let mut state = BatchState {
            buffer: VecDeque::with_capacity(config.batch_size),
            batches: batch_rx,
            refill_in_flight: false,
            last_failure: None,
        };
        request_refill(&refill_tx, &mut state);

        Self {
            config,
            state: Mutex::new(state),
            refill_tx,
            worker,
        }
    }

    /// Settings in use
    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    /// Draws currently buffered
    pub async fn buffered(&self) -> usize {
        let mut state = self.state.lock().await;
        state.absorb_ready();
        state.buffer.len()
    }

    /// Pop `count` draws, waiting up to the starvation timeout for a refill
    ///
    /// On failure nothing is consumed; leftover draws stay at the front of
    /// the buffer and are served first once the next batch lands.
    pub async fn take(&self, count: usize) -> EntropyResult<Vec<u8>> {
        let deadline = Instant::now() + self.config.starvation_timeout();
        let mut state = self.state.lock().await;

        state.absorb_ready();
        if state.buffer.len() < count {
            if let Some(e) = state.last_failure.take() {
                return Err(e);
            }
        }

        while state.buffer.len() < count {
            request_refill(&self.refill_tx, &mut state);
            match tokio::time::timeout_at(deadline, state.batches.recv()).await {
                Ok(Some(result)) => {
                    state.refill_in_flight = false;
                    state.buffer.extend(result?);
                }
                Ok(None) => {
                    return Err(EntropyError::ProviderUnavailable(
                        "remote refill worker stopped".into(),
                    ));
                }
                Err(_) => {
                    log::warn!(
                        "[RemoteBatch] starved: {} of {} draws buffered after {:?}",
                        state.buffer.len(),
                        count,
                        self.config.starvation_timeout()
                    );
                    return Err(EntropyError::NotReady {
                        buffered: state.buffer.len(),
                        needed: count,
                    });
                }
            }
        }

        let draws: Vec<u8> = state.buffer.drain(..count).collect();
        if state.buffer.len() < REEL_COUNT {
            request_refill(&self.refill_tx, &mut state);
        }
        Ok(draws)
    }
}

impl Drop for RemoteDeviceBatch {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

#[async_trait]
impl RandomSource for RemoteDeviceBatch {
    fn kind(&self) -> SourceKind {
        SourceKind::RemoteDevice
    }

    async fn is_ready(&self) -> bool {
        self.buffered().await >= REEL_COUNT
    }

    async fn draw(&self, count: usize) -> EntropyResult<Vec<u8>> {
        self.take(count).await
    }
}

/// Ask the worker for a batch unless one is already on its way
fn request_refill(refill_tx: &mpsc::Sender<()>, state: &mut BatchState) {
    if state.refill_in_flight {
        return;
    }
    match refill_tx.try_send(()) {
        Ok(()) | Err(mpsc::error::TrySendError::Full(())) => {
            log::debug!("[RemoteBatch] refill requested ({} buffered)", state.buffer.len());
            state.refill_in_flight = true;
        }
        Err(mpsc::error::TrySendError::Closed(())) => {
            log::warn!("[RemoteBatch] refill worker is gone");
        }
    }
}

async fn refill_worker(
    registry: Arc<DeviceRegistry>,
    config: RemoteConfig,
    mut requests: mpsc::Receiver<()>,
    batches: mpsc::Sender<BatchResult>,
) {
    while requests.recv().await.is_some() {
        let result = retry(&config.retry, "remote refill", || fetch_batch(&registry, &config)).await;
        if let Ok(batch) = &result {
            log::info!("[RemoteBatch] received {} draws", batch.len());
        }
        if batches.send(result).await.is_err() {
            break;
        }
    }
    log::debug!("[RemoteBatch] refill worker stopped");
}

async fn fetch_batch(registry: &DeviceRegistry, config: &RemoteConfig) -> BatchResult {
    let device = registry.least_busy(config.min_qubits.max(DRAW_BITS as usize))?;
    log::info!(
        "[RemoteBatch] sampling {} shots on '{}' ({} jobs queued)",
        config.batch_size,
        device.name(),
        device.pending_jobs()
    );

    let job = device.sample_uniform(DRAW_BITS as usize, config.batch_size);
    let readouts = tokio::time::timeout(config.job_timeout(), job)
        .await
        .map_err(|_| {
            EntropyError::ProviderUnavailable(format!(
                "{}: no result after {:?}",
                device.name(),
                config.job_timeout()
            ))
        })?
        .map_err(|e| EntropyError::ProviderUnavailable(format!("{}: {}", device.name(), e)))?;

    readouts
        .into_iter()
        .map(|r| {
            u8::try_from(r)
                .ok()
                .filter(|&d| d < DRAW_RANGE)
                .ok_or_else(|| EntropyError::Decode(format!("register readout {} out of range", r)))
        })
        .collect()
}
