//! Remote batch buffering, refill and starvation behavior

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use qs_entropy::{
    DeviceError, DeviceRegistry, EntropyError, FallbackPolicy, LocalSampler, QuantumDevice,
    RandomSource, RemoteConfig, RemoteDeviceBatch, RetryPolicy, SourceKind, TripleProvider,
    TripleSource,
};
use qs_slot::{Symbol, Triple};

// ═══════════════════════════════════════════════════════════════════════════════
// TEST FIXTURES
// ═══════════════════════════════════════════════════════════════════════════════

enum Job {
    Ready(Vec<u64>),
    Gated(Arc<Notify>, Vec<u64>),
    Fail,
}

/// Device that plays back a fixed list of jobs
struct ScriptedDevice {
    jobs: Mutex<VecDeque<Job>>,
    calls: AtomicUsize,
}

impl ScriptedDevice {
    fn new(jobs: Vec<Job>) -> Arc<Self> {
        Arc::new(Self {
            jobs: Mutex::new(jobs.into()),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl QuantumDevice for ScriptedDevice {
    fn name(&self) -> &str {
        "scripted_5q"
    }

    fn num_qubits(&self) -> usize {
        5
    }

    fn is_simulator(&self) -> bool {
        false
    }

    fn pending_jobs(&self) -> usize {
        0
    }

    async fn sample_uniform(&self, _width: usize, _shots: usize) -> Result<Vec<u64>, DeviceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let job = self.jobs.lock().pop_front();
        match job {
            Some(Job::Ready(values)) => Ok(values),
            Some(Job::Gated(gate, values)) => {
                gate.notified().await;
                Ok(values)
            }
            Some(Job::Fail) | None => Err(DeviceError::ExecutionFailed("job rejected".into())),
        }
    }
}

fn config(batch_size: usize, starvation_ms: u64) -> RemoteConfig {
    RemoteConfig {
        batch_size,
        min_qubits: 3,
        starvation_timeout_ms: starvation_ms,
        job_timeout_ms: 5_000,
        retry: RetryPolicy::none(),
    }
}

fn registry_with(device: Arc<ScriptedDevice>) -> Arc<DeviceRegistry> {
    let registry = Arc::new(DeviceRegistry::new());
    registry.register(device);
    registry
}

// ═══════════════════════════════════════════════════════════════════════════════
// BUFFERING
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_prefetch_serves_fifo_triples() {
    let device = ScriptedDevice::new(vec![Job::Ready(vec![7, 7, 7, 0, 1, 2])]);
    let batch = RemoteDeviceBatch::spawn(registry_with(device.clone()), config(6, 1_000));

    assert_eq!(batch.take(3).await.unwrap(), vec![7, 7, 7]);
    assert_eq!(batch.take(3).await.unwrap(), vec![0, 1, 2]);
    assert!(device.calls.load(Ordering::SeqCst) >= 1);
}

#[tokio::test]
async fn test_refill_after_drain() {
    let device = ScriptedDevice::new(vec![
        Job::Ready(vec![1, 2, 3]),
        Job::Ready(vec![4, 5, 6]),
    ]);
    let batch = RemoteDeviceBatch::spawn(registry_with(device.clone()), config(3, 1_000));

    assert_eq!(batch.take(3).await.unwrap(), vec![1, 2, 3]);
    assert_eq!(batch.take(3).await.unwrap(), vec![4, 5, 6]);
    assert!(device.calls.load(Ordering::SeqCst) >= 2);
}

// ═══════════════════════════════════════════════════════════════════════════════
// STARVATION
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_two_leftover_draws_starve_then_recover() {
    let gate = Arc::new(Notify::new());
    let device = ScriptedDevice::new(vec![
        Job::Ready(vec![1, 2, 3, 4, 5]),
        Job::Gated(gate.clone(), vec![6, 7, 0, 1, 2]),
    ]);
    let batch = RemoteDeviceBatch::spawn(registry_with(device), config(5, 150));

    assert_eq!(batch.take(3).await.unwrap(), vec![1, 2, 3]);
    assert_eq!(batch.buffered().await, 2);

    // The refill is stuck on the device: nothing is consumed
    let err = batch.take(3).await.unwrap_err();
    assert_eq!(err, EntropyError::NotReady { buffered: 2, needed: 3 });
    assert!(err.is_retryable());
    assert_eq!(batch.buffered().await, 2);
    assert!(!batch.is_ready().await);

    // Once the batch lands, leftovers go first
    gate.notify_one();
    assert_eq!(batch.take(3).await.unwrap(), vec![4, 5, 6]);
    assert_eq!(batch.take(3).await.unwrap(), vec![7, 0, 1]);
}

#[tokio::test]
async fn test_starvation_falls_back_to_local() {
    let gate = Arc::new(Notify::new());
    let device = ScriptedDevice::new(vec![
        Job::Ready(vec![1, 2, 3, 4, 5]),
        Job::Gated(gate, vec![0; 5]),
    ]);
    let remote = Arc::new(RemoteDeviceBatch::spawn(registry_with(device), config(5, 100)));
    let source = TripleSource::builder(LocalSampler::seeded(21))
        .provider(remote.clone())
        .fallback(FallbackPolicy::LocalSimulator)
        .build();

    let first = source.next_triple(SourceKind::RemoteDevice).await.unwrap();
    assert_eq!(first, Triple::new(Symbol::Cherry, Symbol::Grape, Symbol::Lemon));

    let second = source.next_triple(SourceKind::RemoteDevice).await.unwrap();
    assert_eq!(second, LocalSampler::seeded(21).next_triple());
    assert_eq!(remote.buffered().await, 2);
}

// ═══════════════════════════════════════════════════════════════════════════════
// FAILURES
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_device_failure_surfaces_as_unavailable() {
    let device = ScriptedDevice::new(vec![Job::Fail]);
    let batch = RemoteDeviceBatch::spawn(registry_with(device), config(3, 1_000));

    let err = batch.take(3).await.unwrap_err();
    assert!(matches!(err, EntropyError::ProviderUnavailable(_)), "{:?}", err);
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let device = ScriptedDevice::new(vec![Job::Fail, Job::Ready(vec![5, 5, 5])]);
    let mut cfg = config(3, 1_000);
    cfg.retry = RetryPolicy {
        max_attempts: 2,
        initial_backoff_ms: 1,
        multiplier: 1.0,
        max_backoff_ms: 1,
    };
    let batch = RemoteDeviceBatch::spawn(registry_with(device.clone()), cfg);

    assert_eq!(batch.take(3).await.unwrap(), vec![5, 5, 5]);
    assert_eq!(device.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_no_eligible_device() {
    let registry = Arc::new(DeviceRegistry::new());
    let batch = RemoteDeviceBatch::spawn(registry, config(3, 1_000));

    assert_eq!(
        batch.take(3).await.unwrap_err(),
        EntropyError::NoEligibleProvider { min_qubits: 3 }
    );
}

#[tokio::test]
async fn test_out_of_range_readout_is_a_decode_error() {
    let device = ScriptedDevice::new(vec![Job::Ready(vec![1, 9, 2])]);
    let batch = RemoteDeviceBatch::spawn(registry_with(device), config(3, 1_000));

    assert!(matches!(batch.take(3).await, Err(EntropyError::Decode(_))));
    assert_eq!(batch.buffered().await, 0);
}

#[tokio::test]
async fn test_readiness_check_keeps_refill_failure() {
    let gate = Arc::new(Notify::new());
    let device = ScriptedDevice::new(vec![Job::Fail, Job::Gated(gate, vec![1, 1, 1])]);
    let batch = RemoteDeviceBatch::spawn(registry_with(device), config(3, 1_000));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!batch.is_ready().await);
    assert_eq!(batch.buffered().await, 0);

    let err = batch.take(3).await.unwrap_err();
    assert!(matches!(err, EntropyError::ProviderUnavailable(_)), "{:?}", err);
}

#[tokio::test]
async fn test_hung_job_times_out_and_is_retried() {
    let never = Arc::new(Notify::new());
    let device = ScriptedDevice::new(vec![
        Job::Gated(never, vec![0, 0, 0]),
        Job::Ready(vec![2, 2, 2]),
    ]);
    let mut cfg = config(3, 2_000);
    cfg.job_timeout_ms = 50;
    cfg.retry = RetryPolicy {
        max_attempts: 2,
        initial_backoff_ms: 1,
        multiplier: 1.0,
        max_backoff_ms: 1,
    };
    let batch = RemoteDeviceBatch::spawn(registry_with(device.clone()), cfg);

    assert_eq!(batch.take(3).await.unwrap(), vec![2, 2, 2]);
    assert_eq!(device.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_failed_refill_is_requested_again() {
    let device = ScriptedDevice::new(vec![Job::Fail, Job::Ready(vec![3, 3, 3])]);
    let batch = RemoteDeviceBatch::spawn(registry_with(device), config(3, 1_000));

    assert!(batch.take(3).await.is_err());
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(batch.take(3).await.unwrap(), vec![3, 3, 3]);
}
