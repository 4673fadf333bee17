//! Stress tests for LocalSeal.
//!
//! These exercise key resolution and stream encryption under concurrent
//! access.

use localseal_core::{ProtectionKey, ProtectionKeyManager, StreamCipherCodec};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of operations to perform.
    pub operations: usize,
    /// Number of concurrent threads.
    pub threads: usize,
    /// Size of each payload in bytes.
    pub payload_size: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 1_000,
            threads: 4,
            payload_size: 256,
        }
    }
}

/// Resolves the key from `threads` threads released at the same instant.
///
/// Returns what every thread observed, in thread order.
pub fn stress_concurrent_resolution(
    keys: Arc<ProtectionKeyManager>,
    threads: usize,
) -> Vec<Arc<ProtectionKey>> {
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let keys = Arc::clone(&keys);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                keys.resolve().expect("Key resolution failed")
            })
        })
        .collect();

    handles
        .into_iter()
        .map(|handle| handle.join().expect("Thread panicked"))
        .collect()
}

/// Run a sequential encrypt/decrypt round-trip stress test.
pub fn stress_sequential_roundtrips(
    codec: &StreamCipherCodec,
    config: &StressConfig,
) -> StressTestResult {
    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for i in 0..config.operations {
        let payload = vec![(i % 256) as u8; config.payload_size];
        if roundtrip(codec, &payload) {
            successful += 1;
        } else {
            failed += 1;
        }
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Run a concurrent encrypt/decrypt round-trip stress test.
pub fn stress_concurrent_roundtrips(
    codec: Arc<StreamCipherCodec>,
    config: &StressConfig,
) -> StressTestResult {
    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let ops_per_thread = config.operations / config.threads;

    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let codec = Arc::clone(&codec);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let payload_size = config.payload_size;

            thread::spawn(move || {
                for i in 0..ops_per_thread {
                    let payload = vec![((t * ops_per_thread + i) % 256) as u8; payload_size];
                    if roundtrip(&codec, &payload) {
                        successful.fetch_add(1, Ordering::Relaxed);
                    } else {
                        failed.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

fn roundtrip(codec: &StreamCipherCodec, payload: &[u8]) -> bool {
    codec
        .encrypt_to_vec(payload)
        .and_then(|sealed| codec.decrypt_slice(&sealed))
        .map(|opened| opened == payload)
        .unwrap_or(false)
}
