//! Stress drivers for the data managers.
//!
//! These drive a node from many threads at once and count outcomes; the
//! caller asserts on the counts and on the node state afterwards.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};
use stratum_core::{InstanceDataManager, SegmentMetadata};

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
        println!("\n=== {name} ===");
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
    /// Adds performed by each writer thread.
    pub operations: usize,
    /// Number of writer threads.
    pub threads: usize,
    /// Number of distinct resources written to.
    pub resources: usize,
    /// Number of distinct segment names per resource.
    pub segments_per_resource: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 1_000,
            threads: 4,
            resources: 8,
            segments_per_resource: 16,
        }
    }
}

impl StressConfig {
    /// Returns the resource name used for index `i`.
    pub fn resource_name(&self, i: usize) -> String {
        format!("stress_{}", i % self.resources.max(1))
    }

    /// Returns the segment name used for index `i`.
    pub fn segment_name(&self, i: usize) -> String {
        format!("seg_{}", i % self.segments_per_resource.max(1))
    }
}

/// Adds segments from all threads at once, all starting together.
///
/// Every thread cycles through the same resource and segment names, so the
/// run mixes first adds, concurrent provisioning and replacements.
pub fn stress_concurrent_adds(node: Arc<InstanceDataManager>, config: &StressConfig) -> StressTestResult {
    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(config.threads.max(1)));

    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads.max(1))
        .map(|t| {
            let node = Arc::clone(&node);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let barrier = Arc::clone(&barrier);
            let config = config.clone();

            thread::spawn(move || {
                barrier.wait();
                for i in 0..config.operations {
                    let metadata = SegmentMetadata::new(
                        config.segment_name(i / config.resources.max(1)),
                        config.resource_name(i),
                    )
                    .with_total_docs((t * config.operations + i) as u64);

                    match node.add_segment(metadata) {
                        Ok(()) => {
                            successful.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(_) => {
                            failed.fetch_add(1, Ordering::Relaxed);
                        }
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

/// Runs writers and snapshot readers side by side.
///
/// Readers take registry and segment snapshots and count a failure for any
/// snapshot holding two segments with the same name.
pub fn stress_mixed_readers(node: Arc<InstanceDataManager>, config: &StressConfig) -> StressTestResult {
    let writers = {
        let node = Arc::clone(&node);
        let config = config.clone();
        thread::spawn(move || stress_concurrent_adds(node, &config))
    };

    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let start = Instant::now();

    let readers: Vec<_> = (0..config.threads.max(1))
        .map(|_| {
            let node = Arc::clone(&node);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let operations = config.operations;

            thread::spawn(move || {
                for _ in 0..operations {
                    let consistent = node.get_resource_data_managers().iter().all(|resource| {
                        let segments = resource.get_all_segments();
                        segments.windows(2).all(|w| w[0].name() < w[1].name())
                    });
                    if consistent {
                        successful.fetch_add(1, Ordering::Relaxed);
                    } else {
                        failed.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
        })
        .collect();

    for handle in readers {
        handle.join().expect("Thread panicked");
    }
    let write_result = writers.join().expect("Thread panicked");

    StressTestResult::new(
        successful.load(Ordering::Relaxed) + write_result.successful_ops,
        failed.load(Ordering::Relaxed) + write_result.failed_ops,
        start.elapsed(),
    )
}
