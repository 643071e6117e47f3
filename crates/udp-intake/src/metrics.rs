// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::sync::atomic::{AtomicU64, Ordering};

/// Shared pipeline telemetry.
///
/// Injected into the pipeline at construction and shared behind an `Arc`;
/// operators observe the pipeline exclusively through [`snapshot`] and logs.
///
/// [`snapshot`]: PipelineMetrics::snapshot
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    events: AtomicU64,
    listener_errors: AtomicU64,
    worker_errors: AtomicU64,
    queue_capacity: AtomicU64,
    workers: AtomicU64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Records forwarded to the output sink
    pub events: u64,
    /// Listener attempts that died and were retried
    pub listener_errors: u64,
    /// Workers lost to decode failures
    pub worker_errors: u64,
    /// Configured intake queue capacity
    pub queue_capacity: u64,
    /// Configured worker count
    pub workers: u64,
}

impl PipelineMetrics {
    pub fn incr_events(&self) {
        self.events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_listener_errors(&self) {
        self.listener_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_worker_errors(&self) {
        self.worker_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_queue_capacity(&self, capacity: usize) {
        self.queue_capacity.store(capacity as u64, Ordering::Relaxed);
    }

    pub fn set_workers(&self, workers: usize) {
        self.workers.store(workers as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events: self.events.load(Ordering::Relaxed),
            listener_errors: self.listener_errors.load(Ordering::Relaxed),
            worker_errors: self.worker_errors.load(Ordering::Relaxed),
            queue_capacity: self.queue_capacity.load(Ordering::Relaxed),
            workers: self.workers.load(Ordering::Relaxed),
        }
    }
}
