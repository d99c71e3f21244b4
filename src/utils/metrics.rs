//! Codec metrics
//!
//! Atomic counters for packet decoding, RMC traffic and compression.
//! Recording never blocks and never fails.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Counters shared by every pipeline that records into them
#[derive(Debug)]
pub struct Metrics {
    /// Datagrams decoded into packets
    pub packets_decoded: AtomicU64,
    /// Datagrams, envelopes or frames rejected as malformed
    pub decode_errors: AtomicU64,
    /// RMC requests decoded
    pub requests_decoded: AtomicU64,
    /// RMC responses serialized
    pub responses_encoded: AtomicU64,
    /// Payload bytes received (before decompression)
    pub bytes_received: AtomicU64,
    /// Payload bytes sent (after compression)
    pub bytes_sent: AtomicU64,
    /// Outbound payloads offered to the compressor
    pub compression_total: AtomicU64,
    /// Outbound payloads actually sent compressed
    pub compression_applied: AtomicU64,
    /// Inbound frames the decompressor rejected
    pub decompression_failures: AtomicU64,
    /// Inbound frames rejected by the ratio witness
    pub ratio_mismatches: AtomicU64,
    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            packets_decoded: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
            requests_decoded: AtomicU64::new(0),
            responses_encoded: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            compression_total: AtomicU64::new(0),
            compression_applied: AtomicU64::new(0),
            decompression_failures: AtomicU64::new(0),
            ratio_mismatches: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn packet_decoded(&self) {
        self.packets_decoded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an inbound request and its on-wire payload size
    pub fn request_decoded(&self, byte_count: u64) {
        self.requests_decoded.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(byte_count, Ordering::Relaxed);
    }

    /// Record an outbound response and its on-wire payload size
    pub fn response_encoded(&self, byte_count: u64) {
        self.responses_encoded.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(byte_count, Ordering::Relaxed);
    }

    pub fn compression_attempt(&self, applied: bool) {
        self.compression_total.fetch_add(1, Ordering::Relaxed);
        if applied {
            self.compression_applied.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn decompression_failure(&self) {
        self.decompression_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn ratio_mismatch(&self) {
        self.ratio_mismatches.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            packets_decoded: self.packets_decoded.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            requests_decoded: self.requests_decoded.load(Ordering::Relaxed),
            responses_encoded: self.responses_encoded.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            compression_total: self.compression_total.load(Ordering::Relaxed),
            compression_applied: self.compression_applied.load(Ordering::Relaxed),
            decompression_failures: self.decompression_failures.load(Ordering::Relaxed),
            ratio_mismatches: self.ratio_mismatches.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            packets_decoded = snapshot.packets_decoded,
            decode_errors = snapshot.decode_errors,
            requests_decoded = snapshot.requests_decoded,
            responses_encoded = snapshot.responses_encoded,
            bytes_received = snapshot.bytes_received,
            bytes_sent = snapshot.bytes_sent,
            compression_total = snapshot.compression_total,
            compression_applied = snapshot.compression_applied,
            decompression_failures = snapshot.decompression_failures,
            ratio_mismatches = snapshot.ratio_mismatches,
            uptime_seconds = snapshot.uptime_seconds,
            "Codec metrics snapshot"
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub packets_decoded: u64,
    pub decode_errors: u64,
    pub requests_decoded: u64,
    pub responses_encoded: u64,
    pub bytes_received: u64,
    pub bytes_sent: u64,
    pub compression_total: u64,
    pub compression_applied: u64,
    pub decompression_failures: u64,
    pub ratio_mismatches: u64,
    pub uptime_seconds: u64,
}

static METRICS: once_cell::sync::Lazy<Arc<Metrics>> =
    once_cell::sync::Lazy::new(|| Arc::new(Metrics::new()));

/// Get the global metrics instance
pub fn global_metrics() -> Arc<Metrics> {
    Arc::clone(&METRICS)
}

/// Timer for measuring operation duration
pub struct Timer {
    start: Instant,
    operation: &'static str,
}

impl Timer {
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        debug!(
            operation = self.operation,
            duration_us = self.start.elapsed().as_micros() as u64,
            "Operation completed"
        );
    }
}
