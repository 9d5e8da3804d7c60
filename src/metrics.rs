// Operation metrics
//
// Lightweight counters for install, import and archive handling.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Installer metrics
///
/// Uses atomic operations so the worker tasks can record without locks.
/// Logged on shutdown by the binary.
#[derive(Debug)]
pub struct InstallMetrics {
    pub installs_committed: AtomicUsize,
    pub installs_failed: AtomicUsize,
    pub installs_cancelled: AtomicUsize,

    pub imports_succeeded: AtomicUsize,
    pub imports_failed: AtomicUsize,

    /// Archives refused by validation
    pub archives_rejected: AtomicUsize,

    pub files_extracted: AtomicU64,
    pub bytes_extracted: AtomicU64,

    /// Wall time of committed installs in milliseconds
    pub total_install_time_ms: AtomicU64,

    start_time: Instant,
}

impl InstallMetrics {
    pub fn new() -> Self {
        Self {
            installs_committed: AtomicUsize::new(0),
            installs_failed: AtomicUsize::new(0),
            installs_cancelled: AtomicUsize::new(0),
            imports_succeeded: AtomicUsize::new(0),
            imports_failed: AtomicUsize::new(0),
            archives_rejected: AtomicUsize::new(0),
            files_extracted: AtomicU64::new(0),
            bytes_extracted: AtomicU64::new(0),
            total_install_time_ms: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_install_committed(&self, duration: Duration) {
        self.installs_committed.fetch_add(1, Ordering::Relaxed);
        self.total_install_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn record_install_failed(&self) {
        self.installs_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_install_cancelled(&self) {
        self.installs_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_import(&self, success: bool) {
        if success {
            self.imports_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.imports_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_archive_rejected(&self) {
        self.archives_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_extraction(&self, files: usize, bytes: u64) {
        self.files_extracted
            .fetch_add(files as u64, Ordering::Relaxed);
        self.bytes_extracted.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average wall time per committed install in milliseconds
    pub fn avg_install_time_ms(&self) -> f64 {
        let total = self.total_install_time_ms.load(Ordering::Relaxed);
        let count = self.installs_committed.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    pub fn log_summary(&self) {
        tracing::info!("=== Installer Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Installs: {} committed, {} failed, {} cancelled (avg: {:.0}ms)",
            self.installs_committed.load(Ordering::Relaxed),
            self.installs_failed.load(Ordering::Relaxed),
            self.installs_cancelled.load(Ordering::Relaxed),
            self.avg_install_time_ms()
        );
        tracing::info!(
            "Imports: {} succeeded, {} failed, {} archives rejected",
            self.imports_succeeded.load(Ordering::Relaxed),
            self.imports_failed.load(Ordering::Relaxed),
            self.archives_rejected.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Extracted: {} files, {} bytes",
            self.files_extracted.load(Ordering::Relaxed),
            self.bytes_extracted.load(Ordering::Relaxed)
        );
    }
}

impl Default for InstallMetrics {
    fn default() -> Self {
        Self::new()
    }
}
