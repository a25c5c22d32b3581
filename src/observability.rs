//! Observability stubs (metrics, tracing)

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics handle for recording counters/gauges
#[derive(Debug, Default)]
pub struct Metrics {
    webhooks_received: AtomicU64,
    pipelines_completed: AtomicU64,
    pipelines_failed: AtomicU64,
    pipelines_skipped: AtomicU64,
    render_failures: AtomicU64,
    upload_failures: AtomicU64,
    link_failures: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn webhook_received(&self) {
        self.webhooks_received.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "webhooks_received", "Metric incremented");
    }

    pub fn pipeline_completed(&self) {
        self.pipelines_completed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "pipelines_completed", "Metric incremented");
    }

    pub fn pipeline_failed(&self) {
        self.pipelines_failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "pipelines_failed", "Metric incremented");
    }

    pub fn pipeline_skipped(&self) {
        self.pipelines_skipped.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "pipelines_skipped", "Metric incremented");
    }

    pub fn render_failed(&self) {
        self.render_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "render_failures", "Metric incremented");
    }

    pub fn upload_failed(&self) {
        self.upload_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "upload_failures", "Metric incremented");
    }

    pub fn link_failed(&self) {
        self.link_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "link_failures", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            webhooks_received: self.webhooks_received.load(Ordering::Relaxed),
            pipelines_completed: self.pipelines_completed.load(Ordering::Relaxed),
            pipelines_failed: self.pipelines_failed.load(Ordering::Relaxed),
            pipelines_skipped: self.pipelines_skipped.load(Ordering::Relaxed),
            render_failures: self.render_failures.load(Ordering::Relaxed),
            upload_failures: self.upload_failures.load(Ordering::Relaxed),
            link_failures: self.link_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub webhooks_received: u64,
    pub pipelines_completed: u64,
    pub pipelines_failed: u64,
    pub pipelines_skipped: u64,
    pub render_failures: u64,
    pub upload_failures: u64,
    pub link_failures: u64,
}
