// Private module declaration
mod server;

use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry};

// Re-export for public API
pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Workflow operations (outcome, latency)
// - Notification fan-out (published per event, delivered per session)
// - Connected subscriber sessions
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

/// Central metrics registry for the entire application
pub struct Metrics {
    registry: Registry,

    // Workflow Metrics
    pub workflow_operations: IntCounterVec,
    pub workflow_operation_duration: HistogramVec,

    // Notification Metrics
    pub notifications_published: IntCounterVec,
    pub notifications_delivered: IntCounter,
    pub subscriber_sessions: IntGauge,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        // Workflow Metrics
        let workflow_operations = IntCounterVec::new(
            Opts::new("workflow_operations_total", "Total workflow operations by outcome"),
            &["operation", "outcome"],
        )?;
        registry.register(Box::new(workflow_operations.clone()))?;

        let workflow_operation_duration = HistogramVec::new(
            HistogramOpts::new("workflow_operation_duration_seconds", "Workflow operation duration")
                .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
            &["operation"],
        )?;
        registry.register(Box::new(workflow_operation_duration.clone()))?;

        // Notification Metrics
        let notifications_published = IntCounterVec::new(
            Opts::new("notifications_published_total", "Notifications published by event and group kind"),
            &["event", "group_kind"],
        )?;
        registry.register(Box::new(notifications_published.clone()))?;

        let notifications_delivered = IntCounter::new(
            "notifications_delivered_total",
            "Notifications handed to a connected session",
        )?;
        registry.register(Box::new(notifications_delivered.clone()))?;

        let subscriber_sessions = IntGauge::new(
            "subscriber_sessions",
            "Currently connected subscriber sessions",
        )?;
        registry.register(Box::new(subscriber_sessions.clone()))?;

        Ok(Self {
            registry,
            workflow_operations,
            workflow_operation_duration,
            notifications_published,
            notifications_delivered,
            subscriber_sessions,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Helper to record a finished workflow operation
    pub fn record_operation(&self, operation: &str, outcome: &str, duration_secs: f64) {
        self.workflow_operations.with_label_values(&[operation, outcome]).inc();
        self.workflow_operation_duration
            .with_label_values(&[operation])
            .observe(duration_secs);
    }

    pub fn record_notification_published(&self, event: &str, group_kind: &str) {
        self.notifications_published.with_label_values(&[event, group_kind]).inc();
    }

    pub fn record_notifications_delivered(&self, count: usize) {
        self.notifications_delivered.inc_by(count as u64);
    }

    pub fn set_subscriber_sessions(&self, count: usize) {
        self.subscriber_sessions.set(count as i64);
    }
}
