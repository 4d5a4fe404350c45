//! Prometheus Metrics Registry - Webhook Execution Observability
//!
//! Registers the service metrics and renders them in text exposition
//! format for the `/metrics` route. Covers signal outcomes, executed
//! orders, exchange latency and retry attempts.

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Centralized Prometheus metrics for the webhook executor.
///
/// All metrics follow the naming convention `tradehook_*`.
pub struct MetricsRegistry {
    /// Prometheus registry.
    registry: Registry,
    /// Signals received, labelled by terminal outcome.
    pub signals: IntCounterVec,
    /// Orders acknowledged by the exchange, labelled by side.
    pub orders_executed: IntCounterVec,
    /// Exchange round-trip latency per executed signal (milliseconds).
    pub exchange_latency_ms: Histogram,
    /// Dispatch attempts needed per executed signal.
    pub attempts_per_order: Histogram,
    /// Webhook signature verification failures.
    pub signature_failures: IntCounter,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let signals = IntCounterVec::new(
            Opts::new(
                "tradehook_signals_total",
                "Signals received by terminal outcome",
            ),
            &["outcome"],
        )?;

        let orders_executed = IntCounterVec::new(
            Opts::new(
                "tradehook_orders_executed_total",
                "Orders acknowledged by the exchange",
            ),
            &["side"],
        )?;

        let exchange_latency_ms = Histogram::with_opts(
            HistogramOpts::new(
                "tradehook_exchange_latency_ms",
                "Exchange round-trip latency per executed signal in milliseconds",
            )
            .buckets(vec![
                50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0,
            ]),
        )?;

        let attempts_per_order = Histogram::with_opts(
            HistogramOpts::new(
                "tradehook_attempts_per_order",
                "Dispatch attempts per executed signal",
            )
            .buckets(vec![1.0, 2.0, 3.0, 4.0, 5.0]),
        )?;

        let signature_failures = IntCounter::new(
            "tradehook_signature_failures_total",
            "Webhook signature verification failures",
        )?;

        // Register all metrics
        registry.register(Box::new(signals.clone()))?;
        registry.register(Box::new(orders_executed.clone()))?;
        registry.register(Box::new(exchange_latency_ms.clone()))?;
        registry.register(Box::new(attempts_per_order.clone()))?;
        registry.register(Box::new(signature_failures.clone()))?;

        Ok(Self {
            registry,
            signals,
            orders_executed,
            exchange_latency_ms,
            attempts_per_order,
            signature_failures,
        })
    }

    /// Count one signal's terminal outcome.
    pub fn record_signal(&self, outcome: &str) {
        self.signals.with_label_values(&[outcome]).inc();
    }

    /// Record one successful execution.
    pub fn record_execution(&self, side: &str, attempts: u32, exchange_latency_ms: u64) {
        self.orders_executed.with_label_values(&[side]).inc();
        self.attempts_per_order.observe(f64::from(attempts));
        self.exchange_latency_ms.observe(exchange_latency_ms as f64);
    }

    /// Count one signature verification failure.
    pub fn record_signature_failure(&self) {
        self.signature_failures.inc();
    }

    /// Render the registry in Prometheus text exposition format.
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if encoder.encode(&metric_families, &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}
