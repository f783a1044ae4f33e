//! Metrics collection and export module

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry, TextEncoder};

/// Process-wide metrics registry
pub struct Metrics {
    registry: Registry,

    // Estimation
    pub estimations_total: IntCounter,
    pub estimation_failures_total: IntCounter,
    pub simulation_fallbacks: IntCounter,
    pub bandwidth_fee_fallbacks: IntCounter,

    // Rental
    pub rental_orders_total: IntCounter,
    pub rental_failures_total: IntCounter,
    pub rental_polls_total: IntCounter,
    pub active_rentals: IntGauge,

    // Planning
    pub plans_total: IntCounter,
    pub plans_aborted: IntCounter,

    // Histograms
    pub estimation_latency: Histogram,
    pub rpc_latency: Histogram,
    pub rental_wait: Histogram,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let estimations_total = IntCounter::with_opts(Opts::new(
            "estimations_total",
            "Number of completed fee estimations",
        ))?;
        let estimation_failures_total = IntCounter::with_opts(Opts::new(
            "estimation_failures_total",
            "Number of fee estimations that returned an error",
        ))?;
        let simulation_fallbacks = IntCounter::with_opts(Opts::new(
            "simulation_fallbacks_total",
            "Dry runs that reverted and used the new-account energy estimate",
        ))?;
        let bandwidth_fee_fallbacks = IntCounter::with_opts(Opts::new(
            "bandwidth_fee_fallbacks_total",
            "Estimations that used the default bandwidth fee",
        ))?;

        let rental_orders_total = IntCounter::with_opts(Opts::new(
            "rental_orders_total",
            "Energy rental orders placed",
        ))?;
        let rental_failures_total = IntCounter::with_opts(Opts::new(
            "rental_failures_total",
            "Rentals that were rejected, timed out or cancelled",
        ))?;
        let rental_polls_total = IntCounter::with_opts(Opts::new(
            "rental_polls_total",
            "Energy checks made while waiting for a rental",
        ))?;
        let active_rentals = IntGauge::with_opts(Opts::new(
            "active_rentals",
            "Rentals currently waiting for energy",
        ))?;

        let plans_total = IntCounter::with_opts(Opts::new(
            "plans_total",
            "Transfer planning passes started",
        ))?;
        let plans_aborted = IntCounter::with_opts(Opts::new(
            "plans_aborted_total",
            "Transfer planning passes that ended in an abort",
        ))?;

        let estimation_latency = Histogram::with_opts(
            HistogramOpts::new("estimation_latency_seconds", "Fee estimation latency")
                .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        )?;
        let rpc_latency = Histogram::with_opts(
            HistogramOpts::new("rpc_latency_seconds", "Node HTTP call latency")
                .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
        )?;
        let rental_wait = Histogram::with_opts(
            HistogramOpts::new("rental_wait_seconds", "Time from order to energy arrival")
                .buckets(vec![5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
        )?;

        registry.register(Box::new(estimations_total.clone()))?;
        registry.register(Box::new(estimation_failures_total.clone()))?;
        registry.register(Box::new(simulation_fallbacks.clone()))?;
        registry.register(Box::new(bandwidth_fee_fallbacks.clone()))?;
        registry.register(Box::new(rental_orders_total.clone()))?;
        registry.register(Box::new(rental_failures_total.clone()))?;
        registry.register(Box::new(rental_polls_total.clone()))?;
        registry.register(Box::new(active_rentals.clone()))?;
        registry.register(Box::new(plans_total.clone()))?;
        registry.register(Box::new(plans_aborted.clone()))?;
        registry.register(Box::new(estimation_latency.clone()))?;
        registry.register(Box::new(rpc_latency.clone()))?;
        registry.register(Box::new(rental_wait.clone()))?;

        Ok(Self {
            registry,
            estimations_total,
            estimation_failures_total,
            simulation_fallbacks,
            bandwidth_fee_fallbacks,
            rental_orders_total,
            rental_failures_total,
            rental_polls_total,
            active_rentals,
            plans_total,
            plans_aborted,
            estimation_latency,
            rpc_latency,
            rental_wait,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

/// Global metrics instance
pub fn metrics() -> &'static Metrics {
    static METRICS: once_cell::sync::Lazy<Metrics> = once_cell::sync::Lazy::new(|| {
        // the metric set is static; registration only fails on duplicate names
        Metrics::new().unwrap_or_else(|e| panic!("Failed to initialize metrics: {e}"))
    });
    &METRICS
}

/// Prometheus text exposition of the global registry
pub fn render() -> anyhow::Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&metrics().registry().gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
