use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: booking calls by final outcome. Labels: outcome
/// (booked | unsatisfied | conflict).
pub const BOOKINGS_TOTAL: &str = "guichet_bookings_total";

/// Histogram: search-and-reserve iterations needed per booking call.
pub const BOOKING_ATTEMPTS: &str = "guichet_booking_attempts";

/// Histogram: booking call latency in seconds.
pub const BOOKING_DURATION_SECONDS: &str = "guichet_booking_duration_seconds";

// ── USE metrics (resource utilization) ──────────────────────────

/// Counter: conditional saves rejected by the store's version check.
pub const STORE_CONFLICTS_TOTAL: &str = "guichet_store_conflicts_total";

/// Counter: slots created by schedule generation.
pub const SLOTS_CREATED_TOTAL: &str = "guichet_slots_created_total";

/// Counter: alert records emitted. Labels: kind.
pub const ALERTS_TOTAL: &str = "guichet_alerts_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}
