use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: successful engine mutations. Labels: op.
pub const MUTATIONS_TOTAL: &str = "stockroom_mutations_total";

/// Counter: writes rejected because they exceed availability
/// (reservation counts and activity hours alike). Labels: op.
pub const CAPACITY_REJECTIONS_TOTAL: &str = "stockroom_capacity_rejections_total";

/// Counter: reservations removed by item-delete cascades.
pub const CASCADE_REMOVALS_TOTAL: &str = "stockroom_cascade_removals_total";

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
