//! Prometheus metrics for platform observability.

use metrics::{counter, gauge};

/// Initialize metrics exporter (Prometheus).
pub fn init_metrics() {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    if let Err(e) = builder.install() {
        tracing::warn!("Failed to install Prometheus exporter: {}", e);
    }
}

/// Record an organization creation; `source` is `api`, `import` or `seed`.
pub fn organization_created(source: &str) {
    counter!("impact_organizations_created_total", "source" => source.to_string()).increment(1);
    gauge!("impact_organizations").increment(1.0);
}

pub fn organization_deleted() {
    gauge!("impact_organizations").decrement(1.0);
}

/// Set the organization gauge outright (startup).
pub fn organization_count(count: usize) {
    gauge!("impact_organizations").set(count as f64);
}

/// Record an import attempt: `clean`, `with_warnings` or `rejected`.
pub fn import_completed(outcome: &str) {
    counter!("impact_imports_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record a verification decision.
pub fn verification_resolved(status: &str) {
    counter!("impact_verifications_total", "status" => status.to_string()).increment(1);
}

/// Record an error response.
pub fn api_error(status: u16) {
    counter!("impact_api_errors_total", "status" => status.to_string()).increment(1);
}
