// src/core/metrics.rs

//! Defines and registers Prometheus metrics for controller monitoring.
//!
//! Metrics are registered once, globally, for the process lifetime, the same way the
//! teacher crate's `core::metrics` does it — swapping `lazy_static!` for `once_cell`, which
//! the teacher's dependency tree already carries elsewhere.

use once_cell::sync::Lazy;
use prometheus::{Counter, Gauge, TextEncoder, register_counter, register_gauge};

// --- Gauges ---

/// The current number of active (non-quarantined) members.
pub static CURRENT_SIZE: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "clusterd_current_size",
        "Number of members currently in the cluster's active set."
    )
    .unwrap()
});

/// The most recently requested desired size.
pub static DESIRED_SIZE: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "clusterd_desired_size",
        "Most recently requested desired cluster size."
    )
    .unwrap()
});

/// The current number of quarantined members.
pub static QUARANTINED_SIZE: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "clusterd_quarantined_size",
        "Number of members currently held in quarantine."
    )
    .unwrap()
});

/// The current number of sub-locations classified as failed.
pub static FAILED_ZONES: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "clusterd_failed_zones",
        "Number of availability zones currently classified as failed."
    )
    .unwrap()
});

/// A boolean gauge mirroring `cluster_one_and_all_members_up`.
pub static ONE_AND_ALL_MEMBERS_UP: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "clusterd_one_and_all_members_up",
        "1 if the cluster is running, non-empty, and every member reports service_up=true."
    )
    .unwrap()
});

/// A boolean gauge mirroring the separate `service_up` enricher's `up_quorum_check` verdict.
pub static SERVICE_UP: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "clusterd_service_up",
        "1 if the configured up_quorum_check predicate is satisfied over current members."
    )
    .unwrap()
});

// --- Counters ---

/// The total number of completed resize operations since startup.
pub static RESIZES_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "clusterd_resizes_total",
        "Total number of resize operations completed."
    )
    .unwrap()
});

/// Forces registration of every metric above. Call once at startup so an external exporter
/// sees a populated registry even before the first resize.
pub fn init() {
    Lazy::force(&CURRENT_SIZE);
    Lazy::force(&DESIRED_SIZE);
    Lazy::force(&QUARANTINED_SIZE);
    Lazy::force(&FAILED_ZONES);
    Lazy::force(&ONE_AND_ALL_MEMBERS_UP);
    Lazy::force(&SERVICE_UP);
    Lazy::force(&RESIZES_TOTAL);
}

/// Gathers all registered metrics and encodes them in the Prometheus text format.
/// Exposing this over HTTP is an API-layer concern and out of scope for this crate.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder.encode_to_string(&metric_families).unwrap()
}
