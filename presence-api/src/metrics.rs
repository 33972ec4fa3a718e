/*
 * Copyright 2026 CampusMeet Contributors
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 *
 * Unless you explicitly state otherwise, any contribution intentionally
 * submitted for inclusion in the work by you, as defined in the Apache-2.0
 * license, shall be dual licensed as above, without any additional terms or
 * conditions.
 */

//! Centralized Prometheus metrics for the presence service

use actix_web::{HttpResponse, Responder};
use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge_vec, CounterVec, Encoder, GaugeVec, TextEncoder,
};
use tracing::error;

lazy_static! {
    /// Number of live sessions per meeting
    pub static ref PRESENCE_SESSIONS: GaugeVec = register_gauge_vec!(
        "campusmeet_presence_sessions",
        "Number of live sessions per meeting",
        &["meeting_id"]
    )
    .expect("Failed to create presence_sessions metric");

    /// Sessions removed, labeled by removal path (leave, stale, disconnect)
    pub static ref PRESENCE_EVICTIONS_TOTAL: CounterVec = register_counter_vec!(
        "campusmeet_presence_evictions_total",
        "Sessions removed from the presence registry, by removal path",
        &["reason"]
    )
    .expect("Failed to create presence_evictions_total metric");

    /// Signals discarded because they referenced a superseded session
    pub static ref STALE_SIGNALS_TOTAL: CounterVec = register_counter_vec!(
        "campusmeet_presence_stale_signals_total",
        "Heartbeat and disconnect signals discarded as stale, by kind",
        &["kind"]
    )
    .expect("Failed to create stale_signals_total metric");
}

/// Prometheus text exposition endpoint, `GET /metrics`.
pub async fn metrics_handler() -> impl Responder {
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(buffer),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            HttpResponse::InternalServerError().body("Error encoding metrics")
        }
    }
}
