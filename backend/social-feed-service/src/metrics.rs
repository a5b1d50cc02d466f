//! Prometheus metrics for social-feed-service.
//!
//! Exposes interaction collectors and an HTTP handler for the `/metrics` endpoint.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec, TextEncoder};

lazy_static! {
    /// Interaction outcomes segmented by action (like, unlike, comment, follow, ...).
    pub static ref INTERACTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "social_feed_interactions_total",
        "Interactions processed segmented by action and outcome",
        &["action", "outcome"]
    )
    .expect("failed to register social_feed_interactions_total");

    /// Notifications written segmented by kind.
    pub static ref NOTIFICATIONS_WRITTEN_TOTAL: IntCounterVec = register_int_counter_vec!(
        "social_feed_notifications_written_total",
        "Fan-out notifications written segmented by kind",
        &["kind"]
    )
    .expect("failed to register social_feed_notifications_written_total");

    /// Best-effort media deletions that failed.
    pub static ref MEDIA_CLEANUP_FAILURES_TOTAL: IntCounter = register_int_counter!(
        "social_feed_media_cleanup_failures_total",
        "Media deletions that failed after the owning document was removed"
    )
    .expect("failed to register social_feed_media_cleanup_failures_total");
}

pub fn record_interaction(action: &str, outcome: &str) {
    INTERACTIONS_TOTAL.with_label_values(&[action, outcome]).inc();
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
