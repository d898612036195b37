use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;

use super::{ConnectionGauge, Metrics};

/// Start the metrics HTTP server
/// This should be called in a separate thread/runtime to avoid conflicts
pub async fn start_metrics_server(metrics: Arc<Metrics>, port: u16) -> std::io::Result<()> {
    tracing::info!("📊 Starting metrics server on http://0.0.0.0:{}/metrics", port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(metrics.clone()))
            .route("/metrics", web::get().to(metrics_handler))
            .route("/health", web::get().to(health_handler))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}

async fn metrics_handler(metrics: web::Data<Arc<Metrics>>) -> impl Responder {
    let encoder = TextEncoder::new();
    let metric_families = metrics.registry().gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return HttpResponse::InternalServerError().finish();
    }

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(buffer)
}

async fn health_handler(metrics: web::Data<Arc<Metrics>>) -> impl Responder {
    // The durable store is optional, so a failed connection only degrades.
    let (status, durable) = match metrics.connection_state() {
        ConnectionGauge::Connected => ("healthy", "connected"),
        ConnectionGauge::Connecting => ("healthy", "connecting"),
        ConnectionGauge::Disconnected => ("healthy", "disconnected"),
        ConnectionGauge::Failed => ("degraded", "failed"),
    };

    HttpResponse::Ok().json(serde_json::json!({
        "status": status,
        "service": "whiteboard-sync",
        "durable_store": durable,
    }))
}
