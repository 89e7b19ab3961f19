//! Prometheus exposition for the default registry

use actix_web::HttpResponse;
use prometheus::{Encoder, TextEncoder};

/// Register the pipeline counters with the default registry before serving.
pub fn init_metrics() {
    user_events::metrics::init_metrics();
}

pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

/// GET /metrics
pub async fn serve_metrics() -> HttpResponse {
    match gather_metrics() {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(body),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            HttpResponse::InternalServerError().finish()
        }
    }
}
