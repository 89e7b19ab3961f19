pub mod health;
pub mod users;

use actix_web::web;

use crate::error::AppError;

/// Mount every route of the service. Malformed JSON bodies are reported with
/// the same error body as validation failures.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    )
    .route("/health", web::get().to(health::health_check))
    .route("/metrics", web::get().to(crate::metrics::serve_metrics));

    users::register_routes(cfg);
}
