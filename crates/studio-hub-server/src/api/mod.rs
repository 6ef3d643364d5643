//! HTTP API handlers.
//!
//! Defines the Actix routes for search, queue, status, and volume control.

pub mod health;
pub mod playback;
pub mod queue;
pub mod search;
pub mod streams;

use actix_web::{error, web};

use crate::error::ApiError;

pub use playback::{set_volume, status};
pub use queue::{queue_add, queue_next};
pub use streams::status_stream;

/// JSON extractor config that reports malformed bodies as `{"error": ...}`.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let message = err.to_string();
        tracing::debug!(error = %message, "rejected request body");
        let response = ApiError::InvalidRequest(message).into_response();
        error::InternalError::from_response(err, response).into()
    })
}

/// Register every API route on `cfg`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(health::health)
        .service(search::search)
        .service(queue_add)
        .service(queue_next)
        .service(status)
        .service(status_stream)
        .service(set_volume);
}
