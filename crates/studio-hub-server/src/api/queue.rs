//! Queue-related API handlers.

use actix_web::{post, web, HttpResponse, Responder};

use crate::error::ApiError;
use crate::models::{ErrorResponse, QueueRequest, QueueResponse, StatusResponse};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api/queue",
    request_body = QueueRequest,
    responses(
        (status = 200, description = "Track queued", body = QueueResponse),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 503, description = "Stream launcher unavailable", body = ErrorResponse)
    )
)]
#[post("/api/queue")]
/// Append a track; playback starts immediately when the queue is idle.
pub async fn queue_add(
    state: web::Data<AppState>,
    body: web::Json<QueueRequest>,
) -> impl Responder {
    let QueueRequest { title, url, user } = body.into_inner();
    let Some(url) = url.filter(|u| !u.trim().is_empty()) else {
        return ApiError::InvalidRequest("url is required".to_string()).into_response();
    };
    match state.queue.enqueue(title, url, user) {
        Ok(track) => HttpResponse::Ok().json(QueueResponse {
            status: "queued".to_string(),
            track,
        }),
        Err(err) => ApiError::from(err).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/queue/next",
    responses(
        (status = 200, description = "Advanced; returns the new status", body = StatusResponse),
        (status = 503, description = "Stream launcher unavailable", body = ErrorResponse)
    )
)]
#[post("/api/queue/next")]
/// Mark the current track finished and start the next one.
pub async fn queue_next(state: web::Data<AppState>) -> impl Responder {
    tracing::debug!("queue next request");
    match state.queue.advance() {
        Ok(_) => HttpResponse::Ok().json(state.status()),
        Err(err) => ApiError::from(err).into_response(),
    }
}
