//! Playback status and volume handlers.

use actix_web::{get, post, web, HttpResponse, Responder};

use crate::error::ApiError;
use crate::models::{ErrorResponse, StatusResponse, VolumeRequest, VolumeResponse};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/status",
    responses(
        (status = 200, description = "Now playing and pending tracks", body = StatusResponse)
    )
)]
#[get("/api/status")]
/// Report the current track, the pending queue and the node id.
pub async fn status(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.status())
}

#[utoipa::path(
    post,
    path = "/api/volume",
    request_body = VolumeRequest,
    responses(
        (status = 200, description = "Volume updated", body = VolumeResponse),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 502, description = "Sink controller failed", body = ErrorResponse),
        (status = 503, description = "Sink controller unavailable", body = ErrorResponse),
        (status = 504, description = "Sink controller timed out", body = ErrorResponse)
    )
)]
#[post("/api/volume")]
/// Set the default sink volume.
pub async fn set_volume(
    state: web::Data<AppState>,
    body: web::Json<VolumeRequest>,
) -> impl Responder {
    let volume = body.volume;
    match state.volume.set_volume(volume).await {
        Ok(()) => HttpResponse::Ok().json(VolumeResponse {
            status: "updated".to_string(),
            volume,
        }),
        Err(err) => {
            tracing::warn!(volume, error = %err, "volume change failed");
            ApiError::from(err).into_response()
        }
    }
}
