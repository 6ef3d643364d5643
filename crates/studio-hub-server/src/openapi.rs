use utoipa::OpenApi;

use crate::api;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health,
        api::search::search,
        api::queue::queue_add,
        api::queue::queue_next,
        api::playback::status,
        api::playback::set_volume,
        api::streams::status_stream,
    ),
    components(
        schemas(
            models::Track,
            models::QueueRequest,
            models::QueueResponse,
            models::StatusResponse,
            models::SearchResult,
            models::VolumeRequest,
            models::VolumeResponse,
            models::ErrorResponse,
            api::health::HealthResponse,
        )
    ),
    tags(
        (name = "studio-hub-server", description = "Studio broadcast queue API")
    )
)]
pub struct ApiDoc;
