//! Search API handler.

use actix_web::{get, web, HttpResponse, Responder};

use crate::error::ApiError;
use crate::models::{ErrorResponse, SearchQuery, SearchResult};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/search",
    params(
        ("q" = Option<String>, Query, description = "Free-text search query")
    ),
    responses(
        (status = 200, description = "Candidate tracks", body = [SearchResult]),
        (status = 400, description = "No query provided", body = ErrorResponse),
        (status = 502, description = "Search tool failed or returned malformed output", body = ErrorResponse),
        (status = 503, description = "Search tool unavailable", body = ErrorResponse),
        (status = 504, description = "Search timed out", body = ErrorResponse)
    )
)]
#[get("/api/search")]
/// Resolve a free-text query into candidate tracks.
pub async fn search(state: web::Data<AppState>, query: web::Query<SearchQuery>) -> impl Responder {
    let Some(q) = query.q.as_deref().filter(|q| !q.is_empty()) else {
        return ApiError::InvalidRequest("No query provided".to_string()).into_response();
    };
    match state.search.search(q).await {
        Ok(results) => HttpResponse::Ok().json(results),
        Err(err) => {
            tracing::warn!(query = q, error = %err, "search failed");
            ApiError::from(err).into_response()
        }
    }
}
