//! API error taxonomy and HTTP mapping.

use actix_web::HttpResponse;

use crate::models::ErrorResponse;
use crate::process::CollaboratorError;
use crate::queue_service::QueueError;

/// Errors surfaced by API handlers.
#[derive(Debug)]
pub(crate) enum ApiError {
    /// Missing or malformed client input.
    InvalidRequest(String),
    /// An external tool was missing, failed, timed out or returned garbage.
    Collaborator(CollaboratorError),
}

impl ApiError {
    /// Convert an API error into an HTTP response.
    pub(crate) fn into_response(self) -> HttpResponse {
        match self {
            ApiError::InvalidRequest(message) => HttpResponse::BadRequest().json(ErrorResponse {
                error: message,
                kind: None,
            }),
            ApiError::Collaborator(err) => {
                let body = ErrorResponse {
                    error: err.to_string(),
                    kind: Some(err.kind().to_string()),
                };
                match err {
                    CollaboratorError::Unavailable { .. } => {
                        HttpResponse::ServiceUnavailable().json(body)
                    }
                    CollaboratorError::Timeout { .. } => HttpResponse::GatewayTimeout().json(body),
                    CollaboratorError::Failed { .. }
                    | CollaboratorError::MalformedOutput { .. } => {
                        HttpResponse::BadGateway().json(body)
                    }
                }
            }
        }
    }
}

impl From<CollaboratorError> for ApiError {
    fn from(err: CollaboratorError) -> Self {
        ApiError::Collaborator(err)
    }
}

impl From<QueueError> for ApiError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::Launch { track, source } => {
                tracing::debug!(
                    id = track.id,
                    url = %track.url,
                    "track dropped after failed launch"
                );
                ApiError::Collaborator(source)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn collaborator_kinds_map_to_distinct_statuses() {
        let unavailable = ApiError::from(CollaboratorError::Unavailable {
            program: "wpctl".into(),
            reason: "missing".into(),
        });
        let timeout = ApiError::from(CollaboratorError::Timeout {
            program: "yt-dlp".into(),
            timeout: std::time::Duration::from_secs(1),
        });
        let malformed = ApiError::from(CollaboratorError::MalformedOutput {
            program: "yt-dlp".into(),
            reason: "bad json".into(),
        });

        assert_eq!(unavailable.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(timeout.into_response().status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(malformed.into_response().status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            ApiError::InvalidRequest("nope".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }
}
