//! Engine error to HTTP response mapping.

use axum::http::StatusCode;
use axum::Json;
use driftforge_core::EngineError;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Body shape of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable error class, see [`EngineError::kind`].
    pub error: String,
    pub message: String,
}

pub type ApiError = (StatusCode, Json<ErrorBody>);

pub(crate) type ApiResult<T> = Result<Json<T>, ApiError>;

/// Maps an engine failure onto status code and JSON body.
pub fn engine_error(err: EngineError) -> ApiError {
    let status = match &err {
        EngineError::NotFound { .. } => StatusCode::NOT_FOUND,
        EngineError::InvalidReference { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        EngineError::MalformedInput { .. } => StatusCode::BAD_REQUEST,
        EngineError::Storage { .. } | EngineError::Other(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    if status.is_server_error() {
        error!(error = ?err, "request failed");
    } else {
        debug!(error = ?err, "request rejected");
    }
    (
        status,
        Json(ErrorBody {
            error: err.kind().to_string(),
            message: err.details(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                EngineError::NotFound {
                    details: "telemetry v9".into(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                EngineError::InvalidReference {
                    details: "no such version".into(),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                EngineError::MalformedInput {
                    details: "bad id".into(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                EngineError::Storage {
                    details: "disk".into(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                EngineError::Other(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            let kind = err.kind();
            let (status, Json(body)) = engine_error(err);
            assert_eq!(status, expected);
            assert_eq!(body.error, kind);
        }
    }

    #[test]
    fn test_body_carries_details() {
        let (_, Json(body)) = engine_error(EngineError::NotFound {
            details: "source weather has no schema version 4".into(),
        });
        assert_eq!(body.error, "not_found");
        assert_eq!(body.message, "source weather has no schema version 4");
    }
}
