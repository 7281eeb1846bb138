use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use snafu::Snafu;

use crate::database::DatabaseError;
use crate::service::video::VideoError;

#[derive(Debug, Snafu)]
pub enum ApiError {
    #[snafu(context(false), display("{source}"))]
    Video { source: VideoError },
    #[snafu(context(false), display("{source}"))]
    Connection { source: DatabaseError },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Video {
                source: VideoError::InvalidInput { .. },
            } => StatusCode::BAD_REQUEST,
            ApiError::Video {
                source: VideoError::NotFound { .. },
            } => StatusCode::NOT_FOUND,
            ApiError::Video {
                source: VideoError::Backend { source, .. },
            }
            | ApiError::Connection { source } => {
                if source.is_unavailable() {
                    StatusCode::SERVICE_UNAVAILABLE
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            }
        }
    }

    /// Client errors explain themselves, server errors only say that something went wrong.
    fn public_message(&self) -> String {
        match self.status() {
            StatusCode::SERVICE_UNAVAILABLE => {
                "Unable to connect to the database after multiple attempts".to_string()
            }
            status if status.is_server_error() => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let content = ErrorResponse {
            error: self.public_message(),
        };

        (status, Json(content)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid_input() -> ApiError {
        let error = crate::service::video::NewVideo::parse(None, None).unwrap_err();
        ApiError::from(error)
    }

    fn failed_statement() -> DatabaseError {
        DatabaseError::DatabaseQuery {
            source: surrealdb::error::Db::Thrown("duplicate key videos:v1".to_string()).into(),
            location: snafu::location!(),
        }
    }

    #[test]
    fn client_errors_keep_their_message() {
        let error = invalid_input();
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error.public_message(), "Video ID and title are required");
    }

    #[test]
    fn unreachable_database_is_service_unavailable() {
        let error = ApiError::from(DatabaseError::Unavailable {
            attempts: 5,
            source: Box::new(failed_statement()),
        });

        assert_eq!(error.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            error.public_message(),
            "Unable to connect to the database after multiple attempts"
        );
    }

    #[test]
    fn backend_failures_hide_their_details() {
        let error = ApiError::from(VideoError::Backend {
            source: failed_statement(),
            location: snafu::location!(),
        });

        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.public_message(), "Internal server error");

        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
