use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use frag_convert::ConvertError;
use frag_model::FragmentError;
use thiserror::Error;

use crate::response::error_body;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("authentication failed: {0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    UnsupportedMediaType(String),

    #[error(transparent)]
    Fragment(#[from] FragmentError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Fragment(err) => fragment_status(err),
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

fn fragment_status(err: &FragmentError) -> StatusCode {
    match err {
        FragmentError::NotFound { .. } | FragmentError::DataNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        FragmentError::Validation(_) | FragmentError::UnsupportedType(_) => {
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        }
        FragmentError::TypeMismatch { .. } | FragmentError::EmptyData => StatusCode::BAD_REQUEST,
        FragmentError::Conversion(
            ConvertError::Unsupported { .. } | ConvertError::UnknownExtension(_),
        ) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        FragmentError::Conversion(_)
        | FragmentError::Store(_)
        | FragmentError::PartialWrite { .. }
        | FragmentError::PartialDelete { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "request rejected");
        }

        let body = error_body(status, &self.to_string());
        if status == StatusCode::UNAUTHORIZED {
            return (
                status,
                [(header::WWW_AUTHENTICATE, "Basic realm=\"fragments\"")],
                body,
            )
                .into_response();
        }
        (status, body).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let err = ServerError::from(FragmentError::NotFound {
            owner: "o".into(),
            id: "x".into(),
        });
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn conversion_errors_map_to_415() {
        let err = ServerError::from(FragmentError::Conversion(ConvertError::Unsupported {
            from: "text/plain".into(),
            to: "image/png".into(),
        }));
        assert_eq!(err.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let err = ServerError::from(FragmentError::Conversion(ConvertError::UnknownExtension(
            "exe".into(),
        )));
        assert_eq!(err.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn type_mismatch_maps_to_400() {
        let err = ServerError::from(FragmentError::TypeMismatch {
            existing: "text/plain".into(),
            requested: "text/html".into(),
        });
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unsupported_type_maps_to_415() {
        let err = ServerError::from(FragmentError::UnsupportedType("abc/defg".into()));
        assert_eq!(err.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn image_failure_maps_to_500() {
        let err = ServerError::from(FragmentError::Conversion(ConvertError::Image(
            "truncated".into(),
        )));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unauthorized_challenges_for_basic() {
        let response = ServerError::Unauthorized("missing credentials".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
    }
}
