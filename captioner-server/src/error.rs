use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug)]
pub enum HttpError {
    /// The request was rejected before any cache or provider work.
    BadRequest { detail: String },
    Internal { detail: String },
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            HttpError::BadRequest { detail } => (StatusCode::BAD_REQUEST, detail),
            HttpError::Internal { detail } => (StatusCode::INTERNAL_SERVER_ERROR, detail),
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl From<JsonRejection> for HttpError {
    fn from(rejection: JsonRejection) -> Self {
        HttpError::BadRequest {
            detail: rejection.body_text(),
        }
    }
}

impl From<captioner::Error> for HttpError {
    fn from(error: captioner::Error) -> Self {
        match error {
            captioner::Error::InvalidUrl(_) => HttpError::BadRequest {
                detail: "Invalid URL".to_string(),
            },
            other => HttpError::Internal {
                detail: other.to_string(),
            },
        }
    }
}
