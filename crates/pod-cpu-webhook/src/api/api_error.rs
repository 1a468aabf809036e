use axum::{
    http::{StatusCode, header},
    response::IntoResponse,
};

use crate::errors::WebhookError;

#[derive(Debug)]
/// An error that can be returned by the API and will be converted into a
/// plain text response. A failed review is never answered with a review body.
pub(crate) struct ApiError {
    pub(crate) status: StatusCode,
    pub(crate) message: String,
}

impl From<WebhookError> for ApiError {
    fn from(error: WebhookError) -> Self {
        Self {
            status: error.status_code(),
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (
            self.status,
            [(header::CONTENT_TYPE, mime::TEXT_PLAIN_UTF_8.as_ref())],
            format!("{}\n", self.message),
        )
            .into_response()
    }
}
