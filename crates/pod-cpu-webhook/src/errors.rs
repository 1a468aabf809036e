use axum::http::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, WebhookError>;

/// Every way a single admission review can fail.
///
/// None of these are retried: they stem either from bad input, where resending
/// the same bytes cannot help, or from an internal defect.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WebhookError {
    #[error("could not unmarshal request: {0}")]
    MalformedEnvelope(String),

    #[error("{0}")]
    UnsupportedKind(String),

    #[error("could not unmarshal pod: {0}")]
    MalformedObject(String),

    #[error("could not create JSONPatch for request {uid}: {message}")]
    DiffFailure { uid: String, message: String },

    #[error("could not marshal response for request {uid}: {message}")]
    EncodeFailure { uid: String, message: String },
}

impl WebhookError {
    /// HTTP status used when this error terminates a request.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::MalformedEnvelope(_)
            | WebhookError::UnsupportedKind(_)
            | WebhookError::MalformedObject(_) => StatusCode::BAD_REQUEST,
            WebhookError::DiffFailure { .. } | WebhookError::EncodeFailure { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Correlation UID, known only once the envelope has been decoded and the
    /// object validated.
    pub fn request_uid(&self) -> Option<&str> {
        match self {
            WebhookError::DiffFailure { uid, .. } | WebhookError::EncodeFailure { uid, .. } => {
                Some(uid.as_str())
            }
            _ => None,
        }
    }
}
