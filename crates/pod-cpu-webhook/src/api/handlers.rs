use axum::{
    body::Bytes,
    extract,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::{
    api::{
        api_error::ApiError,
        service::{ReviewOutcome, review},
        state::ApiServerState,
    },
    errors::WebhookError,
};

pub(crate) const HEALTH_RESPONSE: &str = "OK\n";

#[tracing::instrument(
    name = "webhook",
    fields(
        request_uid=tracing::field::Empty,
        host=crate::config::HOSTNAME.as_str(),
        name=tracing::field::Empty,
        namespace=tracing::field::Empty,
        operation=tracing::field::Empty,
        kind_group=tracing::field::Empty,
        kind_version=tracing::field::Empty,
        kind=tracing::field::Empty,
        allowed=tracing::field::Empty,
        mutated=tracing::field::Empty,
        patch_operations=tracing::field::Empty,
    ),
    skip_all)]
/// Review a Pod and answer with the patch needed to make it compliant.
pub(crate) async fn webhook_handler(
    extract::State(state): extract::State<Arc<ApiServerState>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    info!("received request for webhook");

    match review(state.policy.as_ref(), &body) {
        Ok(ReviewOutcome::Skipped) => {
            debug!("empty request body, nothing to review");
            Ok(StatusCode::OK.into_response())
        }
        Ok(ReviewOutcome::Reviewed { body, .. }) => Ok((
            StatusCode::OK,
            [(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())],
            body,
        )
            .into_response()),
        Err(err) => Err(handle_review_error(err)),
    }
}

pub(crate) async fn health_handler() -> &'static str {
    HEALTH_RESPONSE
}

fn handle_review_error(error: WebhookError) -> ApiError {
    match error.request_uid() {
        Some(uid) => error!(request_uid = uid, "Review error: {}", error),
        None => warn!("Rejected request: {}", error),
    }

    ApiError::from(error)
}
