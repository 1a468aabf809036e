use tracing::{Span, debug, info};

use crate::{
    admission_review::{self, AdmissionRequest, AdmissionResponse, AdmissionReviewResponse},
    errors::{Result, WebhookError},
    mutation::MutationPolicy,
    patch,
};

pub const NO_CHANGES_MESSAGE: &str = "No changes made to Pod";

/// How a webhook call ended, when it did not fail.
#[derive(Debug)]
pub enum ReviewOutcome {
    /// The body was empty: nothing is reviewed and nothing is written back.
    Skipped,
    /// A review response, along with its serialized form.
    Reviewed {
        review: AdmissionReviewResponse,
        body: Vec<u8>,
    },
}

/// Run a single admission review from the raw request body to the serialized
/// response.
///
/// The stages are walked strictly in order: decode, validate, mutate, diff,
/// respond. The first failure ends the review; nothing outlives the call.
pub fn review(policy: &dyn MutationPolicy, body: &[u8]) -> Result<ReviewOutcome> {
    if body.is_empty() {
        return Ok(ReviewOutcome::Skipped);
    }

    let incoming = admission_review::decode(body)?;
    let request = &incoming.request;
    populate_span_with_admission_request_data(request);
    debug!(
        kind = %request.kind,
        operation = request.operation.as_str(),
        "admission request decoded"
    );

    let observed = admission_review::extract_object(request)?;
    info!(
        name = observed
            .metadata
            .name
            .as_deref()
            .or(observed.metadata.generate_name.as_deref())
            .unwrap_or_default(),
        namespace = observed.metadata.namespace.as_deref().unwrap_or_default(),
        policy = policy.name(),
        "reviewing pod"
    );

    let desired = policy.apply(&observed);

    let patch = patch::diff(&observed, &desired).map_err(|e| WebhookError::DiffFailure {
        uid: request.uid.clone(),
        message: e.to_string(),
    })?;
    debug!(operations = patch.len(), "patch computed");

    let response = if patch.is_empty() {
        AdmissionResponse::unchanged(request.uid.clone(), NO_CHANGES_MESSAGE.to_owned())
    } else {
        AdmissionResponse::patched(request.uid.clone(), &patch)?
    };
    populate_span_with_review_results(&response, patch.len());

    let review = AdmissionReviewResponse::new(incoming.api_version.as_deref(), response);
    let body = admission_review::encode(&review)?;

    Ok(ReviewOutcome::Reviewed { review, body })
}

fn populate_span_with_admission_request_data(adm_req: &AdmissionRequest) {
    Span::current().record("kind", adm_req.kind.kind.as_str());
    Span::current().record("kind_group", adm_req.kind.group.as_str());
    Span::current().record("kind_version", adm_req.kind.version.as_str());
    Span::current().record("name", adm_req.name.clone().unwrap_or_default().as_str());
    Span::current().record(
        "namespace",
        adm_req.namespace.clone().unwrap_or_default().as_str(),
    );
    Span::current().record("operation", adm_req.operation.as_str());
    Span::current().record("request_uid", adm_req.uid.as_str());
}

fn populate_span_with_review_results(response: &AdmissionResponse, patch_operations: usize) {
    Span::current().record("allowed", response.allowed);
    Span::current().record("mutated", response.patch.is_some());
    Span::current().record("patch_operations", patch_operations);
}
