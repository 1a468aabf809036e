//! Wire types of the `admission.k8s.io` AdmissionReview envelope, plus the
//! functions turning raw request bytes into a Pod and a response back into bytes.

use k8s_openapi::api::authentication::v1::UserInfo;
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::runtime::RawExtension;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, WebhookError};
use crate::patch::Patch;

pub const ADMISSION_REVIEW_KIND: &str = "AdmissionReview";
pub const ADMISSION_API_VERSION_V1: &str = "admission.k8s.io/v1";
pub const ADMISSION_API_VERSION_V1BETA1: &str = "admission.k8s.io/v1beta1";

const SUPPORTED_GROUP: &str = "";
const SUPPORTED_VERSION: &str = "v1";
const SUPPORTED_KIND: &str = "Pod";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupVersionKind {
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub kind: String,
}

impl std::fmt::Display for GroupVersionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}/{}", self.version, self.kind)
        } else {
            write!(f, "{}/{}/{}", self.group, self.version, self.kind)
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupVersionResource {
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub resource: String,
}

/// The review sent by the control plane.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReviewRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    pub request: AdmissionRequest,
}

/// This models the admission/v1/AdmissionRequest object of Kubernetes.
/// Only `uid` and `kind` are mandatory, everything else is informational.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionRequest {
    /// Correlation token, echoed back verbatim inside of the response.
    pub uid: String,
    pub kind: GroupVersionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<GroupVersionResource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_resource: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default)]
    pub operation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_info: Option<UserInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<RawExtension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_object: Option<RawExtension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<RawExtension>,
}

/// The review sent back to the control plane.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReviewResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    pub response: AdmissionResponse,
}

impl AdmissionReviewResponse {
    /// Wrap `response` using the same protocol version the request was sent with.
    pub fn new(request_api_version: Option<&str>, response: AdmissionResponse) -> Self {
        AdmissionReviewResponse {
            kind: Some(String::from(ADMISSION_REVIEW_KIND)),
            api_version: Some(String::from(
                request_api_version.unwrap_or(ADMISSION_API_VERSION_V1),
            )),
            response,
        }
    }
}

/// This models the admission/v1/AdmissionResponse object of Kubernetes.
///
/// The constructors keep the invariants the API server relies on: a patch is
/// only ever attached to an allowed response, always together with its type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionResponse {
    /// Copied over from the corresponding AdmissionRequest.
    pub uid: String,

    pub allowed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch_type: Option<PatchType>,

    /// Base64 encoding of a JSON Patch document (RFC 6902).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AdmissionResponseStatus>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatchType {
    #[serde(rename = "JSONPatch")]
    #[default]
    JSONPatch,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionResponseStatus {
    /// Suggested HTTP return code for this status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,

    /// A human-readable description of the status of this operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AdmissionResponse {
    /// Allow the object as it is, explaining why nothing was changed.
    pub fn unchanged(uid: String, message: String) -> AdmissionResponse {
        AdmissionResponse {
            uid,
            allowed: true,
            status: Some(AdmissionResponseStatus {
                code: Some(200),
                message: Some(message),
            }),
            ..Default::default()
        }
    }

    /// Allow the object once `patch` has been applied to it.
    pub fn patched(uid: String, patch: &Patch) -> Result<AdmissionResponse> {
        let encoded = patch
            .to_base64()
            .map_err(|e| WebhookError::EncodeFailure {
                uid: uid.clone(),
                message: e.to_string(),
            })?;

        Ok(AdmissionResponse {
            uid,
            allowed: true,
            patch_type: Some(PatchType::JSONPatch),
            patch: Some(encoded),
            status: None,
        })
    }
}

/// Parse the raw body of a webhook call.
pub fn decode(body: &[u8]) -> Result<AdmissionReviewRequest> {
    if body.is_empty() {
        return Err(WebhookError::MalformedEnvelope(
            "empty request body".to_owned(),
        ));
    }

    let review: AdmissionReviewRequest = serde_json::from_slice(body)
        .map_err(|e| WebhookError::MalformedEnvelope(e.to_string()))?;

    if let Some(kind) = review.kind.as_deref() {
        if kind != ADMISSION_REVIEW_KIND {
            return Err(WebhookError::MalformedEnvelope(format!(
                "unexpected kind '{kind}', expected '{ADMISSION_REVIEW_KIND}'"
            )));
        }
    }
    if let Some(api_version) = review.api_version.as_deref() {
        if api_version != ADMISSION_API_VERSION_V1 && api_version != ADMISSION_API_VERSION_V1BETA1 {
            return Err(WebhookError::MalformedEnvelope(format!(
                "unsupported apiVersion '{api_version}'"
            )));
        }
    }

    Ok(review)
}

/// Ensure the request targets a core/v1 Pod and parse the embedded object.
pub fn extract_object(request: &AdmissionRequest) -> Result<Pod> {
    let kind = &request.kind;
    if kind.kind != SUPPORTED_KIND
        || kind.group != SUPPORTED_GROUP
        || kind.version != SUPPORTED_VERSION
    {
        return Err(WebhookError::UnsupportedKind(
            "only 'Pod's are supported".to_owned(),
        ));
    }

    let raw = request.object.as_ref().ok_or_else(|| {
        WebhookError::MalformedObject("the request does not contain an object".to_owned())
    })?;

    Pod::deserialize(&raw.0).map_err(|e| WebhookError::MalformedObject(e.to_string()))
}

/// Serialize the response review.
pub fn encode(review: &AdmissionReviewResponse) -> Result<Vec<u8>> {
    serde_json::to_vec(review).map_err(|e| WebhookError::EncodeFailure {
        uid: review.response.uid.clone(),
        message: e.to_string(),
    })
}
