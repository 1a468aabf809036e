//! Computation of the JSON Patch (RFC 6902) turning an observed object into
//! its desired form.
//!
//! Both snapshots are serialized to `serde_json::Value` before being compared.
//! Object members are kept sorted by `serde_json`, hence the same pair of
//! inputs always produces the very same sequence of operations. Paths are
//! expressed against the observed document, which is the one the API server
//! applies the patch to.

use base64::{Engine as _, engine::general_purpose};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiffError {
    #[error("cannot serialize the {0} object: {1}")]
    Serialize(&'static str, #[source] serde_json::Error),

    #[error("computed patch cannot be applied: {0}")]
    Apply(#[source] json_patch::PatchError),

    #[error("computed patch does not reproduce the desired object")]
    Inconsistent,
}

/// An ordered sequence of patch operations.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Patch(json_patch::Patch);

impl Patch {
    pub fn empty() -> Self {
        Patch(json_patch::Patch(Vec::new()))
    }

    pub fn is_empty(&self) -> bool {
        self.operations().is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations().len()
    }

    pub fn operations(&self) -> &[json_patch::PatchOperation] {
        &self.0 .0
    }

    /// Apply the patch in place. On failure `doc` may be partially patched.
    pub fn apply_to(&self, doc: &mut Value) -> Result<(), DiffError> {
        json_patch::patch(doc, self.operations()).map_err(DiffError::Apply)
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.0)
    }

    /// The representation expected by the `patch` field of an AdmissionResponse.
    pub fn to_base64(&self) -> Result<String, serde_json::Error> {
        self.to_json()
            .map(|json| general_purpose::STANDARD.encode(json))
    }
}

/// Compute the patch transforming `observed` into `desired`.
pub fn diff<T: Serialize>(observed: &T, desired: &T) -> Result<Patch, DiffError> {
    let observed =
        serde_json::to_value(observed).map_err(|e| DiffError::Serialize("observed", e))?;
    let desired = serde_json::to_value(desired).map_err(|e| DiffError::Serialize("desired", e))?;

    diff_values(&observed, &desired)
}

/// Same as [`diff`], working on already serialized documents.
///
/// The result is checked by applying it to a copy of `observed`: a patch that
/// does not land exactly on `desired` is never handed out.
pub fn diff_values(observed: &Value, desired: &Value) -> Result<Patch, DiffError> {
    if observed == desired {
        return Ok(Patch::empty());
    }

    let patch = Patch(json_patch::diff(observed, desired));

    let mut patched = observed.clone();
    patch.apply_to(&mut patched)?;
    if patched != *desired {
        return Err(DiffError::Inconsistent);
    }

    Ok(patch)
}
