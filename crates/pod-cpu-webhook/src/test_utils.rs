use serde_json::{Value, json};

/// A Pod named `nginx` inside of the `default` namespace.
pub(crate) fn pod_object(containers: Value, init_containers: Option<Value>) -> Value {
    let mut spec = json!({ "containers": containers });
    if let Some(init_containers) = init_containers {
        spec["initContainers"] = init_containers;
    }

    json!({
        "apiVersion": "v1",
        "kind": "Pod",
        "metadata": {"name": "nginx", "namespace": "default"},
        "spec": spec,
    })
}

/// Serialized AdmissionReview wrapping `object`.
pub(crate) fn admission_review(uid: &str, api_version: &str, kind: Value, object: Value) -> Vec<u8> {
    let review = json!({
        "kind": "AdmissionReview",
        "apiVersion": api_version,
        "request": {
            "uid": uid,
            "kind": kind,
            "resource": {"group": "", "version": "v1", "resource": "pods"},
            "name": "nginx",
            "namespace": "default",
            "operation": "CREATE",
            "userInfo": {"username": "admin", "groups": ["system:authenticated"]},
            "object": object,
            "dryRun": false
        }
    });

    serde_json::to_vec(&review).expect("cannot serialize review")
}
