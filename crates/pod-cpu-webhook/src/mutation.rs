use k8s_openapi::api::core::v1::{Container, Pod};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;
use thiserror::Error;

pub const CPU_RESOURCE: &str = "cpu";
pub const DEFAULT_CPU_REQUEST: &str = "10m";

lazy_static! {
    // Serialized form of a Kubernetes resource.Quantity: a signed decimal
    // number followed by an optional binary suffix, decimal suffix or exponent.
    static ref QUANTITY_RE: Regex =
        Regex::new(r"^[+-]?([0-9]+(\.[0-9]*)?|\.[0-9]+)([KMGTPE]i|[numkMGTPE]|[eE][+-]?[0-9]+)?$")
            .expect("quantity regexp should compile");
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid quantity '{0}'")]
pub struct InvalidQuantity(pub String);

/// Parse a string into a [`Quantity`], rejecting anything the API server would
/// refuse to store.
pub fn parse_quantity(value: &str) -> Result<Quantity, InvalidQuantity> {
    if QUANTITY_RE.is_match(value) {
        Ok(Quantity(value.to_owned()))
    } else {
        Err(InvalidQuantity(value.to_owned()))
    }
}

/// A rule computing the desired form of a Pod.
///
/// Implementations must be pure: the observed Pod is only borrowed, the
/// desired one is a fresh value. When nothing has to change, the returned Pod
/// must be equal to the observed one.
pub trait MutationPolicy: Send + Sync {
    /// Short identifier used inside of log events.
    fn name(&self) -> &str;

    fn apply(&self, observed: &Pod) -> Pod;
}

/// Set a CPU request on every container, and init container, lacking one.
/// Requests that are already declared are never overwritten.
#[derive(Clone, Debug, PartialEq)]
pub struct DefaultCpuRequest {
    quantity: Quantity,
}

impl DefaultCpuRequest {
    pub fn new(quantity: Quantity) -> Self {
        DefaultCpuRequest { quantity }
    }

    pub fn quantity(&self) -> &Quantity {
        &self.quantity
    }

    fn ensure_cpu_request(&self, container: &mut Container) {
        let has_cpu_request = container
            .resources
            .as_ref()
            .and_then(|resources| resources.requests.as_ref())
            .is_some_and(|requests| requests.contains_key(CPU_RESOURCE));
        if has_cpu_request {
            return;
        }

        container
            .resources
            .get_or_insert_with(Default::default)
            .requests
            .get_or_insert_with(BTreeMap::new)
            .insert(CPU_RESOURCE.to_owned(), self.quantity.clone());
    }
}

impl Default for DefaultCpuRequest {
    fn default() -> Self {
        DefaultCpuRequest::new(Quantity(DEFAULT_CPU_REQUEST.to_owned()))
    }
}

impl MutationPolicy for DefaultCpuRequest {
    fn name(&self) -> &str {
        "default-cpu-request"
    }

    fn apply(&self, observed: &Pod) -> Pod {
        let mut desired = observed.clone();

        if let Some(spec) = desired.spec.as_mut() {
            let init_containers = spec.init_containers.iter_mut().flatten();
            for container in spec.containers.iter_mut().chain(init_containers) {
                self.ensure_cpu_request(container);
            }
        }

        desired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn pod(spec: serde_json::Value) -> Pod {
        serde_json::from_value(json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {"name": "web", "namespace": "default", "labels": {"app": "web"}},
            "spec": spec,
        }))
        .expect("cannot build pod")
    }

    fn cpu_request(container: &Container) -> Option<&str> {
        container
            .resources
            .as_ref()?
            .requests
            .as_ref()?
            .get(CPU_RESOURCE)
            .map(|q| q.0.as_str())
    }

    #[rstest]
    #[case::milli("10m")]
    #[case::integer("2")]
    #[case::decimal("0.5")]
    #[case::leading_dot(".5")]
    #[case::binary_suffix("128Mi")]
    #[case::decimal_suffix("1k")]
    #[case::exponent("1e3")]
    #[case::signed("+1")]
    fn valid_quantities(#[case] input: &str) {
        assert_eq!(parse_quantity(input), Ok(Quantity(input.to_owned())));
    }

    #[rstest]
    #[case::empty("")]
    #[case::unit_only("m")]
    #[case::unknown_suffix("10x")]
    #[case::whitespace(" 10m")]
    #[case::double_suffix("10mm")]
    fn invalid_quantities(#[case] input: &str) {
        assert_eq!(
            parse_quantity(input),
            Err(InvalidQuantity(input.to_owned()))
        );
    }

    #[test]
    fn default_quantity_is_ten_millicpu() {
        assert_eq!(DefaultCpuRequest::default().quantity().0, "10m");
        assert_eq!(
            DefaultCpuRequest::default(),
            DefaultCpuRequest::new(parse_quantity(DEFAULT_CPU_REQUEST).unwrap())
        );
        assert_ne!(
            DefaultCpuRequest::default(),
            DefaultCpuRequest::new(Quantity("250m".to_owned()))
        );
    }

    #[test]
    fn cpu_request_is_added_where_missing() {
        let observed = pod(json!({
            "initContainers": [{"name": "init"}],
            "containers": [
                {"name": "no-resources"},
                {"name": "empty-resources", "resources": {}},
                {"name": "memory-only", "resources": {"requests": {"memory": "64Mi"}}}
            ]
        }));

        let desired = DefaultCpuRequest::default().apply(&observed);
        let spec = desired.spec.unwrap();

        for container in spec.containers.iter().chain(spec.init_containers.iter().flatten()) {
            assert_eq!(cpu_request(container), Some("10m"), "{}", container.name);
        }
        assert_eq!(
            spec.containers[2].resources.as_ref().unwrap().requests.as_ref().unwrap()["memory"],
            Quantity("64Mi".to_owned())
        );
    }

    #[rstest]
    #[case::explicit_value("200m")]
    #[case::explicit_zero("0")]
    fn explicit_cpu_requests_are_preserved(#[case] value: &str) {
        let observed = pod(json!({
            "containers": [{"name": "app", "resources": {"requests": {"cpu": value}}}],
            "initContainers": [{"name": "init", "resources": {"requests": {"cpu": value}}}]
        }));

        let desired = DefaultCpuRequest::default().apply(&observed);

        assert_eq!(desired, observed);
    }

    #[test]
    fn nothing_outside_of_resource_requests_changes() {
        let observed = pod(json!({
            "serviceAccountName": "web",
            "initContainers": [{"name": "migrate", "image": "migrate:v1"}],
            "containers": [
                {"name": "b", "image": "nginx", "resources": {"limits": {"cpu": "1"}}},
                {"name": "a", "image": "envoy", "args": ["--log-level", "debug"]}
            ]
        }));

        let desired = DefaultCpuRequest::default().apply(&observed);

        let mut stripped = desired.clone();
        let spec = stripped.spec.as_mut().unwrap();
        let init_containers = spec.init_containers.iter_mut().flatten();
        for container in spec.containers.iter_mut().chain(init_containers) {
            let resources = container.resources.as_mut().unwrap();
            resources.requests.as_mut().unwrap().remove(CPU_RESOURCE);
            if resources.requests.as_ref().unwrap().is_empty() {
                resources.requests = None;
            }
            if resources.limits.is_none() {
                container.resources = None;
            }
        }

        assert_eq!(stripped, observed);

        let names: Vec<&str> = desired
            .spec
            .as_ref()
            .unwrap()
            .containers
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(
            desired.spec.unwrap().containers[0]
                .resources
                .as_ref()
                .unwrap()
                .limits,
            Some(BTreeMap::from([("cpu".to_owned(), Quantity("1".to_owned()))]))
        );
    }

    #[test]
    fn applying_twice_is_the_same_as_applying_once() {
        let policy = DefaultCpuRequest::default();
        let observed = pod(json!({
            "initContainers": [{"name": "init"}],
            "containers": [{"name": "app"}, {"name": "sidecar", "resources": {"requests": {"cpu": "1"}}}]
        }));

        let once = policy.apply(&observed);
        let twice = policy.apply(&once);

        assert_eq!(once, twice);
    }

    #[test]
    fn observed_pod_is_left_untouched() {
        let observed = pod(json!({"containers": [{"name": "app"}]}));
        let snapshot = observed.clone();

        let desired = DefaultCpuRequest::default().apply(&observed);

        assert_eq!(observed, snapshot);
        assert_ne!(desired, observed);
    }

    #[test]
    fn pod_without_spec_is_unchanged() {
        let observed: Pod = serde_json::from_value(json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {"name": "bare"}
        }))
        .unwrap();

        assert_eq!(DefaultCpuRequest::default().apply(&observed), observed);
    }

    #[test]
    fn custom_quantity_is_used() {
        let policy = DefaultCpuRequest::new(parse_quantity("250m").unwrap());
        let observed = pod(json!({"containers": [{"name": "app"}]}));

        let desired = policy.apply(&observed);

        assert_eq!(cpu_request(&desired.spec.unwrap().containers[0]), Some("250m"));
    }
}
