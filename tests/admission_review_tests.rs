//! Integration tests for the admission review handler
//!
//! Reviews are fed in as raw JSON bodies, exactly as the API server posts them.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::StatusCode;
use k8s_openapi::api::core::v1::Pod;
use kube::core::admission::AdmissionResponse;
use serde_json::{json, Value};
use vault_secrets_webhook::config::InjectorSettings;
use vault_secrets_webhook::mutators::pod::{mutate_pod, MutationOutcome};
use vault_secrets_webhook::webhook::{handler, read_body, MAX_REVIEW_BYTES};

// ============================================================================
// Test Helpers
// ============================================================================

fn pod_json(annotations: Value) -> Value {
    json!({
        "apiVersion": "v1",
        "kind": "Pod",
        "metadata": {
            "name": "test-pod",
            "namespace": "default",
            "annotations": annotations
        },
        "spec": {
            "containers": [{
                "name": "alpine",
                "image": "alpine",
                "command": ["user-command"],
                "args": ["with", "extra", "args"],
                "env": [{"name": "AWS_SECRET_ACCESS_KEY", "value": "vault:AWS_SECRET_ACCESS_KEY"}]
            }]
        }
    })
}

fn enabled_annotations() -> Value {
    json!({
        "vault.security/enabled": "true",
        "vault.security/vault-addr": "https://vault.default.svc.cluster.local:8200",
        "vault.security/vault-role": "some-role",
        "vault.security/vault-path": "/secret/some/path",
        "vault.security/vault-tls-secret-name": "vault-consul-ca"
    })
}

fn review_body(kind: &str, resource: &str, object: Value) -> Vec<u8> {
    let review = json!({
        "apiVersion": "admission.k8s.io/v1",
        "kind": "AdmissionReview",
        "request": {
            "uid": "705ab4f5-6393-11e8-b7cc-42010a800002",
            "kind": {"group": "", "version": "v1", "kind": kind},
            "resource": {"group": "", "version": "v1", "resource": resource},
            "name": "test-pod",
            "namespace": "default",
            "operation": "CREATE",
            "userInfo": {"username": "admin"},
            "object": object,
            "dryRun": false
        }
    });
    serde_json::to_vec(&review).unwrap()
}

fn answer(body: &[u8]) -> AdmissionResponse {
    handler::review(body, &InjectorSettings::default())
        .response
        .expect("review carries a response")
}

// ============================================================================
// Review Tests
// ============================================================================

#[test]
fn pod_without_annotations_is_allowed_without_patch() {
    let response = answer(&review_body("Pod", "pods", pod_json(json!({}))));

    assert!(response.allowed);
    assert_eq!(response.uid, "705ab4f5-6393-11e8-b7cc-42010a800002");
    assert!(response.patch.is_none());
}

#[test]
fn enabled_pod_is_allowed_with_json_patch() {
    let response = answer(&review_body("Pod", "pods", pod_json(enabled_annotations())));

    assert!(response.allowed);
    assert!(response.patch_type.is_some());

    let patch: json_patch::Patch = serde_json::from_slice(&response.patch.unwrap()).unwrap();
    let mut document = pod_json(enabled_annotations());
    json_patch::patch(&mut document, &patch).unwrap();
    assert_eq!(document["spec"]["initContainers"][0]["name"], "init");
    assert_eq!(document["spec"]["containers"][0]["command"][0], "/vault/vault-env");
}

#[test]
fn incomplete_configuration_is_denied() {
    let mut annotations = enabled_annotations();
    annotations
        .as_object_mut()
        .unwrap()
        .remove("vault.security/vault-path");

    let response = answer(&review_body("Pod", "pods", pod_json(annotations)));

    assert!(!response.allowed);
    assert!(response.patch.is_none());
    assert!(format!("{:?}", response.result).contains("vault.security/vault-path"));
}

#[test]
fn other_kinds_are_allowed_unchanged() {
    let config_map = json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": {"name": "cfg", "namespace": "default", "annotations": enabled_annotations()},
        "data": {"key": "vault:value"}
    });

    let response = answer(&review_body("ConfigMap", "configmaps", config_map));

    assert!(response.allowed);
    assert!(response.patch.is_none());
}

#[test]
fn malformed_body_is_answered_as_invalid() {
    let response = answer(b"{not json");
    assert!(!response.allowed);
}

// ============================================================================
// Patch Tests
// ============================================================================

#[test]
fn patch_turns_original_pod_into_mutated_pod() {
    let original: Pod = serde_json::from_value(pod_json(enabled_annotations())).unwrap();
    let MutationOutcome::Mutated(mutated) =
        mutate_pod(&original, &InjectorSettings::default()).unwrap()
    else {
        panic!("expected a mutated pod");
    };

    let patch = handler::patch_for(&original, &mutated).unwrap();

    let mut document = serde_json::to_value(&original).unwrap();
    json_patch::patch(&mut document, &patch).unwrap();
    assert_eq!(document, serde_json::to_value(&*mutated).unwrap());
}

#[test]
fn patch_leaves_metadata_alone() {
    let original: Pod = serde_json::from_value(pod_json(enabled_annotations())).unwrap();
    let MutationOutcome::Mutated(mutated) =
        mutate_pod(&original, &InjectorSettings::default()).unwrap()
    else {
        panic!("expected a mutated pod");
    };

    let patch = handler::patch_for(&original, &mutated).unwrap();
    let value = serde_json::to_value(&patch).unwrap();

    for op in value.as_array().unwrap() {
        let path = op["path"].as_str().unwrap();
        assert!(path.starts_with("/spec/"), "unexpected patch path {}", path);
    }
}

// ============================================================================
// Request Body Tests
// ============================================================================

#[tokio::test]
async fn review_body_within_limit_is_read() {
    let body = review_body("Pod", "pods", pod_json(enabled_annotations()));

    let read = read_body(Full::new(Bytes::from(body.clone())), MAX_REVIEW_BYTES)
        .await
        .unwrap();

    assert_eq!(read, Bytes::from(body));
}

#[tokio::test]
async fn oversized_review_body_is_refused() {
    let body = Bytes::from(vec![b' '; MAX_REVIEW_BYTES + 1]);

    let result = read_body(Full::new(body), MAX_REVIEW_BYTES).await;

    assert_eq!(result, Err(StatusCode::PAYLOAD_TOO_LARGE));
}
