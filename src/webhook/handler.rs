//! AdmissionReview handling for pods

use k8s_openapi::api::core::v1::Pod;
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview};
use kube::core::DynamicObject;
use tracing::{debug, error, info, warn};

use crate::config::InjectorSettings;
use crate::metrics::{ADMISSION_REVIEWS, MUTATED_PODS};
use crate::mutators::pod::{mutate_pod, MutationOutcome};
use crate::Result;

/// Answer a raw AdmissionReview body
pub fn review(body: &[u8], settings: &InjectorSettings) -> AdmissionReview<DynamicObject> {
    let review: AdmissionReview<DynamicObject> = match serde_json::from_slice(body) {
        Ok(review) => review,
        Err(e) => {
            error!(error = %e, "Failed to decode admission review");
            ADMISSION_REVIEWS.with_label_values(&["invalid"]).inc();
            return AdmissionResponse::invalid(e.to_string()).into_review();
        }
    };

    let request: AdmissionRequest<DynamicObject> = match review.try_into() {
        Ok(request) => request,
        Err(e) => {
            error!(error = %e, "Failed to parse admission request");
            ADMISSION_REVIEWS.with_label_values(&["invalid"]).inc();
            return AdmissionResponse::invalid(e.to_string()).into_review();
        }
    };

    admit(&request, settings).into_review()
}

/// Decide on one admission request
///
/// Only pods are considered; anything else is allowed untouched.
pub fn admit(
    request: &AdmissionRequest<DynamicObject>,
    settings: &InjectorSettings,
) -> AdmissionResponse {
    let response = AdmissionResponse::from(request);
    let uid = request.uid.clone();

    if request.kind.kind != "Pod" {
        debug!(uid = %uid, kind = %request.kind.kind, "Not a pod, allowing unchanged");
        ADMISSION_REVIEWS.with_label_values(&["unchanged"]).inc();
        return response;
    }

    let Some(object) = &request.object else {
        debug!(uid = %uid, "No object in request, allowing unchanged");
        ADMISSION_REVIEWS.with_label_values(&["unchanged"]).inc();
        return response;
    };

    let pod: Pod = match serde_json::to_value(object).and_then(serde_json::from_value) {
        Ok(pod) => pod,
        Err(e) => {
            warn!(uid = %uid, error = %e, "Request object is not a valid pod");
            ADMISSION_REVIEWS.with_label_values(&["invalid"]).inc();
            return response.deny(format!("invalid pod object: {}", e));
        }
    };

    let namespace = pod
        .metadata
        .namespace
        .clone()
        .or_else(|| request.namespace.clone())
        .unwrap_or_default();
    let name = pod
        .metadata
        .name
        .clone()
        .or_else(|| pod.metadata.generate_name.clone())
        .unwrap_or_default();

    match mutate_pod(&pod, settings) {
        Ok(MutationOutcome::Unchanged) => {
            debug!(uid = %uid, namespace = %namespace, pod = %name, "Injection not requested");
            ADMISSION_REVIEWS.with_label_values(&["unchanged"]).inc();
            response
        }
        Ok(MutationOutcome::Mutated(mutated)) => {
            let patched = patch_for(&pod, &mutated)
                .map_err(|e| e.to_string())
                .and_then(|patch| response.clone().with_patch(patch).map_err(|e| e.to_string()));

            match patched {
                Ok(patched) => {
                    info!(uid = %uid, namespace = %namespace, pod = %name, "Mutated pod for Vault injection");
                    ADMISSION_REVIEWS.with_label_values(&["mutated"]).inc();
                    MUTATED_PODS.inc();
                    patched
                }
                Err(e) => {
                    error!(uid = %uid, namespace = %namespace, pod = %name, error = %e, "Failed to build patch");
                    ADMISSION_REVIEWS.with_label_values(&["error"]).inc();
                    response.deny(format!("patch serialization error: {}", e))
                }
            }
        }
        Err(e) => {
            warn!(uid = %uid, namespace = %namespace, pod = %name, error = %e, "Denied pod");
            ADMISSION_REVIEWS.with_label_values(&["rejected"]).inc();
            response.deny(e.to_string())
        }
    }
}

/// JSON patch turning `original` into `mutated`
pub fn patch_for(original: &Pod, mutated: &Pod) -> Result<json_patch::Patch> {
    let before = serde_json::to_value(original)?;
    let after = serde_json::to_value(mutated)?;
    Ok(json_patch::diff(&before, &after))
}
