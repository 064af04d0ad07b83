//! MutatingWebhookConfiguration registering the pod endpoint

use k8s_openapi::api::admissionregistration::v1::{
    MutatingWebhook, MutatingWebhookConfiguration, RuleWithOperations, ServiceReference,
    WebhookClientConfig,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;

use super::PODS_PATH;

/// Where the API server reaches the webhook
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebhookTarget {
    pub service_name: String,
    pub namespace: String,
    pub port: i32,
    pub failure_policy: String,
}

/// Build the webhook registration for pod creation
pub fn build_webhook_configuration(
    target: &WebhookTarget,
    ca_bundle: Vec<u8>,
) -> MutatingWebhookConfiguration {
    MutatingWebhookConfiguration {
        metadata: ObjectMeta {
            name: Some(format!("{}-pods", target.service_name)),
            ..Default::default()
        },
        webhooks: Some(vec![MutatingWebhook {
            name: format!("pods.{}.{}.svc", target.service_name, target.namespace),
            admission_review_versions: vec!["v1".to_string(), "v1beta1".to_string()],
            client_config: WebhookClientConfig {
                ca_bundle: Some(ByteString(ca_bundle)),
                service: Some(ServiceReference {
                    name: target.service_name.clone(),
                    namespace: target.namespace.clone(),
                    path: Some(PODS_PATH.to_string()),
                    port: Some(target.port),
                }),
                ..Default::default()
            },
            rules: Some(vec![RuleWithOperations {
                api_groups: Some(vec![String::new()]),
                api_versions: Some(vec!["v1".to_string()]),
                operations: Some(vec!["CREATE".to_string()]),
                resources: Some(vec!["pods".to_string()]),
                scope: Some("Namespaced".to_string()),
            }]),
            failure_policy: Some(target.failure_policy.clone()),
            side_effects: "None".to_string(),
            timeout_seconds: Some(10),
            ..Default::default()
        }]),
    }
}
