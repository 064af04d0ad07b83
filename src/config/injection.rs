//! Injection settings carried by pod annotations, and the fixed names shared
//! between the mutator and the vault-env entrypoint.

use std::collections::BTreeMap;

/// Annotation that switches injection on for a pod
pub const ANNOTATION_ENABLED: &str = "vault.security/enabled";
/// Vault address handed to the entrypoint
pub const ANNOTATION_VAULT_ADDR: &str = "vault.security/vault-addr";
/// Kubernetes auth role used for the Vault login
pub const ANNOTATION_VAULT_ROLE: &str = "vault.security/vault-role";
/// Secret path read by the entrypoint
pub const ANNOTATION_VAULT_PATH: &str = "vault.security/vault-path";
/// Name of the Kubernetes secret holding the Vault CA bundle
pub const ANNOTATION_VAULT_TLS_SECRET_NAME: &str = "vault.security/vault-tls-secret-name";

/// Prefix marking an environment value as a Vault reference
pub const SECRET_REFERENCE_PREFIX: &str = "vault:";

/// Memory-backed volume the staging init container copies vault-env into
pub const VAULT_ENV_VOLUME: &str = "vault-env";
pub const VAULT_ENV_MOUNT_PATH: &str = "/vault";
/// Where the mutated containers find the entrypoint
pub const VAULT_ENV_BINARY_PATH: &str = "/vault/vault-env";

/// Secret-backed volume carrying the Vault CA bundle
pub const TLS_VOLUME: &str = "tls";
pub const TLS_MOUNT_PATH: &str = "/etc/tls";
pub const VAULT_CA_BUNDLE_PATH: &str = "/etc/tls/ca.pem";

/// Staging init container
pub const STAGING_CONTAINER_NAME: &str = "init";
pub const STAGING_COPY_COMMAND: &str = "cp /usr/local/bin/vault-env /vault/";
pub const DEFAULT_VAULT_ENV_IMAGE: &str = "innovia/vault-env:1.1.0";

/// Environment variables written onto mutated containers
pub const ENV_VAULT_ADDR: &str = "VAULT_ADDR";
pub const ENV_VAULT_PATH: &str = "VAULT_PATH";
pub const ENV_VAULT_ROLE: &str = "VAULT_ROLE";
pub const ENV_VAULT_CAPATH: &str = "VAULT_CAPATH";

/// Service account token presented to the Vault Kubernetes auth backend
pub const SERVICE_ACCOUNT_TOKEN_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";

/// Vault injection settings for one pod
///
/// Missing annotations are empty strings; `enabled` is false unless the
/// annotation parses as a true boolean.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SecretInjectionConfig {
    pub addr: String,
    pub role: String,
    pub path: String,
    pub enabled: bool,
    pub tls_secret_name: String,
}

impl SecretInjectionConfig {
    /// Read the injection settings from pod annotations
    pub fn from_annotations(annotations: Option<&BTreeMap<String, String>>) -> Self {
        let get = |key: &str| {
            annotations
                .and_then(|a| a.get(key))
                .cloned()
                .unwrap_or_default()
        };

        Self {
            addr: get(ANNOTATION_VAULT_ADDR),
            role: get(ANNOTATION_VAULT_ROLE),
            path: get(ANNOTATION_VAULT_PATH),
            enabled: parse_bool(&get(ANNOTATION_ENABLED)).unwrap_or(false),
            tls_secret_name: get(ANNOTATION_VAULT_TLS_SECRET_NAME),
        }
    }
}

/// Boolean spellings accepted in annotations and Vault environment variables
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
