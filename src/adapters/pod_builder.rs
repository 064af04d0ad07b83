//! Builders for everything the mutator adds to a pod

use k8s_openapi::api::core::v1::{
    Container, EmptyDirVolumeSource, EnvVar, SecretVolumeSource, Volume, VolumeMount,
};

use crate::config::{
    InjectorSettings, SecretInjectionConfig, ENV_VAULT_ADDR, ENV_VAULT_CAPATH, ENV_VAULT_PATH,
    ENV_VAULT_ROLE, STAGING_CONTAINER_NAME, STAGING_COPY_COMMAND, TLS_MOUNT_PATH, TLS_VOLUME,
    VAULT_CA_BUNDLE_PATH, VAULT_ENV_MOUNT_PATH, VAULT_ENV_VOLUME,
};

/// Init container that copies vault-env onto the shared memory volume
pub fn build_staging_container(settings: &InjectorSettings) -> Container {
    Container {
        name: STAGING_CONTAINER_NAME.to_string(),
        image: Some(settings.vault_env_image.clone()),
        image_pull_policy: Some("IfNotPresent".to_string()),
        command: Some(vec![
            "sh".to_string(),
            "-c".to_string(),
            STAGING_COPY_COMMAND.to_string(),
        ]),
        volume_mounts: Some(vec![vault_env_mount()]),
        ..Default::default()
    }
}

/// Pod volumes backing the binary staging area and the Vault CA bundle
pub fn build_volumes(config: &SecretInjectionConfig) -> Vec<Volume> {
    vec![
        Volume {
            name: VAULT_ENV_VOLUME.to_string(),
            empty_dir: Some(EmptyDirVolumeSource {
                medium: Some("Memory".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        },
        Volume {
            name: TLS_VOLUME.to_string(),
            secret: Some(SecretVolumeSource {
                secret_name: Some(config.tls_secret_name.clone()),
                ..Default::default()
            }),
            ..Default::default()
        },
    ]
}

/// Mounts added to every container that runs through vault-env
pub fn build_volume_mounts() -> Vec<VolumeMount> {
    vec![
        vault_env_mount(),
        VolumeMount {
            name: TLS_VOLUME.to_string(),
            mount_path: TLS_MOUNT_PATH.to_string(),
            ..Default::default()
        },
    ]
}

/// Environment vault-env reads to log in and locate the secret
pub fn build_env_vars(config: &SecretInjectionConfig) -> Vec<EnvVar> {
    [
        (ENV_VAULT_ADDR, config.addr.as_str()),
        (ENV_VAULT_PATH, config.path.as_str()),
        (ENV_VAULT_ROLE, config.role.as_str()),
        (ENV_VAULT_CAPATH, VAULT_CA_BUNDLE_PATH),
    ]
    .into_iter()
    .map(|(name, value)| EnvVar {
        name: name.to_string(),
        value: Some(value.to_string()),
        ..Default::default()
    })
    .collect()
}

fn vault_env_mount() -> VolumeMount {
    VolumeMount {
        name: VAULT_ENV_VOLUME.to_string(),
        mount_path: VAULT_ENV_MOUNT_PATH.to_string(),
        ..Default::default()
    }
}
