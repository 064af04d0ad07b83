//! Pod mutation for Vault secret injection
//!
//! Containers whose environment holds `vault:` references are rewritten to
//! start through `/vault/vault-env`, which resolves the references and then
//! execs the original command. A staging init container and two volumes are
//! added once per pod when at least one container was rewritten.

use k8s_openapi::api::core::v1::{Container, Pod};
use tracing::{debug, info};

use crate::adapters::pod_builder;
use crate::config::{
    InjectorSettings, SecretInjectionConfig, ANNOTATION_VAULT_ADDR, ANNOTATION_VAULT_PATH,
    ANNOTATION_VAULT_ROLE, ANNOTATION_VAULT_TLS_SECRET_NAME, VAULT_ENV_BINARY_PATH,
};
use crate::reference;
use crate::{Error, Result};

/// Result of running the mutator over one pod
#[derive(Clone, Debug, PartialEq)]
pub enum MutationOutcome {
    /// Injection not requested, or no container references Vault
    Unchanged,
    /// The rewritten pod
    Mutated(Box<Pod>),
}

/// Validate the injection settings of an enabled pod
pub fn validate(config: &SecretInjectionConfig) -> Result<()> {
    let required = [
        (config.addr.as_str(), "vault address", ANNOTATION_VAULT_ADDR),
        (
            config.tls_secret_name.as_str(),
            "vault TLS secret name",
            ANNOTATION_VAULT_TLS_SECRET_NAME,
        ),
        (config.path.as_str(), "vault path", ANNOTATION_VAULT_PATH),
        (config.role.as_str(), "vault role", ANNOTATION_VAULT_ROLE),
    ];

    for (value, what, annotation) in required {
        if value.is_empty() {
            return Err(Error::ValidationError(format!(
                "missing {} - make sure you set the annotation \"{}\"",
                what, annotation
            )));
        }
    }

    Ok(())
}

/// Compute the mutated form of a pod
///
/// The input is never modified. Pods that did not opt in, and opted-in pods
/// without any `vault:` reference, come back as [`MutationOutcome::Unchanged`].
pub fn mutate_pod(pod: &Pod, settings: &InjectorSettings) -> Result<MutationOutcome> {
    let config = SecretInjectionConfig::from_annotations(pod.metadata.annotations.as_ref());
    if !config.enabled {
        return Ok(MutationOutcome::Unchanged);
    }

    validate(&config)?;

    let Some(spec) = pod.spec.as_ref() else {
        return Ok(MutationOutcome::Unchanged);
    };

    let mut spec = spec.clone();
    let mut init_containers = spec.init_containers.take().unwrap_or_default();

    let init_mutated = mutate_containers(&mut init_containers, &config);
    let containers_mutated = mutate_containers(&mut spec.containers, &config);

    if init_mutated + containers_mutated == 0 {
        debug!("No container references Vault, leaving pod unchanged");
        return Ok(MutationOutcome::Unchanged);
    }

    info!(
        init_containers = init_mutated,
        containers = containers_mutated,
        "Injecting vault-env into pod"
    );

    init_containers.insert(0, pod_builder::build_staging_container(settings));
    spec.init_containers = Some(init_containers);

    let mut volumes = spec.volumes.take().unwrap_or_default();
    volumes.extend(pod_builder::build_volumes(&config));
    spec.volumes = Some(volumes);

    Ok(MutationOutcome::Mutated(Box::new(Pod {
        spec: Some(spec),
        ..pod.clone()
    })))
}

/// Rewrite every container that references Vault, returning how many were
pub fn mutate_containers(containers: &mut [Container], config: &SecretInjectionConfig) -> usize {
    let mut mutated = 0;

    for container in containers.iter_mut() {
        if !references_vault(container) {
            continue;
        }

        debug!(container = %container.name, "Wrapping container command with vault-env");
        wrap_container(container, config);
        mutated += 1;
    }

    mutated
}

/// Whether any environment value of the container is a `vault:` reference
pub fn references_vault(container: &Container) -> bool {
    container
        .env
        .iter()
        .flatten()
        .filter_map(|env| env.value.as_deref())
        .any(reference::is_reference)
}

fn wrap_container(container: &mut Container, config: &SecretInjectionConfig) {
    // vault-env execs its own arguments: original command, then original args
    let mut args = container.command.take().unwrap_or_default();
    args.extend(container.args.take().unwrap_or_default());

    container.command = Some(vec![VAULT_ENV_BINARY_PATH.to_string()]);
    container.args = if args.is_empty() { None } else { Some(args) };

    container
        .volume_mounts
        .get_or_insert_with(Vec::new)
        .extend(pod_builder::build_volume_mounts());

    container
        .env
        .get_or_insert_with(Vec::new)
        .extend(pod_builder::build_env_vars(config));
}
