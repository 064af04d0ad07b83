//! The vault-env entrypoint
//!
//! Runs as the first process of a mutated container: logs into Vault with the
//! pod's service account, reads the configured secret, swaps `vault:` references
//! in its environment for the secret's values, strips the Vault client variables
//! and execs the original command.

pub mod document;
pub mod environ;
pub mod launcher;

use std::ffi::OsString;
use std::path::PathBuf;

use tracing::info;

use crate::adapters::vault_client::{read_service_account_token, VaultClient, VaultConfig};
use crate::config::{ENV_VAULT_PATH, ENV_VAULT_ROLE, SERVICE_ACCOUNT_TOKEN_PATH};
use crate::{Error, Result};

pub use document::SecretDocument;
pub use launcher::Launch;

/// Process-independent inputs of the entrypoint
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeOptions {
    /// Service account token presented to Vault
    pub token_path: PathBuf,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            token_path: PathBuf::from(SERVICE_ACCOUNT_TOKEN_PATH),
        }
    }
}

/// Authenticate, fetch the secret and resolve the launch of the target
///
/// `inherited` is the environment vault-env started with and `argv` the
/// target command line (vault-env's arguments without its own program name).
pub async fn prepare(
    inherited: Vec<(OsString, OsString)>,
    argv: Vec<OsString>,
    options: &RuntimeOptions,
) -> Result<Launch> {
    let lookup = |name: &str| {
        inherited
            .iter()
            .find(|(key, _)| key.as_os_str() == name)
            .and_then(|(_, value)| value.to_str())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    let role = lookup(ENV_VAULT_ROLE).ok_or_else(|| {
        Error::ConfigError(format!("{} environment variable is missing", ENV_VAULT_ROLE))
    })?;
    let path = lookup(ENV_VAULT_PATH).ok_or_else(|| {
        Error::ConfigError(format!("{} environment variable is missing", ENV_VAULT_PATH))
    })?;
    let vault_config = VaultConfig::from_lookup(&lookup)?;

    let mut client = VaultClient::new(&vault_config)?;
    let jwt = read_service_account_token(&options.token_path)?;
    client.login_kubernetes(&role, &jwt).await?;

    info!(path = %path, "Getting Vault secrets from path");
    let data = client
        .read(&path)
        .await?
        .ok_or_else(|| Error::SecretNotFound(path.clone()))?;
    let document = SecretDocument::from_response(&data);

    info!(keys = document.len(), "Processing environment variables from Vault secret");
    let env = environ::sanitize(inherited, &document)?;

    Launch::resolve(argv, env)
}

/// Run the entrypoint against the current process; returns only on failure
pub async fn run(options: &RuntimeOptions) -> Error {
    let inherited = std::env::vars_os().collect();
    let argv = std::env::args_os().skip(1).collect();

    match prepare(inherited, argv, options).await {
        Ok(launch) => {
            info!("Launching command");
            launcher::exec(launch)
        }
        Err(e) => e,
    }
}
