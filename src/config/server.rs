//! Settings for the admission webhook process

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use super::injection::DEFAULT_VAULT_ENV_IMAGE;

/// Command line of the admission webhook server
#[derive(Debug, Clone, Parser)]
#[command(name = "vault-secrets-webhook", version, about)]
pub struct WebhookArgs {
    /// Address the admission endpoint listens on
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8443")]
    pub listen_addr: SocketAddr,

    /// PEM certificate served to the API server
    #[arg(long, env = "TLS_CERT_FILE", requires = "tls_private_key_file")]
    pub tls_cert_file: Option<PathBuf>,

    /// PEM private key matching the certificate
    #[arg(long, env = "TLS_PRIVATE_KEY_FILE", requires = "tls_cert_file")]
    pub tls_private_key_file: Option<PathBuf>,

    /// Image of the staging init container, must contain /usr/local/bin/vault-env
    #[arg(long, env = "VAULT_ENV_IMAGE", default_value = DEFAULT_VAULT_ENV_IMAGE)]
    pub vault_env_image: String,

    /// Port of the metrics and probe server
    #[arg(long, env = "METRICS_PORT", default_value_t = 8080)]
    pub metrics_port: u16,
}

impl WebhookArgs {
    /// Injection settings derived from the flags
    pub fn injector_settings(&self) -> InjectorSettings {
        InjectorSettings {
            vault_env_image: self.vault_env_image.clone(),
        }
    }

    /// Certificate and key paths, when TLS is configured
    pub fn tls_files(&self) -> Option<(PathBuf, PathBuf)> {
        match (&self.tls_cert_file, &self.tls_private_key_file) {
            (Some(cert), Some(key)) => Some((cert.clone(), key.clone())),
            _ => None,
        }
    }
}

/// Process-wide settings that shape what the mutator injects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectorSettings {
    pub vault_env_image: String,
}

impl Default for InjectorSettings {
    fn default() -> Self {
        Self {
            vault_env_image: DEFAULT_VAULT_ENV_IMAGE.to_string(),
        }
    }
}
