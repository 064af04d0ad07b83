//! Minimal Vault HTTP client: Kubernetes auth login and logical reads

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::{Certificate, Identity, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::config::parse_bool;
use crate::{Error, Result};

/// Address used when `VAULT_ADDR` is not set
pub const DEFAULT_VAULT_ADDR: &str = "https://127.0.0.1:8200";

/// Login endpoint of the Kubernetes auth backend
const KUBERNETES_LOGIN_PATH: &str = "auth/kubernetes/login";

const VAULT_TOKEN_HEADER: &str = "X-Vault-Token";
const VAULT_NAMESPACE_HEADER: &str = "X-Vault-Namespace";

/// Client settings taken from the standard `VAULT_*` variables
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VaultConfig {
    pub address: String,
    pub ca_cert: Option<PathBuf>,
    pub ca_path: Option<PathBuf>,
    pub client_cert: Option<PathBuf>,
    pub client_key: Option<PathBuf>,
    pub skip_verify: bool,
    pub timeout: Option<Duration>,
    pub namespace: Option<String>,
}

impl VaultConfig {
    /// Build the settings from a variable lookup, typically the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let skip_verify = match get("VAULT_SKIP_VERIFY") {
            Some(v) => parse_bool(&v).ok_or_else(|| {
                Error::ConfigError(format!("VAULT_SKIP_VERIFY is not a boolean: {}", v))
            })?,
            None => false,
        };

        let timeout = get("VAULT_CLIENT_TIMEOUT")
            .map(|v| parse_timeout(&v))
            .transpose()?;

        Ok(Self {
            address: get("VAULT_ADDR").unwrap_or_else(|| DEFAULT_VAULT_ADDR.to_string()),
            ca_cert: get("VAULT_CACERT").map(PathBuf::from),
            ca_path: get("VAULT_CAPATH").map(PathBuf::from),
            client_cert: get("VAULT_CLIENT_CERT").map(PathBuf::from),
            client_key: get("VAULT_CLIENT_KEY").map(PathBuf::from),
            skip_verify,
            timeout,
            namespace: get("VAULT_NAMESPACE"),
        })
    }
}

/// Accepts plain seconds (`30`) or a unit-suffixed duration (`500ms`, `1m`, `1h30m`)
fn parse_timeout(value: &str) -> Result<Duration> {
    if let Ok(seconds) = value.parse::<u64>() {
        return Ok(Duration::from_secs(seconds));
    }

    humantime::parse_duration(value).map_err(|e| {
        Error::ConfigError(format!(
            "VAULT_CLIENT_TIMEOUT is not a duration: {}: {}",
            value, e
        ))
    })
}

/// Authenticated (or not yet authenticated) Vault session
#[derive(Debug, Clone)]
pub struct VaultClient {
    http: reqwest::Client,
    address: String,
    namespace: Option<String>,
    token: Option<String>,
}

#[derive(Deserialize)]
struct LoginResponse {
    auth: Option<LoginAuth>,
}

#[derive(Deserialize)]
struct LoginAuth {
    client_token: String,
}

#[derive(Deserialize)]
struct ReadResponse {
    #[serde(default)]
    data: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    errors: Vec<String>,
}

impl VaultClient {
    /// Create a client for the configured address and trust settings
    pub fn new(config: &VaultConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();

        for path in trust_roots(config)? {
            let pem = read_file(&path)?;
            let cert = Certificate::from_pem(&pem).map_err(|e| {
                Error::ConfigError(format!("Invalid CA certificate {}: {}", path.display(), e))
            })?;
            builder = builder.add_root_certificate(cert);
        }

        if let (Some(cert), Some(key)) = (&config.client_cert, &config.client_key) {
            let mut pem = read_file(cert)?;
            pem.extend(read_file(key)?);
            let identity = Identity::from_pem(&pem)
                .map_err(|e| Error::ConfigError(format!("Invalid client certificate: {}", e)))?;
            builder = builder.identity(identity);
        }

        if config.skip_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            address: config.address.trim_end_matches('/').to_string(),
            namespace: config.namespace.clone(),
            token: None,
        })
    }

    /// Token obtained by the last successful login
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Exchange a service account JWT for a Vault token
    pub async fn login_kubernetes(&mut self, role: &str, jwt: &str) -> Result<()> {
        info!(role, "Logging into Vault Kubernetes backend");

        let body = serde_json::json!({ "jwt": jwt, "role": role });
        let response = self
            .request(reqwest::Method::POST, KUBERNETES_LOGIN_PATH)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::AuthError(format!("Failed to request new Vault token: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::AuthError(format!("Failed to read login response: {}", e)))?;

        if !status.is_success() {
            return Err(Error::AuthError(format!(
                "Vault login rejected ({}): {}",
                status,
                error_message(&text)
            )));
        }

        let login: LoginResponse = serde_json::from_str(&text)?;
        let token = login
            .auth
            .map(|a| a.client_token)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::AuthError("Vault login returned no client token".to_string()))?;

        self.token = Some(token);
        Ok(())
    }

    /// Read a logical path, `None` when nothing exists there
    pub async fn read(&self, path: &str) -> Result<Option<Map<String, Value>>> {
        debug!(path, "Reading Vault secret");

        let response = self
            .request(reqwest::Method::GET, path)
            .send()
            .await
            .map_err(|e| Error::SecretError(format!("Failed to read secret '{}': {}", path, e)))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            Error::SecretError(format!("Failed to read secret '{}': {}", path, e))
        })?;

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            return Err(Error::SecretError(format!(
                "Failed to read secret '{}' ({}): {}",
                path,
                status,
                error_message(&text)
            )));
        }

        let secret: ReadResponse = serde_json::from_str(&text)?;
        Ok(Some(secret.data.unwrap_or_default()))
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/v1/{}", self.address, path.trim_start_matches('/'));
        let mut request = self.http.request(method, url);

        if let Some(token) = &self.token {
            request = request.header(VAULT_TOKEN_HEADER, token);
        }
        if let Some(namespace) = &self.namespace {
            request = request.header(VAULT_NAMESPACE_HEADER, namespace);
        }

        request
    }
}

/// Read the service account token used for the Kubernetes login
pub fn read_service_account_token(path: &Path) -> Result<String> {
    info!(path = %path.display(), "Getting service account token");
    std::fs::read_to_string(path)
        .map(|token| token.trim().to_string())
        .map_err(|e| {
            Error::AuthError(format!(
                "Failed to read service account token file {}: {}",
                path.display(),
                e
            ))
        })
}

/// CA files to trust: `VAULT_CACERT`, then `VAULT_CAPATH` as a file or directory
fn trust_roots(config: &VaultConfig) -> Result<Vec<PathBuf>> {
    if let Some(file) = &config.ca_cert {
        return Ok(vec![file.clone()]);
    }

    let Some(path) = &config.ca_path else {
        return Ok(Vec::new());
    };

    if !path.is_dir() {
        return Ok(vec![path.clone()]);
    }

    let entries = std::fs::read_dir(path).map_err(|e| {
        Error::ConfigError(format!("Failed to list CA directory {}: {}", path.display(), e))
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            Error::ConfigError(format!("Failed to list CA directory {}: {}", path.display(), e))
        })?;
        if entry.path().is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path)
        .map_err(|e| Error::ConfigError(format!("Failed to read {}: {}", path.display(), e)))
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(parsed) if !parsed.errors.is_empty() => parsed.errors.join("; "),
        _ => body.trim().to_string(),
    }
}
