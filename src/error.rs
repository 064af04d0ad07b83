//! Error types for the Vault secrets webhook and the vault-env entrypoint

/// Result type for the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Error type shared by the admission mutator and the injection runtime
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or invalid process configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Pod annotations requested injection but are incomplete
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Service account token unreadable or Vault login rejected
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Vault could not be read
    #[error("Secret error: {0}")]
    SecretError(String),

    /// Vault answered, but nothing exists at the path
    #[error("Vault secret path not found: {0}")]
    SecretNotFound(String),

    /// A `vault:` reference points at a key the secret does not contain
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// The target program could not be resolved or executed
    #[error("Launch error: {0}")]
    LaunchError(String),

    /// JSON encoding or decoding failed
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Transport failure talking to Vault
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}
