//! Construction of the environment handed to the target program

use std::collections::HashSet;
use std::ffi::OsString;

use crate::reference;
use crate::runtime::document::SecretDocument;
use crate::{Error, Result};

lazy_static::lazy_static! {
    /// Vault client variables that only matter to vault-env itself
    pub static ref SANITIZED_VARIABLES: HashSet<&'static str> = [
        "VAULT_TOKEN",
        "VAULT_ADDR",
        "VAULT_CACERT",
        "VAULT_CAPATH",
        "VAULT_CLIENT_CERT",
        "VAULT_CLIENT_KEY",
        "VAULT_CLIENT_TIMEOUT",
        "VAULT_CLUSTER_ADDR",
        "VAULT_MAX_RETRIES",
        "VAULT_REDIRECT_ADDR",
        "VAULT_SKIP_VERIFY",
        "VAULT_TLS_SERVER_NAME",
        "VAULT_CLI_NO_COLOR",
        "VAULT_RATE_LIMIT",
        "VAULT_NAMESPACE",
        "VAULT_MFA",
        "VAULT_ROLE",
        "VAULT_PATH",
    ]
    .into_iter()
    .collect();
}

/// Whether a variable is stripped before launching the target
pub fn is_sanitized(name: &str) -> bool {
    SANITIZED_VARIABLES.contains(name)
}

/// Resolve `vault:` references and strip Vault client variables
///
/// Entries keep their relative order and names. A reference to a key the
/// document lacks fails the whole build.
pub fn sanitize<I>(environ: I, document: &SecretDocument) -> Result<Vec<(OsString, OsString)>>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    let mut sanitized = Vec::new();

    for (name, value) in environ {
        let resolved = match value.to_str().and_then(reference::parse) {
            Some(key) => Some(
                document
                    .get(key)
                    .map(OsString::from)
                    .ok_or_else(|| Error::KeyNotFound(key.to_string()))?,
            ),
            None => None,
        };
        let value = resolved.unwrap_or(value);

        if name.to_str().is_some_and(is_sanitized) {
            continue;
        }

        sanitized.push((name, value));
    }

    Ok(sanitized)
}
