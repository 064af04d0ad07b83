//! TLS material for the admission endpoint

use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::TlsAcceptor;

use crate::{Error, Result};

/// Build a TLS acceptor from PEM certificate chain and private key files
pub fn load_acceptor(cert_path: &Path, key_path: &Path) -> Result<TlsAcceptor> {
    let cert_pem = read(cert_path)?;
    let key_pem = read(key_path)?;

    let certs: Vec<CertificateDer<'static>> =
        rustls_pemfile::certs(&mut BufReader::new(&cert_pem[..]))
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| {
                Error::ConfigError(format!("Invalid certificate {}: {}", cert_path.display(), e))
            })?;
    if certs.is_empty() {
        return Err(Error::ConfigError(format!(
            "No certificate found in {}",
            cert_path.display()
        )));
    }

    let key: PrivateKeyDer<'static> = rustls_pemfile::private_key(&mut BufReader::new(&key_pem[..]))
        .map_err(|e| Error::ConfigError(format!("Invalid key {}: {}", key_path.display(), e)))?
        .ok_or_else(|| {
            Error::ConfigError(format!("No private key found in {}", key_path.display()))
        })?;

    let config = rustls::ServerConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .map_err(|e| Error::ConfigError(format!("TLS configuration error: {}", e)))?
    .with_no_client_auth()
    .with_single_cert(certs, key)
    .map_err(|e| Error::ConfigError(format!("TLS configuration error: {}", e)))?;

    Ok(TlsAcceptor::from(Arc::new(config)))
}

fn read(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path)
        .map_err(|e| Error::ConfigError(format!("Failed to read {}: {}", path.display(), e)))
}
