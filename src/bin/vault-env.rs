//! vault-env entrypoint
//!
//! Injected by the webhook as the command of containers that reference Vault.
//! Usage: vault-env <command> [args...]

use std::process::ExitCode;

use tracing::error;
use tracing_subscriber::EnvFilter;

use vault_secrets_webhook::runtime::{self, RuntimeOptions};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();

    let err = runtime::run(&RuntimeOptions::default()).await;
    error!("{}", err);
    ExitCode::FAILURE
}

/// Plain-text logs on stderr, stdout belongs to the target program
fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}
