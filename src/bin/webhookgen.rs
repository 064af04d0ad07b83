//! Webhook manifest generator
//!
//! Prints the MutatingWebhookConfiguration that routes pod creation to the
//! webhook service.
//!
//! Usage: cargo run --bin webhookgen -- --ca-bundle ca.pem > deploy/webhook.yaml

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use vault_secrets_webhook::webhook::manifest::{build_webhook_configuration, WebhookTarget};

#[derive(Debug, Parser)]
#[command(name = "webhookgen", about = "Generate the MutatingWebhookConfiguration manifest")]
struct Args {
    /// PEM bundle of the CA that signed the webhook certificate
    #[arg(long)]
    ca_bundle: PathBuf,

    /// Service fronting the webhook pods
    #[arg(long, default_value = "vault-secrets-webhook")]
    service_name: String,

    /// Namespace of the service
    #[arg(long, default_value = "default")]
    namespace: String,

    /// Service port
    #[arg(long, default_value_t = 443)]
    port: i32,

    /// Ignore or Fail
    #[arg(long, default_value = "Ignore", value_parser = ["Ignore", "Fail"])]
    failure_policy: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let ca_bundle = std::fs::read(&args.ca_bundle)
        .with_context(|| format!("reading {}", args.ca_bundle.display()))?;

    let target = WebhookTarget {
        service_name: args.service_name,
        namespace: args.namespace,
        port: args.port,
        failure_policy: args.failure_policy,
    };

    println!("---");
    print!(
        "{}",
        serde_yaml::to_string(&build_webhook_configuration(&target, ca_bundle))?
    );
    Ok(())
}
