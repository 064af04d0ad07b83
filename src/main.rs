//! Vault secrets admission webhook
//!
//! Main entry point for the webhook. Parses settings, starts the admission
//! server and the metrics server, and waits for a shutdown signal.

use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vault_secrets_webhook::{
    config::WebhookArgs,
    metrics,
    webhook::{self, tls, Context},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = WebhookArgs::parse();

    // Initialize tracing
    init_tracing();

    info!("Starting Vault secrets webhook");

    let acceptor = match args.tls_files() {
        Some((cert, key)) => Some(tls::load_acceptor(&cert, &key)?),
        None => {
            info!("No TLS certificate configured, serving plain HTTP");
            None
        }
    };

    // Create shared context
    let context = Context::new(args.injector_settings());
    info!(image = %context.settings.vault_env_image, "Using vault-env image");

    // Start metrics server
    let metrics_handle = tokio::spawn(metrics::serve(args.metrics_port));
    info!("Metrics server starting on port {}", args.metrics_port);

    // Run the admission server
    let webhook_handle = tokio::spawn(webhook::serve(args.listen_addr, acceptor, context));

    // Handle graceful shutdown
    tokio::select! {
        res = webhook_handle => {
            error!("Admission server exited unexpectedly: {:?}", res);
        }
        res = metrics_handle => {
            error!("Metrics server exited unexpectedly: {:?}", res);
        }
        _ = shutdown_signal() => {
            info!("Received shutdown signal, stopping webhook");
        }
    }

    info!("Vault secrets webhook stopped");
    Ok(())
}

/// Initialize tracing subscriber
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,vault_secrets_webhook=debug,hyper=warn,rustls=warn")
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install CTRL+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received CTRL+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}
