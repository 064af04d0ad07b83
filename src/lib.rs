//! Vault secrets injection for Kubernetes
//!
//! Two halves share this crate: a mutating admission webhook that rewrites pods
//! to start through `vault-env`, and the `vault-env` entrypoint that resolves
//! `vault:` environment references and execs the original command.

pub mod adapters;
pub mod config;
pub mod error;
pub mod metrics;
pub mod mutators;
pub mod reference;
pub mod runtime;
pub mod webhook;

pub use error::{Error, Result};
