//! Adapters for building injected Kubernetes objects and talking to Vault

pub mod pod_builder;
pub mod vault_client;
