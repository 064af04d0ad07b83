//! Prometheus metrics for the Vault secrets webhook
//!
//! This module exposes metrics for monitoring admission traffic and webhook health.

pub mod prometheus;

pub use prometheus::*;
