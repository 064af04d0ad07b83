//! Configuration derived from pod annotations and from the webhook's own flags

pub mod injection;
pub mod server;

pub use injection::*;
pub use server::*;
