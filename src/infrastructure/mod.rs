//! Infrastructure layer
//!
//! This layer contains:
//! - Tokio runtime bridge for background commands
//! - JSON-RPC server over the local chain

pub mod runtime;
pub mod server;

pub use runtime::RuntimeBridge;
