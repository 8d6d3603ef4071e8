//! Runtime infrastructure - Tokio runtime bridge for async commands

mod bridge;

pub use bridge::RuntimeBridge;
