//! chop: an interactive console for a local in-process EVM
//!
//! The [`app`] module holds the screen state machine. Collaborators (EVM
//! backend, chain, accounts, history, persistence) live in their own modules
//! and are shared with background commands through [`app::Services`].

pub mod accounts;
pub mod app;
pub mod bytecode;
pub mod chain;
pub mod clipboard;
pub mod config;
pub mod core;
pub mod domain;
pub mod evm;
pub mod export;
pub mod history;
pub mod infrastructure;
pub mod inspector;
pub mod logging;
pub mod store;
pub mod ui;
