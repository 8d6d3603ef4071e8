//! Asynchronous commands and the completion messages they report

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use futures::FutureExt;

use crate::bytecode::Disassembly;
use crate::domain::{CallParams, CallResult};
use crate::evm::EvmBackend;

/// Completion events re-injected into the event loop.
pub enum Message {
    CallFinished {
        params: CallParams,
        result: CallResult,
        timestamp: DateTime<Utc>,
    },
    DisassemblyLoaded {
        address: Address,
        result: Result<Disassembly, String>,
    },
    ResetFinished {
        backend: Result<Arc<dyn EvmBackend>, String>,
    },
    ExportFinished(Result<Vec<PathBuf>, String>),
}

impl Message {
    pub fn label(&self) -> &'static str {
        match self {
            Message::CallFinished { .. } => "call-finished",
            Message::DisassemblyLoaded { .. } => "disassembly-loaded",
            Message::ResetFinished { .. } => "reset-finished",
            Message::ExportFinished(_) => "export-finished",
        }
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::CallFinished {
                params,
                result,
                timestamp,
            } => f
                .debug_struct("CallFinished")
                .field("params", params)
                .field("success", &result.success)
                .field("timestamp", timestamp)
                .finish(),
            Message::DisassemblyLoaded { address, result } => f
                .debug_struct("DisassemblyLoaded")
                .field("address", address)
                .field("ok", &result.is_ok())
                .finish(),
            Message::ResetFinished { backend } => f
                .debug_struct("ResetFinished")
                .field("ok", &backend.is_ok())
                .finish(),
            Message::ExportFinished(result) => {
                f.debug_tuple("ExportFinished").field(result).finish()
            }
        }
    }
}

/// A unit of work that runs off the event loop and reports at most one message.
pub struct Command {
    label: &'static str,
    task: BoxFuture<'static, Option<Message>>,
}

impl Command {
    pub fn new<F>(label: &'static str, task: F) -> Self
    where
        F: Future<Output = Option<Message>> + Send + 'static,
    {
        Self {
            label,
            task: task.boxed(),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub async fn run(self) -> Option<Message> {
        self.task.await
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command").field("label", &self.label).finish()
    }
}
