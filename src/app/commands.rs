//! Background commands started by the key handlers

use std::path::PathBuf;
use std::sync::Arc;

use alloy_primitives::{Address, Bytes};
use chrono::Utc;

use super::Services;
use crate::bytecode;
use crate::core::{Command, Message};
use crate::domain::{CallParams, CallResult, HistoryEntry};
use crate::evm::{BackendFactory, EvmBackend};
use crate::export;
use crate::store::{CallStore, PersistedCall};

/// Execute `params` off the loop.
///
/// Backend failures become a failed [`CallResult`]. The timestamp is taken once
/// and shared by the persisted record and the completion message.
pub fn execute_call(
    evm: Arc<dyn EvmBackend>,
    store: Option<Arc<dyn CallStore>>,
    params: CallParams,
) -> Command {
    Command::new("execute-call", async move {
        let exec_params = params.clone();
        let outcome = tokio::task::spawn_blocking(move || evm.execute(&exec_params)).await;
        let result = match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => {
                tracing::debug!(error = %err, "call failed in backend");
                CallResult::failure(err.to_string())
            }
            Err(err) => {
                tracing::error!(error = %err, "execution task failed");
                CallResult::failure(format!("execution task failed: {err}"))
            }
        };
        let timestamp = Utc::now();

        if let Some(store) = store {
            let record = PersistedCall::new(&params, timestamp);
            tokio::spawn(async move {
                if let Err(err) = store.append_call(record).await {
                    tracing::warn!(error = %err, "failed to persist call");
                }
            });
        }

        Some(Message::CallFinished {
            params,
            result,
            timestamp,
        })
    })
}

pub fn load_disassembly(address: Address, code: Bytes) -> Command {
    Command::new("load-disassembly", async move {
        let outcome = tokio::task::spawn_blocking(move || {
            bytecode::disassemble(&code).map_err(|err| err.to_string())
        })
        .await;
        let result = match outcome {
            Ok(result) => result,
            Err(err) => Err(format!("disassembly task failed: {err}")),
        };
        Some(Message::DisassemblyLoaded { address, result })
    })
}

/// Clear the state file and build a fresh backend. The old backend is closed
/// only once its replacement exists.
pub fn reset_state(
    old: Arc<dyn EvmBackend>,
    factory: BackendFactory,
    store: Option<Arc<dyn CallStore>>,
) -> Command {
    Command::new("reset-state", async move {
        if let Some(store) = store {
            if let Err(err) = store.clear().await {
                tracing::warn!(error = %err, "failed to clear state file");
            }
        }
        let backend = match factory() {
            Ok(backend) => {
                old.close();
                Ok(backend)
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to create backend");
                Err(err.to_string())
            }
        };
        Some(Message::ResetFinished { backend })
    })
}

pub fn export_history(dir: PathBuf, entries: Vec<HistoryEntry>) -> Command {
    Command::new("export-history", async move {
        let outcome =
            tokio::task::spawn_blocking(move || export::export_history(&dir, &entries)).await;
        let result = match outcome {
            Ok(Ok(paths)) => Ok(paths),
            Ok(Err(err)) => Err(format!("{err:#}")),
            Err(err) => Err(format!("export task failed: {err}")),
        };
        Some(Message::ExportFinished(result))
    })
}

/// Re-execute persisted calls so history and the chain survive restarts.
/// Each call keeps its original timestamp. Returns the number replayed.
pub fn replay_calls(services: &Services, calls: Vec<PersistedCall>) -> usize {
    let mut replayed = 0;
    for call in calls {
        let params = call.params();
        let result = match services.evm.execute(&params) {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    timestamp = %call.timestamp,
                    "skipping persisted call"
                );
                continue;
            }
        };
        services.record_call(&params, &result, call.timestamp);
        replayed += 1;
    }
    if replayed > 0 {
        tracing::info!(replayed, "persisted calls replayed");
    }
    replayed
}
