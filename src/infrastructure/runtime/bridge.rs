//! Runtime bridge - connects the sync TUI loop with the async Tokio runtime
//!
//! Commands returned by the application are spawned on the runtime. Each one
//! reports at most one [`Message`], which the loop drains without blocking.

use std::sync::mpsc::{self, Receiver, Sender};

use tokio::runtime::{Builder, Handle, Runtime};

use crate::core::{Command, Message};

pub struct RuntimeBridge {
    runtime: Option<Runtime>,
    msg_tx: Sender<Message>,
    msg_rx: Receiver<Message>,
}

impl RuntimeBridge {
    pub fn new() -> anyhow::Result<Self> {
        let runtime = Builder::new_multi_thread()
            .enable_all()
            .thread_name("chop-worker")
            .build()?;
        let (msg_tx, msg_rx) = mpsc::channel::<Message>();
        Ok(Self {
            runtime: Some(runtime),
            msg_tx,
            msg_rx,
        })
    }

    /// Run `command` in the background; its completion message lands in the queue.
    pub fn spawn(&self, command: Command) {
        let Some(runtime) = self.runtime.as_ref() else {
            return;
        };
        let tx = self.msg_tx.clone();
        let label = command.label();
        tracing::debug!(command = label, "command launched");
        runtime.spawn(async move {
            if let Some(message) = command.run().await {
                tracing::debug!(command = label, message = message.label(), "command finished");
                let _ = tx.send(message);
            }
        });
    }

    /// Drain completed messages in emission order (non-blocking).
    pub fn poll_messages(&self) -> Vec<Message> {
        let mut messages = Vec::new();
        while let Ok(message) = self.msg_rx.try_recv() {
            messages.push(message);
        }
        messages
    }

    pub fn handle(&self) -> Option<Handle> {
        self.runtime.as_ref().map(|runtime| runtime.handle().clone())
    }

    pub fn block_on<F: std::future::Future>(&self, future: F) -> Option<F::Output> {
        self.runtime.as_ref().map(|runtime| runtime.block_on(future))
    }
}

impl Drop for RuntimeBridge {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::{Duration, Instant};

    use super::*;

    #[test]
    fn test_spawned_command_reports_once() {
        let bridge = RuntimeBridge::new().unwrap();
        bridge.spawn(Command::new("export", async {
            Some(Message::ExportFinished(Ok(vec![PathBuf::from("x.csv")])))
        }));
        bridge.spawn(Command::new("noop", async { None }));

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut received = Vec::new();
        while received.is_empty() && Instant::now() < deadline {
            received.extend(bridge.poll_messages());
            std::thread::sleep(Duration::from_millis(10));
        }
        std::thread::sleep(Duration::from_millis(50));
        received.extend(bridge.poll_messages());
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].label(), "export-finished");
    }
}
