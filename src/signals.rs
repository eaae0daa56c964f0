//! Change signals and the trailing debounce loop
//!
//! Any source (the vault watcher, the CLI, a test) reports that an item
//! changed through a `ChangeSignals` handle. The loop waits until an item has
//! been quiet for the debounce window, then hands it to the handler. A new
//! signal for the same item restarts its window.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::store::ItemId;

/// How long the loop sleeps when nothing is pending
const IDLE_WAIT: Duration = Duration::from_secs(60);

#[derive(Debug)]
pub enum SignalMessage {
    Changed(ItemId),
    /// Run everything pending now, then acknowledge
    Flush(oneshot::Sender<()>),
    /// Run everything pending, then stop
    Shutdown,
}

#[async_trait]
pub trait SignalHandler: Send + Sync {
    /// Runs one cycle for `id`; errors stay inside the handler
    async fn handle(&self, id: ItemId);
}

/// Handle for sending signals into a running loop
#[derive(Debug, Clone)]
pub struct ChangeSignals {
    sender: mpsc::UnboundedSender<SignalMessage>,
}

impl ChangeSignals {
    pub fn signal(&self, id: ItemId) {
        if self.sender.send(SignalMessage::Changed(id)).is_err() {
            log::debug!("Signal dropped: loop has stopped");
        }
    }

    /// Wait until every pending item has been handled
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.sender.send(SignalMessage::Flush(tx)).is_ok() {
            let _ = rx.await;
        }
    }

    pub fn shutdown(&self) {
        let _ = self.sender.send(SignalMessage::Shutdown);
    }
}

pub fn spawn_signal_loop(
    handler: Arc<dyn SignalHandler>,
    window: Duration,
) -> (ChangeSignals, JoinHandle<()>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let task = tokio::spawn(signal_loop(handler, window, receiver));
    (ChangeSignals { sender }, task)
}

async fn signal_loop(
    handler: Arc<dyn SignalHandler>,
    window: Duration,
    mut receiver: mpsc::UnboundedReceiver<SignalMessage>,
) {
    let mut pending: HashMap<ItemId, Instant> = HashMap::new();

    loop {
        let wake_at = pending
            .values()
            .min()
            .copied()
            .unwrap_or_else(|| Instant::now() + IDLE_WAIT);

        tokio::select! {
            _ = tokio::time::sleep_until(wake_at) => {
                let now = Instant::now();
                let mut ready: Vec<ItemId> = pending
                    .iter()
                    .filter(|(_, deadline)| **deadline <= now)
                    .map(|(id, _)| id.clone())
                    .collect();
                ready.sort();
                for id in ready {
                    pending.remove(&id);
                    handler.handle(id).await;
                }
            }

            msg = receiver.recv() => {
                match msg {
                    Some(SignalMessage::Changed(id)) => {
                        log::trace!("Change signal for {}", id);
                        pending.insert(id, Instant::now() + window);
                    }
                    Some(SignalMessage::Flush(ack)) => {
                        run_all(&handler, &mut pending).await;
                        let _ = ack.send(());
                    }
                    Some(SignalMessage::Shutdown) | None => {
                        run_all(&handler, &mut pending).await;
                        log::info!("Signal loop: shutting down");
                        break;
                    }
                }
            }
        }
    }
}

async fn run_all(handler: &Arc<dyn SignalHandler>, pending: &mut HashMap<ItemId, Instant>) {
    let mut ids: Vec<ItemId> = pending.drain().map(|(id, _)| id).collect();
    ids.sort();
    for id in ids {
        handler.handle(id).await;
    }
}
