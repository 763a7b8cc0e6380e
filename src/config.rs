//! Per-instance runtime configuration and lifecycle events.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::broadcast;

/// Lifecycle event types emitted during composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Emitted when a transaction group is simulated (for AVM traces).
    TxnGroupSimulated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxnGroupSimulatedEventData {
    pub simulate_response: serde_json::Value,
}

#[derive(Debug, Clone)]
pub enum EventData {
    TxnGroupSimulated(TxnGroupSimulatedEventData),
}

/// Async event emitter using Tokio broadcast.
#[derive(Clone)]
pub struct AsyncEventEmitter {
    sender: broadcast::Sender<(EventType, EventData)>,
}

impl AsyncEventEmitter {
    pub fn new(buffer: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(buffer);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<(EventType, EventData)> {
        self.sender.subscribe()
    }

    pub async fn emit(&self, event_type: EventType, data: EventData) {
        // Ignore error if there are no subscribers
        let _ = self.sender.send((event_type, data));
    }
}

impl Default for AsyncEventEmitter {
    fn default() -> Self {
        Self::new(32)
    }
}

/// Configuration carried by each composer instance.
///
/// Debug behaviour is scoped to the instance rather than process-wide state,
/// so tests can vary it without global mutation.
#[derive(Clone, Default)]
pub struct ComposerConfig {
    /// Enables best-effort trace capture on simulate and on send failures.
    pub debug: bool,
    /// Capture a trace for every group, not only failing ones.
    pub trace_all: bool,
    /// Root directory used by trace subscribers to persist artifacts.
    pub project_root: Option<PathBuf>,
    /// Emitter for lifecycle events such as simulated groups.
    pub events: AsyncEventEmitter,
}

/// Whether a genesis id identifies a disposable local development network.
pub fn genesis_id_is_localnet(genesis_id: &str) -> bool {
    genesis_id == "devnet-v1" || genesis_id == "sandnet-v1" || genesis_id == "dockernet-v1"
}
