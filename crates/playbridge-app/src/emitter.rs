//! Event emitter: the one-way notification channel to the host
//!
//! Fire-and-forget. The emitter never blocks and never waits for an
//! acknowledgment; if the host dropped its receiver the event is discarded.

use tokio::sync::mpsc;

use playbridge_core::prelude::*;
use playbridge_core::BridgeEvent;

/// Create a connected emitter/receiver pair
pub fn channel() -> (EventEmitter, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventEmitter { tx }, EventReceiver { rx })
}

/// Sending half, owned by the engine
#[derive(Debug)]
pub struct EventEmitter {
    tx: mpsc::UnboundedSender<BridgeEvent>,
}

impl EventEmitter {
    pub fn emit(&mut self, event: BridgeEvent) {
        info!(event = event.name(), "Emitting event");
        if self.tx.send(event).is_err() {
            debug!("Host event receiver dropped; event discarded");
        }
    }
}

/// Receiving half, owned by the host
#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::UnboundedReceiver<BridgeEvent>,
}

impl EventReceiver {
    /// Next event if one is queued
    pub fn try_recv(&mut self) -> Option<BridgeEvent> {
        self.rx.try_recv().ok()
    }

    /// Wait for the next event; `None` once the engine is gone
    pub async fn recv(&mut self) -> Option<BridgeEvent> {
        self.rx.recv().await
    }

    /// Take every queued event, in emission order
    pub fn drain(&mut self) -> Vec<BridgeEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}
