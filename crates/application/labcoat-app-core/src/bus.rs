//! Application-scoped publish/subscribe channel for build state changes.
//!
//! One `EventBus` is created at startup and cloned into every component that
//! publishes or listens. Subscribers see every event and filter by `BuildRef`.

use labcoat_core::{Build, BuildRef};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub enum BusEvent {
    /// An action on `target` completed; `build` is the server's new snapshot.
    BuildChanged { target: BuildRef, build: Build },
}

impl BusEvent {
    pub fn target(&self) -> BuildRef {
        match self {
            BusEvent::BuildChanged { target, .. } => *target,
        }
    }
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<BusEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(labcoat_config::EVENT_BUS_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Returns the number of subscribers the event reached.
    pub fn publish(&self, ev: BusEvent) -> usize {
        self.tx.send(ev).unwrap_or(0)
    }

    pub fn subscribe(&self) -> BusSubscription {
        BusSubscription {
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

pub struct BusSubscription {
    rx: broadcast::Receiver<BusEvent>,
}

impl BusSubscription {
    /// Next buffered event, if any. Lag is logged and skipped over.
    pub fn try_next(&mut self) -> Option<BusEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(ev) => return Some(ev),
                Err(TryRecvError::Lagged(n)) => {
                    warn!("Event bus subscriber lagged, {} events dropped", n);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Next buffered event about `target`, discarding events for other builds.
    pub fn try_next_for(&mut self, target: &BuildRef) -> Option<BusEvent> {
        while let Some(ev) = self.try_next() {
            if ev.target() == *target {
                return Some(ev);
            }
        }
        None
    }

    pub async fn next(&mut self) -> Option<BusEvent> {
        loop {
            match self.rx.recv().await {
                Ok(ev) => return Some(ev),
                Err(RecvError::Lagged(n)) => {
                    warn!("Event bus subscriber lagged, {} events dropped", n);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
