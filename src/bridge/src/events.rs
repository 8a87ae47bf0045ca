//! Structured progress events emitted by the bridge components.
//!
//! Components never print. They hand `BridgeEvent`s to an `EventSink`; the
//! binary decides how to render them.

use primitives::{
    format_execution_address, Anomaly, BalanceSnapshot, CallSignature, ChainEvent, MappingState,
    TxState, H160, H256,
};
use std::sync::Mutex;
use tracing::{info, warn};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BridgeEvent {
    Connected {
        chain: String,
    },
    MappingClaimSubmitted {
        native_address: String,
    },
    MappingEstablished {
        native_address: String,
        execution_address: H160,
        state: MappingState,
    },
    SignatureResolved {
        signature: CallSignature,
    },
    SignatureFallback {
        signature: CallSignature,
    },
    TransferSkipped {
        signature: CallSignature,
    },
    TransferSubmitted {
        call: String,
    },
    StatusChanged {
        state: TxState,
        block: Option<H256>,
    },
    DispatchFailed {
        error: String,
    },
    EventEmitted {
        event: ChainEvent,
    },
    SnapshotTaken {
        label: &'static str,
        snapshot: BalanceSnapshot,
    },
    TokenViewUnavailable {
        reason: String,
    },
    AnomalyDetected {
        anomaly: Anomaly,
    },
}

/// Consumer of bridge events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: BridgeEvent);
}

/// Writes events to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: BridgeEvent) {
        match event {
            BridgeEvent::Connected { chain } => info!("Connected to chain: {}", chain),
            BridgeEvent::MappingClaimSubmitted { native_address } => {
                info!("Submitting mapping claim for {}", native_address)
            }
            BridgeEvent::MappingEstablished {
                native_address,
                execution_address,
                state,
            } => info!(
                "{} mapped to {} ({:?})",
                native_address,
                format_execution_address(&execution_address),
                state
            ),
            BridgeEvent::SignatureResolved { signature } => {
                info!("Transfer signature: {}", signature)
            }
            BridgeEvent::SignatureFallback { signature } => warn!(
                "Unknown transfer signature {}; trying (H160, Amount) optimistically",
                signature
            ),
            BridgeEvent::TransferSkipped { signature } => warn!(
                "Transfer signature {} looks like a native-only transfer; skipping",
                signature
            ),
            BridgeEvent::TransferSubmitted { call } => info!("Submitted {}", call),
            BridgeEvent::StatusChanged { state, block } => {
                info!("Status {:?} (block {:?})", state, block)
            }
            BridgeEvent::DispatchFailed { error } => warn!("Dispatch error: {}", error),
            BridgeEvent::EventEmitted { event } => info!("Event {}", event),
            BridgeEvent::SnapshotTaken { label, snapshot } => info!(
                "Snapshot {} #{}: native {} / execution {}",
                label, snapshot.taken_at, snapshot.native_free, snapshot.execution_raw_balance
            ),
            BridgeEvent::TokenViewUnavailable { reason } => {
                warn!("Token view balance unavailable: {}", reason)
            }
            BridgeEvent::AnomalyDetected { anomaly } => warn!("Anomaly: {}", anomaly),
        }
    }
}

/// Keeps every event in memory, in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<BridgeEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the events recorded so far.
    pub fn events(&self) -> Vec<BridgeEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: BridgeEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl<S: EventSink + ?Sized> EventSink for std::sync::Arc<S> {
    fn emit(&self, event: BridgeEvent) {
        (**self).emit(event)
    }
}
