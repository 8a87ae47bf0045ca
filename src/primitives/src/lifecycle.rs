//! Submission lifecycle state machine.
//!
//! `Submitted -> Included -> Finalized`, with `DispatchError` as the
//! alternative terminal state when the runtime rejected the dispatch. The
//! tracker only ever moves forward and refuses every notice once terminal.

use crate::errors::CoreError;
use crate::types::{ChainEvent, TransferOutcome, TxState, H256};

/// Tracks one submitted call from send to finality.
#[derive(Clone, Debug)]
pub struct LifecycleTracker {
    state: TxState,
    history: Vec<TxState>,
    included_in: Option<H256>,
    finalized_in: Option<H256>,
    events: Vec<ChainEvent>,
    error: Option<String>,
}

impl Default for LifecycleTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleTracker {
    /// Starts tracking a call that has just been sent.
    pub fn new() -> Self {
        Self {
            state: TxState::Submitted,
            history: vec![TxState::Submitted],
            included_in: None,
            finalized_in: None,
            events: Vec::new(),
            error: None,
        }
    }

    pub fn state(&self) -> TxState {
        self.state
    }

    /// Every state the tracker has reported, in order.
    pub fn history(&self) -> &[TxState] {
        &self.history
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Block in which the call was first seen.
    pub fn included_in(&self) -> Option<H256> {
        self.included_in
    }

    /// Applies an in-block notice. Repeated notices (re-inclusion after a
    /// retraction) refresh the block, events and dispatch result but keep
    /// the state.
    pub fn observe_in_block(
        &mut self,
        block: H256,
        events: Vec<ChainEvent>,
        dispatch_error: Option<String>,
    ) -> Result<(), CoreError> {
        self.ensure_open("in-block")?;
        self.included_in = Some(block);
        self.events = events;
        self.error = dispatch_error;
        self.advance(TxState::Included);
        Ok(())
    }

    /// Applies the finality notice and returns the terminal state.
    ///
    /// The dispatch result of the finalized block is authoritative. A
    /// finality notice without an earlier in-block notice passes through
    /// `Included` for the same block first.
    pub fn observe_finalized(
        &mut self,
        block: H256,
        events: Vec<ChainEvent>,
        dispatch_error: Option<String>,
    ) -> Result<TxState, CoreError> {
        self.ensure_open("finalized")?;
        if self.state == TxState::Submitted {
            self.included_in = Some(block);
            self.advance(TxState::Included);
        }
        self.finalized_in = Some(block);
        if !events.is_empty() || self.events.is_empty() {
            self.events = events;
        }
        self.error = dispatch_error;
        let terminal = if self.error.is_some() {
            TxState::DispatchError
        } else {
            TxState::Finalized
        };
        self.advance(terminal);
        Ok(terminal)
    }

    /// Builds the outcome. Non-terminal trackers yield their last state.
    pub fn into_outcome(self) -> TransferOutcome {
        TransferOutcome {
            state: self.state,
            block_ref: self.finalized_in.or(self.included_in),
            emitted_events: self.events,
            error: self.error,
            warnings: Vec::new(),
            signature_fallback: false,
        }
    }

    fn ensure_open(&self, notice: &'static str) -> Result<(), CoreError> {
        if self.is_terminal() {
            return Err(CoreError::IllegalTransition {
                from: self.state,
                notice,
            });
        }
        Ok(())
    }

    fn advance(&mut self, next: TxState) {
        if next != self.state {
            self.state = next;
            self.history.push(next);
        }
    }
}
