// The store: single writer of `GameState`.
//
// Each action is reduced first, the new state is published, and only then do the
// pipeline stages see the action. Follow-up actions are queued FIFO and handled
// the same way before `dispatch` returns.

use crate::domain::{Action, GameState};
use crate::use_cases::pipeline::{Pipeline, StateAccessor};
use std::collections::VecDeque;
use tokio::sync::watch;
use tracing::{debug, warn};

pub const DEFAULT_MAX_CASCADE: usize = 256;

/// What a single `dispatch` did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Actions reduced, including the dispatched one.
    pub processed: usize,
    /// Follow-ups admitted; never more than `max_cascade`.
    pub follow_ups: usize,
    /// Follow-ups discarded because the cascade limit was hit.
    pub dropped: usize,
}

pub struct Store {
    state_tx: watch::Sender<GameState>,
    pipeline: Pipeline,
    max_cascade: usize,
}

impl Store {
    pub fn new(state_tx: watch::Sender<GameState>, pipeline: Pipeline, max_cascade: usize) -> Self {
        Self {
            state_tx,
            pipeline,
            max_cascade: max_cascade.max(1),
        }
    }

    /// Latest published state.
    pub fn state(&self) -> GameState {
        self.state_tx.borrow().clone()
    }

    /// Accessor that observes this store's published state.
    pub fn accessor(&self) -> StateAccessor {
        StateAccessor::new(self.state_tx.subscribe())
    }

    pub fn subscribe(&self) -> watch::Receiver<GameState> {
        self.state_tx.subscribe()
    }

    /// Reduces `action` and every follow-up it causes, in FIFO order.
    ///
    /// At most `max_cascade` follow-ups are admitted per dispatched action; the
    /// rest are counted in `dropped`.
    pub fn dispatch(&mut self, action: Action) -> DispatchReport {
        let mut report = DispatchReport::default();
        let mut queue = VecDeque::from([action]);

        while let Some(action) = queue.pop_front() {
            report.processed += 1;
            debug!(kind = action.kind(), origin = %action.origin(), "action");

            let next = self.state_tx.borrow().reduce(&action);
            self.state_tx.send_replace(next);

            for follow_up in self.pipeline.run(&action) {
                if report.follow_ups < self.max_cascade {
                    report.follow_ups += 1;
                    queue.push_back(follow_up);
                } else {
                    report.dropped += 1;
                }
            }
        }

        if report.dropped > 0 {
            warn!(
                processed = report.processed,
                follow_ups = report.follow_ups,
                dropped = report.dropped,
                max_cascade = self.max_cascade,
                "cascade limit reached; follow-up actions dropped"
            );
        }
        report
    }
}
