use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use crate::domain::ports::{ActionSink, SendError};
use crate::domain::{Action, GameState, Player, PlayerAction, SessionAction};
use crate::use_cases::pipeline::StateAccessor;

// Fake network sink that records every request handed to it.
#[derive(Clone, Default)]
pub(crate) struct RecordingSink {
    sent: Arc<Mutex<Vec<Action>>>,
    // Toggle used to simulate a closed transport.
    fail: bool,
}

impl RecordingSink {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(crate) fn sent(&self) -> Vec<Action> {
        self.sent.lock().expect("sent mutex poisoned").clone()
    }
}

impl ActionSink for RecordingSink {
    fn send(&self, action: &Action) -> Result<(), SendError> {
        if self.fail {
            return Err(SendError::Closed);
        }
        let mut guard = self.sent.lock().expect("sent mutex poisoned");
        guard.push(action.clone());
        Ok(())
    }
}

// State accessor over a fixed starting state; keep the sender to publish updates.
pub(crate) fn accessor(state: GameState) -> (watch::Sender<GameState>, StateAccessor) {
    let (tx, rx) = watch::channel(state);
    (tx, StateAccessor::new(rx))
}

// A state where `player_id` is signed in and has joined at (x, y).
pub(crate) fn signed_in_at(player_id: &str, x: f32, y: f32) -> GameState {
    GameState::new()
        .reduce(&Action::from(SessionAction::SignedIn {
            player_id: player_id.to_string(),
        }))
        .reduce(&PlayerAction::Joined(Player::new(player_id, "Pilot", x, y)).into())
}
