// Player movement stages. Movement is a plain grid step; collisions are not modelled.

use crate::domain::selectors::{current_player_id, get_player_by_id};
use crate::domain::{Action, ActionSink, PlayerAction};
use crate::use_cases::pipeline::{Epic, RequestToNetwork, StateAccessor};
use std::sync::Arc;
use tracing::debug;

pub struct MoveKeyToRequest {
    state: StateAccessor,
}

impl MoveKeyToRequest {
    pub fn new(state: StateAccessor) -> Self {
        Self { state }
    }
}

impl Epic for MoveKeyToRequest {
    fn name(&self) -> &'static str {
        "player_move_key_to_request"
    }

    fn on_action(&mut self, action: &Action) -> Vec<Action> {
        let Action::Player(PlayerAction::MoveKeyPressed { direction }) = action else {
            return Vec::new();
        };
        let state = self.state.get();
        let Some(player_id) = current_player_id(&state) else {
            return Vec::new();
        };
        vec![
            PlayerAction::MoveRequested {
                player_id: player_id.clone(),
                direction: *direction,
            }
            .into(),
        ]
    }
}

fn is_move_request(action: &Action) -> bool {
    matches!(action, Action::Player(PlayerAction::MoveRequested { .. }))
}

pub fn request_to_network(sink: Arc<dyn ActionSink>) -> RequestToNetwork {
    RequestToNetwork::new("player_request_to_network", sink, is_move_request)
}

/// Local authority for moves: one `step` from the current position.
pub struct MoveRequestToAuthoritative {
    state: StateAccessor,
    step: f32,
}

impl MoveRequestToAuthoritative {
    pub fn new(state: StateAccessor, step: f32) -> Self {
        Self { state, step }
    }
}

impl Epic for MoveRequestToAuthoritative {
    fn name(&self) -> &'static str {
        "player_move_request_to_authoritative"
    }

    fn on_action(&mut self, action: &Action) -> Vec<Action> {
        let Action::Player(PlayerAction::MoveRequested {
            player_id,
            direction,
        }) = action
        else {
            return Vec::new();
        };
        let state = self.state.get();
        let Some(player) = get_player_by_id(&state, player_id) else {
            debug!(player_id = %player_id, "move requested by unknown player; dropping");
            return Vec::new();
        };

        let (dx, dy) = direction.offset(self.step);
        vec![
            PlayerAction::Moved {
                id: player.id.clone(),
                x: player.x + dx,
                y: player.y + dy,
                facing: Some(*direction),
            }
            .into(),
        ]
    }
}
