// Shot stages: fire intent → request → network / local authority.

use crate::domain::selectors::{current_player_id, get_player_by_id};
use crate::domain::{Action, ActionSink, PlayerId, Shot, ShotAction};
use crate::use_cases::pipeline::{Epic, RequestToNetwork, StateAccessor};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

pub struct FireKeyToRequest {
    state: StateAccessor,
}

impl FireKeyToRequest {
    pub fn new(state: StateAccessor) -> Self {
        Self { state }
    }
}

impl Epic for FireKeyToRequest {
    fn name(&self) -> &'static str {
        "shot_fire_key_to_request"
    }

    fn on_action(&mut self, action: &Action) -> Vec<Action> {
        let Action::Shot(ShotAction::FireKeyPressed) = action else {
            return Vec::new();
        };
        let state = self.state.get();
        let Some(player_id) = current_player_id(&state) else {
            return Vec::new();
        };
        vec![
            ShotAction::FireRequested {
                player_id: player_id.clone(),
            }
            .into(),
        ]
    }
}

fn is_fire_request(action: &Action) -> bool {
    matches!(action, Action::Shot(ShotAction::FireRequested { .. }))
}

pub fn request_to_network(sink: Arc<dyn ActionSink>) -> RequestToNetwork {
    RequestToNetwork::new("shot_request_to_network", sink, is_fire_request)
}

/// Local authority for shots: spawns a shot at the player, facing their last move.
pub struct FireRequestToAuthoritative {
    state: StateAccessor,
    fired: HashMap<PlayerId, u64>,
}

impl FireRequestToAuthoritative {
    pub fn new(state: StateAccessor) -> Self {
        Self {
            state,
            fired: HashMap::new(),
        }
    }
}

impl Epic for FireRequestToAuthoritative {
    fn name(&self) -> &'static str {
        "shot_fire_request_to_authoritative"
    }

    fn on_action(&mut self, action: &Action) -> Vec<Action> {
        let Action::Shot(ShotAction::FireRequested { player_id }) = action else {
            return Vec::new();
        };
        let state = self.state.get();
        let Some(player) = get_player_by_id(&state, player_id) else {
            debug!(player_id = %player_id, "shot requested by unknown player; dropping");
            return Vec::new();
        };

        let count = self.fired.entry(player_id.clone()).or_insert(0);
        *count += 1;
        let shot = Shot {
            id: format!("{player_id}:{count}"),
            player_id: player_id.clone(),
            x: player.x,
            y: player.y,
            direction: player.facing,
        };
        vec![ShotAction::Fired(shot).into()]
    }
}
