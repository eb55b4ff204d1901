// Bomb pipeline stages: key intent → request → network / local authority.

use crate::domain::selectors::{current_player_id, get_bombs_by_owner, get_player_by_id};
use crate::domain::{Action, ActionSink, Bomb, BombAction, PlayerId};
use crate::use_cases::pipeline::{Epic, RequestToNetwork, StateAccessor};
use crate::use_cases::types::BombIdPolicy;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// `BOMB_SET_KEY_PRESSED` → `BOMB_SET_REQUESTED{playerId}` for the signed-in player.
pub struct SetKeyToRequest {
    state: StateAccessor,
}

impl SetKeyToRequest {
    pub fn new(state: StateAccessor) -> Self {
        Self { state }
    }
}

impl Epic for SetKeyToRequest {
    fn name(&self) -> &'static str {
        "bomb_set_key_to_request"
    }

    fn on_action(&mut self, action: &Action) -> Vec<Action> {
        let Action::Bomb(BombAction::SetKeyPressed) = action else {
            return Vec::new();
        };
        let state = self.state.get();
        let Some(player_id) = current_player_id(&state) else {
            debug!("bomb set key pressed while signed out; dropping");
            return Vec::new();
        };
        vec![
            BombAction::SetRequested {
                player_id: player_id.clone(),
            }
            .into(),
        ]
    }
}

/// `BOMB_DETONATE_KEY_PRESSED` → `BOMB_DETONATE_REQUESTED{id}` for the player's bomb(s).
pub struct DetonateKeyToRequest {
    state: StateAccessor,
    policy: BombIdPolicy,
}

impl DetonateKeyToRequest {
    pub fn new(state: StateAccessor, policy: BombIdPolicy) -> Self {
        Self { state, policy }
    }
}

impl Epic for DetonateKeyToRequest {
    fn name(&self) -> &'static str {
        "bomb_detonate_key_to_request"
    }

    fn on_action(&mut self, action: &Action) -> Vec<Action> {
        let Action::Bomb(BombAction::DetonateKeyPressed) = action else {
            return Vec::new();
        };
        let state = self.state.get();
        let Some(player_id) = current_player_id(&state) else {
            debug!("bomb detonate key pressed while signed out; dropping");
            return Vec::new();
        };

        match self.policy {
            // Bomb id is the player id; detonating a missing bomb is a no-op downstream.
            BombIdPolicy::OnePerPlayer => vec![
                BombAction::DetonateRequested {
                    id: player_id.clone(),
                }
                .into(),
            ],
            BombIdPolicy::Sequential => get_bombs_by_owner(&state, player_id)
                .into_iter()
                .map(|bomb| Action::from(BombAction::DetonateRequested { id: bomb.id.clone() }))
                .collect(),
        }
    }
}

fn is_bomb_request(action: &Action) -> bool {
    matches!(
        action,
        Action::Bomb(BombAction::SetRequested { .. } | BombAction::DetonateRequested { .. })
    )
}

/// Sends bomb requests to the server.
pub fn request_to_network(sink: Arc<dyn ActionSink>) -> RequestToNetwork {
    RequestToNetwork::new("bomb_request_to_network", sink, is_bomb_request)
}

/// Local stand-in for the server: `BOMB_SET_REQUESTED` → `BOMB_SET` at the player's position.
pub struct SetRequestToAuthoritative {
    state: StateAccessor,
    policy: BombIdPolicy,
    // Placements per player, used for sequential ids.
    placed: HashMap<PlayerId, u64>,
    version: u64,
    reload_time: Duration,
    last_placed: HashMap<PlayerId, Instant>,
}

impl SetRequestToAuthoritative {
    pub fn new(state: StateAccessor, policy: BombIdPolicy) -> Self {
        Self {
            state,
            policy,
            placed: HashMap::new(),
            version: 0,
            reload_time: Duration::ZERO,
            last_placed: HashMap::new(),
        }
    }

    /// Minimum time between two placements by the same player; zero disables it.
    pub fn with_reload_time(mut self, reload_time: Duration) -> Self {
        self.reload_time = reload_time;
        self
    }

    fn reloading(&mut self, player_id: &str) -> bool {
        if self.reload_time.is_zero() {
            return false;
        }
        let now = Instant::now();
        if let Some(last) = self.last_placed.get(player_id) {
            if now.duration_since(*last) < self.reload_time {
                return true;
            }
        }
        self.last_placed.insert(player_id.to_string(), now);
        false
    }

    fn bomb_id(&mut self, player_id: &str) -> String {
        match self.policy {
            BombIdPolicy::OnePerPlayer => player_id.to_string(),
            BombIdPolicy::Sequential => {
                let count = self.placed.entry(player_id.to_string()).or_insert(0);
                *count += 1;
                format!("{player_id}#{count}")
            }
        }
    }
}

impl Epic for SetRequestToAuthoritative {
    fn name(&self) -> &'static str {
        "bomb_set_request_to_authoritative"
    }

    fn on_action(&mut self, action: &Action) -> Vec<Action> {
        let Action::Bomb(BombAction::SetRequested { player_id }) = action else {
            return Vec::new();
        };
        let state = self.state.get();
        let Some(player) = get_player_by_id(&state, player_id) else {
            debug!(player_id = %player_id, "bomb requested by unknown player; dropping");
            return Vec::new();
        };
        if self.reloading(player_id) {
            debug!(player_id = %player_id, "bomb requested while reloading; dropping");
            return Vec::new();
        }

        let id = self.bomb_id(player_id);
        self.version += 1;
        let bomb = Bomb::new(id, player_id.clone(), player.x, player.y).with_version(self.version);
        vec![BombAction::Set(bomb).into()]
    }
}

/// Local stand-in for the server: `BOMB_DETONATE_REQUESTED{id}` → `BOMB_DETONATED{id}`.
pub struct DetonateRequestToAuthoritative;

impl Epic for DetonateRequestToAuthoritative {
    fn name(&self) -> &'static str {
        "bomb_detonate_request_to_authoritative"
    }

    fn on_action(&mut self, action: &Action) -> Vec<Action> {
        match action {
            Action::Bomb(BombAction::DetonateRequested { id }) => {
                vec![BombAction::Detonated { id: id.clone() }.into()]
            }
            _ => Vec::new(),
        }
    }
}
