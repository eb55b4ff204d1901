// Bus-level action model shared by every entity kind.

use crate::domain::bombs::BombAction;
use crate::domain::players::PlayerAction;
use crate::domain::session::{ConnectionEvent, SessionAction};
use crate::domain::shots::ShotAction;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type EntityId = String;
pub type PlayerId = String;

/// Wire tags for every action type, shared by `Action::kind` and the wire codec.
pub mod tags {
    pub const KEY_DOWN: &str = "KEY_DOWN";

    pub const SIGNED_IN: &str = "SIGNED_IN";
    pub const SIGNED_OUT: &str = "SIGNED_OUT";

    pub const CONNECTION_LOST: &str = "CONNECTION_LOST";
    pub const CONNECTION_RESTORED: &str = "CONNECTION_RESTORED";
    pub const LATENCY_MEASURED: &str = "LATENCY_MEASURED";

    pub const PLAYER_MOVE_KEY_PRESSED: &str = "PLAYER_MOVE_KEY_PRESSED";
    pub const PLAYER_MOVE_REQUESTED: &str = "PLAYER_MOVE_REQUESTED";
    pub const PLAYER_JOINED: &str = "PLAYER_JOINED";
    pub const PLAYER_MOVED: &str = "PLAYER_MOVED";
    pub const PLAYER_LEFT: &str = "PLAYER_LEFT";

    pub const BOMB_SET_KEY_PRESSED: &str = "BOMB_SET_KEY_PRESSED";
    pub const BOMB_DETONATE_KEY_PRESSED: &str = "BOMB_DETONATE_KEY_PRESSED";
    pub const BOMB_SET_REQUESTED: &str = "BOMB_SET_REQUESTED";
    pub const BOMB_SET: &str = "BOMB_SET";
    pub const BOMB_DETONATE_REQUESTED: &str = "BOMB_DETONATE_REQUESTED";
    pub const BOMB_DETONATED: &str = "BOMB_DETONATED";

    pub const SHOT_FIRE_KEY_PRESSED: &str = "SHOT_FIRE_KEY_PRESSED";
    pub const SHOT_FIRE_REQUESTED: &str = "SHOT_FIRE_REQUESTED";
    pub const SHOT_FIRED: &str = "SHOT_FIRED";
    pub const SHOT_REMOVED: &str = "SHOT_REMOVED";
}

/// Marks an action as a client intent or an authoritative server fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Client,
    Server,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Client => f.write_str("client"),
            Origin::Server => f.write_str("server"),
        }
    }
}

/// Every message that can travel over the bus.
///
/// Each variant has a fixed origin, so a client intent can never be mistaken
/// for an authoritative fact by a reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // Raw key press from the input collaborator.
    KeyDown { key: String },
    Session(SessionAction),
    Connection(ConnectionEvent),
    Player(PlayerAction),
    Bomb(BombAction),
    Shot(ShotAction),
}

impl Action {
    pub fn key_down(key: impl Into<String>) -> Self {
        Action::KeyDown { key: key.into() }
    }

    pub fn origin(&self) -> Origin {
        match self {
            Action::KeyDown { .. } => Origin::Client,
            Action::Connection(_) => Origin::Client,
            Action::Session(_) => Origin::Server,
            Action::Player(action) => action.origin(),
            Action::Bomb(action) => action.origin(),
            Action::Shot(action) => action.origin(),
        }
    }

    /// Wire tag of this action.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::KeyDown { .. } => tags::KEY_DOWN,
            Action::Session(action) => action.kind(),
            Action::Connection(event) => event.kind(),
            Action::Player(action) => action.kind(),
            Action::Bomb(action) => action.kind(),
            Action::Shot(action) => action.kind(),
        }
    }

    /// Client-local actions (raw input, key intents, transport events) never cross the wire.
    pub fn is_transmittable(&self) -> bool {
        match self {
            Action::KeyDown { .. } | Action::Connection(_) => false,
            Action::Session(_) => true,
            Action::Player(action) => !matches!(action, PlayerAction::MoveKeyPressed { .. }),
            Action::Bomb(action) => !matches!(
                action,
                BombAction::SetKeyPressed | BombAction::DetonateKeyPressed
            ),
            Action::Shot(action) => !matches!(action, ShotAction::FireKeyPressed),
        }
    }
}

impl From<SessionAction> for Action {
    fn from(action: SessionAction) -> Self {
        Action::Session(action)
    }
}

impl From<ConnectionEvent> for Action {
    fn from(event: ConnectionEvent) -> Self {
        Action::Connection(event)
    }
}

impl From<PlayerAction> for Action {
    fn from(action: PlayerAction) -> Self {
        Action::Player(action)
    }
}

impl From<BombAction> for Action {
    fn from(action: BombAction) -> Self {
        Action::Bomb(action)
    }
}

impl From<ShotAction> for Action {
    fn from(action: ShotAction) -> Self {
        Action::Shot(action)
    }
}
