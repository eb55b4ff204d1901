// Player entity slice. Positions are authoritative; movement rules live in the pipeline.

use crate::domain::action::{Action, Origin, PlayerId, tags};
use crate::domain::entity_map::{self, EntityMap};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

impl Direction {
    /// Grid offset for one step of `step` units (y grows downwards).
    pub fn offset(self, step: f32) -> (f32, f32) {
        match self {
            Direction::Up => (0.0, -step),
            Direction::Down => (0.0, step),
            Direction::Left => (-step, 0.0),
            Direction::Right => (step, 0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub x: f32,
    pub y: f32,
    // Last direction the player moved in; shots leave this way.
    pub facing: Direction,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            x,
            y,
            facing: Direction::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerAction {
    MoveKeyPressed {
        direction: Direction,
    },
    MoveRequested {
        player_id: PlayerId,
        direction: Direction,
    },
    Joined(Player),
    Moved {
        id: PlayerId,
        x: f32,
        y: f32,
        facing: Option<Direction>,
    },
    Left {
        id: PlayerId,
    },
}

impl PlayerAction {
    pub fn origin(&self) -> Origin {
        match self {
            PlayerAction::MoveKeyPressed { .. } | PlayerAction::MoveRequested { .. } => {
                Origin::Client
            }
            PlayerAction::Joined(_) | PlayerAction::Moved { .. } | PlayerAction::Left { .. } => {
                Origin::Server
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PlayerAction::MoveKeyPressed { .. } => tags::PLAYER_MOVE_KEY_PRESSED,
            PlayerAction::MoveRequested { .. } => tags::PLAYER_MOVE_REQUESTED,
            PlayerAction::Joined(_) => tags::PLAYER_JOINED,
            PlayerAction::Moved { .. } => tags::PLAYER_MOVED,
            PlayerAction::Left { .. } => tags::PLAYER_LEFT,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayersState {
    pub players: EntityMap<Player>,
}

impl Default for PlayersState {
    fn default() -> Self {
        Self {
            players: entity_map::empty(),
        }
    }
}

pub fn reduce(state: &PlayersState, action: &Action) -> PlayersState {
    match action {
        Action::Player(PlayerAction::Joined(player)) => PlayersState {
            players: entity_map::with_entity(&state.players, &player.id, player.clone()),
        },
        Action::Player(PlayerAction::Moved { id, x, y, facing }) => {
            // Only a join creates a player; a move for an unknown id is dropped.
            let Some(current) = state.players.get(id) else {
                return state.clone();
            };
            let moved = Player {
                x: *x,
                y: *y,
                facing: facing.unwrap_or(current.facing),
                ..current.clone()
            };
            PlayersState {
                players: entity_map::with_entity(&state.players, id, moved),
            }
        }
        Action::Player(PlayerAction::Left { id }) => PlayersState {
            players: entity_map::without_entity(&state.players, id),
        },
        _ => state.clone(),
    }
}
