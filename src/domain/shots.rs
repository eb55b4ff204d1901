// Shot entity slice.

use crate::domain::action::{Action, EntityId, Origin, PlayerId, tags};
use crate::domain::entity_map::{self, EntityMap};
use crate::domain::players::Direction;

#[derive(Debug, Clone, PartialEq)]
pub struct Shot {
    pub id: EntityId,
    pub player_id: PlayerId,
    pub x: f32,
    pub y: f32,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShotAction {
    FireKeyPressed,
    FireRequested { player_id: PlayerId },
    Fired(Shot),
    Removed { id: EntityId },
}

impl ShotAction {
    pub fn origin(&self) -> Origin {
        match self {
            ShotAction::FireKeyPressed | ShotAction::FireRequested { .. } => Origin::Client,
            ShotAction::Fired(_) | ShotAction::Removed { .. } => Origin::Server,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ShotAction::FireKeyPressed => tags::SHOT_FIRE_KEY_PRESSED,
            ShotAction::FireRequested { .. } => tags::SHOT_FIRE_REQUESTED,
            ShotAction::Fired(_) => tags::SHOT_FIRED,
            ShotAction::Removed { .. } => tags::SHOT_REMOVED,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShotsState {
    pub shots: EntityMap<Shot>,
}

impl Default for ShotsState {
    fn default() -> Self {
        Self {
            shots: entity_map::empty(),
        }
    }
}

pub fn reduce(state: &ShotsState, action: &Action) -> ShotsState {
    match action {
        Action::Shot(ShotAction::Fired(shot)) => ShotsState {
            shots: entity_map::with_entity(&state.shots, &shot.id, shot.clone()),
        },
        Action::Shot(ShotAction::Removed { id }) => ShotsState {
            shots: entity_map::without_entity(&state.shots, id),
        },
        _ => state.clone(),
    }
}
