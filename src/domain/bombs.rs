// Bomb entity slice: types, actions and the authoritative reducer.

use crate::domain::action::{Action, EntityId, Origin, PlayerId, tags};
use crate::domain::entity_map::{self, EntityMap};

#[derive(Debug, Clone, PartialEq)]
pub struct Bomb {
    pub id: EntityId,
    pub player_id: PlayerId,
    pub x: f32,
    pub y: f32,
    // Monotonic revision stamped by the authority; 0 means unversioned.
    pub version: u64,
}

impl Bomb {
    pub fn new(id: impl Into<EntityId>, player_id: impl Into<PlayerId>, x: f32, y: f32) -> Self {
        Self {
            id: id.into(),
            player_id: player_id.into(),
            x,
            y,
            version: 0,
        }
    }

    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// A versioned bomb older than the stored one must not replace it.
    /// Unversioned updates keep last-write-wins.
    pub fn is_stale_against(&self, current: &Bomb) -> bool {
        self.version != 0 && self.version < current.version
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BombAction {
    SetKeyPressed,
    DetonateKeyPressed,
    SetRequested { player_id: PlayerId },
    Set(Bomb),
    DetonateRequested { id: EntityId },
    Detonated { id: EntityId },
}

impl BombAction {
    pub fn origin(&self) -> Origin {
        match self {
            BombAction::Set(_) | BombAction::Detonated { .. } => Origin::Server,
            BombAction::SetKeyPressed
            | BombAction::DetonateKeyPressed
            | BombAction::SetRequested { .. }
            | BombAction::DetonateRequested { .. } => Origin::Client,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BombAction::SetKeyPressed => tags::BOMB_SET_KEY_PRESSED,
            BombAction::DetonateKeyPressed => tags::BOMB_DETONATE_KEY_PRESSED,
            BombAction::SetRequested { .. } => tags::BOMB_SET_REQUESTED,
            BombAction::Set(_) => tags::BOMB_SET,
            BombAction::DetonateRequested { .. } => tags::BOMB_DETONATE_REQUESTED,
            BombAction::Detonated { .. } => tags::BOMB_DETONATED,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BombsState {
    pub bombs: EntityMap<Bomb>,
    // Last version seen for each detonated id, so a late older `SET` stays dead.
    pub detonated: EntityMap<u64>,
}

impl Default for BombsState {
    fn default() -> Self {
        Self {
            bombs: entity_map::empty(),
            detonated: entity_map::empty(),
        }
    }
}

impl BombsState {
    fn is_stale(&self, bomb: &Bomb) -> bool {
        if let Some(current) = self.bombs.get(&bomb.id) {
            return bomb.is_stale_against(current);
        }
        bomb.version != 0
            && self
                .detonated
                .get(&bomb.id)
                .is_some_and(|&last| bomb.version <= last)
    }
}

/// Applies server facts to the bomb slice.
///
/// Any action other than `BOMB_SET` / `BOMB_DETONATED` returns a state sharing
/// the same mapping, so memoized selectors can skip work.
pub fn reduce(state: &BombsState, action: &Action) -> BombsState {
    match action {
        Action::Bomb(BombAction::Set(bomb)) => {
            if state.is_stale(bomb) {
                return state.clone();
            }
            BombsState {
                bombs: entity_map::with_entity(&state.bombs, &bomb.id, bomb.clone()),
                // The stored bomb now carries the guard.
                detonated: entity_map::without_entity(&state.detonated, &bomb.id),
            }
        }
        Action::Bomb(BombAction::Detonated { id }) => {
            let detonated = match state.bombs.get(id) {
                Some(bomb) if bomb.version != 0 => {
                    entity_map::with_entity(&state.detonated, id, bomb.version)
                }
                _ => state.detonated.clone(),
            };
            BombsState {
                bombs: entity_map::without_entity(&state.bombs, id),
                detonated,
            }
        }
        _ => state.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn set(bomb: Bomb) -> Action {
        BombAction::Set(bomb).into()
    }

    fn detonated(id: &str) -> Action {
        BombAction::Detonated { id: id.to_string() }.into()
    }

    #[test]
    fn when_bomb_set_then_bomb_is_stored_by_id() {
        let state = reduce(&BombsState::default(), &set(Bomb::new("p1", "p1", 3.0, 4.0)));

        assert_eq!(state.bombs.len(), 1);
        assert_eq!(state.bombs.get("p1"), Some(&Bomb::new("p1", "p1", 3.0, 4.0)));
    }

    #[test]
    fn when_same_id_set_twice_then_last_write_wins() {
        let state = reduce(&BombsState::default(), &set(Bomb::new("p1", "p1", 1.0, 1.0)));
        let state = reduce(&state, &set(Bomb::new("p1", "p1", 2.0, 2.0)));

        assert_eq!(state.bombs.len(), 1);
        let bomb = &state.bombs["p1"];
        assert_eq!((bomb.x, bomb.y), (2.0, 2.0));
    }

    #[test]
    fn when_detonated_id_is_absent_then_state_is_unchanged() {
        let state = reduce(&BombsState::default(), &set(Bomb::new("p1", "p1", 1.0, 1.0)));

        let next = reduce(&state, &detonated("p2"));

        assert_eq!(next, state);
        assert!(Arc::ptr_eq(&next.bombs, &state.bombs));
    }

    #[test]
    fn when_detonated_id_is_present_then_bomb_is_removed() {
        let state = reduce(&BombsState::default(), &set(Bomb::new("p1", "p1", 1.0, 1.0)));

        let next = reduce(&state, &detonated("p1"));

        assert!(next.bombs.is_empty());
    }

    #[test]
    fn when_action_is_unrelated_then_same_mapping_reference_is_returned() {
        let state = reduce(&BombsState::default(), &set(Bomb::new("p1", "p1", 1.0, 1.0)));

        for action in [
            Action::key_down("b"),
            BombAction::SetRequested {
                player_id: "p1".to_string(),
            }
            .into(),
            BombAction::DetonateRequested {
                id: "p1".to_string(),
            }
            .into(),
        ] {
            let next = reduce(&state, &action);
            assert!(Arc::ptr_eq(&next.bombs, &state.bombs), "{}", action.kind());
        }
    }

    #[test]
    fn when_versioned_set_is_older_than_stored_then_it_is_ignored() {
        let state = reduce(
            &BombsState::default(),
            &set(Bomb::new("p1", "p1", 5.0, 5.0).with_version(4)),
        );

        let next = reduce(&state, &set(Bomb::new("p1", "p1", 1.0, 1.0).with_version(3)));

        assert!(Arc::ptr_eq(&next.bombs, &state.bombs));
        assert_eq!(next.bombs["p1"].x, 5.0);
    }

    #[test]
    fn when_unversioned_set_follows_versioned_then_last_write_wins() {
        let state = reduce(
            &BombsState::default(),
            &set(Bomb::new("p1", "p1", 5.0, 5.0).with_version(4)),
        );

        let next = reduce(&state, &set(Bomb::new("p1", "p1", 1.0, 1.0)));

        assert_eq!(next.bombs["p1"].x, 1.0);
    }

    #[test]
    fn when_stale_set_follows_detonation_then_bomb_stays_gone() {
        let state = reduce(
            &BombsState::default(),
            &set(Bomb::new("p1", "p1", 5.0, 5.0).with_version(5)),
        );
        let state = reduce(&state, &detonated("p1"));

        let next = reduce(&state, &set(Bomb::new("p1", "p1", 1.0, 1.0).with_version(3)));

        assert!(next.bombs.is_empty());
        assert!(Arc::ptr_eq(&next.bombs, &state.bombs));
    }

    #[test]
    fn when_newer_set_follows_detonation_then_bomb_is_placed_again() {
        let state = reduce(
            &BombsState::default(),
            &set(Bomb::new("p1", "p1", 5.0, 5.0).with_version(5)),
        );
        let state = reduce(&state, &detonated("p1"));

        let next = reduce(&state, &set(Bomb::new("p1", "p1", 2.0, 2.0).with_version(6)));

        assert_eq!(next.bombs["p1"].version, 6);
        assert!(next.detonated.is_empty());
    }
}
