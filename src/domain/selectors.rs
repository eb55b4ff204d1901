// Read-only views over `GameState`.
//
// List selectors cache their output and recompute only when the input mapping is a
// different `Arc` than on the previous call.

use crate::domain::action::PlayerId;
use crate::domain::bombs::Bomb;
use crate::domain::entity_map::EntityMap;
use crate::domain::players::Player;
use crate::domain::shots::Shot;
use crate::domain::state::GameState;
use std::sync::Arc;

pub fn get_bombs(state: &GameState) -> &EntityMap<Bomb> {
    &state.bombs.bombs
}

pub fn get_players(state: &GameState) -> &EntityMap<Player> {
    &state.players.players
}

pub fn get_shots(state: &GameState) -> &EntityMap<Shot> {
    &state.shots.shots
}

pub fn current_player_id(state: &GameState) -> Option<&PlayerId> {
    state.session.current_player_id.as_ref()
}

pub fn is_signed_in(state: &GameState) -> bool {
    state.session.current_player_id.is_some()
}

/// Round trip of the last answered ping, while online.
pub fn get_latency_ms(state: &GameState) -> Option<u64> {
    state.connection.latency_ms
}

pub fn get_player_by_id<'a>(state: &'a GameState, player_id: &str) -> Option<&'a Player> {
    state.players.players.get(player_id)
}

pub fn get_current_player(state: &GameState) -> Option<&Player> {
    current_player_id(state).and_then(|id| get_player_by_id(state, id))
}

/// Live bombs placed by `player_id`, in mapping order.
pub fn get_bombs_by_owner<'a>(state: &'a GameState, player_id: &str) -> Vec<&'a Bomb> {
    state
        .bombs
        .bombs
        .values()
        .filter(|bomb| bomb.player_id == player_id)
        .collect()
}

/// Memoized conversion of one keyed slice into a list.
pub struct ListSelector<T> {
    input: fn(&GameState) -> &EntityMap<T>,
    // Holding the input `Arc` keeps its address from being reused while cached.
    cached: Option<(EntityMap<T>, Arc<[T]>)>,
    recomputations: usize,
}

impl<T: Clone> ListSelector<T> {
    pub fn new(input: fn(&GameState) -> &EntityMap<T>) -> Self {
        Self {
            input,
            cached: None,
            recomputations: 0,
        }
    }

    pub fn select(&mut self, state: &GameState) -> Arc<[T]> {
        let map = (self.input)(state);
        if let Some((cached_map, list)) = &self.cached {
            if Arc::ptr_eq(cached_map, map) {
                return Arc::clone(list);
            }
        }

        let list: Arc<[T]> = map.values().cloned().collect();
        self.recomputations += 1;
        self.cached = Some((Arc::clone(map), Arc::clone(&list)));
        list
    }

    /// How many times the list was rebuilt.
    pub fn recomputations(&self) -> usize {
        self.recomputations
    }
}

pub fn bomb_list_selector() -> ListSelector<Bomb> {
    ListSelector::new(get_bombs)
}

pub fn player_list_selector() -> ListSelector<Player> {
    ListSelector::new(get_players)
}

pub fn shot_list_selector() -> ListSelector<Shot> {
    ListSelector::new(get_shots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::action::Action;
    use crate::domain::bombs::BombAction;
    use crate::domain::session::SessionAction;

    fn with_bomb(state: &GameState, id: &str, owner: &str) -> GameState {
        state.reduce(&BombAction::Set(Bomb::new(id, owner, 1.0, 1.0)).into())
    }

    #[test]
    fn when_selecting_same_mapping_twice_then_list_is_computed_once() {
        let state = with_bomb(&GameState::new(), "p1", "p1");
        let mut selector = bomb_list_selector();

        let first = selector.select(&state);
        let second = selector.select(&state);

        assert_eq!(selector.recomputations(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn when_unrelated_action_is_applied_then_list_is_not_recomputed() {
        let state = with_bomb(&GameState::new(), "p1", "p1");
        let mut selector = bomb_list_selector();
        selector.select(&state);

        let next = state.reduce(&Action::key_down("q"));
        selector.select(&next);

        assert_eq!(selector.recomputations(), 1);
    }

    #[test]
    fn when_mapping_changes_then_list_is_recomputed() {
        let state = with_bomb(&GameState::new(), "p1", "p1");
        let mut selector = bomb_list_selector();
        selector.select(&state);

        let next = with_bomb(&state, "p2", "p2");
        let list = selector.select(&next);

        assert_eq!(selector.recomputations(), 2);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn when_signed_in_then_current_player_is_resolved() {
        let state = GameState::new().reduce(
            &SessionAction::SignedIn {
                player_id: "p1".to_string(),
            }
            .into(),
        );

        assert!(is_signed_in(&state));
        assert_eq!(current_player_id(&state).map(String::as_str), Some("p1"));
        // Signed in but not yet joined.
        assert!(get_current_player(&state).is_none());
    }

    #[test]
    fn when_filtering_by_owner_then_only_owned_bombs_are_returned() {
        let state = with_bomb(&GameState::new(), "p1#1", "p1");
        let state = with_bomb(&state, "p2#1", "p2");
        let state = with_bomb(&state, "p1#2", "p1");

        let owned: Vec<&str> = get_bombs_by_owner(&state, "p1")
            .into_iter()
            .map(|bomb| bomb.id.as_str())
            .collect();

        assert_eq!(owned, vec!["p1#1", "p1#2"]);
        assert_eq!(get_bombs(&state).len(), 3);
    }
}
