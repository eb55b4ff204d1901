// Copy-on-write keyed storage shared by every entity slice.
//
// A slice is handed out by reference; an update always builds a new map, and an
// update that changes nothing returns the very same `Arc`.

use crate::domain::action::EntityId;
use std::collections::BTreeMap;
use std::sync::Arc;

pub type EntityMap<T> = Arc<BTreeMap<EntityId, T>>;

pub fn empty<T>() -> EntityMap<T> {
    Arc::new(BTreeMap::new())
}

/// Returns a new map with `entity` stored at `id`, replacing any previous value.
pub fn with_entity<T: Clone>(map: &EntityMap<T>, id: &str, entity: T) -> EntityMap<T> {
    let mut next = BTreeMap::clone(map);
    next.insert(id.to_string(), entity);
    Arc::new(next)
}

/// Returns a new map without `id`; an absent id yields the same reference.
pub fn without_entity<T: Clone>(map: &EntityMap<T>, id: &str) -> EntityMap<T> {
    if !map.contains_key(id) {
        return Arc::clone(map);
    }
    let mut next = BTreeMap::clone(map);
    next.remove(id);
    Arc::new(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_removing_absent_id_then_same_reference_is_returned() {
        let map = with_entity(&empty(), "a", 1);

        let next = without_entity(&map, "missing");

        assert!(Arc::ptr_eq(&map, &next));
    }

    #[test]
    fn when_inserting_then_original_map_is_untouched() {
        let map = with_entity(&empty(), "a", 1);

        let next = with_entity(&map, "a", 2);

        assert_eq!(map.get("a"), Some(&1));
        assert_eq!(next.get("a"), Some(&2));
        assert_eq!(next.len(), 1);
    }
}
