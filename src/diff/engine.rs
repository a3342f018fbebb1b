use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityId {
    Int(u64),
    Text(String),
}

pub trait Diffable: Clone + Ord {
    fn id(&self) -> EntityId;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffEntry<T> {
    pub actual: T,
    pub target: T,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diff<T> {
    pub to_add: Vec<T>,
    pub to_remove: Vec<T>,
    pub to_change: Vec<DiffEntry<T>>,
}

impl<T: Diffable> Diff<T> {
    pub fn between(target: &BTreeSet<T>, actual: &BTreeSet<T>) -> Self {
        // A basic diff is everything that needs to be added and removed,
        // without deeper inspection. BTreeSet::difference iterates in
        // ascending order, which keeps both lists sorted.
        let mut to_add: Vec<T> = target.difference(actual).cloned().collect();
        let mut to_remove: Vec<T> = actual.difference(target).cloned().collect();

        // That alone produces a rough diff: changing e.g. a team description
        // would show up as deleting one team and adding back an almost
        // identical one. When the same id needs to be both added and removed,
        // record a single "change" instead. If two distinct entities within
        // one set share an id (a manifest error), the one sorting last wins
        // the id slot and the other stays a plain add/remove.
        let to_change: Vec<DiffEntry<T>> = {
            let add_by_id: BTreeMap<EntityId, &T> =
                to_add.iter().map(|entity| (entity.id(), entity)).collect();
            let remove_by_id: BTreeMap<EntityId, &T> =
                to_remove.iter().map(|entity| (entity.id(), entity)).collect();
            add_by_id
                .iter()
                .filter_map(|(id, target_entity)| {
                    remove_by_id.get(id).map(|actual_entity| DiffEntry {
                        actual: (*actual_entity).clone(),
                        target: (*target_entity).clone(),
                    })
                })
                .collect()
        };

        // Entities promoted to a change no longer count as added or removed.
        // Matching is by value against the exact paired entity, so an
        // ambiguous-id leftover is not dropped along with its sibling.
        let consumed_targets: BTreeSet<&T> = to_change.iter().map(|c| &c.target).collect();
        let consumed_actuals: BTreeSet<&T> = to_change.iter().map(|c| &c.actual).collect();
        to_add.retain(|entity| !consumed_targets.contains(entity));
        to_remove.retain(|entity| !consumed_actuals.contains(entity));

        Self {
            to_add,
            to_remove,
            to_change,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty() && self.to_change.is_empty()
    }
}
