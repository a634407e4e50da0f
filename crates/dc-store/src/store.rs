//! Normalized entity store: one slice per kind, one entry per id.

use std::collections::HashMap;

use dc_core::EntityId;

use crate::entity::Entity;
use crate::kind::EntityKind;
use crate::merge::merge_entity;

/// Entries of one kind in first-insertion order, indexed by id.
#[derive(Clone, Debug, Default)]
struct Slice {
    entries: Vec<Entity>,
    index: HashMap<EntityId, usize>,
}

impl Slice {
    fn upsert(&mut self, entity: Entity) {
        match self.index.get(&entity.id) {
            Some(&pos) => merge_entity(&mut self.entries[pos], entity),
            None => {
                self.index.insert(entity.id.clone(), self.entries.len());
                self.entries.push(entity);
            }
        }
    }

    fn remove(&mut self, id: &EntityId) -> Option<Entity> {
        let pos = self.index.remove(id)?;
        let removed = self.entries.remove(pos);
        for slot in self.index.values_mut() {
            if *slot > pos {
                *slot -= 1;
            }
        }
        Some(removed)
    }

    fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.index.get(id).map(|&pos| &self.entries[pos])
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }
}

/// Client-side cache of backend models.
///
/// Every kind the store is asked about must be registered up front.
/// Touching an unregistered kind trips a debug assertion and is otherwise
/// logged and ignored.
#[derive(Clone, Debug)]
pub struct Store {
    slices: HashMap<EntityKind, Slice>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Store with every known kind registered.
    pub fn new() -> Self {
        Self::with_kinds(EntityKind::ALL)
    }

    pub fn with_kinds(kinds: impl IntoIterator<Item = EntityKind>) -> Self {
        let mut store = Self {
            slices: HashMap::new(),
        };
        for kind in kinds {
            store.register(kind);
        }
        store
    }

    /// Register a kind. Registering twice keeps the existing entries.
    pub fn register(&mut self, kind: EntityKind) {
        self.slices.entry(kind).or_default();
    }

    pub fn is_registered(&self, kind: EntityKind) -> bool {
        self.slices.contains_key(&kind)
    }

    fn slice(&self, kind: EntityKind) -> Option<&Slice> {
        let slice = self.slices.get(&kind);
        if slice.is_none() {
            unregistered(kind);
        }
        slice
    }

    fn slice_mut(&mut self, kind: EntityKind) -> Option<&mut Slice> {
        let slice = self.slices.get_mut(&kind);
        if slice.is_none() {
            unregistered(kind);
        }
        slice
    }

    /// Insert `entity`, or deep-merge it into the entry with the same id.
    pub fn upsert(&mut self, entity: Entity) {
        let kind = entity.kind;
        if let Some(slice) = self.slice_mut(kind) {
            tracing::trace!(%kind, id = %entity.id, "upsert");
            slice.upsert(entity);
        }
    }

    /// Upsert each entity in order; later entries win on conflicting fields.
    pub fn upsert_many(&mut self, entities: impl IntoIterator<Item = Entity>) {
        for entity in entities {
            self.upsert(entity);
        }
    }

    /// Remove the entry with `id`. Absent ids are a no-op.
    pub fn remove(&mut self, kind: EntityKind, id: &EntityId) -> Option<Entity> {
        let removed = self.slice_mut(kind)?.remove(id);
        if removed.is_some() {
            tracing::trace!(%kind, %id, "remove");
        }
        removed
    }

    pub fn remove_entity(&mut self, entity: &Entity) -> Option<Entity> {
        self.remove(entity.kind, &entity.id)
    }

    /// All entries of `kind` in first-insertion order.
    pub fn select_all(&self, kind: EntityKind) -> &[Entity] {
        self.slice(kind)
            .map(|s| s.entries.as_slice())
            .unwrap_or_default()
    }

    pub fn select_by_id(&self, kind: EntityKind, id: &EntityId) -> Option<&Entity> {
        self.slice(kind)?.get(id)
    }

    /// Resolve the relation `field` of `entity` to stored entries of `kind`.
    ///
    /// Referents that are not resident are skipped.
    pub fn select_related(&self, entity: &Entity, field: &str, kind: EntityKind) -> Vec<&Entity> {
        let Some(slice) = self.slice(kind) else {
            return Vec::new();
        };
        entity
            .related_ids(field)
            .iter()
            .filter_map(|id| slice.get(id))
            .collect()
    }

    pub fn len(&self, kind: EntityKind) -> usize {
        self.slice(kind).map_or(0, |s| s.entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.slices.values().all(|s| s.entries.is_empty())
    }

    /// Drop every entry; registrations are kept.
    pub fn clear(&mut self) {
        for slice in self.slices.values_mut() {
            slice.clear();
        }
        tracing::debug!("store cleared");
    }
}

fn unregistered(kind: EntityKind) {
    tracing::error!(%kind, "entity kind is not registered with the store");
    debug_assert!(false, "entity kind {kind} is not registered with the store");
}

#[cfg(test)]
mod tests {
    use super::*;
    use dc_frames::{DataMap, Frame288, LoadType};
    use serde_json::json;

    fn group(id: i64, name: &str) -> Entity {
        Entity::new(EntityKind::MeterGroup, id).with_field("name", json!(name))
    }

    #[test]
    fn upsert_appends_then_merges() {
        let mut store = Store::new();
        store.upsert(group(1, "a"));
        store.upsert(group(2, "b"));
        store.upsert(group(1, "a2"));

        let all = store.select_all(EntityKind::MeterGroup);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name(), Some("a2"));
        assert_eq!(all[1].name(), Some("b"));
    }

    #[test]
    fn upsert_is_idempotent() {
        let entity = Entity::new(EntityKind::Meter, 5)
            .with_data(DataMap::new().with(LoadType::Average, Frame288::zeros()))
            .with_field("tags", json!(["a", {"k": 1}]));

        let mut once = Store::new();
        once.upsert(entity.clone());
        let mut twice = Store::new();
        twice.upsert(entity.clone());
        twice.upsert(entity.clone());

        assert_eq!(
            once.select_all(EntityKind::Meter),
            twice.select_all(EntityKind::Meter)
        );
        assert_eq!(twice.select_by_id(EntityKind::Meter, &entity.id), Some(&entity));
    }

    #[test]
    fn partial_fetch_never_erases_tags() {
        let mut store = Store::new();
        store.upsert(
            Entity::new(EntityKind::MeterGroup, 1)
                .with_data(DataMap::new().with(LoadType::Average, Frame288::zeros())),
        );
        store.upsert(
            Entity::new(EntityKind::MeterGroup, 1)
                .with_data(DataMap::new().with(LoadType::Maximum, Frame288::zeros())),
        );

        let cached = store
            .select_by_id(EntityKind::MeterGroup, &EntityId::Int(1))
            .unwrap();
        assert!(cached.data.contains(LoadType::Average));
        assert!(cached.data.contains(LoadType::Maximum));
    }

    #[test]
    fn upsert_many_later_wins() {
        let mut store = Store::new();
        store.upsert_many([group(1, "first"), group(1, "second")]);
        assert_eq!(store.len(EntityKind::MeterGroup), 1);
        assert_eq!(
            store.select_all(EntityKind::MeterGroup)[0].name(),
            Some("second")
        );
    }

    #[test]
    fn remove_keeps_order_and_index() {
        let mut store = Store::new();
        store.upsert_many([group(1, "a"), group(2, "b"), group(3, "c")]);

        assert!(store.remove(EntityKind::MeterGroup, &EntityId::Int(2)).is_some());
        assert!(store.remove(EntityKind::MeterGroup, &EntityId::Int(2)).is_none());

        let names: Vec<_> = store
            .select_all(EntityKind::MeterGroup)
            .iter()
            .filter_map(Entity::name)
            .collect();
        assert_eq!(names, ["a", "c"]);
        assert_eq!(
            store
                .select_by_id(EntityKind::MeterGroup, &EntityId::Int(3))
                .and_then(Entity::name),
            Some("c")
        );
    }

    #[test]
    fn kinds_are_isolated() {
        let mut store = Store::new();
        store.upsert(Entity::new(EntityKind::Meter, 1));
        assert!(store
            .select_by_id(EntityKind::MeterGroup, &EntityId::Int(1))
            .is_none());
        assert_eq!(store.len(EntityKind::Meter), 1);
    }

    #[test]
    fn select_related_skips_missing() {
        let mut store = Store::new();
        store.upsert_many([
            Entity::new(EntityKind::Meter, 1),
            Entity::new(EntityKind::Meter, 3),
        ]);
        let mg = group(9, "g").with_field("meters", json!([1, 2, 3]));

        let related = store.select_related(&mg, "meters", EntityKind::Meter);
        let ids: Vec<_> = related.iter().map(|e| e.id.clone()).collect();
        assert_eq!(ids, [EntityId::Int(1), EntityId::Int(3)]);
    }

    #[test]
    fn clear_keeps_registrations() {
        let mut store = Store::new();
        store.upsert(group(1, "a"));
        assert!(!store.is_empty());
        store.clear();
        assert!(store.is_empty());
        assert!(store.is_registered(EntityKind::MeterGroup));
        store.upsert(group(2, "b"));
        assert_eq!(store.len(EntityKind::MeterGroup), 1);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "not registered")]
    fn unregistered_kind_asserts_in_debug() {
        let mut store = Store::with_kinds([EntityKind::Meter]);
        store.upsert(Entity::new(EntityKind::Scenario, 1));
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn unregistered_kind_is_ignored_in_release() {
        let mut store = Store::with_kinds([EntityKind::Meter]);
        store.upsert(Entity::new(EntityKind::Scenario, 1));
        assert!(store.select_all(EntityKind::Scenario).is_empty());
    }
}
