// Copyright 2025 the Soma authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Internal component storage: per-tag slot columns and entity records.

use crate::ecs::bitset::TagBitset;
use crate::ecs::component::{Component, ComponentRef};
use ahash::AHashMap;
use soma_core::{EntityId, TypeTag, WorldError};

/// The central record for an entity: its tag set, the slot each tag's
/// payload occupies in that tag's column, and a bitset over its numeric
/// tags for mask-compiled predicates.
#[derive(Default)]
pub(crate) struct EntityRecord {
    /// Map from a held tag to the payload's slot in that tag's column.
    slots: AHashMap<TypeTag, u32>,
    /// Presence bits for the numeric tags this entity holds.
    mask: TagBitset,
}

impl EntityRecord {
    /// Returns true if the entity currently holds `tag`.
    pub(crate) fn has(&self, tag: &TypeTag) -> bool {
        self.slots.contains_key(tag)
    }

    /// The entity's numeric-tag bitset.
    pub(crate) fn mask(&self) -> &TagBitset {
        &self.mask
    }
}

/// One appendable column of payload slots for a single tag.
///
/// Slots are retired to a free list on removal and reused by later inserts.
/// A slot referenced by any entity record always contains a live payload.
/// Retiring a slot does not invalidate rows built from it: rows hold their
/// own `Rc` payload handles, and slot indices are only ever read through a
/// live entity record.
#[derive(Default)]
struct Column {
    slots: Vec<Option<ComponentRef>>,
    free: Vec<u32>,
}

impl Column {
    fn allocate(&mut self, payload: ComponentRef) -> u32 {
        if let Some(slot) = self.free.pop() {
            self.slots[slot as usize] = Some(payload);
            slot
        } else {
            let slot = self.slots.len() as u32;
            self.slots.push(Some(payload));
            slot
        }
    }

    fn retire(&mut self, slot: u32) {
        self.slots[slot as usize] = None;
        self.free.push(slot);
    }
}

/// Whether an insert stored a new payload or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The entity did not hold the tag before.
    Added,
    /// The entity already held the tag; its payload was replaced.
    Replaced,
}

/// Owns every component instance in a world, keyed by (entity, tag).
///
/// The table is archetype-free: one column per tag, and an entity record
/// mapping each held tag to its slot. Nothing outside this module touches
/// the columns or records directly; payload contents, however, are shared
/// handles mutated in place by systems.
#[derive(Default)]
pub struct ComponentTable {
    columns: AHashMap<TypeTag, Column>,
    entities: AHashMap<EntityId, EntityRecord>,
    /// Live entities in spawn order. Queries seed their result lists from
    /// this so that "insertion order among currently-matching entities" is
    /// well defined even for queries compiled late.
    spawn_order: Vec<EntityId>,
}

impl ComponentTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `entity` as alive with no components.
    ///
    /// Fails with [`WorldError::DuplicateSpawn`] if the identifier is
    /// already alive; identifiers are never reused implicitly.
    pub fn create_entity(&mut self, entity: EntityId) -> Result<(), WorldError> {
        if self.entities.contains_key(&entity) {
            return Err(WorldError::DuplicateSpawn { entity });
        }
        log::trace!("Creating entity `{entity}`.");
        self.spawn_order.push(entity.clone());
        self.entities.insert(entity, EntityRecord::default());
        Ok(())
    }

    /// Returns true if `entity` is currently alive.
    pub fn contains(&self, entity: &EntityId) -> bool {
        self.entities.contains_key(entity)
    }

    /// Stores or replaces the payload for (`entity`, `component.tag()`).
    ///
    /// Replace-on-insert: inserting a tag the entity already holds swaps the
    /// payload handle in place and reports [`InsertOutcome::Replaced`]. No
    /// observed caller depends on duplicate inserts erroring, and plugins
    /// rely on replacement for respawn-style flows.
    pub fn insert(
        &mut self,
        entity: &EntityId,
        component: Component,
    ) -> Result<InsertOutcome, WorldError> {
        let record = self
            .entities
            .get_mut(entity)
            .ok_or_else(|| WorldError::UnknownEntity {
                entity: entity.clone(),
            })?;

        let tag = component.tag().clone();
        let column = self.columns.entry(tag.clone()).or_default();

        if let Some(&slot) = record.slots.get(&tag) {
            column.slots[slot as usize] = Some(component.payload());
            log::trace!("Replaced `{tag}` on entity `{entity}`.");
            return Ok(InsertOutcome::Replaced);
        }

        let slot = column.allocate(component.payload());
        if let Some(bit) = tag.bit() {
            record.mask.set(bit);
        }
        record.slots.insert(tag, slot);
        Ok(InsertOutcome::Added)
    }

    /// Deletes the payload for (`entity`, `tag`).
    ///
    /// Idempotent: returns `Ok(false)` when the entity does not hold the
    /// tag, so a second removal fires no second event. Unknown entities are
    /// still an error — removal never creates or resurrects anything.
    pub fn remove(&mut self, entity: &EntityId, tag: &TypeTag) -> Result<bool, WorldError> {
        let record = self
            .entities
            .get_mut(entity)
            .ok_or_else(|| WorldError::UnknownEntity {
                entity: entity.clone(),
            })?;

        let Some(slot) = record.slots.remove(tag) else {
            return Ok(false);
        };
        if let Some(bit) = tag.bit() {
            record.mask.clear(bit);
        }
        // The column exists for every slot an entity record references.
        self.columns
            .get_mut(tag)
            .expect("column must exist for a referenced slot")
            .retire(slot);
        log::trace!("Removed `{tag}` from entity `{entity}`.");
        Ok(true)
    }

    /// Returns the payload handle for (`entity`, `tag`), or `None` if the
    /// entity is unknown or does not hold the tag. Never an error.
    pub fn get(&self, entity: &EntityId, tag: &TypeTag) -> Option<ComponentRef> {
        let record = self.entities.get(entity)?;
        let slot = *record.slots.get(tag)?;
        let column = self.columns.get(tag)?;
        column.slots[slot as usize].clone()
    }

    /// Returns true if `entity` is alive and holds `tag`.
    pub fn has(&self, entity: &EntityId, tag: &TypeTag) -> bool {
        self.entities.get(entity).is_some_and(|r| r.has(tag))
    }

    /// The tags `entity` currently holds, in unspecified order.
    pub fn tags_of(&self, entity: &EntityId) -> Result<Vec<TypeTag>, WorldError> {
        let record = self
            .entities
            .get(entity)
            .ok_or_else(|| WorldError::UnknownEntity {
                entity: entity.clone(),
            })?;
        Ok(record.slots.keys().cloned().collect())
    }

    /// Drops `entity`'s record. All of its components must have been removed
    /// first (the caller drains them so each removal retracts the entity
    /// from the live indices and fires its event).
    pub fn retire_entity(&mut self, entity: &EntityId) -> Result<(), WorldError> {
        let record = self
            .entities
            .remove(entity)
            .ok_or_else(|| WorldError::UnknownEntity {
                entity: entity.clone(),
            })?;
        debug_assert!(
            record.slots.is_empty(),
            "entity retired while still holding components"
        );
        if let Some(position) = self.spawn_order.iter().position(|id| id == entity) {
            self.spawn_order.remove(position);
        }
        log::trace!("Retired entity `{entity}`.");
        Ok(())
    }

    /// Live entities in spawn order.
    pub fn entities_in_order(&self) -> impl Iterator<Item = &EntityId> {
        self.spawn_order.iter()
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// The record for `entity`, if alive.
    pub(crate) fn record(&self, entity: &EntityId) -> Option<&EntityRecord> {
        self.entities.get(entity)
    }
}
