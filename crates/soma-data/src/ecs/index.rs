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

//! The incrementally maintained query result index.
//!
//! Query records live in an explicit arena with stable indices; an inverted
//! index maps each component tag to the queries referencing it. When an
//! entity mutates, only those queries re-evaluate — and only for the one
//! affected entity. The cost of a mutation is proportional to the queries
//! touching the changed tag, never to the number of entities or the total
//! number of queries.

use crate::ecs::query::{Matcher, QueryDescriptor, QueryRow};
use crate::ecs::table::ComponentTable;
use ahash::AHashMap;
use soma_core::{EntityId, TypeTag};
use std::mem;

/// A stable handle to a compiled query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryId(u32);

/// One compiled query and its live result list.
struct QueryRecord {
    descriptor: QueryDescriptor,
    matcher: Matcher,
    /// Result rows in insertion order among currently matching entities.
    rows: Vec<(EntityId, QueryRow)>,
    /// Row position of each member entity.
    positions: AHashMap<EntityId, usize>,
}

/// Arena of query records plus the tag-to-queries inverted index.
#[derive(Default)]
pub struct LiveIndex {
    queries: Vec<QueryRecord>,
    by_tag: AHashMap<TypeTag, Vec<QueryId>>,
    /// Queries referencing no tag at all. Only spawn/despawn can change
    /// their membership, so they get their own bucket.
    untagged: Vec<QueryId>,
    /// Reused id buffer; steady-state mutations must not allocate.
    scratch: Vec<QueryId>,
}

impl LiveIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles `descriptor` and seeds its result list from the current
    /// table contents, in spawn order. A query compiled before any matching
    /// entity exists simply starts empty.
    pub fn register(&mut self, descriptor: QueryDescriptor, table: &ComponentTable) -> QueryId {
        let id = QueryId(self.queries.len() as u32);
        let referenced = descriptor.referenced_tags();
        if referenced.is_empty() {
            self.untagged.push(id);
        }
        for tag in referenced {
            self.by_tag.entry(tag).or_default().push(id);
        }

        let mut record = QueryRecord {
            matcher: descriptor.compile(),
            descriptor,
            rows: Vec::new(),
            positions: AHashMap::new(),
        };
        for entity in table.entities_in_order() {
            let matches = table
                .record(entity)
                .is_some_and(|r| record.matcher.matches(r));
            if matches {
                let row = record.descriptor.build_row(entity, table);
                record.positions.insert(entity.clone(), record.rows.len());
                record.rows.push((entity.clone(), row));
            }
        }
        log::debug!(
            "Registered query {:?} with {} initial row(s).",
            record.descriptor,
            record.rows.len()
        );
        self.queries.push(record);
        id
    }

    /// Number of registered queries.
    pub fn query_count(&self) -> usize {
        self.queries.len()
    }

    /// A snapshot of the query's current rows, in insertion order.
    ///
    /// Iterating the snapshot is never concurrent with index mutation:
    /// changes made while a caller walks these rows surface in the next
    /// snapshot, not this one. Payload handles inside the rows are shared,
    /// so in-place payload mutation is visible immediately.
    pub fn rows(&self, id: QueryId) -> Vec<QueryRow> {
        let record = &self.queries[id.0 as usize];
        record.rows.iter().map(|(_, row)| row.clone()).collect()
    }

    /// Number of entities currently matching the query.
    pub fn row_count(&self, id: QueryId) -> usize {
        self.queries[id.0 as usize].rows.len()
    }

    /// Returns true if `entity` is currently a member of the query's result.
    pub fn contains(&self, id: QueryId, entity: &EntityId) -> bool {
        self.queries[id.0 as usize].positions.contains_key(entity)
    }

    /// Re-evaluates the untagged queries for a freshly spawned (still
    /// component-less) entity.
    pub fn on_spawned(&mut self, entity: &EntityId, table: &ComponentTable) {
        let mut affected = mem::take(&mut self.scratch);
        affected.clear();
        affected.extend_from_slice(&self.untagged);
        for &id in &affected {
            self.reevaluate(id, entity, table);
        }
        self.scratch = affected;
    }

    /// Re-evaluates the affected entity against every query referencing
    /// `tag`. Called for both additions and removals, after the table has
    /// been mutated and before any user listener runs.
    pub fn on_tag_changed(&mut self, entity: &EntityId, tag: &TypeTag, table: &ComponentTable) {
        let mut affected = mem::take(&mut self.scratch);
        affected.clear();
        if let Some(ids) = self.by_tag.get(tag) {
            affected.extend_from_slice(ids);
        }
        for &id in &affected {
            self.reevaluate(id, entity, table);
        }
        self.scratch = affected;
    }

    /// Retracts a despawned entity. Its components were already removed one
    /// by one (each retracting it from the tagged queries), so only the
    /// untagged bucket can still hold it.
    pub fn on_despawned(&mut self, entity: &EntityId) {
        let mut affected = mem::take(&mut self.scratch);
        affected.clear();
        affected.extend_from_slice(&self.untagged);
        for &id in &affected {
            let record = &mut self.queries[id.0 as usize];
            if record.positions.contains_key(entity) {
                Self::remove_member(record, entity);
            }
        }
        self.scratch = affected;
    }

    /// Re-evaluates one query's predicate for one entity and reconciles the
    /// result list: insert at the end, refresh in place, remove, or no-op.
    fn reevaluate(&mut self, id: QueryId, entity: &EntityId, table: &ComponentTable) {
        let record = &mut self.queries[id.0 as usize];
        let matches = table
            .record(entity)
            .is_some_and(|r| record.matcher.matches(r));
        let present = record.positions.contains_key(entity);

        match (matches, present) {
            (true, false) => {
                let row = record.descriptor.build_row(entity, table);
                record.positions.insert(entity.clone(), record.rows.len());
                record.rows.push((entity.clone(), row));
            }
            (true, true) => {
                // Still matching, but replace-on-insert may have swapped a
                // payload handle; rebuild the row at its existing position.
                let row = record.descriptor.build_row(entity, table);
                let position = record.positions[entity];
                record.rows[position].1 = row;
            }
            (false, true) => Self::remove_member(record, entity),
            (false, false) => {}
        }
    }

    fn remove_member(record: &mut QueryRecord, entity: &EntityId) {
        // Present by the caller's check.
        let position = record
            .positions
            .remove(entity)
            .expect("member entity must have a row position");
        record.rows.remove(position);
        for other in record.positions.values_mut() {
            if *other > position {
                *other -= 1;
            }
        }
    }
}
