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

use super::query::Matcher;
use super::*;
use soma_core::{EntityId, TypeTag};

// --- DUMMY COMPONENTS FOR TESTING ---

#[derive(Debug, Clone, Copy, PartialEq)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Velocity {
    x: f32,
    y: f32,
}

// --- WIRING HELPERS ---
//
// These mirror what the world façade does: table mutation first, then the
// live index, so every assertion here observes indices consistent with the
// table.

fn spawn(table: &mut ComponentTable, index: &mut LiveIndex, id: &str, components: Vec<Component>) {
    let entity = EntityId::from(id);
    table.create_entity(entity.clone()).unwrap();
    index.on_spawned(&entity, table);
    for component in components {
        add(table, index, id, component);
    }
}

fn add(table: &mut ComponentTable, index: &mut LiveIndex, id: &str, component: Component) {
    let entity = EntityId::from(id);
    let tag = component.tag().clone();
    table.insert(&entity, component).unwrap();
    index.on_tag_changed(&entity, &tag, table);
}

fn remove(table: &mut ComponentTable, index: &mut LiveIndex, id: &str, tag: impl Into<TypeTag>) {
    let entity = EntityId::from(id);
    let tag = tag.into();
    if table.remove(&entity, &tag).unwrap() {
        index.on_tag_changed(&entity, &tag, table);
    }
}

fn despawn(table: &mut ComponentTable, index: &mut LiveIndex, id: &str) {
    let entity = EntityId::from(id);
    for tag in table.tags_of(&entity).unwrap() {
        if table.remove(&entity, &tag).unwrap() {
            index.on_tag_changed(&entity, &tag, table);
        }
    }
    table.retire_entity(&entity).unwrap();
    index.on_despawned(&entity);
}

// --- TESTS ---

#[test]
fn query_over_position_and_velocity_yields_one_row() {
    let mut table = ComponentTable::new();
    let mut index = LiveIndex::new();
    spawn(
        &mut table,
        &mut index,
        "e1",
        vec![
            Component::new("position", Position { x: 0.0, y: 0.0 }),
            Component::new("velocity", Velocity { x: 1.0, y: 0.0 }),
        ],
    );

    let movers = index.register(
        QueryDescriptor::new().has("position").has("velocity"),
        &table,
    );

    let rows = index.rows(movers);
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.len(), 2);
    assert_eq!(*row[0].read::<Position>().unwrap(), Position { x: 0.0, y: 0.0 });
    assert_eq!(*row[1].read::<Velocity>().unwrap(), Velocity { x: 1.0, y: 0.0 });
}

#[test]
fn in_place_mutation_is_visible_through_the_next_snapshot() {
    // Scenario: one "update" integrating velocity into position.
    let mut table = ComponentTable::new();
    let mut index = LiveIndex::new();
    spawn(
        &mut table,
        &mut index,
        "e1",
        vec![
            Component::new("position", Position { x: 0.0, y: 0.0 }),
            Component::new("velocity", Velocity { x: 1.0, y: 0.0 }),
        ],
    );
    let movers = index.register(
        QueryDescriptor::new().has("position").has("velocity"),
        &table,
    );

    for row in index.rows(movers) {
        let velocity = *row[1].read::<Velocity>().unwrap();
        let mut position = row[0].write::<Position>().unwrap();
        position.x += velocity.x;
        position.y += velocity.y;
    }

    let rows = index.rows(movers);
    assert_eq!(*rows[0][0].read::<Position>().unwrap(), Position { x: 1.0, y: 0.0 });
    assert_eq!(*rows[0][1].read::<Velocity>().unwrap(), Velocity { x: 1.0, y: 0.0 });
}

#[test]
fn entity_added_to_live_result_without_recreating_the_query() {
    let mut table = ComponentTable::new();
    let mut index = LiveIndex::new();
    spawn(
        &mut table,
        &mut index,
        "e1",
        vec![Component::new("position", Position { x: 0.0, y: 0.0 })],
    );

    let movers = index.register(
        QueryDescriptor::new().has("position").has("velocity"),
        &table,
    );
    assert_eq!(index.rows(movers).len(), 0, "position alone must not match");

    add(
        &mut table,
        &mut index,
        "e1",
        Component::new("velocity", Velocity { x: 2.0, y: 2.0 }),
    );
    assert_eq!(index.rows(movers).len(), 1);
}

#[test]
fn any_of_drops_entity_only_when_no_alternative_remains() {
    let mut table = ComponentTable::new();
    let mut index = LiveIndex::new();
    spawn(
        &mut table,
        &mut index,
        "e1",
        vec![Component::new("a", 1u8), Component::new("b", 2u8)],
    );
    let query = index.register(
        QueryDescriptor::new().has("a").any_of(["b", "c"]),
        &table,
    );
    assert_eq!(index.row_count(query), 1);

    // Removing `b` with no `c` present: the entity must leave the result.
    remove(&mut table, &mut index, "e1", "b");
    assert_eq!(index.row_count(query), 0);

    // With both alternatives held, removing one keeps the match alive.
    add(&mut table, &mut index, "e1", Component::new("b", 2u8));
    add(&mut table, &mut index, "e1", Component::new("c", 3u8));
    assert_eq!(index.row_count(query), 1);
    remove(&mut table, &mut index, "e1", "b");
    assert_eq!(index.row_count(query), 1);
    let rows = index.rows(query);
    assert_eq!(
        *rows[0][1].read::<u8>().unwrap(),
        3,
        "the surviving alternative supplies the row outcome"
    );
}

#[test]
fn replace_on_insert_refreshes_the_live_row() {
    let mut table = ComponentTable::new();
    let mut index = LiveIndex::new();
    spawn(
        &mut table,
        &mut index,
        "e1",
        vec![Component::new("position", Position { x: 1.0, y: 1.0 })],
    );
    let query = index.register(QueryDescriptor::new().has("position"), &table);

    // Same tag, new payload handle.
    add(
        &mut table,
        &mut index,
        "e1",
        Component::new("position", Position { x: 9.0, y: 9.0 }),
    );

    let rows = index.rows(query);
    assert_eq!(rows.len(), 1, "replacement must not duplicate the row");
    assert_eq!(*rows[0][0].read::<Position>().unwrap(), Position { x: 9.0, y: 9.0 });
}

#[test]
fn removing_twice_is_a_no_op_the_second_time() {
    let mut table = ComponentTable::new();
    let mut index = LiveIndex::new();
    spawn(
        &mut table,
        &mut index,
        "e1",
        vec![Component::new("position", Position { x: 0.0, y: 0.0 })],
    );

    let entity = EntityId::from("e1");
    let tag = TypeTag::from("position");
    assert!(table.remove(&entity, &tag).unwrap());
    assert!(
        !table.remove(&entity, &tag).unwrap(),
        "second removal must report absence"
    );
}

#[test]
fn filter_terms_are_required_but_not_projected() {
    let mut table = ComponentTable::new();
    let mut index = LiveIndex::new();
    spawn(
        &mut table,
        &mut index,
        "e1",
        vec![
            Component::new("position", Position { x: 0.0, y: 0.0 }),
            Component::new("frozen", ()),
        ],
    );
    spawn(
        &mut table,
        &mut index,
        "e2",
        vec![Component::new("position", Position { x: 5.0, y: 5.0 })],
    );

    let frozen = index.register(
        QueryDescriptor::new().has("position").filter("frozen"),
        &table,
    );
    let rows = index.rows(frozen);
    assert_eq!(rows.len(), 1, "only the frozen entity matches");
    assert_eq!(rows[0].len(), 1, "the filter tag contributes no row position");
}

#[test]
fn entity_id_occupies_the_first_position_regardless_of_declaration_order() {
    let mut table = ComponentTable::new();
    let mut index = LiveIndex::new();
    spawn(
        &mut table,
        &mut index,
        "e1",
        vec![
            Component::new("position", Position { x: 0.0, y: 0.0 }),
            Component::new("velocity", Velocity { x: 1.0, y: 1.0 }),
        ],
    );

    // `with_entity` declared after the terms.
    let query = index.register(
        QueryDescriptor::new()
            .has("position")
            .has("velocity")
            .with_entity(),
        &table,
    );
    let rows = index.rows(query);
    assert_eq!(rows[0][0].entity(), Some(&EntityId::from("e1")));
    assert!(rows[0][1].read::<Position>().is_some());
    assert!(rows[0][2].read::<Velocity>().is_some());
}

#[test]
fn map_projection_runs_per_matching_entity() {
    let mut table = ComponentTable::new();
    let mut index = LiveIndex::new();
    spawn(
        &mut table,
        &mut index,
        "e1",
        vec![
            Component::new("position", Position { x: 3.0, y: 4.0 }),
            Component::new("velocity", Velocity { x: 0.0, y: 0.0 }),
        ],
    );

    // Project down to the position only.
    let query = index.register(
        QueryDescriptor::new()
            .has("position")
            .has("velocity")
            .map(|mut row| {
                row.truncate(1);
                row
            }),
        &table,
    );
    let rows = index.rows(query);
    assert_eq!(rows[0].len(), 1);
    assert!(rows[0][0].read::<Position>().is_some());
}

#[test]
fn numeric_tags_compile_to_the_bitmask_form() {
    let all_numeric = QueryDescriptor::new()
        .has(0u32)
        .filter(1u32)
        .any_of([2u32, 3u32]);
    assert!(matches!(all_numeric.compile(), Matcher::Mask { .. }));

    let mixed = QueryDescriptor::new().has(0u32).has("position");
    assert!(matches!(mixed.compile(), Matcher::Tags { .. }));
}

#[test]
fn numeric_and_string_tags_match_identically() {
    let mut table = ComponentTable::new();
    let mut index = LiveIndex::new();
    spawn(
        &mut table,
        &mut index,
        "n",
        vec![Component::new(0u32, 1i32), Component::new(1u32, 2i32)],
    );
    spawn(
        &mut table,
        &mut index,
        "s",
        vec![Component::new("zero", 1i32), Component::new("one", 2i32)],
    );

    let by_mask = index.register(QueryDescriptor::new().has(0u32).any_of([1u32, 2u32]), &table);
    let by_set = index.register(
        QueryDescriptor::new().has("zero").any_of(["one", "two"]),
        &table,
    );
    assert_eq!(index.row_count(by_mask), 1);
    assert_eq!(index.row_count(by_set), 1);
}

#[test]
fn late_query_seeds_in_spawn_order() {
    let mut table = ComponentTable::new();
    let mut index = LiveIndex::new();
    for id in ["e1", "e2", "e3"] {
        spawn(
            &mut table,
            &mut index,
            id,
            vec![Component::new("position", Position { x: 0.0, y: 0.0 })],
        );
    }

    let query = index.register(
        QueryDescriptor::new().with_entity().has("position"),
        &table,
    );
    let order: Vec<EntityId> = index
        .rows(query)
        .iter()
        .map(|row| row[0].entity().unwrap().clone())
        .collect();
    assert_eq!(
        order,
        vec![EntityId::from("e1"), EntityId::from("e2"), EntityId::from("e3")]
    );

    // A despawned entity leaves; the remaining order is preserved, and a
    // re-entrant member joins at the end.
    despawn(&mut table, &mut index, "e2");
    spawn(
        &mut table,
        &mut index,
        "e2",
        vec![Component::new("position", Position { x: 0.0, y: 0.0 })],
    );
    let order: Vec<EntityId> = index
        .rows(query)
        .iter()
        .map(|row| row[0].entity().unwrap().clone())
        .collect();
    assert_eq!(
        order,
        vec![EntityId::from("e1"), EntityId::from("e3"), EntityId::from("e2")]
    );
}

#[test]
fn duplicate_spawn_and_unknown_entity_fail_fast() {
    let mut table = ComponentTable::new();
    table.create_entity(EntityId::from("e1")).unwrap();

    assert!(matches!(
        table.create_entity(EntityId::from("e1")),
        Err(soma_core::WorldError::DuplicateSpawn { .. })
    ));
    assert!(matches!(
        table.insert(&EntityId::from("ghost"), Component::new("position", 0u8)),
        Err(soma_core::WorldError::UnknownEntity { .. })
    ));
    assert!(matches!(
        table.remove(&EntityId::from("ghost"), &TypeTag::from("position")),
        Err(soma_core::WorldError::UnknownEntity { .. })
    ));
}

#[test]
fn get_for_missing_tag_is_absent_not_an_error() {
    let mut table = ComponentTable::new();
    table.create_entity(EntityId::from("e1")).unwrap();
    assert!(table.get(&EntityId::from("e1"), &TypeTag::from("position")).is_none());
}

// --- RANDOMIZED ORACLE ---
//
// Drives the table and live index through a long random mutation sequence
// and, after every step, compares each query's member list against a naive
// full rescan of the table. Any divergence is a staleness bug.

/// Minimal xorshift PRNG so the sequence is deterministic and dependency-free.
struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    fn below(&mut self, bound: u64) -> u64 {
        self.next() % bound
    }
}

#[test]
fn live_results_always_equal_a_full_rescan() {
    let entity_pool: Vec<EntityId> = (0..8).map(|i| EntityId::from(format!("e{i}"))).collect();
    let tag_pool: Vec<TypeTag> = vec![
        TypeTag::from(0u32),
        TypeTag::from(1u32),
        TypeTag::from(2u32),
        TypeTag::from("alpha"),
        TypeTag::from("beta"),
    ];

    let mut table = ComponentTable::new();
    let mut index = LiveIndex::new();

    // Each query is paired with a naive predicate for the rescan oracle.
    type Oracle = fn(&ComponentTable, &EntityId) -> bool;
    let queries: Vec<(QueryId, Oracle)> = vec![
        (
            index.register(
                QueryDescriptor::new().with_entity().has(0u32).has(1u32),
                &table,
            ),
            |t, e| t.has(e, &TypeTag::from(0u32)) && t.has(e, &TypeTag::from(1u32)),
        ),
        (
            index.register(
                QueryDescriptor::new()
                    .with_entity()
                    .has(0u32)
                    .any_of([2u32]),
                &table,
            ),
            |t, e| t.has(e, &TypeTag::from(0u32)) && t.has(e, &TypeTag::from(2u32)),
        ),
        (
            index.register(
                QueryDescriptor::new()
                    .with_entity()
                    .has("alpha")
                    .any_of(["beta", "gamma"]),
                &table,
            ),
            |t, e| {
                t.has(e, &TypeTag::from("alpha"))
                    && (t.has(e, &TypeTag::from("beta")) || t.has(e, &TypeTag::from("gamma")))
            },
        ),
        (
            index.register(QueryDescriptor::new().with_entity(), &table),
            |_, _| true,
        ),
    ];

    let mut rng = XorShift(0x5eed_cafe_f00d_1234);
    for _ in 0..2_000 {
        let entity = entity_pool[rng.below(entity_pool.len() as u64) as usize].clone();
        match rng.below(4) {
            0 => {
                if !table.contains(&entity) {
                    table.create_entity(entity.clone()).unwrap();
                    index.on_spawned(&entity, &table);
                }
            }
            1 => {
                if table.contains(&entity) {
                    for tag in table.tags_of(&entity).unwrap() {
                        if table.remove(&entity, &tag).unwrap() {
                            index.on_tag_changed(&entity, &tag, &table);
                        }
                    }
                    table.retire_entity(&entity).unwrap();
                    index.on_despawned(&entity);
                }
            }
            2 => {
                if table.contains(&entity) {
                    let tag = tag_pool[rng.below(tag_pool.len() as u64) as usize].clone();
                    table
                        .insert(&entity, Component::new(tag.clone(), rng.next()))
                        .unwrap();
                    index.on_tag_changed(&entity, &tag, &table);
                }
            }
            _ => {
                if table.contains(&entity) {
                    let tag = tag_pool[rng.below(tag_pool.len() as u64) as usize].clone();
                    if table.remove(&entity, &tag).unwrap() {
                        index.on_tag_changed(&entity, &tag, &table);
                    }
                }
            }
        }

        for (query, oracle) in &queries {
            let live: Vec<EntityId> = index
                .rows(*query)
                .iter()
                .map(|row| row[0].entity().unwrap().clone())
                .collect();
            let rescan: Vec<EntityId> = table
                .entities_in_order()
                .filter(|e| oracle(&table, e))
                .cloned()
                .collect();
            // Membership must agree exactly; order may differ because the
            // oracle walks spawn order while the live list keeps insertion
            // order among matches.
            let mut live_sorted = live.clone();
            let mut rescan_sorted = rescan.clone();
            live_sorted.sort_by_key(|e| e.to_string());
            rescan_sorted.sort_by_key(|e| e.to_string());
            assert_eq!(
                live_sorted, rescan_sorted,
                "live index diverged from a full rescan"
            );
        }
    }
}
