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

//! Query declaration and one-time compilation.
//!
//! A query is declared as a tuple of type-predicates and compiled exactly
//! once: into a predicate over an entity's tag set plus a positional
//! projection. The predicate takes one of two forms, chosen at compile
//! time — a fixed-width bitmask when every referenced tag is numeric, or
//! tag-set lookups otherwise. There is no per-entity runtime inspection of
//! the term variants after compilation.

use crate::ecs::component::{borrow_as, borrow_mut_as, ComponentRef};
use crate::ecs::table::{ComponentTable, EntityRecord};
use crate::ecs::TagBitset;
use soma_core::{EntityId, TypeTag};
use std::cell::{Ref, RefMut};
use std::fmt;
use std::rc::Rc;

/// One term of a query declaration.
#[derive(Clone)]
enum Term {
    /// The entity must hold `tag`; the payload appears in the row unless
    /// `include` is false.
    Has { tag: TypeTag, include: bool },
    /// The entity must hold at least one of `tags`; the first held tag in
    /// declaration order supplies the row outcome.
    AnyOf { tags: Vec<TypeTag> },
}

/// The projection applied to a row before it enters the visible result.
pub(crate) type MapFn = Rc<dyn Fn(QueryRow) -> QueryRow>;

/// A declarative query over component tags.
///
/// Built fluently and handed to the world, which compiles it once and keeps
/// its live result list up to date from then on:
///
/// ```ignore
/// let movers = world.create_query(
///     QueryDescriptor::new().with_entity().has("position").has("velocity"),
/// );
/// ```
#[derive(Clone, Default)]
pub struct QueryDescriptor {
    terms: Vec<Term>,
    include_entity: bool,
    map: Option<MapFn>,
}

impl QueryDescriptor {
    /// An empty declaration. With no terms added it matches every entity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires `tag`; its payload is included in the row.
    pub fn has(mut self, tag: impl Into<TypeTag>) -> Self {
        self.terms.push(Term::Has {
            tag: tag.into(),
            include: true,
        });
        self
    }

    /// Requires `tag` without including its payload in the row
    /// (the `include: false` form of a `has` term).
    pub fn filter(mut self, tag: impl Into<TypeTag>) -> Self {
        self.terms.push(Term::Has {
            tag: tag.into(),
            include: false,
        });
        self
    }

    /// Requires at least one of `tags`. The row outcome for this term is
    /// the payload of the first tag, in the order given here, that the
    /// entity holds.
    pub fn any_of<T: Into<TypeTag>>(mut self, tags: impl IntoIterator<Item = T>) -> Self {
        self.terms.push(Term::AnyOf {
            tags: tags.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Prepends the entity identifier to each row. The identifier occupies
    /// the first position regardless of where the terms were declared.
    pub fn with_entity(mut self) -> Self {
        self.include_entity = true;
        self
    }

    /// Applies `map` to each row before it enters the visible result.
    pub fn map(mut self, map: impl Fn(QueryRow) -> QueryRow + 'static) -> Self {
        self.map = Some(Rc::new(map));
        self
    }

    /// Every tag the declaration references, deduplicated, in declaration
    /// order. Declaring a tag no entity ever holds is legitimate — the
    /// query simply never matches through it.
    pub(crate) fn referenced_tags(&self) -> Vec<TypeTag> {
        let mut tags = Vec::new();
        let mut push = |tag: &TypeTag| {
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        };
        for term in &self.terms {
            match term {
                Term::Has { tag, .. } => push(tag),
                Term::AnyOf { tags } => tags.iter().for_each(&mut push),
            }
        }
        tags
    }

    /// Compiles the predicate. The bitmask form is chosen whenever every
    /// referenced tag is numeric; otherwise the tag-set form is used. The
    /// two are semantically identical.
    pub(crate) fn compile(&self) -> Matcher {
        let all_numeric = self.referenced_tags().iter().all(|t| t.bit().is_some());
        if all_numeric {
            let mut all = TagBitset::new();
            let mut any = Vec::new();
            for term in &self.terms {
                match term {
                    Term::Has { tag, .. } => {
                        // Numeric by the check above.
                        all.set(tag.bit().expect("numeric tag"));
                    }
                    Term::AnyOf { tags } => {
                        let mut alternatives = TagBitset::new();
                        for tag in tags {
                            alternatives.set(tag.bit().expect("numeric tag"));
                        }
                        any.push(alternatives);
                    }
                }
            }
            Matcher::Mask { all, any }
        } else {
            let mut all = Vec::new();
            let mut any = Vec::new();
            for term in &self.terms {
                match term {
                    Term::Has { tag, .. } => all.push(tag.clone()),
                    Term::AnyOf { tags } => any.push(tags.clone()),
                }
            }
            Matcher::Tags { all, any }
        }
    }

    /// Builds the projected row for a matching entity.
    ///
    /// Position order: the entity identifier first when requested, then the
    /// included `has` payloads and `any_of` outcomes in declaration order.
    /// `filter` terms contribute nothing. The caller guarantees the entity
    /// currently satisfies the predicate.
    pub(crate) fn build_row(&self, entity: &EntityId, table: &ComponentTable) -> QueryRow {
        let mut row = Vec::new();
        if self.include_entity {
            row.push(QueryValue::Entity(entity.clone()));
        }
        for term in &self.terms {
            match term {
                Term::Has { tag, include: true } => {
                    // The predicate held, so the payload exists.
                    let handle = table
                        .get(entity, tag)
                        .expect("matching entity must hold a required tag");
                    row.push(QueryValue::Component(handle));
                }
                Term::Has { include: false, .. } => {}
                Term::AnyOf { tags } => {
                    let handle = tags
                        .iter()
                        .find_map(|tag| table.get(entity, tag))
                        .expect("matching entity must hold one any_of alternative");
                    row.push(QueryValue::Component(handle));
                }
            }
        }
        match &self.map {
            Some(map) => map(row),
            None => row,
        }
    }
}

impl fmt::Debug for QueryDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryDescriptor")
            .field("terms", &self.terms.len())
            .field("include_entity", &self.include_entity)
            .field("mapped", &self.map.is_some())
            .finish()
    }
}

/// The compiled predicate over an entity's current tag set.
pub(crate) enum Matcher {
    /// Fixed-width bitmask AND/OR; available when every referenced tag is
    /// numeric.
    Mask {
        all: TagBitset,
        any: Vec<TagBitset>,
    },
    /// Set lookups against the entity record; used when any referenced tag
    /// is a string.
    Tags {
        all: Vec<TypeTag>,
        any: Vec<Vec<TypeTag>>,
    },
}

impl Matcher {
    /// Evaluates the predicate against a single entity's record.
    pub(crate) fn matches(&self, record: &EntityRecord) -> bool {
        match self {
            Matcher::Mask { all, any } => {
                record.mask().contains_all(all)
                    && any.iter().all(|alternatives| record.mask().intersects(alternatives))
            }
            Matcher::Tags { all, any } => {
                all.iter().all(|tag| record.has(tag))
                    && any
                        .iter()
                        .all(|alternatives| alternatives.iter().any(|tag| record.has(tag)))
            }
        }
    }
}

/// One position of a query result row.
#[derive(Clone)]
pub enum QueryValue {
    /// The entity identifier (first position of `with_entity` queries).
    Entity(EntityId),
    /// A shared handle to a component payload.
    Component(ComponentRef),
}

impl QueryValue {
    /// The entity identifier, if this position holds one.
    pub fn entity(&self) -> Option<&EntityId> {
        match self {
            QueryValue::Entity(entity) => Some(entity),
            QueryValue::Component(_) => None,
        }
    }

    /// The payload handle, if this position holds one.
    pub fn handle(&self) -> Option<&ComponentRef> {
        match self {
            QueryValue::Entity(_) => None,
            QueryValue::Component(handle) => Some(handle),
        }
    }

    /// Borrows this position's payload as a `T`.
    pub fn read<T: 'static>(&self) -> Option<Ref<'_, T>> {
        self.handle().and_then(borrow_as::<T>)
    }

    /// Mutably borrows this position's payload as a `T`.
    pub fn write<T: 'static>(&self) -> Option<RefMut<'_, T>> {
        self.handle().and_then(borrow_mut_as::<T>)
    }
}

impl fmt::Debug for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryValue::Entity(entity) => write!(f, "Entity({entity})"),
            QueryValue::Component(_) => write!(f, "Component(..)"),
        }
    }
}

/// A projected result row: the entity identifier (when requested) followed
/// by the matched component payloads in declaration order.
pub type QueryRow = Vec<QueryValue>;
