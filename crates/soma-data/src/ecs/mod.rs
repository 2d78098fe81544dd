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

//! The tag-keyed component store and the query engine built on top of it.
//!
//! Storage here is archetype-free: each component tag owns one appendable
//! column of slots, and an entity record maps its tags to slots. Queries are
//! compiled once — into either a bitmask predicate (all-numeric tags) or a
//! tag-set predicate — and their result lists are maintained incrementally
//! by the [`LiveIndex`] as entities mutate. A mutation only re-evaluates the
//! queries that reference the changed tag, never the whole table.

mod bitset;
mod component;
mod index;
mod query;
mod table;

pub use bitset::TagBitset;
pub use component::{borrow_as, borrow_mut_as, Component, ComponentRef};
pub use index::{LiveIndex, QueryId};
pub use query::{QueryDescriptor, QueryRow, QueryValue};
pub use table::{ComponentTable, InsertOutcome};

#[cfg(test)]
mod tests;
