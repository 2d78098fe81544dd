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

//! Component type tags.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The tag identifying a component kind within a world.
///
/// An entity holds at most one component instance per tag. A tag is either a
/// string name or a small integer index; the two forms are semantically
/// identical, but numeric tags let the query compiler express a predicate as
/// a fixed-width bitmask instead of set lookups. Mixing both forms in one
/// world is allowed — queries touching any string tag simply take the
/// set-lookup path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    /// A string tag (e.g. `"position"`).
    Name(String),
    /// A small integer tag, usable as a bit index in compiled predicates.
    Index(u32),
}

impl TypeTag {
    /// Returns the bit index when this is a numeric tag.
    pub fn bit(&self) -> Option<u32> {
        match self {
            TypeTag::Name(_) => None,
            TypeTag::Index(index) => Some(*index),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Name(name) => write!(f, "{name}"),
            TypeTag::Index(index) => write!(f, "#{index}"),
        }
    }
}

impl From<&str> for TypeTag {
    fn from(name: &str) -> Self {
        TypeTag::Name(name.to_string())
    }
}

impl From<String> for TypeTag {
    fn from(name: String) -> Self {
        TypeTag::Name(name)
    }
}

impl From<u32> for TypeTag {
    fn from(index: u32) -> Self {
        TypeTag::Index(index)
    }
}
