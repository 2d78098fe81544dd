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

//! Defines core types related to entities in the ECS architecture.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A unique identifier for an entity in the world.
///
/// Identity is caller-issued rather than allocated by the runtime: a caller
/// spawns an entity under either a human-readable name or a numeric index,
/// and the same identifier refers to the same entity until it is despawned.
/// The world never recycles an identifier on its own; spawning an identifier
/// that is still alive is an error, and re-spawning a despawned identifier
/// is an explicit caller decision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityId {
    /// A human-readable name chosen by the caller (e.g. `"player"`).
    Name(String),
    /// A caller-issued numeric identifier.
    Index(u64),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Name(name) => write!(f, "{name}"),
            EntityId::Index(index) => write!(f, "#{index}"),
        }
    }
}

impl From<&str> for EntityId {
    fn from(name: &str) -> Self {
        EntityId::Name(name.to_string())
    }
}

impl From<String> for EntityId {
    fn from(name: String) -> Self {
        EntityId::Name(name)
    }
}

impl From<u64> for EntityId {
    fn from(index: u64) -> Self {
        EntityId::Index(index)
    }
}
