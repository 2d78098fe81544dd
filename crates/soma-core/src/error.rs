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

//! The error taxonomy shared by every runtime layer.
//!
//! All variants carry the identifying context (entity id, tag, resource key,
//! bundle or query name) needed to locate the offending call. The runtime
//! fails fast: none of these conditions is silently absorbed or retried.

use crate::ecs::EntityId;
use crate::event::EventKind;
use thiserror::Error;

/// An error raised by a world mutation or lookup.
#[derive(Debug, Error)]
pub enum WorldError {
    /// The operation targeted an identifier that was never spawned or has
    /// already been despawned. The world never creates an entity as a side
    /// effect of another operation.
    #[error("unknown entity `{entity}`")]
    UnknownEntity {
        /// The identifier the caller used.
        entity: EntityId,
    },

    /// `spawn` was called with an identifier that is still alive.
    #[error("entity `{entity}` is already spawned")]
    DuplicateSpawn {
        /// The live identifier.
        entity: EntityId,
    },

    /// A resource was read before any writer set it.
    #[error("resource `{key}` has not been set")]
    MissingResource {
        /// The resource key.
        key: String,
    },

    /// A typed resource read found a value of a different type under the key.
    #[error("resource `{key}` holds a value of a different type")]
    ResourceTypeMismatch {
        /// The resource key.
        key: String,
    },

    /// `spawn_bundle` named a bundle that was never registered.
    #[error("bundle `{name}` has not been registered")]
    UnknownBundle {
        /// The bundle name.
        name: String,
    },

    /// A named-query lookup found nothing under the name.
    #[error("no query registered under the name `{name}`")]
    UnknownQuery {
        /// The query name.
        name: String,
    },

    /// A lifecycle listener returned an error; the triggering mutation is
    /// considered failed and nothing is retried.
    #[error("{kind} handler failed for entity `{entity}`")]
    Handler {
        /// The event kind whose handler failed.
        kind: EventKind,
        /// The entity the event described.
        entity: EntityId,
        /// The listener's error.
        #[source]
        source: anyhow::Error,
    },
}
