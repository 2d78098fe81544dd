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

//! Foundational types for the Soma entity-component runtime.
//!
//! This crate holds the vocabulary shared by every other layer: entity
//! identity ([`ecs::EntityId`]), component type tags ([`ecs::TypeTag`]),
//! the synchronous lifecycle [`event::EventBus`], and the [`error::WorldError`]
//! taxonomy. It deliberately contains no storage or scheduling logic.

pub mod ecs;
pub mod error;
pub mod event;

pub use ecs::{EntityId, TypeTag};
pub use error::WorldError;
pub use event::{EventBus, EventHandler, EventKind, WorldEvent};
