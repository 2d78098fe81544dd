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

use crate::ecs::{EntityId, TypeTag};
use crate::error::WorldError;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// The kind of a lifecycle notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// An entity was created.
    Spawn,
    /// An entity was destroyed (after its components were removed).
    Despawn,
    /// A component was stored on an entity (including replacement).
    AddComponent,
    /// A component was removed from an entity.
    RemoveComponent,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Spawn => "spawn",
            EventKind::Despawn => "despawn",
            EventKind::AddComponent => "add-component",
            EventKind::RemoveComponent => "remove-component",
        };
        write!(f, "{name}")
    }
}

/// A lifecycle notification describing the affected entity and, for the
/// component events, the component tag involved.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldEvent {
    /// What happened.
    pub kind: EventKind,
    /// The entity the mutation applied to.
    pub entity: EntityId,
    /// The component tag for `AddComponent`/`RemoveComponent`; `None` for
    /// the entity-level events.
    pub tag: Option<TypeTag>,
}

impl WorldEvent {
    /// A `Spawn` notification for `entity`.
    pub fn spawned(entity: EntityId) -> Self {
        Self {
            kind: EventKind::Spawn,
            entity,
            tag: None,
        }
    }

    /// A `Despawn` notification for `entity`.
    pub fn despawned(entity: EntityId) -> Self {
        Self {
            kind: EventKind::Despawn,
            entity,
            tag: None,
        }
    }

    /// An `AddComponent` notification for `entity`/`tag`.
    pub fn component_added(entity: EntityId, tag: TypeTag) -> Self {
        Self {
            kind: EventKind::AddComponent,
            entity,
            tag: Some(tag),
        }
    }

    /// A `RemoveComponent` notification for `entity`/`tag`.
    pub fn component_removed(entity: EntityId, tag: TypeTag) -> Self {
        Self {
            kind: EventKind::RemoveComponent,
            entity,
            tag: Some(tag),
        }
    }
}

/// A user-registered lifecycle listener.
///
/// Handlers run synchronously at the point of mutation, after the live query
/// indices have been brought up to date. A handler error is fatal for the
/// triggering call and propagates to its caller.
pub type EventHandler = Box<dyn FnMut(&WorldEvent) -> anyhow::Result<()>>;

/// Registers lifecycle handlers and dispatches events to them in
/// registration order.
///
/// Unlike a channel-based bus, dispatch here is a plain synchronous call
/// chain: `emit` returns only after every handler for the event kind has
/// run, so callers observe listener side effects immediately.
#[derive(Default)]
pub struct EventBus {
    handlers: HashMap<EventKind, Vec<Rc<RefCell<EventHandler>>>>,
}

impl EventBus {
    /// Creates a new bus with no handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `kind`. Handlers for a kind run in
    /// registration order.
    pub fn on(&mut self, kind: EventKind, handler: EventHandler) {
        log::trace!("Registering {kind} handler.");
        self.handlers
            .entry(kind)
            .or_default()
            .push(Rc::new(RefCell::new(handler)));
    }

    /// Dispatches `event` to every handler registered for its kind.
    ///
    /// The handler list is snapshotted before dispatch, so a handler that
    /// registers further handlers does not affect the in-flight emission.
    pub fn emit(&self, event: &WorldEvent) -> Result<(), WorldError> {
        let Some(list) = self.handlers.get(&event.kind) else {
            return Ok(());
        };
        log::trace!(
            "Emitting {} for entity `{}` to {} handler(s).",
            event.kind,
            event.entity,
            list.len()
        );
        let snapshot: Vec<_> = list.to_vec();
        for handler in snapshot {
            let mut handler = handler.borrow_mut();
            (*handler)(event).map_err(|source| WorldError::Handler {
                kind: event.kind,
                entity: event.entity.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Number of handlers registered for `kind`.
    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }
}
