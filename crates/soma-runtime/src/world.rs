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

//! The world façade: one owned instance composing the component table, the
//! live query index, the resource store, the event bus, and the scheduler.
//!
//! Every mutation follows the same sequence: the table changes first, the
//! live indices are reconciled second, and user event handlers run last.
//! A handler therefore always observes query results consistent with the
//! mutation it is being told about.

use crate::clock::FrameClock;
use crate::driver::{FixedFrames, FrameDriver};
use crate::plugin::{BundleFn, Plugin, Registration};
use crate::schedule::{stage_plan, Scheduler, Stage, SystemDescriptor, SystemFn, SystemRecord};
use anyhow::Context;
use soma_core::{EntityId, EventBus, EventKind, TypeTag, WorldError, WorldEvent};
use soma_data::ecs::{
    Component, ComponentRef, ComponentTable, LiveIndex, QueryDescriptor, QueryId, QueryRow,
};
use soma_data::ResourceStore;
use std::cell::{Ref, RefMut};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

/// The single object a host owns and passes around explicitly. There is no
/// process-global instance; tests build as many worlds as they like.
#[derive(Default)]
pub struct World {
    table: ComponentTable,
    index: LiveIndex,
    resources: ResourceStore,
    bus: EventBus,
    scheduler: Scheduler,
    bundles: HashMap<String, BundleFn>,
    named_queries: HashMap<String, QueryId>,
    /// Startup systems run at most once per world, on the first run call.
    startup_complete: bool,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Entities and components ---

    /// Spawns `entity` with the given components.
    ///
    /// Emits one `Spawn` event, then one `AddComponent` event per component
    /// in the order given. Fails fast on a duplicate identifier.
    pub fn spawn(
        &mut self,
        entity: impl Into<EntityId>,
        components: Vec<Component>,
    ) -> Result<(), WorldError> {
        let entity = entity.into();
        self.table.create_entity(entity.clone())?;
        self.index.on_spawned(&entity, &self.table);
        self.bus.emit(&WorldEvent::spawned(entity.clone()))?;
        for component in components {
            self.add_component(&entity, component)?;
        }
        Ok(())
    }

    /// Spawns `entity` from the named bundle's component set, then applies
    /// `extra` on top (replace-on-insert lets `extra` override a bundle
    /// component with the same tag).
    pub fn spawn_bundle(
        &mut self,
        entity: impl Into<EntityId>,
        bundle: &str,
        extra: Vec<Component>,
    ) -> Result<(), WorldError> {
        let factory = self
            .bundles
            .get(bundle)
            .cloned()
            .ok_or_else(|| WorldError::UnknownBundle {
                name: bundle.to_string(),
            })?;
        let mut components = factory();
        components.extend(extra);
        self.spawn(entity, components)
    }

    /// Stores or replaces a component on a live entity.
    ///
    /// The live indices are reconciled before the `AddComponent` event
    /// fires; replacement re-projects the entity's rows in place.
    pub fn add_component(
        &mut self,
        entity: &EntityId,
        component: Component,
    ) -> Result<(), WorldError> {
        let tag = component.tag().clone();
        self.table.insert(entity, component)?;
        self.index.on_tag_changed(entity, &tag, &self.table);
        self.bus
            .emit(&WorldEvent::component_added(entity.clone(), tag))?;
        Ok(())
    }

    /// Removes a component from a live entity.
    ///
    /// Idempotent: removing a tag the entity does not hold is an `Ok` no-op
    /// and fires no event. Returns whether a payload was actually removed.
    pub fn remove_component(
        &mut self,
        entity: &EntityId,
        tag: &TypeTag,
    ) -> Result<bool, WorldError> {
        if !self.table.remove(entity, tag)? {
            return Ok(false);
        }
        self.index.on_tag_changed(entity, tag, &self.table);
        self.bus
            .emit(&WorldEvent::component_removed(entity.clone(), tag.clone()))?;
        Ok(true)
    }

    /// Destroys a live entity.
    ///
    /// Its components are removed one by one first — each removal retracts
    /// the entity from the affected queries and fires its `RemoveComponent`
    /// event — then the entity record is dropped and a single `Despawn`
    /// event fires.
    pub fn despawn(&mut self, entity: &EntityId) -> Result<(), WorldError> {
        for tag in self.table.tags_of(entity)? {
            self.remove_component(entity, &tag)?;
        }
        self.table.retire_entity(entity)?;
        self.index.on_despawned(entity);
        self.bus.emit(&WorldEvent::despawned(entity.clone()))?;
        Ok(())
    }

    /// Returns true if `entity` is currently alive.
    pub fn is_alive(&self, entity: &EntityId) -> bool {
        self.table.contains(entity)
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.table.entity_count()
    }

    /// The payload handle for (`entity`, `tag`), or `None` when absent.
    pub fn component(&self, entity: &EntityId, tag: &TypeTag) -> Option<ComponentRef> {
        self.table.get(entity, tag)
    }

    /// Returns true if `entity` is alive and holds `tag`.
    pub fn has_component(&self, entity: &EntityId, tag: &TypeTag) -> bool {
        self.table.has(entity, tag)
    }

    /// Registers a named spawn bundle, replacing any previous factory under
    /// the same name.
    pub fn register_bundle(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn() -> Vec<Component> + 'static,
    ) {
        let name = name.into();
        log::debug!("Registering bundle `{name}`.");
        self.bundles.insert(name, Rc::new(factory));
    }

    // --- Queries ---

    /// Compiles a query and seeds its live result list from the current
    /// world contents. The returned id stays valid for the world's lifetime.
    pub fn create_query(&mut self, descriptor: QueryDescriptor) -> QueryId {
        self.index.register(descriptor, &self.table)
    }

    /// Compiles a query under a name systems can look up at run time.
    pub fn register_named_query(
        &mut self,
        name: impl Into<String>,
        descriptor: QueryDescriptor,
    ) -> QueryId {
        let id = self.create_query(descriptor);
        self.named_queries.insert(name.into(), id);
        id
    }

    /// Looks up a query registered under `name`.
    pub fn named_query(&self, name: &str) -> Result<QueryId, WorldError> {
        self.named_queries
            .get(name)
            .copied()
            .ok_or_else(|| WorldError::UnknownQuery {
                name: name.to_string(),
            })
    }

    /// A snapshot of the query's current rows, in insertion order among the
    /// matching entities. Mutations made while iterating the snapshot
    /// surface in the next snapshot; payload mutation through the handles
    /// is visible immediately.
    pub fn rows(&self, query: QueryId) -> Vec<QueryRow> {
        self.index.rows(query)
    }

    /// Number of entities currently matching the query.
    pub fn row_count(&self, query: QueryId) -> usize {
        self.index.row_count(query)
    }

    /// Returns true if `entity` currently matches the query.
    pub fn query_contains(&self, query: QueryId, entity: &EntityId) -> bool {
        self.index.contains(query, entity)
    }

    // --- Resources ---

    /// Stores a resource value under `key`, replacing any previous value.
    pub fn set_resource<T: 'static>(&mut self, key: impl Into<String>, value: T) {
        self.resources.set(key, value);
    }

    /// Borrows the resource under `key`. Fails fast when the key was never
    /// set or holds a different type.
    pub fn resource<T: 'static>(&self, key: &str) -> Result<Ref<'_, T>, WorldError> {
        self.resources.read(key)
    }

    /// Mutably borrows the resource under `key`.
    pub fn resource_mut<T: 'static>(&self, key: &str) -> Result<RefMut<'_, T>, WorldError> {
        self.resources.write(key)
    }

    /// Returns true if a resource has been set under `key`.
    pub fn has_resource(&self, key: &str) -> bool {
        self.resources.contains(key)
    }

    // --- Events ---

    /// Registers a lifecycle handler for `kind`. Handlers run synchronously
    /// at the point of mutation, after the live indices are up to date, in
    /// registration order.
    pub fn on(
        &mut self,
        kind: EventKind,
        handler: impl FnMut(&WorldEvent) -> anyhow::Result<()> + 'static,
    ) {
        self.bus.on(kind, Box::new(handler));
    }

    // --- Systems and plugins ---

    /// Registers a system. A system registered while a run is in progress
    /// joins the schedule at the end of the current frame.
    pub fn register_system(
        &mut self,
        descriptor: SystemDescriptor,
        run: impl FnMut(&mut World, Duration) -> anyhow::Result<()> + 'static,
    ) {
        self.scheduler.register(descriptor, Box::new(run));
    }

    /// Registers a batch of systems in order.
    pub fn register_systems(&mut self, systems: Vec<(SystemDescriptor, SystemFn)>) {
        for (descriptor, run) in systems {
            self.scheduler.register(descriptor, run);
        }
    }

    /// Builds each plugin in order and applies its registration. A plugin
    /// sees the world as already composed by the plugins before it.
    pub async fn register_plugins(
        &mut self,
        plugins: Vec<Box<dyn Plugin>>,
    ) -> anyhow::Result<()> {
        for plugin in plugins {
            log::info!("Registering plugin `{}`.", plugin.name());
            let registration = plugin
                .build(self)
                .await
                .with_context(|| format!("plugin `{}` failed to build", plugin.name()))?;
            self.apply(registration);
        }
        Ok(())
    }

    /// Applies a registration descriptor: resources, bundles, event
    /// handlers, named queries, then systems.
    pub fn apply(&mut self, registration: Registration) {
        for (key, install) in registration.resources {
            log::trace!("Installing plugin resource `{key}`.");
            install(&mut self.resources);
        }
        for (name, factory) in registration.bundles {
            log::debug!("Registering bundle `{name}`.");
            self.bundles.insert(name, factory);
        }
        for (kind, handler) in registration.handlers {
            self.bus.on(kind, handler);
        }
        for (name, descriptor) in registration.queries {
            self.register_named_query(name, descriptor);
        }
        for (descriptor, run) in registration.systems {
            self.scheduler.register(descriptor, run);
        }
    }

    // --- Running ---

    /// Runs the startup stage (first call only) and exactly one frame cycle.
    pub fn run_once(&mut self) -> anyhow::Result<()> {
        self.run_loop(&mut FixedFrames::new(1))
    }

    /// Runs the startup stage (first call only), then one frame cycle per
    /// frame the driver schedules. Returns when the driver declines the
    /// next frame or a system fails.
    pub fn run_loop(&mut self, driver: &mut dyn FrameDriver) -> anyhow::Result<()> {
        let mut systems = self.scheduler.take_systems();
        let result = self.execute(&mut systems, driver);
        // Systems must survive a failed run; restore before propagating.
        self.scheduler.restore(systems);
        result
    }

    fn execute(
        &mut self,
        systems: &mut Vec<SystemRecord>,
        driver: &mut dyn FrameDriver,
    ) -> anyhow::Result<()> {
        if !self.startup_complete {
            self.startup_complete = true;
            self.run_stage(systems, Stage::Startup, Duration::ZERO)?;
            systems.extend(self.scheduler.take_systems());
        }
        let mut clock = FrameClock::start();
        while driver.next_frame() {
            let delta = clock.tick();
            for stage in Stage::CYCLE {
                self.run_stage(systems, stage, delta)?;
            }
            // Systems registered during the frame join for the next one.
            systems.extend(self.scheduler.take_systems());
        }
        Ok(())
    }

    fn run_stage(
        &mut self,
        systems: &mut [SystemRecord],
        stage: Stage,
        delta: Duration,
    ) -> anyhow::Result<()> {
        for i in stage_plan(systems, stage) {
            let record = &mut systems[i];
            log::trace!("Running {stage} system `{}`.", record.descriptor.name);
            (record.run)(self, delta).with_context(|| {
                format!(
                    "system `{}` failed in the {stage} stage",
                    record.descriptor.name
                )
            })?;
        }
        Ok(())
    }
}
