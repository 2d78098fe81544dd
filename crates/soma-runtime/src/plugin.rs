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

//! Plugin composition: features bundle their systems, queries, resources,
//! bundles, and event handlers into one [`Registration`] the world applies
//! atomically.

use crate::schedule::{SystemDescriptor, SystemFn};
use crate::world::World;
use async_trait::async_trait;
use soma_core::{EventHandler, EventKind, WorldEvent};
use soma_data::ecs::{Component, QueryDescriptor};
use soma_data::ResourceStore;
use std::rc::Rc;
use std::time::Duration;

/// A factory producing the component set a named bundle stamps onto a
/// freshly spawned entity. Shared because the world keeps it registered
/// across spawns.
pub(crate) type BundleFn = Rc<dyn Fn() -> Vec<Component>>;

pub(crate) type ResourceInstall = Box<dyn FnOnce(&mut ResourceStore)>;

/// A unit of functionality composed into a world before the run starts.
///
/// `build` returns a descriptor rather than mutating the world directly:
/// the world applies the registrations itself, in plugin order, so a plugin
/// cannot observe a half-registered world or trigger systems early. Build
/// is async to allow awaiting asset or configuration loads; the world view
/// passed in is read-only.
#[async_trait(?Send)]
pub trait Plugin {
    /// The plugin's name for logs and error context.
    fn name(&self) -> &str;

    /// Assembles everything this plugin contributes.
    async fn build(&self, world: &World) -> anyhow::Result<Registration>;
}

/// The deferred output of a plugin build: everything the plugin wants
/// registered, applied by the world in the order the entries were added.
#[derive(Default)]
pub struct Registration {
    pub(crate) resources: Vec<(String, ResourceInstall)>,
    pub(crate) bundles: Vec<(String, BundleFn)>,
    pub(crate) handlers: Vec<(EventKind, EventHandler)>,
    pub(crate) queries: Vec<(String, QueryDescriptor)>,
    pub(crate) systems: Vec<(SystemDescriptor, SystemFn)>,
}

impl Registration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contributes a resource value under `key`.
    pub fn resource<T: 'static>(mut self, key: impl Into<String>, value: T) -> Self {
        let key = key.into();
        let install_key = key.clone();
        self.resources.push((
            key,
            Box::new(move |store| store.set(install_key, value)),
        ));
        self
    }

    /// Contributes a named spawn bundle.
    pub fn bundle(
        mut self,
        name: impl Into<String>,
        factory: impl Fn() -> Vec<Component> + 'static,
    ) -> Self {
        self.bundles.push((name.into(), Rc::new(factory)));
        self
    }

    /// Contributes a lifecycle event handler.
    pub fn handler(
        mut self,
        kind: EventKind,
        handler: impl FnMut(&WorldEvent) -> anyhow::Result<()> + 'static,
    ) -> Self {
        self.handlers.push((kind, Box::new(handler)));
        self
    }

    /// Contributes a named query, compiled when the registration is applied.
    /// Systems look it up by name at run time.
    pub fn query(mut self, name: impl Into<String>, descriptor: QueryDescriptor) -> Self {
        self.queries.push((name.into(), descriptor));
        self
    }

    /// Contributes a system.
    pub fn system(
        mut self,
        descriptor: SystemDescriptor,
        run: impl FnMut(&mut World, Duration) -> anyhow::Result<()> + 'static,
    ) -> Self {
        self.systems.push((descriptor, Box::new(run)));
        self
    }

    /// True if the registration contributes nothing.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
            && self.bundles.is_empty()
            && self.handlers.is_empty()
            && self.queries.is_empty()
            && self.systems.is_empty()
    }
}
