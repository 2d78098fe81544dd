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

//! The Soma runtime layer: stage scheduling, plugin composition, and the
//! [`World`] façade every other subsystem holds.
//!
//! A caller builds a world, registers plugins (which bundle systems,
//! queries, resources, bundles, and event handlers into one deferred
//! [`Registration`]), registers any further systems directly, and
//! calls [`World::run_once`] or [`World::run_loop`]. Startup systems run
//! once; every following frame executes the fixed
//! before-update → update → after-update → render cycle with a single
//! delta-time measurement per frame.

mod clock;
mod driver;
mod plugin;
mod schedule;
mod world;

pub use clock::FrameClock;
pub use driver::{FixedFrames, FrameDriver};
pub use plugin::{Plugin, Registration};
pub use schedule::{Scheduler, Stage, SystemDescriptor, SystemFn};
pub use world::World;

pub mod prelude {
    //! Everything a typical consumer needs in scope.
    pub use crate::{FixedFrames, FrameDriver, Plugin, Registration, Stage, SystemDescriptor, World};
    pub use soma_core::{EntityId, EventKind, TypeTag, WorldError, WorldEvent};
    pub use soma_data::ecs::{
        borrow_as, borrow_mut_as, Component, ComponentRef, QueryDescriptor, QueryId, QueryRow,
        QueryValue,
    };
}
