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

//! Staged system registration and per-stage execution planning.

use crate::world::World;
use std::fmt;
use std::mem;
use std::time::Duration;

/// The phase a system runs in.
///
/// `Startup` runs exactly once before the first frame; the remaining stages
/// form the per-frame cycle, always in the order listed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Once, before the first frame cycle.
    Startup,
    /// First stage of every frame.
    BeforeUpdate,
    /// Main per-frame stage.
    Update,
    /// After the update stage, before rendering.
    AfterUpdate,
    /// Last stage of every frame.
    Render,
}

impl Stage {
    /// The per-frame stages, in execution order.
    pub const CYCLE: [Stage; 4] = [
        Stage::BeforeUpdate,
        Stage::Update,
        Stage::AfterUpdate,
        Stage::Render,
    ];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Startup => "startup",
            Stage::BeforeUpdate => "before-update",
            Stage::Update => "update",
            Stage::AfterUpdate => "after-update",
            Stage::Render => "render",
        };
        write!(f, "{name}")
    }
}

/// A system callback. Receives the world and the frame's delta time
/// (zero for startup systems).
pub type SystemFn = Box<dyn FnMut(&mut World, Duration) -> anyhow::Result<()>>;

/// Placement of a system: a name for logs and errors, the stage it belongs
/// to, and an explicit order value within that stage (ascending; ties run
/// in registration order).
#[derive(Debug, Clone)]
pub struct SystemDescriptor {
    pub name: String,
    pub stage: Stage,
    pub order: i32,
}

impl SystemDescriptor {
    /// A descriptor with the default order of 0.
    pub fn new(name: impl Into<String>, stage: Stage) -> Self {
        Self {
            name: name.into(),
            stage,
            order: 0,
        }
    }

    /// Sets the explicit in-stage order.
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }
}

pub(crate) struct SystemRecord {
    pub(crate) descriptor: SystemDescriptor,
    /// Global registration sequence number, the tie-breaker for equal
    /// order values.
    pub(crate) seq: u64,
    pub(crate) run: SystemFn,
}

/// Holds every registered system and hands the world an execution plan
/// per stage.
#[derive(Default)]
pub struct Scheduler {
    systems: Vec<SystemRecord>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a system. Position within its stage is fixed at this
    /// point: (order, registration sequence) ascending.
    pub fn register(&mut self, descriptor: SystemDescriptor, run: SystemFn) {
        log::debug!(
            "Registering system `{}` in {} stage (order {}).",
            descriptor.name,
            descriptor.stage,
            descriptor.order
        );
        let seq = self.next_seq;
        self.next_seq += 1;
        self.systems.push(SystemRecord {
            descriptor,
            seq,
            run,
        });
    }

    /// Total number of registered systems.
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Number of systems registered for `stage`.
    pub fn count_in_stage(&self, stage: Stage) -> usize {
        self.systems
            .iter()
            .filter(|s| s.descriptor.stage == stage)
            .count()
    }

    /// Moves the system list out so the world can run systems while lending
    /// them `&mut self`. The sequence counter stays, so systems registered
    /// mid-run keep globally consistent tie-breaking.
    pub(crate) fn take_systems(&mut self) -> Vec<SystemRecord> {
        mem::take(&mut self.systems)
    }

    /// Returns a previously taken system list. Systems registered while the
    /// list was out (pushed onto `self.systems` in the meantime) are kept;
    /// execution order is derived from sort keys, not vector order.
    pub(crate) fn restore(&mut self, mut systems: Vec<SystemRecord>) {
        let newcomers = mem::take(&mut self.systems);
        systems.extend(newcomers);
        self.systems = systems;
    }
}

/// Indices of the systems belonging to `stage`, sorted by
/// (order, registration sequence) ascending.
pub(crate) fn stage_plan(systems: &[SystemRecord], stage: Stage) -> Vec<usize> {
    let mut plan: Vec<usize> = (0..systems.len())
        .filter(|&i| systems[i].descriptor.stage == stage)
        .collect();
    plan.sort_by_key(|&i| (systems[i].descriptor.order, systems[i].seq));
    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> SystemFn {
        Box::new(|_, _| Ok(()))
    }

    fn names<'a>(systems: &'a [SystemRecord], plan: &[usize]) -> Vec<&'a str> {
        plan.iter()
            .map(|&i| systems[i].descriptor.name.as_str())
            .collect()
    }

    #[test]
    fn plan_sorts_by_order_ascending() {
        let mut scheduler = Scheduler::new();
        scheduler.register(
            SystemDescriptor::new("late", Stage::Update).with_order(5),
            noop(),
        );
        scheduler.register(
            SystemDescriptor::new("early", Stage::Update).with_order(1),
            noop(),
        );

        let systems = scheduler.take_systems();
        assert_eq!(names(&systems, &stage_plan(&systems, Stage::Update)), [
            "early", "late"
        ]);
    }

    #[test]
    fn equal_orders_fall_back_to_registration_order() {
        let mut scheduler = Scheduler::new();
        for name in ["a", "b", "c"] {
            scheduler.register(SystemDescriptor::new(name, Stage::Render), noop());
        }

        let systems = scheduler.take_systems();
        assert_eq!(names(&systems, &stage_plan(&systems, Stage::Render)), [
            "a", "b", "c"
        ]);
    }

    #[test]
    fn plans_are_scoped_to_one_stage() {
        let mut scheduler = Scheduler::new();
        scheduler.register(SystemDescriptor::new("update", Stage::Update), noop());
        scheduler.register(SystemDescriptor::new("render", Stage::Render), noop());
        scheduler.register(SystemDescriptor::new("startup", Stage::Startup), noop());

        let systems = scheduler.take_systems();
        assert_eq!(
            names(&systems, &stage_plan(&systems, Stage::Update)),
            ["update"]
        );
        assert_eq!(
            names(&systems, &stage_plan(&systems, Stage::Startup)),
            ["startup"]
        );
        assert!(stage_plan(&systems, Stage::BeforeUpdate).is_empty());
    }

    #[test]
    fn restore_keeps_systems_registered_while_the_list_was_out() {
        let mut scheduler = Scheduler::new();
        scheduler.register(SystemDescriptor::new("original", Stage::Update), noop());

        let taken = scheduler.take_systems();
        scheduler.register(SystemDescriptor::new("newcomer", Stage::Update), noop());
        scheduler.restore(taken);

        assert_eq!(scheduler.system_count(), 2);
        // The newcomer's seq continued the global sequence.
        let systems = scheduler.take_systems();
        assert_eq!(names(&systems, &stage_plan(&systems, Stage::Update)), [
            "original", "newcomer"
        ]);
    }
}
