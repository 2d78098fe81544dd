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

//! A headless playground: a movement feature composed as a plugin, a few
//! entities, and a short fixed-frame run.

use async_trait::async_trait;
use soma_runtime::prelude::*;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Debug, Clone, Copy)]
struct Velocity {
    dx: f32,
    dy: f32,
}

struct MovementPlugin;

#[async_trait(?Send)]
impl Plugin for MovementPlugin {
    fn name(&self) -> &str {
        "movement"
    }

    async fn build(&self, _world: &World) -> anyhow::Result<Registration> {
        Ok(Registration::new()
            .bundle("mover", || {
                vec![
                    Component::new("position", Position { x: 0.0, y: 0.0 }),
                    Component::new("velocity", Velocity { dx: 1.0, dy: 0.5 }),
                ]
            })
            .query(
                "movers",
                QueryDescriptor::new()
                    .with_entity()
                    .has("position")
                    .has("velocity"),
            )
            .system(SystemDescriptor::new("integrate", Stage::Update), integrate)
            .system(
                SystemDescriptor::new("report", Stage::Render),
                |world, _| {
                    let movers = world.named_query("movers")?;
                    for row in world.rows(movers) {
                        let entity = row[0].entity().unwrap();
                        let p = row[1].read::<Position>().unwrap();
                        log::info!("`{entity}` is at ({:.2}, {:.2})", p.x, p.y);
                    }
                    Ok(())
                },
            ))
    }
}

fn integrate(world: &mut World, delta: Duration) -> anyhow::Result<()> {
    let movers = world.named_query("movers")?;
    let seconds = delta.as_secs_f32();
    for row in world.rows(movers) {
        let v = *row[2].read::<Velocity>().unwrap();
        let mut p = row[1].write::<Position>().unwrap();
        p.x += v.dx * seconds;
        p.y += v.dy * seconds;
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut world = World::new();
    world.register_plugins(vec![Box::new(MovementPlugin)]).await?;

    world.spawn_bundle("alpha", "mover", vec![])?;
    world.spawn_bundle(
        "beta",
        "mover",
        vec![Component::new("velocity", Velocity { dx: -2.0, dy: 0.0 })],
    )?;

    world.run_loop(&mut FixedFrames::new(60))?;
    Ok(())
}
