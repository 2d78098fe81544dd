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

use std::time::{Duration, Instant};

/// Measures the delta time handed to every non-startup system.
///
/// `tick` is called exactly once per frame cycle; every system in that
/// cycle observes the same delta.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
}

impl FrameClock {
    /// Starts the clock; the first `tick` measures from here.
    #[inline]
    pub fn start() -> Self {
        Self {
            last: Instant::now(),
        }
    }

    /// Returns the wall-clock time elapsed since the previous tick (or
    /// since `start`) and resets the reference point.
    #[inline]
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let delta = now.duration_since(self.last);
        self.last = now;
        delta
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::start()
    }
}
