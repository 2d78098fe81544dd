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

//! The host-environment boundary that drives the frame loop.

/// Supplies the per-frame callback of the host environment.
///
/// The runtime has no internal stop API: a looping run continues exactly as
/// long as the host schedules another frame. A windowed host would return
/// `true` from its redraw pump until the window closes; tests and headless
/// tools use [`FixedFrames`].
pub trait FrameDriver {
    /// Returns true to schedule one more frame cycle. The driver may block
    /// (e.g. on vsync) before answering.
    fn next_frame(&mut self) -> bool;
}

/// A headless driver scheduling a fixed number of frames back to back.
#[derive(Debug, Clone)]
pub struct FixedFrames {
    remaining: u64,
}

impl FixedFrames {
    /// Schedules exactly `frames` cycles.
    pub fn new(frames: u64) -> Self {
        Self { remaining: frames }
    }
}

impl FrameDriver for FixedFrames {
    fn next_frame(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}
