//
// Copyright 2025-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! ECS Components
//!
//! Cognitive state owned per combatant, plus the host-side components of the
//! reference arena.

mod arena;
mod brain;
mod neuron;
mod regulator;

// Re-export all components
pub use arena::*;
pub use brain::*;
pub use neuron::*;
pub use regulator::*;

/// Clamp to the unit interval, collapsing NaN to zero
pub(crate) fn saturate(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
