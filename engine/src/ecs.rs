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

//! Entity Component System (ECS) module
//!
//! Components hold cognitive state (neurons, brains, the regulator) and the
//! reference arena's host data; systems hold the combat engine, the tick
//! orchestrator and the arena's sensing/actuation.

pub use hecs::{Entity, World};

/// Type alias for hecs runtime entity handles (non-persistent, memory-only)
/// This is NOT the same as the persistent CombatantId
pub type EcsEntity = Entity;

/// Type alias for the reference arena world
pub type ArenaWorld = World;

pub mod boundary;
pub mod components;
pub mod events;
pub mod knowledge;
pub mod registry;
pub mod systems;

pub use boundary::{Actuator, Sensor};
pub use knowledge::CollectiveKnowledge;
pub use registry::EntityRegistry;
