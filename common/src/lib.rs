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

//! Banditry Common Types
//!
//! This crate defines the value types exchanged between the cognition engine and
//! the host world:
//! - Geometry primitives (Vec3)
//! - The per-tick combat context snapshot produced by the sensing collaborator
//! - The decision handed to the actuation collaborator

pub mod context;
pub mod decision;
pub mod geometry;

pub use context::{AllySighting, CombatContext, CombatantId, OpponentSighting, SelfStatus, Stance};
pub use decision::{ActionType, Decision, Movement};
pub use geometry::Vec3;
