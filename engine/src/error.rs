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

//! Error types for the cognition engine
//!
//! None of these cross the orchestrator boundary: sensing failures become a
//! skipped tick, wiring and registry errors are reported to whoever configures
//! the engine, and configuration errors only surface at startup.

use crate::ecs::components::NeuronKind;
use crate::ecs::EcsEntity;
use banditry_common::CombatantId;
use thiserror::Error;

/// Why a combat context could not be produced for a combatant
#[derive(Debug, Error)]
pub enum SenseError {
    /// The entity no longer exists in the host world
    #[error("Combatant despawned: {0}")]
    Despawned(CombatantId),

    /// The entity exists but is dead
    #[error("Combatant is dead: {0}")]
    Dead(CombatantId),

    /// Transient failure; the combatant simply skips this tick
    #[error("Sensing unavailable: {0}")]
    Unavailable(String),
}

impl SenseError {
    /// Whether the combatant is gone for good and its brain should be discarded
    pub fn is_terminal(&self) -> bool {
        matches!(self, SenseError::Despawned(_) | SenseError::Dead(_))
    }
}

/// Rejected synapse configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WiringError {
    #[error("Neuron {0} cannot synapse onto itself")]
    SelfSynapse(NeuronKind),

    #[error("Synapse {from} -> {to} has non-finite weight {weight}")]
    NonFiniteWeight {
        from: NeuronKind,
        to: NeuronKind,
        weight: f32,
    },
}

/// Identity registry conflicts
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Entity {0:?} is already registered")]
    EntityRegistered(EcsEntity),

    #[error("Combatant {0} is already registered")]
    IdRegistered(CombatantId),
}

/// Configuration loading failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to open config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}
