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

//! Collective knowledge shared by every hostile combatant
//!
//! One bandit's experience reaches its peers through this service rather than
//! through direct references: ally deaths raise population fear and mark the
//! killer as dangerous, discovered weaknesses embolden everyone. It is injected
//! as `Arc<CollectiveKnowledge>` into every reader and writer.
//!
//! # Concurrency
//!
//! Event handlers may write from a different execution context than the tick
//! loop. Profiles live in a `DashMap` (sharded, internally synchronised) and the
//! two global biases are `f32` bit patterns in atomics, so readers never block
//! on a writer. Bias reads may be slightly stale; that is acceptable.

use crate::config::KnowledgeConfig;
use crate::ecs::components::saturate;
use banditry_common::CombatantId;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};

/// What the population has learned about one opponent
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OpponentProfile {
    /// Decaying danger estimate, never negative
    pub danger: f32,
    pub preferred_weapon: Option<String>,
    pub weakness: Option<String>,
    /// Bandits this opponent has killed
    pub kills: u32,
}

/// Population-wide mood, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GlobalBiases {
    pub aggression: f32,
    pub fear: f32,
}

/// Lock-free `f32` cell
#[derive(Debug, Default)]
struct AtomicF32(AtomicU32);

impl AtomicF32 {
    fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Acquire))
    }

    /// Apply `f` atomically; the result is clamped to [0, 1]
    fn update(&self, f: impl Fn(f32) -> f32) -> f32 {
        let previous = self
            .0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                Some(saturate(f(f32::from_bits(bits))).to_bits())
            })
            .unwrap_or_else(|bits| bits);
        saturate(f(f32::from_bits(previous)))
    }
}

#[derive(Debug)]
pub struct CollectiveKnowledge {
    profiles: DashMap<CombatantId, OpponentProfile>,
    aggression_bias: AtomicF32,
    fear_bias: AtomicF32,
    config: KnowledgeConfig,
}

impl CollectiveKnowledge {
    pub fn new(config: KnowledgeConfig) -> Self {
        Self {
            profiles: DashMap::new(),
            aggression_bias: AtomicF32::default(),
            fear_bias: AtomicF32::default(),
            config,
        }
    }

    /// Record a weakness spotted on `opponent` and embolden the population
    pub fn update_global_tactics(&self, opponent: CombatantId, weakness: impl Into<String>) {
        let weakness = weakness.into();
        tracing::debug!(%opponent, %weakness, "Weakness shared with the population");
        self.profiles.entry(opponent).or_default().weakness = Some(weakness);
        let gain = self.config.aggression_per_weakness;
        self.aggression_bias.update(|bias| bias + gain);
    }

    /// An ally fell to `killer`, `distance` away from the pack
    pub fn report_ally_death(&self, killer: CombatantId, distance: f32, weapon: Option<&str>) {
        let radius = self.config.alarm_radius.max(f32::EPSILON);
        let proximity = saturate(1.0 - distance / radius);
        let fear_gain = self.config.fear_per_death * proximity;
        let fear = self.fear_bias.update(|bias| bias + fear_gain);

        let mut profile = self.profiles.entry(killer).or_default();
        profile.danger = (profile.danger + self.config.danger_per_kill).max(0.0);
        profile.kills = profile.kills.saturating_add(1);
        if let Some(weapon) = weapon {
            profile.preferred_weapon = Some(weapon.to_string());
        }
        tracing::debug!(
            %killer,
            distance,
            danger = profile.danger,
            fear_bias = fear,
            "Ally death reported"
        );
    }

    /// Decay every danger level and both biases by one step
    ///
    /// Call on a fixed cadence, never once per combatant.
    pub fn tick(&self) {
        let decay = saturate(self.config.decay);
        for mut profile in self.profiles.iter_mut() {
            profile.danger = (profile.danger * decay).max(0.0);
        }
        self.aggression_bias.update(|bias| bias * decay);
        self.fear_bias.update(|bias| bias * decay);

        if let Some(floor) = self.config.evict_below {
            self.profiles
                .retain(|_, profile| profile.danger >= floor || profile.weakness.is_some());
        }
    }

    pub fn biases(&self) -> GlobalBiases {
        GlobalBiases {
            aggression: self.aggression_bias.load(),
            fear: self.fear_bias.load(),
        }
    }

    /// Danger of `opponent`, zero when unknown
    pub fn danger_of(&self, opponent: CombatantId) -> f32 {
        self.profiles.get(&opponent).map(|p| p.danger).unwrap_or(0.0)
    }

    pub fn profile(&self, opponent: CombatantId) -> Option<OpponentProfile> {
        self.profiles.get(&opponent).map(|p| p.value().clone())
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl Default for CollectiveKnowledge {
    fn default() -> Self {
        Self::new(KnowledgeConfig::default())
    }
}
