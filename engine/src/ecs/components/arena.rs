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

//! Host-side components of the reference arena

use banditry_common::{CombatantId, Vec3};
use serde::{Deserialize, Serialize};

/// Which side a fighter is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    /// Driven by the cognition engine
    Bandit,
    /// Driven by the arena's scripted behaviour
    Defender,
}

impl Faction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Faction::Bandit => "bandit",
            Faction::Defender => "defender",
        }
    }

    pub fn is_hostile_to(&self, other: Faction) -> bool {
        *self != other
    }
}

/// Identity component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fighter {
    pub id: CombatantId,
    pub faction: Faction,
    pub name: String,
}

impl Fighter {
    pub fn new(id: CombatantId, faction: Faction, name: impl Into<String>) -> Self {
        Self {
            id,
            faction,
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position(pub Vec3);

/// Units per second
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Velocity(pub Vec3);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    pub hp: f32,
    pub max_hp: f32,
}

impl Vitals {
    pub fn new(max_hp: f32) -> Self {
        let max_hp = max_hp.max(1.0);
        Self { hp: max_hp, max_hp }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    /// Health as a percentage in [0, 100]
    pub fn hp_pct(&self) -> f32 {
        (self.hp / self.max_hp * 100.0).clamp(0.0, 100.0)
    }

    /// Apply damage and return what was actually taken
    pub fn apply_damage(&mut self, amount: f32) -> f32 {
        let taken = amount.max(0.0).min(self.hp.max(0.0));
        self.hp -= taken;
        taken
    }
}

/// Weapon carried by a fighter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Armament {
    pub weapon: String,
    pub reach: f32,
    pub damage: f32,
    /// Seconds between strikes
    pub cooldown: f32,
    /// Seconds until the next strike is possible
    pub ready_in: f32,
}

impl Armament {
    pub fn new(weapon: impl Into<String>, reach: f32, damage: f32, cooldown: f32) -> Self {
        Self {
            weapon: weapon.into(),
            reach,
            damage,
            cooldown,
            ready_in: 0.0,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready_in <= 0.0
    }

    pub fn trigger(&mut self) {
        self.ready_in = self.cooldown;
    }

    pub fn recover(&mut self, delta_time: f32) {
        self.ready_in = (self.ready_in - delta_time).max(0.0);
    }
}

/// Visible body language other fighters can read
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Posture {
    pub winding_up: bool,
    pub crouching: bool,
    /// Seconds left before a wind-up turns into a strike
    pub windup_left: f32,
    /// Unit vector the fighter is squared up toward
    pub facing: Vec3,
}

/// Named abilities a fighter can invoke
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Abilities(pub Vec<String>);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vitals_damage() {
        let mut vitals = Vitals::new(50.0);
        assert_eq!(vitals.hp_pct(), 100.0);
        assert_eq!(vitals.apply_damage(20.0), 20.0);
        assert_eq!(vitals.hp_pct(), 60.0);
        assert_eq!(vitals.apply_damage(100.0), 30.0);
        assert!(!vitals.is_alive());
        assert_eq!(vitals.apply_damage(5.0), 0.0);
        assert_eq!(vitals.hp_pct(), 0.0);
    }

    #[test]
    fn test_armament_cooldown() {
        let mut sword = Armament::new("sword", 1.5, 10.0, 1.0);
        assert!(sword.is_ready());
        sword.trigger();
        assert!(!sword.is_ready());
        sword.recover(0.6);
        assert!(!sword.is_ready());
        sword.recover(0.6);
        assert!(sword.is_ready());
    }

    #[test]
    fn test_faction_hostility() {
        assert!(Faction::Bandit.is_hostile_to(Faction::Defender));
        assert!(!Faction::Bandit.is_hostile_to(Faction::Bandit));
    }
}
