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

//! Combat context snapshot
//!
//! A read-only view of one combatant's surroundings for a single tick. The host
//! world's sensing layer produces it; the cognition engine only consumes it.

use crate::geometry::Vec3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persistent identity of any combatant, hostile or not
pub type CombatantId = Uuid;

/// Body stance of the sensing combatant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Stance {
    #[default]
    Standing,
    Crouching,
    Prone,
    Airborne,
}

impl Stance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stance::Standing => "Standing",
            Stance::Crouching => "Crouching",
            Stance::Prone => "Prone",
            Stance::Airborne => "Airborne",
        }
    }
}

/// Status of the combatant doing the thinking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelfStatus {
    pub id: CombatantId,
    pub position: Vec3,
    pub velocity: Vec3,
    /// Health as a percentage, 0..=100
    pub hp_pct: f32,
    pub stance: Stance,
    /// Free-form inventory tags (e.g. "bandage", "torch")
    pub inventory: Vec<String>,
    /// Ability identifiers this combatant may invoke
    pub abilities: Vec<String>,
}

impl SelfStatus {
    pub fn new(id: CombatantId, position: Vec3) -> Self {
        Self {
            id,
            position,
            velocity: Vec3::ZERO,
            hp_pct: 100.0,
            stance: Stance::Standing,
            inventory: Vec::new(),
            abilities: Vec::new(),
        }
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_hp_pct(mut self, hp_pct: f32) -> Self {
        self.hp_pct = hp_pct;
        self
    }

    pub fn with_stance(mut self, stance: Stance) -> Self {
        self.stance = stance;
        self
    }

    pub fn with_item(mut self, tag: impl Into<String>) -> Self {
        self.inventory.push(tag.into());
        self
    }

    pub fn with_ability(mut self, ability: impl Into<String>) -> Self {
        self.abilities.push(ability.into());
        self
    }

    pub fn has_ability(&self, ability: &str) -> bool {
        self.abilities.iter().any(|a| a == ability)
    }
}

/// A hostile actor within sensing range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpponentSighting {
    pub id: CombatantId,
    pub position: Vec3,
    pub velocity: Vec3,
    pub distance: f32,
    /// Direction the opponent is aiming or facing (unit vector, zero if unknown)
    pub aim: Vec3,
    pub weapon: Option<String>,
    /// Estimated striking reach of the equipped weapon
    pub reach: f32,
    /// Opponent is in an attack-ready / wind-up animation
    pub winding_up: bool,
    pub crouching: bool,
}

impl OpponentSighting {
    pub fn new(id: CombatantId, position: Vec3, distance: f32) -> Self {
        Self {
            id,
            position,
            velocity: Vec3::ZERO,
            distance,
            aim: Vec3::ZERO,
            weapon: None,
            reach: 1.5,
            winding_up: false,
            crouching: false,
        }
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_aim(mut self, aim: Vec3) -> Self {
        self.aim = aim.normalized();
        self
    }

    pub fn with_weapon(mut self, weapon: impl Into<String>, reach: f32) -> Self {
        self.weapon = Some(weapon.into());
        self.reach = reach;
        self
    }

    pub fn winding_up(mut self, winding_up: bool) -> Self {
        self.winding_up = winding_up;
        self
    }

    pub fn crouching(mut self, crouching: bool) -> Self {
        self.crouching = crouching;
        self
    }
}

/// A friendly actor within sensing range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllySighting {
    pub id: CombatantId,
    pub position: Vec3,
    pub distance: f32,
    pub hp_pct: f32,
}

impl AllySighting {
    pub fn new(id: CombatantId, position: Vec3, distance: f32) -> Self {
        Self {
            id,
            position,
            distance,
            hp_pct: 100.0,
        }
    }
}

/// Everything one combatant knows about its fight for a single tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatContext {
    pub me: SelfStatus,
    pub opponents: Vec<OpponentSighting>,
    pub allies: Vec<AllySighting>,
    /// Nearest known cover, if any
    pub cover: Option<Vec3>,
}

impl CombatContext {
    pub fn new(me: SelfStatus) -> Self {
        Self {
            me,
            opponents: Vec::new(),
            allies: Vec::new(),
            cover: None,
        }
    }

    pub fn with_opponent(mut self, opponent: OpponentSighting) -> Self {
        self.opponents.push(opponent);
        self
    }

    pub fn with_ally(mut self, ally: AllySighting) -> Self {
        self.allies.push(ally);
        self
    }

    pub fn with_cover(mut self, cover: Vec3) -> Self {
        self.cover = Some(cover);
        self
    }

    /// Closest sensed opponent; NaN distances never win
    pub fn nearest_opponent(&self) -> Option<&OpponentSighting> {
        self.opponents
            .iter()
            .filter(|o| !o.distance.is_nan())
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_opponent() {
        let me = SelfStatus::new(Uuid::new_v4(), Vec3::ZERO);
        let far = Uuid::new_v4();
        let near = Uuid::new_v4();
        let context = CombatContext::new(me)
            .with_opponent(OpponentSighting::new(far, Vec3::new(9.0, 0.0, 0.0), 9.0))
            .with_opponent(OpponentSighting::new(near, Vec3::new(3.0, 0.0, 0.0), 3.0))
            .with_opponent(OpponentSighting::new(Uuid::new_v4(), Vec3::ZERO, f32::NAN));

        assert_eq!(context.nearest_opponent().map(|o| o.id), Some(near));
    }

    #[test]
    fn test_no_opponents() {
        let context = CombatContext::new(SelfStatus::new(Uuid::new_v4(), Vec3::ZERO));
        assert!(context.nearest_opponent().is_none());
    }

    #[test]
    fn test_context_serialization() {
        let context = CombatContext::new(
            SelfStatus::new(Uuid::new_v4(), Vec3::ZERO).with_ability("frenzy"),
        )
        .with_cover(Vec3::new(1.0, 2.0, 0.0));

        let json = serde_json::to_string(&context).unwrap();
        let back: CombatContext = serde_json::from_str(&json).unwrap();
        assert_eq!(back, context);
        assert!(back.me.has_ability("frenzy"));
    }
}
