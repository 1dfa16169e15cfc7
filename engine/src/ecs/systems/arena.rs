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

//! Reference arena: a small hecs world hosting bandits and scripted defenders
//!
//! The arena implements both boundary traits so the cognition system can run
//! against it end to end. Defenders close in, wind up and strike; bandits move
//! and fight according to the decisions handed to [`Actuator::execute`]. Every
//! landed blow and every bandit death is published on the event bus.

use crate::ecs::boundary::{Actuator, Sensor};
use crate::ecs::components::{Abilities, Armament, Faction, Fighter, Position, Posture, Velocity, Vitals};
use crate::ecs::events::{CombatEvent, EventBus};
use crate::ecs::registry::EntityRegistry;
use crate::ecs::{ArenaWorld, EcsEntity, Entity};
use crate::error::{RegistryError, SenseError};
use banditry_common::{
    ActionType, AllySighting, CombatContext, CombatantId, Decision, Movement, OpponentSighting, SelfStatus,
    Stance, Vec3,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::PI;

/// Fighters farther apart than this cannot see each other
pub const SENSE_RANGE: f32 = 25.0;

const BANDIT_SPEED: f32 = 3.5;
const DEFENDER_SPEED: f32 = 3.0;
const WINDUP_SECONDS: f32 = 0.4;
/// Defenders start winding up this far beyond their reach
const WINDUP_REACH_SLACK: f32 = 1.5;
const COUNTER_MULTIPLIER: f32 = 1.25;
const BURST_MULTIPLIER: f32 = 1.5;
/// Close enough to a cover point to stop moving
const COVER_TOLERANCE: f32 = 0.25;

/// What one `step` did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepReport {
    pub strikes: usize,
    pub deaths: usize,
    pub reaped: usize,
}

/// A blow that connected
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrikeOutcome {
    pub attacker: CombatantId,
    pub victim: CombatantId,
    pub damage: f32,
    pub killed: bool,
}

pub struct Arena {
    world: ArenaWorld,
    registry: EntityRegistry,
    bus: EventBus,
    rng: StdRng,
    radius: f32,
    cover: Vec<Vec3>,
    burst_ability: String,
}

impl Arena {
    /// Create an empty circular arena with four cover points
    pub fn new(radius: f32, bus: EventBus, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let radius = if radius.is_finite() { radius.max(1.0) } else { 20.0 };
        let ring = radius * 0.6;
        Self {
            world: ArenaWorld::new(),
            registry: EntityRegistry::new(),
            bus,
            rng,
            radius,
            cover: vec![
                Vec3::new(ring, 0.0, 0.0),
                Vec3::new(-ring, 0.0, 0.0),
                Vec3::new(0.0, ring, 0.0),
                Vec3::new(0.0, -ring, 0.0),
            ],
            burst_ability: "frenzy".to_string(),
        }
    }

    /// Name of the ability bandits are spawned with
    pub fn with_burst_ability(mut self, ability: impl Into<String>) -> Self {
        self.burst_ability = ability.into();
        self
    }

    pub fn world(&self) -> &ArenaWorld {
        &self.world
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn cover(&self) -> &[Vec3] {
        &self.cover
    }

    /// Spawn a fighter with explicit components
    pub fn spawn_fighter(
        &mut self,
        fighter: Fighter,
        position: Vec3,
        vitals: Vitals,
        armament: Armament,
        abilities: Abilities,
    ) -> Result<EcsEntity, RegistryError> {
        let id = fighter.id;
        if self.registry.contains_id(id) {
            return Err(RegistryError::IdRegistered(id));
        }

        tracing::debug!(%id, name = %fighter.name, faction = fighter.faction.as_str(), "Spawning fighter");
        let entity = self.world.spawn((
            fighter,
            Position(position),
            Velocity::default(),
            vitals,
            armament,
            Posture::default(),
            abilities,
        ));
        if let Err(err) = self.registry.register(entity, id) {
            self.world.despawn(entity).ok();
            return Err(err);
        }
        Ok(entity)
    }

    pub fn spawn_bandit(&mut self, name: impl Into<String>, position: Vec3) -> Result<CombatantId, RegistryError> {
        let id = uuid::Uuid::new_v4();
        self.spawn_fighter(
            Fighter::new(id, Faction::Bandit, name),
            position,
            Vitals::new(60.0),
            Armament::new("sabre", 1.6, 9.0, 0.8),
            Abilities(vec![self.burst_ability.clone()]),
        )?;
        Ok(id)
    }

    pub fn spawn_defender(&mut self, name: impl Into<String>, position: Vec3) -> Result<CombatantId, RegistryError> {
        let id = uuid::Uuid::new_v4();
        self.spawn_fighter(
            Fighter::new(id, Faction::Defender, name),
            position,
            Vitals::new(100.0),
            Armament::new("halberd", 2.2, 14.0, 1.4),
            Abilities::default(),
        )?;
        Ok(id)
    }

    /// Scatter bandits on the western half and defenders on the eastern half
    pub fn populate(&mut self, bandits: usize, defenders: usize) -> Result<(), RegistryError> {
        for index in 0..bandits {
            let position = self.random_position(PI * 0.5, PI * 1.5);
            self.spawn_bandit(format!("bandit-{}", index + 1), position)?;
        }
        for index in 0..defenders {
            let position = self.random_position(-PI * 0.5, PI * 0.5);
            self.spawn_defender(format!("defender-{}", index + 1), position)?;
        }
        tracing::info!(bandits, defenders, radius = self.radius, "Arena populated");
        Ok(())
    }

    fn random_position(&mut self, from: f32, to: f32) -> Vec3 {
        let angle = self.rng.random_range(from..to);
        let distance = self.rng.random_range(self.radius * 0.5..self.radius * 0.9);
        Vec3::new(angle.cos() * distance, angle.sin() * distance, 0.0)
    }

    /// Every fighter of a faction still in the world, dead or alive
    pub fn roster(&self, faction: Faction) -> Vec<CombatantId> {
        self.world
            .query::<(Entity, &Fighter)>()
            .iter()
            .filter(|(_, fighter)| fighter.faction == faction)
            .map(|(_, fighter)| fighter.id)
            .collect()
    }

    pub fn bandits(&self) -> Vec<CombatantId> {
        self.roster(Faction::Bandit)
    }

    pub fn living(&self, faction: Faction) -> usize {
        self.world
            .query::<(Entity, &Fighter, &Vitals)>()
            .iter()
            .filter(|(_, fighter, vitals)| fighter.faction == faction && vitals.is_alive())
            .count()
    }

    pub fn position_of(&self, combatant: CombatantId) -> Option<Vec3> {
        let entity = self.registry.get_entity(combatant)?;
        self.world.get::<&Position>(entity).ok().map(|p| p.0)
    }

    pub fn velocity_of(&self, combatant: CombatantId) -> Option<Vec3> {
        let entity = self.registry.get_entity(combatant)?;
        self.world.get::<&Velocity>(entity).ok().map(|v| v.0)
    }

    pub fn vitals_of(&self, combatant: CombatantId) -> Option<Vitals> {
        let entity = self.registry.get_entity(combatant)?;
        self.world.get::<&Vitals>(entity).ok().map(|v| *v)
    }

    /// Advance the arena by `delta_time` seconds
    ///
    /// Corpses from the previous step are removed first, so every dead fighter
    /// is sensed as dead for exactly one tick before it despawns.
    pub fn step(&mut self, delta_time: f32) -> StepReport {
        let delta_time = if delta_time.is_finite() { delta_time.max(0.0) } else { 0.0 };
        let mut report = StepReport {
            reaped: self.reap(),
            ..StepReport::default()
        };

        for (_entity, armament) in self.world.query_mut::<(Entity, &mut Armament)>() {
            armament.recover(delta_time);
        }

        for (attacker, target) in self.script_defenders(delta_time) {
            if let Some(outcome) = self.strike(attacker, target, 1.0) {
                report.strikes += 1;
                report.deaths += usize::from(outcome.killed);
            }
        }

        let radius = self.radius;
        for (_entity, position, velocity, vitals) in
            self.world.query_mut::<(Entity, &mut Position, &Velocity, &Vitals)>()
        {
            if !vitals.is_alive() {
                continue;
            }
            let next = position.0 + velocity.0 * delta_time;
            position.0 = if next.length() > radius {
                next.normalized() * radius
            } else {
                next
            };
        }

        report
    }

    /// Defenders chase the nearest bandit, wind up inside striking distance and
    /// release when the wind-up completes. Returns the strikes to resolve.
    fn script_defenders(&mut self, delta_time: f32) -> Vec<(EcsEntity, CombatantId)> {
        let bandits: Vec<(CombatantId, Vec3)> = self
            .world
            .query::<(Entity, &Fighter, &Position, &Vitals)>()
            .iter()
            .filter(|(_, fighter, _, vitals)| fighter.faction == Faction::Bandit && vitals.is_alive())
            .map(|(_, fighter, position, _)| (fighter.id, position.0))
            .collect();

        let mut strikes = Vec::new();
        for (entity, fighter, position, velocity, vitals, armament, posture) in self.world.query_mut::<(
            Entity,
            &Fighter,
            &Position,
            &mut Velocity,
            &Vitals,
            &Armament,
            &mut Posture,
        )>() {
            if fighter.faction != Faction::Defender || !vitals.is_alive() {
                continue;
            }

            let nearest = bandits
                .iter()
                .min_by(|a, b| a.1.distance(position.0).total_cmp(&b.1.distance(position.0)));
            let Some(&(target, target_position)) = nearest else {
                velocity.0 = Vec3::ZERO;
                posture.winding_up = false;
                posture.crouching = false;
                continue;
            };

            let offset = target_position - position.0;
            let distance = offset.length();
            let direction = offset.normalized();
            posture.facing = direction;
            velocity.0 = if distance > armament.reach * 0.9 {
                direction * DEFENDER_SPEED
            } else {
                Vec3::ZERO
            };

            if posture.winding_up {
                posture.windup_left -= delta_time;
                if posture.windup_left <= 0.0 {
                    posture.winding_up = false;
                    posture.crouching = false;
                    strikes.push((entity, target));
                }
            } else if armament.is_ready() && distance <= armament.reach * WINDUP_REACH_SLACK {
                posture.winding_up = true;
                posture.crouching = true;
                posture.windup_left = WINDUP_SECONDS;
            }
        }
        strikes
    }

    /// Resolve one blow; a swing that misses still costs the cooldown
    fn strike(&mut self, attacker: EcsEntity, target: CombatantId, multiplier: f32) -> Option<StrikeOutcome> {
        let attacker_id = self.registry.get_id(attacker)?;
        let victim = self.registry.get_entity(target)?;

        let attacker_faction = {
            let vitals = self.world.get::<&Vitals>(attacker).ok()?;
            if !vitals.is_alive() {
                return None;
            }
            self.world.get::<&Fighter>(attacker).ok()?.faction
        };
        let (weapon, reach, damage) = {
            let mut armament = self.world.get::<&mut Armament>(attacker).ok()?;
            if !armament.is_ready() {
                return None;
            }
            armament.trigger();
            (armament.weapon.clone(), armament.reach, armament.damage)
        };

        let origin = self.world.get::<&Position>(attacker).ok()?.0;
        let landing = self.world.get::<&Position>(victim).ok()?.0;
        if origin.distance(landing) > reach {
            tracing::trace!(attacker = %attacker_id, victim = %target, "Swing fell short");
            return None;
        }

        let (taken, severity, killed) = {
            let mut vitals = self.world.get::<&mut Vitals>(victim).ok()?;
            if !vitals.is_alive() {
                return None;
            }
            let taken = vitals.apply_damage(damage * multiplier.max(0.0));
            (taken, taken / vitals.max_hp, !vitals.is_alive())
        };

        let (victim_faction, interrupted) = {
            let faction = self.world.get::<&Fighter>(victim).ok()?.faction;
            let mut posture = self.world.get::<&mut Posture>(victim).ok()?;
            let interrupted = posture.winding_up;
            posture.winding_up = false;
            posture.crouching = false;
            (faction, interrupted)
        };

        tracing::debug!(attacker = %attacker_id, victim = %target, damage = taken, killed, "Strike landed");
        self.bus.publish(CombatEvent::HitLanded {
            attacker: attacker_id,
            victim: target,
            severity,
        });

        if interrupted && attacker_faction == Faction::Bandit {
            self.bus.publish(CombatEvent::WeaknessSpotted {
                opponent: target,
                weakness: "slow wind-up".to_string(),
            });
        }

        if killed && victim_faction == Faction::Bandit {
            let distance = self
                .bandit_centroid()
                .map(|centroid| landing.distance(centroid))
                .unwrap_or(0.0);
            tracing::info!(victim = %target, killer = %attacker_id, distance, "Bandit killed");
            self.bus.publish(CombatEvent::AllyDied {
                victim: target,
                killer: attacker_id,
                distance,
                weapon: Some(weapon),
            });
        }

        Some(StrikeOutcome {
            attacker: attacker_id,
            victim: target,
            damage: taken,
            killed,
        })
    }

    /// Mean position of the living bandits
    fn bandit_centroid(&self) -> Option<Vec3> {
        let (sum, count) = self
            .world
            .query::<(Entity, &Fighter, &Position, &Vitals)>()
            .iter()
            .filter(|(_, fighter, _, vitals)| fighter.faction == Faction::Bandit && vitals.is_alive())
            .fold((Vec3::ZERO, 0usize), |(sum, count), (_, _, position, _)| {
                (sum + position.0, count + 1)
            });
        (count > 0).then(|| sum * (1.0 / count as f32))
    }

    /// Despawn dead fighters, returning how many were removed
    fn reap(&mut self) -> usize {
        let dead: Vec<EcsEntity> = self
            .world
            .query::<(Entity, &Vitals)>()
            .iter()
            .filter(|(_, vitals)| !vitals.is_alive())
            .map(|(entity, _)| entity)
            .collect();

        for entity in &dead {
            if let Some(combatant) = self.registry.unregister_entity(*entity) {
                self.bus.publish(CombatEvent::CombatantDespawned { combatant });
            }
            self.world.despawn(*entity).ok();
        }
        dead.len()
    }
}

impl Sensor for Arena {
    fn sense(&self, combatant: CombatantId) -> Result<CombatContext, SenseError> {
        let entity = self
            .registry
            .get_entity(combatant)
            .ok_or(SenseError::Despawned(combatant))?;
        let despawned = |_| SenseError::Despawned(combatant);

        let faction = self.world.get::<&Fighter>(entity).map_err(despawned)?.faction;
        let vitals = *self.world.get::<&Vitals>(entity).map_err(despawned)?;
        if !vitals.is_alive() {
            return Err(SenseError::Dead(combatant));
        }
        let position = self.world.get::<&Position>(entity).map_err(despawned)?.0;
        let velocity = self.world.get::<&Velocity>(entity).map_err(despawned)?.0;
        let posture = *self.world.get::<&Posture>(entity).map_err(despawned)?;
        let weapon = self.world.get::<&Armament>(entity).map_err(despawned)?.weapon.clone();
        let abilities = self
            .world
            .get::<&Abilities>(entity)
            .map(|a| a.0.clone())
            .unwrap_or_default();

        let mut me = SelfStatus::new(combatant, position)
            .with_velocity(velocity)
            .with_hp_pct(vitals.hp_pct())
            .with_stance(if posture.crouching {
                Stance::Crouching
            } else {
                Stance::Standing
            })
            .with_item(weapon);
        me.abilities = abilities;

        let mut context = CombatContext::new(me);
        for (other, fighter, other_position, other_velocity, other_vitals, armament, other_posture) in self
            .world
            .query::<(Entity, &Fighter, &Position, &Velocity, &Vitals, &Armament, &Posture)>()
            .iter()
        {
            if other == entity || !other_vitals.is_alive() {
                continue;
            }
            let distance = position.distance(other_position.0);
            if distance > SENSE_RANGE {
                continue;
            }
            if faction.is_hostile_to(fighter.faction) {
                context = context.with_opponent(
                    OpponentSighting::new(fighter.id, other_position.0, distance)
                        .with_velocity(other_velocity.0)
                        .with_aim(other_posture.facing)
                        .with_weapon(armament.weapon.clone(), armament.reach)
                        .winding_up(other_posture.winding_up)
                        .crouching(other_posture.crouching),
                );
            } else {
                let mut ally = AllySighting::new(fighter.id, other_position.0, distance);
                ally.hp_pct = other_vitals.hp_pct();
                context = context.with_ally(ally);
            }
        }

        let cover = self
            .cover
            .iter()
            .copied()
            .min_by(|a, b| a.distance(position).total_cmp(&b.distance(position)));
        if let Some(cover) = cover {
            context = context.with_cover(cover);
        }
        Ok(context)
    }
}

impl Actuator for Arena {
    fn execute(&mut self, combatant: CombatantId, decision: &Decision) {
        let Some(entity) = self.registry.get_entity(combatant) else {
            return;
        };
        let alive = self.world.get::<&Vitals>(entity).map(|v| v.is_alive()).unwrap_or(false);
        let Ok(origin) = self.world.get::<&Position>(entity).map(|p| p.0) else {
            return;
        };
        if !alive {
            return;
        }

        let target_position = decision.target.and_then(|target| self.position_of(target));
        let toward = target_position
            .map(|p| (p - origin).normalized())
            .unwrap_or(Vec3::ZERO);

        let velocity = match decision.movement {
            Movement::Hold => Vec3::ZERO,
            Movement::Approach => toward * BANDIT_SPEED,
            Movement::Backstep => -toward * BANDIT_SPEED,
            Movement::Sidestep => toward.perpendicular() * BANDIT_SPEED,
            Movement::KeepDistance { range } => match target_position {
                Some(p) if origin.distance(p) < range => -toward * BANDIT_SPEED,
                Some(p) if origin.distance(p) > range * 1.25 => toward * (BANDIT_SPEED * 0.5),
                _ => Vec3::ZERO,
            },
            Movement::TakeCover { position } => {
                let offset = position - origin;
                if offset.length() < COVER_TOLERANCE {
                    Vec3::ZERO
                } else {
                    offset.normalized() * BANDIT_SPEED
                }
            }
            Movement::Withdraw => -toward * BANDIT_SPEED,
        };

        if let Ok(mut v) = self.world.get::<&mut Velocity>(entity) {
            v.0 = velocity;
        }
        if let Ok(mut posture) = self.world.get::<&mut Posture>(entity) {
            posture.crouching = decision.action == ActionType::Evade;
            posture.winding_up = false;
            if toward != Vec3::ZERO {
                posture.facing = toward;
            }
        }

        if !decision.action.is_offensive() {
            return;
        }
        let Some(target) = decision.target else {
            return;
        };

        let mut multiplier = if decision.action == ActionType::Counter {
            COUNTER_MULTIPLIER
        } else {
            1.0
        };
        if let Some(ability) = &decision.ability {
            let owned = self
                .world
                .get::<&Abilities>(entity)
                .map(|a| a.0.iter().any(|owned| owned == ability))
                .unwrap_or(false);
            if owned {
                multiplier *= BURST_MULTIPLIER;
            }
        }
        self.strike(entity, target, multiplier);
    }
}
