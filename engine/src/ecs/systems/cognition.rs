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

//! Cognition system: owns every live brain and drives the per-tick pipeline
//!
//! For each combatant: sense, fetch or create its brain, fold queued
//! experience, think, hand the decision to the actuator. Nothing here returns
//! an error; a combatant that cannot be sensed skips its tick, one that is gone
//! loses its brain.

use crate::config::CognitionConfig;
use crate::ecs::boundary::{Actuator, Sensor};
use crate::ecs::components::{Brain, BrainSnapshot, ExperienceLedger, Neuron, NeuronKind};
use crate::ecs::events::CombatEvent;
use crate::ecs::knowledge::CollectiveKnowledge;
use crate::ecs::systems::tactics::{CombatEngine, Verdict};
use banditry_common::{CombatContext, CombatantId};
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

type LedgerMap = DashMap<CombatantId, Arc<ExperienceLedger>>;

/// What happened to one combatant on one tick
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Thought and handed a decision to the actuator
    Acted { verdict: Verdict, mentored: bool },
    /// Sensing was temporarily unavailable; nothing changed
    Skipped,
    /// The combatant is dead or despawned; its brain was dropped
    Discarded,
}

/// Totals for one world tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickSummary {
    pub tick: u64,
    pub acted: usize,
    pub skipped: usize,
    pub discarded: usize,
    pub regulated: usize,
    pub mentored: usize,
    /// Whether collective knowledge decayed on this tick
    pub knowledge_decayed: bool,
}

pub struct CognitionSystem {
    config: CognitionConfig,
    engine: CombatEngine,
    knowledge: Arc<CollectiveKnowledge>,
    brains: HashMap<CombatantId, Brain>,
    ledgers: Arc<LedgerMap>,
    world_tick: u64,
}

impl CognitionSystem {
    pub fn new(config: CognitionConfig, knowledge: Arc<CollectiveKnowledge>) -> Self {
        let engine = CombatEngine::new(config.tactics.clone(), Arc::clone(&knowledge));
        Self {
            config,
            engine,
            knowledge,
            brains: HashMap::new(),
            ledgers: Arc::new(DashMap::new()),
            world_tick: 0,
        }
    }

    /// Use a custom combat engine (e.g. a different rule book)
    pub fn with_engine(mut self, engine: CombatEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn engine(&self) -> &CombatEngine {
        &self.engine
    }

    pub fn knowledge(&self) -> &Arc<CollectiveKnowledge> {
        &self.knowledge
    }

    pub fn world_tick(&self) -> u64 {
        self.world_tick
    }

    pub fn brain(&self, combatant: CombatantId) -> Option<&Brain> {
        self.brains.get(&combatant)
    }

    pub fn brains(&self) -> impl Iterator<Item = &Brain> {
        self.brains.values()
    }

    pub fn active_brains(&self) -> usize {
        self.brains.len()
    }

    /// Event router sharing this system's ledgers and knowledge
    pub fn router(&self) -> CombatEventRouter {
        CombatEventRouter {
            ledgers: Arc::clone(&self.ledgers),
            knowledge: Arc::clone(&self.knowledge),
        }
    }

    /// Snapshot history of every live brain, for post-combat analysis
    pub fn histories(&self) -> HashMap<CombatantId, Vec<BrainSnapshot>> {
        self.brains
            .iter()
            .map(|(id, brain)| (*id, brain.history().cloned().collect()))
            .collect()
    }

    /// Drop a combatant's brain and ledger; returns whether it had one
    pub fn discard(&mut self, combatant: CombatantId) -> bool {
        self.ledgers.remove(&combatant);
        let discarded = self.brains.remove(&combatant).is_some();
        if discarded {
            metrics::counter!("banditry_brains_discarded_total").increment(1);
            tracing::debug!(%combatant, "Brain discarded");
        }
        discarded
    }

    /// Run the pipeline for one combatant
    #[tracing::instrument(level = "trace", skip(self, host), fields(tick = self.world_tick))]
    pub fn tick_combatant<H>(&mut self, combatant: CombatantId, host: &mut H) -> TickOutcome
    where
        H: Sensor + Actuator + ?Sized,
    {
        let context = match host.sense(combatant) {
            Ok(context) => context,
            Err(err) if err.is_terminal() => {
                tracing::debug!(%combatant, "{}", err);
                self.discard(combatant);
                return TickOutcome::Discarded;
            }
            Err(err) => {
                tracing::trace!(%combatant, "Skipping tick: {}", err);
                metrics::counter!("banditry_ticks_skipped_total").increment(1);
                return TickOutcome::Skipped;
            }
        };

        let mentor = self.mentor_for(combatant, &context);
        let brain = self.brains.entry(combatant).or_insert_with(|| {
            let ledger = Arc::new(ExperienceLedger::new());
            self.ledgers.insert(combatant, Arc::clone(&ledger));
            tracing::debug!(%combatant, "Brain created");
            Brain::with_ledger(combatant, &self.config, ledger)
        });

        let mentored = match &mentor {
            Some(neurons) => {
                brain.mimic(neurons, self.config.mimic_rate);
                true
            }
            None => false,
        };

        brain.digest_experience();
        let verdict = self.engine.think(brain, &context);
        if verdict.regulated {
            metrics::counter!("banditry_regulator_interventions_total").increment(1);
        }
        metrics::counter!("banditry_decisions_total", "action" => verdict.decision.action.as_str())
            .increment(1);

        host.execute(combatant, &verdict.decision);
        TickOutcome::Acted { verdict, mentored }
    }

    /// Advance the world one tick, processing each roster entry once
    pub fn run_tick<H>(&mut self, roster: &[CombatantId], host: &mut H) -> TickSummary
    where
        H: Sensor + Actuator + ?Sized,
    {
        self.world_tick += 1;
        let mut summary = TickSummary {
            tick: self.world_tick,
            ..TickSummary::default()
        };

        let mut seen = HashSet::with_capacity(roster.len());
        for &combatant in roster {
            if !seen.insert(combatant) {
                continue;
            }
            match self.tick_combatant(combatant, host) {
                TickOutcome::Acted { verdict, mentored } => {
                    summary.acted += 1;
                    summary.regulated += usize::from(verdict.regulated);
                    summary.mentored += usize::from(mentored);
                }
                TickOutcome::Skipped => summary.skipped += 1,
                TickOutcome::Discarded => summary.discarded += 1,
            }
        }

        // an interval of zero would starve decay, so it means every tick
        let interval = self.config.knowledge_decay_interval.max(1);
        if self.world_tick % interval == 0 {
            self.knowledge.tick();
            summary.knowledge_decayed = true;
        }

        metrics::gauge!("banditry_brains_active").set(self.brains.len() as f64);
        summary
    }

    /// Most experienced sensed ally that has thought longer than this combatant
    fn mentor_for(&self, combatant: CombatantId, context: &CombatContext) -> Option<[Neuron; NeuronKind::COUNT]> {
        if !(self.config.mimic_rate > 0.0) {
            return None;
        }
        let own = self.brains.get(&combatant).map(Brain::ticks).unwrap_or(0);
        context
            .allies
            .iter()
            .filter(|ally| ally.id != combatant)
            .filter_map(|ally| self.brains.get(&ally.id))
            .filter(|brain| brain.ticks() > own)
            .max_by_key(|brain| brain.ticks())
            .map(|brain| brain.neurons().clone())
    }
}

/// Maps combat events onto brain ledgers and collective knowledge
///
/// Cheap to clone and safe to call from any thread. Events are only queued
/// here; brains fold them in on their next tick.
#[derive(Debug, Clone)]
pub struct CombatEventRouter {
    ledgers: Arc<LedgerMap>,
    knowledge: Arc<CollectiveKnowledge>,
}

impl CombatEventRouter {
    pub fn route(&self, event: &CombatEvent) {
        match event {
            CombatEvent::HitLanded {
                attacker,
                victim,
                severity,
            } => {
                self.credit(*attacker, event, |ledger| ledger.credit_reward(*severity));
                self.credit(*victim, event, |ledger| ledger.credit_penalty(*severity));
            }
            CombatEvent::AllyDied {
                killer,
                distance,
                weapon,
                ..
            } => {
                self.knowledge
                    .report_ally_death(*killer, *distance, weapon.as_deref());
            }
            CombatEvent::WeaknessSpotted { opponent, weakness } => {
                self.knowledge
                    .update_global_tactics(*opponent, weakness.as_str());
            }
            CombatEvent::CombatantDespawned { combatant } => {
                self.ledgers.remove(combatant);
            }
        }
    }

    fn credit(&self, combatant: CombatantId, event: &CombatEvent, apply: impl FnOnce(&ExperienceLedger)) {
        let ledger = self.ledgers.get(&combatant).map(|entry| Arc::clone(entry.value()));
        match ledger {
            Some(ledger) => apply(&ledger),
            None => tracing::trace!(%combatant, kind = event.kind(), "Dropped event for combatant without a brain"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SenseError;
    use banditry_common::{ActionType, AllySighting, Decision, OpponentSighting, SelfStatus, Vec3};
    use mockall::mock;
    use uuid::Uuid;

    mock! {
        Host {}
        impl Sensor for Host {
            fn sense(&self, combatant: CombatantId) -> Result<CombatContext, SenseError>;
        }
        impl Actuator for Host {
            fn execute(&mut self, combatant: CombatantId, decision: &Decision);
        }
    }

    fn system() -> CognitionSystem {
        CognitionSystem::new(CognitionConfig::default(), Arc::new(CollectiveKnowledge::default()))
    }

    fn skirmish(me: CombatantId) -> CombatContext {
        CombatContext::new(SelfStatus::new(me, Vec3::ZERO))
            .with_opponent(OpponentSighting::new(Uuid::new_v4(), Vec3::new(3.0, 0.0, 0.0), 3.0))
    }

    #[test]
    fn test_unavailable_sensor_skips_without_mutation() {
        let mut system = system();
        let id = Uuid::new_v4();
        let mut host = MockHost::new();
        host.expect_sense()
            .returning(|_| Err(SenseError::Unavailable("fog".to_string())));
        host.expect_execute().never();

        assert_eq!(system.tick_combatant(id, &mut host), TickOutcome::Skipped);
        assert!(system.brain(id).is_none());
        assert_eq!(system.active_brains(), 0);
    }

    #[test]
    fn test_brain_created_once_and_decision_executed() {
        let mut system = system();
        let id = Uuid::new_v4();
        let mut host = MockHost::new();
        host.expect_sense().returning(move |_| Ok(skirmish(id)));
        host.expect_execute().times(2).returning(|_, _| ());

        assert!(matches!(system.tick_combatant(id, &mut host), TickOutcome::Acted { .. }));
        assert!(matches!(system.tick_combatant(id, &mut host), TickOutcome::Acted { .. }));
        assert_eq!(system.active_brains(), 1);
        assert_eq!(system.brain(id).unwrap().ticks(), 2);
    }

    #[test]
    fn test_dead_combatant_is_discarded() {
        let mut system = system();
        let id = Uuid::new_v4();
        let mut alive = MockHost::new();
        alive.expect_sense().returning(move |_| Ok(skirmish(id)));
        alive.expect_execute().returning(|_, _| ());
        system.tick_combatant(id, &mut alive);
        assert!(system.brain(id).is_some());

        let mut dead = MockHost::new();
        dead.expect_sense().returning(|id| Err(SenseError::Dead(id)));
        dead.expect_execute().never();
        assert_eq!(system.tick_combatant(id, &mut dead), TickOutcome::Discarded);
        assert!(system.brain(id).is_none());

        // a late event for the dead combatant goes nowhere
        system.router().route(&CombatEvent::HitLanded {
            attacker: id,
            victim: Uuid::new_v4(),
            severity: 0.5,
        });
    }

    #[test]
    fn test_hits_reach_ledgers_before_next_think() {
        let mut system = system();
        let bandit = Uuid::new_v4();
        let mut host = MockHost::new();
        host.expect_sense().returning(move |_| Ok(skirmish(bandit)));
        host.expect_execute().returning(|_, _| ());
        system.tick_combatant(bandit, &mut host);

        let router = system.router();
        router.route(&CombatEvent::HitLanded {
            attacker: Uuid::new_v4(),
            victim: bandit,
            severity: 0.4,
        });
        let ledger = system.brain(bandit).unwrap().ledger();
        assert!((ledger.pending().penalty - 0.4).abs() < 1e-6);

        system.tick_combatant(bandit, &mut host);
        assert!(ledger.pending().is_empty());
    }

    #[test]
    fn test_router_feeds_knowledge() {
        let system = system();
        let router = system.router();
        let killer = Uuid::new_v4();
        router.route(&CombatEvent::AllyDied {
            victim: Uuid::new_v4(),
            killer,
            distance: 0.0,
            weapon: Some("spear".to_string()),
        });
        router.route(&CombatEvent::WeaknessSpotted {
            opponent: killer,
            weakness: "slow recovery".to_string(),
        });

        let profile = system.knowledge().profile(killer).unwrap();
        assert_eq!(profile.kills, 1);
        assert_eq!(profile.weakness.as_deref(), Some("slow recovery"));
        assert!(system.knowledge().biases().fear > 0.0);
    }

    #[test]
    fn test_run_tick_counts_outcomes_and_dedupes_roster() {
        let mut system = system();
        let alive = Uuid::new_v4();
        let lost = Uuid::new_v4();
        let gone = Uuid::new_v4();
        let mut host = MockHost::new();
        host.expect_sense().returning(move |id| {
            if id == alive {
                Ok(skirmish(alive))
            } else if id == lost {
                Err(SenseError::Unavailable("occluded".to_string()))
            } else {
                Err(SenseError::Despawned(id))
            }
        });
        host.expect_execute().times(1).returning(|_, _| ());

        let summary = system.run_tick(&[alive, lost, gone, alive], &mut host);
        assert_eq!(summary.tick, 1);
        assert_eq!(summary.acted, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.discarded, 1);
        assert!(!summary.knowledge_decayed);
    }

    #[test]
    fn test_knowledge_decay_cadence_ignores_roster_size() {
        let mut fear_after = Vec::new();
        for roster_size in [1usize, 12] {
            let knowledge = Arc::new(CollectiveKnowledge::default());
            knowledge.report_ally_death(Uuid::new_v4(), 0.0, None);
            let mut system = CognitionSystem::new(CognitionConfig::default(), Arc::clone(&knowledge));
            let roster: Vec<_> = (0..roster_size).map(|_| Uuid::new_v4()).collect();

            let mut host = MockHost::new();
            host.expect_sense().returning(|id| Ok(skirmish(id)));
            host.expect_execute().returning(|_, _| ());

            let decays = (0..25)
                .map(|_| system.run_tick(&roster, &mut host))
                .filter(|summary| summary.knowledge_decayed)
                .count();
            assert_eq!(decays, 2);
            fear_after.push(knowledge.biases().fear);
        }
        assert_eq!(fear_after[0], fear_after[1]);
    }

    #[test]
    fn test_zero_decay_interval_decays_every_tick() {
        let knowledge = Arc::new(CollectiveKnowledge::default());
        knowledge.report_ally_death(Uuid::new_v4(), 0.0, None);
        let config = CognitionConfig {
            knowledge_decay_interval: 0,
            ..CognitionConfig::default()
        };
        let mut system = CognitionSystem::new(config, Arc::clone(&knowledge));
        let mut host = MockHost::new();
        host.expect_sense().never();
        host.expect_execute().never();

        let before = knowledge.biases().fear;
        for _ in 0..3 {
            assert!(system.run_tick(&[], &mut host).knowledge_decayed);
        }
        assert!(knowledge.biases().fear < before);
    }

    #[test]
    fn test_novice_is_mentored_by_veteran_ally() {
        let mut system = system();
        let veteran = Uuid::new_v4();
        let novice = Uuid::new_v4();
        let mut host = MockHost::new();
        host.expect_sense().returning(move |id| {
            let ally = if id == novice { veteran } else { novice };
            Ok(skirmish(id).with_ally(AllySighting::new(ally, Vec3::new(1.0, 1.0, 0.0), 1.4)))
        });
        host.expect_execute().returning(|_, _| ());

        for _ in 0..3 {
            system.tick_combatant(veteran, &mut host);
        }
        match system.tick_combatant(novice, &mut host) {
            TickOutcome::Acted { mentored, .. } => assert!(mentored),
            other => panic!("unexpected outcome {other:?}"),
        }
        // the veteran has no one more experienced to learn from
        match system.tick_combatant(veteran, &mut host) {
            TickOutcome::Acted { mentored, .. } => assert!(!mentored),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_novice_inherits_veterans_reaction_profile() {
        let config = CognitionConfig {
            mimic_rate: 1.0,
            ..CognitionConfig::default()
        };
        let mut system = CognitionSystem::new(config, Arc::new(CollectiveKnowledge::default()));
        let router = system.router();
        let veteran = Uuid::new_v4();
        let novice = Uuid::new_v4();
        let mut host = MockHost::new();
        host.expect_sense().returning(move |id| {
            let ally = if id == novice { veteran } else { novice };
            Ok(skirmish(id).with_ally(AllySighting::new(ally, Vec3::new(1.0, 1.0, 0.0), 1.4)))
        });
        host.expect_execute().returning(|_, _| ());

        // the veteran takes a beating and comes out jumpier
        for _ in 0..5 {
            system.tick_combatant(veteran, &mut host);
            router.route(&CombatEvent::HitLanded {
                attacker: Uuid::new_v4(),
                victim: veteran,
                severity: 0.5,
            });
        }
        system.tick_combatant(veteran, &mut host);
        let decays = |brain: &Brain| brain.neurons().iter().map(Neuron::base_decay).collect::<Vec<_>>();
        let seasoned = decays(system.brain(veteran).unwrap());
        let fresh = decays(&Brain::new(novice, &CognitionConfig::default()));
        assert_ne!(seasoned, fresh);

        match system.tick_combatant(novice, &mut host) {
            TickOutcome::Acted { mentored, .. } => assert!(mentored),
            other => panic!("unexpected outcome {other:?}"),
        }
        let learned = decays(system.brain(novice).unwrap());
        assert_ne!(learned, fresh);
        for (learned, seasoned) in learned.iter().zip(&seasoned) {
            assert!((learned - seasoned).abs() < 1e-6);
        }
    }

    #[test]
    fn test_decisions_reach_the_actuator() {
        let mut system = system();
        let id = Uuid::new_v4();
        let mut host = MockHost::new();
        host.expect_sense().returning(move |_| {
            Ok(CombatContext::new(SelfStatus::new(id, Vec3::ZERO)))
        });
        host.expect_execute()
            .withf(move |combatant, decision| *combatant == id && decision.action == ActionType::Observe)
            .times(1)
            .returning(|_, _| ());

        system.tick_combatant(id, &mut host);
        assert_eq!(system.histories()[&id].len(), 1);
    }
}
