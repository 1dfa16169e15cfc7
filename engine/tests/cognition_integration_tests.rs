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

//! End-to-end tests of the cognition system driving the reference arena

use banditry_engine::common::{ActionType, Decision, Movement, Vec3};
use banditry_engine::config::CognitionConfig;
use banditry_engine::ecs::components::{
    Abilities, Armament, BrainSnapshot, Faction, Fighter, NeuronKind, Vitals, DECAY_CEILING, DECAY_FLOOR,
};
use banditry_engine::ecs::events::EventBus;
use banditry_engine::ecs::systems::{Arena, CognitionSystem, TickSummary};
use banditry_engine::ecs::{Actuator, CollectiveKnowledge};
use std::collections::HashMap;
use std::sync::Arc;

struct Simulation {
    arena: Arena,
    system: CognitionSystem,
    bus: EventBus,
    knowledge: Arc<CollectiveKnowledge>,
}

impl Simulation {
    fn new(seed: u64) -> Self {
        let config = CognitionConfig::default();
        let knowledge = Arc::new(CollectiveKnowledge::new(config.knowledge.clone()));
        let system = CognitionSystem::new(config, Arc::clone(&knowledge));
        let bus = EventBus::new();
        bus.attach(system.router());
        let arena = Arena::new(20.0, bus.clone(), Some(seed));
        Self {
            arena,
            system,
            bus,
            knowledge,
        }
    }

    fn tick(&mut self) -> TickSummary {
        self.bus.process_events();
        self.arena.step(0.1);
        let roster = self.arena.bandits();
        self.system.run_tick(&roster, &mut self.arena)
    }
}

#[test]
fn test_simulation_stays_in_bounds() {
    let mut sim = Simulation::new(42);
    sim.arena.populate(6, 3).unwrap();

    for _ in 0..300 {
        let summary = sim.tick();
        assert_eq!(summary.skipped, 0);

        // every bandit still standing has exactly one brain
        assert_eq!(sim.system.active_brains(), sim.arena.living(Faction::Bandit));

        for brain in sim.system.brains() {
            for neuron in brain.neurons() {
                assert!((0.0..=1.0).contains(&neuron.state()));
                assert!((DECAY_FLOOR..=DECAY_CEILING).contains(&neuron.base_decay()));
            }
            let affect = brain.affect();
            for value in [affect.adrenaline, affect.composure, affect.frustration, affect.temperature] {
                assert!((0.0..=1.0).contains(&value));
            }
            assert!(brain.regulator().glutamate() >= 0.0);
        }

        let biases = sim.knowledge.biases();
        assert!((0.0..=1.0).contains(&biases.aggression));
        assert!((0.0..=1.0).contains(&biases.fear));

        for bandit in sim.arena.bandits() {
            let position = sim.arena.position_of(bandit).unwrap();
            assert!(position.length() <= sim.arena.radius() + 1e-3);
        }
    }
    assert_eq!(sim.system.world_tick(), 300);
}

#[test]
fn test_bandits_take_action_against_defenders() {
    let mut sim = Simulation::new(7);
    let bandit = sim.arena.spawn_bandit("scout", Vec3::ZERO).unwrap();
    sim.arena.spawn_defender("guard", Vec3::new(6.0, 0.0, 0.0)).unwrap();

    let summary = sim.tick();
    assert_eq!(summary.acted, 1);

    let brain = sim.system.brain(bandit).unwrap();
    assert_eq!(brain.ticks(), 1);
    assert!(brain.state(NeuronKind::Aggression) > 0.0);
    assert!(brain.state(NeuronKind::Tactical) > 0.0);
}

#[test]
fn test_death_discards_brain_and_spreads_fear() {
    let mut sim = Simulation::new(3);
    let doomed = uuid::Uuid::new_v4();
    sim.arena
        .spawn_fighter(
            Fighter::new(doomed, Faction::Bandit, "doomed"),
            Vec3::ZERO,
            Vitals { hp: 1.0, max_hp: 60.0 },
            Armament::new("sabre", 1.6, 9.0, 0.8),
            Abilities::default(),
        )
        .unwrap();
    let survivor = sim.arena.spawn_bandit("survivor", Vec3::new(-3.0, 0.0, 0.0)).unwrap();
    let guard = sim.arena.spawn_defender("guard", Vec3::new(1.0, 0.0, 0.0)).unwrap();

    assert_eq!(sim.tick().acted, 2);
    assert!(sim.system.brain(doomed).is_some());

    // the guard cuts the doomed bandit down between ticks
    sim.arena.execute(
        guard,
        &Decision::new(ActionType::Attack, Movement::Hold).with_target(Some(doomed)),
    );
    assert!(!sim.arena.vitals_of(doomed).unwrap().is_alive());

    // the corpse is still on the roster until the next step reaps it
    sim.bus.process_events();
    let roster = sim.arena.bandits();
    assert_eq!(roster.len(), 2);
    let summary = sim.system.run_tick(&roster, &mut sim.arena);
    assert_eq!(summary.discarded, 1);
    assert!(sim.system.brain(doomed).is_none());
    assert_eq!(sim.system.active_brains(), 1);

    let killer = sim.knowledge.profile(guard).unwrap();
    assert_eq!(killer.kills, 1);
    assert!(killer.danger > 0.0);
    assert_eq!(killer.preferred_weapon.as_deref(), Some("halberd"));
    assert!(sim.knowledge.biases().fear > 0.0);

    let brain = sim.system.brain(survivor).unwrap();
    assert!(brain.last_stimulus().fear > 0.0);
}

#[test]
fn test_histories_export_as_json() {
    let mut sim = Simulation::new(5);
    sim.arena.populate(3, 1).unwrap();
    for _ in 0..10 {
        sim.tick();
    }

    let histories = sim.system.histories();
    assert!(!histories.is_empty());
    let json = serde_json::to_string(&histories).unwrap();
    let parsed: HashMap<uuid::Uuid, Vec<BrainSnapshot>> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.len(), histories.len());
    for (id, snapshots) in &parsed {
        assert_eq!(snapshots.len(), histories[id].len());
        assert!(snapshots.windows(2).all(|pair| pair[0].tick < pair[1].tick));
    }
}
