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

//! Per-combatant brain: a fixed neuron ensemble plus derived affect
//!
//! A brain lives exactly as long as its combatant. Each tick the orchestrator
//! folds queued experience in (`digest_experience`), the combat engine then
//! perceives, regulates, recomputes affect and decides.

use super::neuron::{Ensemble, Neuron, NeuronKind};
use super::regulator::Regulator;
use super::saturate;
use crate::config::CognitionConfig;
use crate::ecs::knowledge::GlobalBiases;
use crate::error::WiringError;
use banditry_common::{ActionType, CombatantId};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Fixed-point scale of the experience ledger (micro-units)
const LEDGER_SCALE: f32 = 1_000_000.0;
/// Largest single credit accepted, keeps the fixed-point sum far from overflow
const LEDGER_MAX_CREDIT: f32 = 1_000.0;

const REWARD_AGGRESSION_GAIN: f32 = 0.30;
const REWARD_FEAR_RELIEF: f32 = 0.10;
const PENALTY_FEAR_GAIN: f32 = 0.50;
const PENALTY_TACTICAL_GAIN: f32 = 0.30;
const PENALTY_FRUSTRATION_GAIN: f32 = 0.40;
const REWARD_FRUSTRATION_RELIEF: f32 = 0.20;
/// Base decay shift per unit of experience; hits taken sensitise fear and reflex,
/// hits landed quicken aggression and calm fear
const PENALTY_SENSITISATION: f32 = 0.05;
const REWARD_SENSITISATION: f32 = 0.05;

const MORALE_COMPOSURE_DAMPING: f32 = 0.3;

/// Base decay per neuron (smaller is more persistent)
const BASE_DECAYS: [(NeuronKind, f32); NeuronKind::COUNT] = [
    (NeuronKind::Aggression, 0.30),
    (NeuronKind::Fear, 0.20),
    (NeuronKind::Tactical, 0.40),
    (NeuronKind::Reflex, 0.70),
];

/// (source, target, weight)
const DEFAULT_SYNAPSES: [(NeuronKind, NeuronKind, f32); 5] = [
    (NeuronKind::Fear, NeuronKind::Aggression, -0.40),
    (NeuronKind::Aggression, NeuronKind::Fear, -0.20),
    (NeuronKind::Tactical, NeuronKind::Aggression, 0.10),
    (NeuronKind::Fear, NeuronKind::Tactical, 0.30),
    (NeuronKind::Fear, NeuronKind::Reflex, 0.20),
];

/// Reward and penalty queued between ticks
///
/// Event handlers may credit from any thread; credits are integer `fetch_add`s so
/// delivery order never changes the total. The owning brain drains it once per tick.
#[derive(Debug, Default)]
pub struct ExperienceLedger {
    reward: AtomicU64,
    penalty: AtomicU64,
}

impl ExperienceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue reward (e.g. a landed hit); non-positive amounts are ignored
    pub fn credit_reward(&self, amount: f32) {
        Self::credit(&self.reward, amount);
    }

    /// Queue penalty (e.g. a hit taken); non-positive amounts are ignored
    pub fn credit_penalty(&self, amount: f32) {
        Self::credit(&self.penalty, amount);
    }

    /// Amounts currently queued, without draining
    pub fn pending(&self) -> Experience {
        Experience {
            reward: from_fixed(self.reward.load(Ordering::Acquire)),
            penalty: from_fixed(self.penalty.load(Ordering::Acquire)),
        }
    }

    /// Take everything queued, leaving the ledger empty
    pub fn drain(&self) -> Experience {
        Experience {
            reward: from_fixed(self.reward.swap(0, Ordering::AcqRel)),
            penalty: from_fixed(self.penalty.swap(0, Ordering::AcqRel)),
        }
    }

    fn credit(slot: &AtomicU64, amount: f32) {
        if !(amount > 0.0) {
            return;
        }
        let units = (amount.min(LEDGER_MAX_CREDIT) * LEDGER_SCALE) as u64;
        slot.fetch_add(units, Ordering::AcqRel);
    }
}

fn from_fixed(units: u64) -> f32 {
    (units as f64 / LEDGER_SCALE as f64) as f32
}

/// Experience folded in by one digest
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Experience {
    pub reward: f32,
    pub penalty: f32,
}

impl Experience {
    pub fn is_empty(&self) -> bool {
        self.reward == 0.0 && self.penalty == 0.0
    }
}

/// External drive applied to each neuron on one tick
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Stimulus {
    pub aggression: f32,
    pub fear: f32,
    pub tactical: f32,
    pub reflex: f32,
}

impl Stimulus {
    pub fn get(&self, kind: NeuronKind) -> f32 {
        match kind {
            NeuronKind::Aggression => self.aggression,
            NeuronKind::Fear => self.fear,
            NeuronKind::Tactical => self.tactical,
            NeuronKind::Reflex => self.reflex,
        }
    }
}

/// Affective scalars recomputed once per tick from the ensemble
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Affect {
    pub adrenaline: f32,
    pub composure: f32,
    pub frustration: f32,
    /// How urgently and erratically the brain is reacting; shortens time constants
    pub temperature: f32,
}

impl Default for Affect {
    fn default() -> Self {
        Self {
            adrenaline: 0.0,
            composure: 0.5,
            frustration: 0.0,
            temperature: 0.0,
        }
    }
}

/// One entry of a brain's post-combat history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrainSnapshot {
    pub tick: u64,
    pub states: Ensemble,
    pub morale: f32,
    pub affect: Affect,
    pub action: ActionType,
}

#[derive(Debug)]
pub struct Brain {
    id: CombatantId,
    neurons: [Neuron; NeuronKind::COUNT],
    regulator: Regulator,
    affect: Affect,
    ledger: Arc<ExperienceLedger>,
    previous: Ensemble,
    last_stimulus: Stimulus,
    ticks: u64,
    history: VecDeque<BrainSnapshot>,
    history_capacity: usize,
}

impl Brain {
    /// Create a resting brain with the standard wiring and a fresh ledger
    pub fn new(id: CombatantId, config: &CognitionConfig) -> Self {
        Self::with_ledger(id, config, Arc::new(ExperienceLedger::new()))
    }

    /// Create a brain around an existing ledger (credits already queued are kept)
    pub fn with_ledger(id: CombatantId, config: &CognitionConfig, ledger: Arc<ExperienceLedger>) -> Self {
        let mut neurons = BASE_DECAYS.map(|(kind, decay)| Neuron::new(kind, decay));
        for (source, target, weight) in DEFAULT_SYNAPSES {
            let target = &mut neurons[target.index()];
            // the default table has no self-loops and only finite weights
            if let Err(err) = target.connect(source, weight) {
                tracing::error!("Default wiring rejected: {}", err);
            }
        }

        Self {
            id,
            neurons,
            regulator: Regulator::new(Regulator::DEFAULT_ZONE, config.regulator.clone()),
            affect: Affect::default(),
            ledger,
            previous: [0.0; NeuronKind::COUNT],
            last_stimulus: Stimulus::default(),
            ticks: 0,
            history: VecDeque::with_capacity(config.history_capacity),
            history_capacity: config.history_capacity,
        }
    }

    pub fn id(&self) -> CombatantId {
        self.id
    }

    pub fn neuron(&self, kind: NeuronKind) -> &Neuron {
        &self.neurons[kind.index()]
    }

    pub fn neurons(&self) -> &[Neuron; NeuronKind::COUNT] {
        &self.neurons
    }

    pub fn state(&self, kind: NeuronKind) -> f32 {
        self.neurons[kind.index()].state()
    }

    /// Current activation of every neuron
    pub fn ensemble(&self) -> Ensemble {
        self.neurons.each_ref().map(|n| n.state())
    }

    /// Force one neuron's activation
    pub fn set_state(&mut self, kind: NeuronKind, state: f32) {
        self.neurons[kind.index()].set_state(state);
    }

    pub fn affect(&self) -> Affect {
        self.affect
    }

    pub fn regulator(&self) -> &Regulator {
        &self.regulator
    }

    /// Handle for event callbacks to queue reward and penalty
    pub fn ledger(&self) -> Arc<ExperienceLedger> {
        Arc::clone(&self.ledger)
    }

    /// Stimulus applied on the most recent perceive pass
    pub fn last_stimulus(&self) -> Stimulus {
        self.last_stimulus
    }

    /// Ticks this brain has thought through; doubles as combat experience
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn history(&self) -> impl Iterator<Item = &BrainSnapshot> {
        self.history.iter()
    }

    /// Replace or add the synapse `source -> target`
    pub fn rewire(&mut self, source: NeuronKind, target: NeuronKind, weight: f32) -> Result<(), WiringError> {
        self.neurons[target.index()].connect(source, weight)
    }

    /// Fold queued reward and penalty into the ensemble. Call exactly once per
    /// tick, before thinking.
    pub fn digest_experience(&mut self) -> Experience {
        let experience = self.ledger.drain();
        if experience.is_empty() {
            return experience;
        }

        let Experience { reward, penalty } = experience;
        self.neurons[NeuronKind::Aggression.index()].stimulate(reward * REWARD_AGGRESSION_GAIN);
        self.neurons[NeuronKind::Fear.index()]
            .stimulate(penalty * PENALTY_FEAR_GAIN - reward * REWARD_FEAR_RELIEF);
        self.neurons[NeuronKind::Tactical.index()].stimulate(penalty * PENALTY_TACTICAL_GAIN);
        self.affect.frustration = saturate(
            self.affect.frustration + penalty * PENALTY_FRUSTRATION_GAIN
                - reward * REWARD_FRUSTRATION_RELIEF,
        );

        // experience reshapes the reaction profile, which is what mentoring passes on
        self.neurons[NeuronKind::Fear.index()]
            .adapt((penalty - reward) * PENALTY_SENSITISATION);
        self.neurons[NeuronKind::Reflex.index()].adapt(penalty * PENALTY_SENSITISATION);
        self.neurons[NeuronKind::Aggression.index()].adapt(reward * REWARD_SENSITISATION);

        tracing::trace!(brain = %self.id, reward, penalty, "Digested experience");
        experience
    }

    /// Drive every neuron from the pre-update ensemble at last tick's temperature
    pub fn perceive(&mut self, stimulus: &Stimulus, urgency: f32) {
        let ensemble = self.ensemble();
        let temperature = self.affect.temperature;
        for neuron in self.neurons.iter_mut() {
            neuron.update(stimulus.get(neuron.kind()), urgency, temperature, &ensemble);
        }
        self.previous = ensemble;
        self.last_stimulus = *stimulus;
    }

    /// Homeostatic pass at last tick's temperature; returns whether it intervened
    pub fn regulate(&mut self) -> bool {
        self.regulator.regulate(&mut self.neurons, self.affect.temperature)
    }

    /// Recompute adrenaline, frustration, composure and temperature
    pub fn recompute_affect(&mut self, urgency: f32) {
        let urgency = saturate(urgency);
        let reflex = self.state(NeuronKind::Reflex);
        let tactical = self.state(NeuronKind::Tactical);
        let affect = &mut self.affect;

        affect.adrenaline = saturate(0.8 * affect.adrenaline + 0.4 * urgency.max(reflex));
        affect.frustration = saturate(0.95 * affect.frustration);
        affect.composure =
            saturate(0.6 * tactical + 0.4 * (1.0 - affect.adrenaline) - 0.3 * affect.frustration);

        let volatility = self
            .neurons
            .iter()
            .zip(self.previous.iter())
            .map(|(n, prev)| (n.state() - prev).abs())
            .sum::<f32>()
            / NeuronKind::COUNT as f32;
        affect.temperature =
            saturate(0.5 * affect.adrenaline + 0.3 * affect.frustration + 0.8 * volatility);
    }

    /// Willingness to fight, in [-1, 1]
    pub fn morale(&self, biases: GlobalBiases, bias_weight: f32) -> f32 {
        let aggression = self.state(NeuronKind::Aggression);
        let fear = self.state(NeuronKind::Fear);
        let composure = self.affect.composure;
        let morale = aggression - fear * (1.0 - composure * MORALE_COMPOSURE_DAMPING)
            + bias_weight * (biases.aggression - biases.fear);
        if morale.is_nan() { 0.0 } else { morale.clamp(-1.0, 1.0) }
    }

    /// Close out a think pass: count the tick and keep a snapshot
    pub fn record(&mut self, action: ActionType, morale: f32) {
        self.ticks += 1;
        if self.history_capacity == 0 {
            return;
        }
        while self.history.len() >= self.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(BrainSnapshot {
            tick: self.ticks,
            states: self.ensemble(),
            morale,
            affect: self.affect,
            action,
        });
    }

    /// Drift every neuron's reaction profile toward a mentor's
    pub fn mimic(&mut self, mentor: &[Neuron; NeuronKind::COUNT], rate: f32) {
        for (neuron, leader) in self.neurons.iter_mut().zip(mentor.iter()) {
            neuron.mimic(leader, rate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::neuron::{DECAY_CEILING, DECAY_FLOOR};

    fn brain() -> Brain {
        Brain::new(uuid::Uuid::new_v4(), &CognitionConfig::default())
    }

    #[test]
    fn test_default_wiring_has_no_self_loops() {
        let brain = brain();
        for neuron in brain.neurons() {
            assert!(neuron.synapses().iter().all(|s| s.source != neuron.kind()));
        }
        assert_eq!(brain.neuron(NeuronKind::Aggression).synapses().len(), 2);
    }

    #[test]
    fn test_rewire_rejects_self_loop() {
        let mut brain = brain();
        assert_eq!(
            brain.rewire(NeuronKind::Fear, NeuronKind::Fear, 1.0),
            Err(WiringError::SelfSynapse(NeuronKind::Fear))
        );
        assert!(brain.rewire(NeuronKind::Reflex, NeuronKind::Fear, 0.5).is_ok());
    }

    #[test]
    fn test_digest_with_nothing_queued_is_noop() {
        let mut brain = brain();
        brain.set_state(NeuronKind::Fear, 0.4);
        let before = brain.ensemble();
        let affect = brain.affect();

        let experience = brain.digest_experience();
        assert!(experience.is_empty());
        assert_eq!(brain.ensemble(), before);
        assert_eq!(brain.affect(), affect);
    }

    #[test]
    fn test_digest_twice_equals_once() {
        let mut once = brain();
        let mut twice = brain();
        for b in [&once, &twice] {
            b.ledger().credit_reward(0.5);
            b.ledger().credit_penalty(0.4);
        }

        once.digest_experience();
        twice.digest_experience();
        let second = twice.digest_experience();

        assert!(second.is_empty());
        assert_eq!(once.ensemble(), twice.ensemble());
        assert_eq!(once.affect(), twice.affect());
    }

    #[test]
    fn test_reward_emboldens_penalty_frightens() {
        let mut brain = brain();
        brain.set_state(NeuronKind::Fear, 0.3);
        brain.ledger().credit_reward(1.0);
        brain.digest_experience();
        assert!((brain.state(NeuronKind::Aggression) - 0.3).abs() < 1e-6);
        assert!((brain.state(NeuronKind::Fear) - 0.2).abs() < 1e-6);

        brain.ledger().credit_penalty(1.0);
        brain.digest_experience();
        assert!((brain.state(NeuronKind::Fear) - 0.7).abs() < 1e-6);
        assert!((brain.state(NeuronKind::Tactical) - 0.3).abs() < 1e-6);
        assert!(brain.affect().frustration > 0.0);
    }

    #[test]
    fn test_ledger_ignores_non_positive_credits() {
        let ledger = ExperienceLedger::new();
        ledger.credit_reward(-1.0);
        ledger.credit_reward(f32::NAN);
        ledger.credit_penalty(0.0);
        assert!(ledger.pending().is_empty());
    }

    #[test]
    fn test_ledger_credits_commute_across_threads() {
        let ledger = Arc::new(ExperienceLedger::new());
        std::thread::scope(|scope| {
            for _ in 0..8 {
                let ledger = Arc::clone(&ledger);
                scope.spawn(move || {
                    for _ in 0..1000 {
                        ledger.credit_reward(0.001);
                        ledger.credit_penalty(0.002);
                    }
                });
            }
        });
        let drained = ledger.drain();
        assert!((drained.reward - 8.0).abs() < 1e-3);
        assert!((drained.penalty - 16.0).abs() < 1e-3);
        assert!(ledger.drain().is_empty());
    }

    #[test]
    fn test_perceive_records_stimulus_and_moves_states() {
        let mut brain = brain();
        let stimulus = Stimulus {
            aggression: 0.6,
            fear: 0.2,
            tactical: 0.1,
            reflex: 0.9,
        };
        brain.perceive(&stimulus, 0.0);
        assert_eq!(brain.last_stimulus(), stimulus);
        assert!(brain.state(NeuronKind::Reflex) > brain.state(NeuronKind::Tactical));
        assert!(brain.ensemble().iter().all(|s| (0.0..=1.0).contains(s)));
    }

    #[test]
    fn test_affect_heats_under_urgency() {
        let mut brain = brain();
        let calm = brain.affect();
        brain.perceive(
            &Stimulus {
                aggression: 1.0,
                fear: 1.0,
                tactical: 1.0,
                reflex: 1.0,
            },
            1.0,
        );
        brain.recompute_affect(1.0);
        assert!(brain.affect().adrenaline > calm.adrenaline);
        assert!(brain.affect().temperature > calm.temperature);
    }

    #[test]
    fn test_morale_formula() {
        let mut brain = brain();
        brain.set_state(NeuronKind::Aggression, 0.8);
        brain.set_state(NeuronKind::Fear, 0.1);
        // composure starts at 0.5
        let expected = 0.8 - 0.1 * (1.0 - 0.5 * 0.3);
        assert!((brain.morale(GlobalBiases::default(), 0.2) - expected).abs() < 1e-6);

        let fearful = GlobalBiases {
            aggression: 0.0,
            fear: 1.0,
        };
        assert!(brain.morale(fearful, 0.2) < brain.morale(GlobalBiases::default(), 0.2));
    }

    #[test]
    fn test_history_is_bounded_and_ordered() {
        let config = CognitionConfig {
            history_capacity: 3,
            ..CognitionConfig::default()
        };
        let mut brain = Brain::new(uuid::Uuid::new_v4(), &config);
        for _ in 0..5 {
            brain.record(ActionType::Observe, 0.0);
        }
        let ticks: Vec<u64> = brain.history().map(|s| s.tick).collect();
        assert_eq!(ticks, vec![3, 4, 5]);
        assert_eq!(brain.ticks(), 5);
    }

    #[test]
    fn test_experience_reshapes_reaction_profile() {
        let mut brain = brain();
        let fear = brain.neuron(NeuronKind::Fear).base_decay();
        let reflex = brain.neuron(NeuronKind::Reflex).base_decay();
        let aggression = brain.neuron(NeuronKind::Aggression).base_decay();

        brain.ledger().credit_penalty(1.0);
        brain.digest_experience();
        assert!(brain.neuron(NeuronKind::Fear).base_decay() > fear);
        assert!(brain.neuron(NeuronKind::Reflex).base_decay() > reflex);
        assert_eq!(brain.neuron(NeuronKind::Aggression).base_decay(), aggression);

        brain.ledger().credit_reward(1.0);
        brain.digest_experience();
        assert!(brain.neuron(NeuronKind::Aggression).base_decay() > aggression);

        for _ in 0..1_000 {
            brain.ledger().credit_penalty(10.0);
            brain.digest_experience();
        }
        for neuron in brain.neurons() {
            assert!((DECAY_FLOOR..=DECAY_CEILING).contains(&neuron.base_decay()));
        }
    }

    #[test]
    fn test_mimic_stays_in_band() {
        let mut novice = brain();
        let mut veteran = brain();
        for _ in 0..20 {
            veteran.ledger().credit_penalty(1.0);
            veteran.digest_experience();
        }
        assert_eq!(veteran.neuron(NeuronKind::Reflex).base_decay(), DECAY_CEILING);
        for _ in 0..10_000 {
            novice.mimic(veteran.neurons(), 0.5);
        }
        for neuron in novice.neurons() {
            assert!((DECAY_FLOOR..=DECAY_CEILING).contains(&neuron.base_decay()));
        }
        assert!((novice.neuron(NeuronKind::Reflex).base_decay() - 0.95).abs() < 1e-4);
    }
}
