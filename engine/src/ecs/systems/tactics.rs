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

//! Combat engine: threat assessment plus an ordered tactical rule cascade
//!
//! A think pass reads the context, turns it into neuron stimulation, lets the
//! brain settle (perceive, regulate, recompute affect) and then walks the
//! rule book. The first rule whose condition holds produces the decision.
//! Survival rules sit before aggression rules so a bandit about to be hit
//! always gets out of the way first.

use crate::config::TacticsConfig;
use crate::ecs::components::{saturate, Affect, Brain, Ensemble, NeuronKind, Stimulus};
use crate::ecs::knowledge::{CollectiveKnowledge, GlobalBiases};
use banditry_common::{
    ActionType, CombatContext, CombatantId, Decision, Movement, OpponentSighting, SelfStatus, Vec3,
};
use std::fmt;
use std::sync::Arc;

/// Closing speed (units/s) that counts as a full-speed charge
pub const CLOSING_SPEED_NORM: f32 = 6.0;

const REACH_WEIGHT: f32 = 0.35;
const CLOSING_WEIGHT: f32 = 0.20;
const AIM_WEIGHT: f32 = 0.20;
const WINDUP_CUE: f32 = 0.25;
const CROUCH_CUE: f32 = 0.10;
const BAIT_DISCOUNT: f32 = 0.30;
const BACKPEDAL_SPEED: f32 = -0.5;
const STRAFE_SPEED: f32 = 2.0;

const AGGRESSION_BASELINE: f32 = 0.25;
const AGGRESSION_RANGE_GAIN: f32 = 0.6;
const FEAR_HP_GAIN: f32 = 0.5;
const FEAR_IMMINENCE_GAIN: f32 = 0.3;
const FEAR_DANGER_GAIN: f32 = 0.3;
const FEAR_BIAS_GAIN: f32 = 0.3;

/// Fear above which an evading bandit backs off instead of sidestepping
const EVADE_BACKSTEP_FEAR: f32 = 0.5;

/// How threatening a context looks, computed once per think pass
#[derive(Debug, Clone, PartialEq)]
pub struct ThreatReading {
    /// Nearest sensed opponent
    pub target: Option<CombatantId>,
    /// Distance to the target, infinite when there is none
    pub distance: f32,
    pub hp_stress: f32,
    /// How likely the target is to land a blow right now, in [0, 1]
    pub imminence: f32,
    pub urgency: f32,
    /// Closeness relative to twice the close range, in [0, 1]
    pub proximity: f32,
    /// Closeness relative to the engage range, in [0, 1]
    pub engage_closeness: f32,
    /// The target is feinting a wind-up while backing off or strafing
    pub baiting: bool,
    /// Collective danger estimate of the target
    pub danger: f32,
    pub biases: GlobalBiases,
    pub cover: Option<Vec3>,
    /// Whether the thinker owns the configured burst ability
    pub burst_ability: bool,
}

impl Default for ThreatReading {
    fn default() -> Self {
        Self {
            target: None,
            distance: f32::INFINITY,
            hp_stress: 0.0,
            imminence: 0.0,
            urgency: 0.0,
            proximity: 0.0,
            engage_closeness: 0.0,
            baiting: false,
            danger: 0.0,
            biases: GlobalBiases::default(),
            cover: None,
            burst_ability: false,
        }
    }
}

/// Estimate how soon `opponent` will hit `me`; also reports whether the
/// wind-up looks like bait
pub fn attack_imminence(me: &SelfStatus, opponent: &OpponentSighting) -> (f32, bool) {
    let toward_me = (me.position - opponent.position).normalized();
    let distance = if opponent.distance.is_nan() {
        f32::INFINITY
    } else {
        opponent.distance.max(0.0)
    };

    let reach = opponent.reach.max(f32::EPSILON);
    let reach_term = saturate(1.0 - (distance - reach) / reach);

    let closing_speed = (opponent.velocity - me.velocity).dot(toward_me);
    let closing = saturate(closing_speed / CLOSING_SPEED_NORM);
    let aim = saturate(opponent.aim.dot(toward_me));

    let mut cues = 0.0;
    if opponent.winding_up {
        cues += WINDUP_CUE;
    }
    if opponent.crouching {
        cues += CROUCH_CUE;
    }

    // the opponent's own motion: moving away from me, or across my line of sight
    let own_approach = opponent.velocity.dot(toward_me);
    let lateral = (opponent.velocity - toward_me * own_approach).length();
    let baiting = opponent.winding_up && (own_approach < BACKPEDAL_SPEED || lateral > STRAFE_SPEED);
    let bait = if baiting { BAIT_DISCOUNT } else { 0.0 };

    let imminence =
        saturate(REACH_WEIGHT * reach_term + CLOSING_WEIGHT * closing + AIM_WEIGHT * aim + cues - bait);
    (imminence, baiting)
}

/// Everything a tactical rule may look at
#[derive(Debug)]
pub struct Situation<'a> {
    pub reading: &'a ThreatReading,
    pub tactics: &'a TacticsConfig,
    pub states: Ensemble,
    pub affect: Affect,
    pub morale: f32,
}

impl Situation<'_> {
    pub fn state(&self, kind: NeuronKind) -> f32 {
        self.states[kind.index()]
    }
}

/// One entry in the cascade
#[derive(Clone, Copy)]
pub struct TacticalRule {
    pub name: &'static str,
    pub applies: fn(&Situation) -> bool,
    pub decide: fn(&Situation) -> Decision,
}

impl fmt::Debug for TacticalRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TacticalRule").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Ordered tactical rules; the first applicable rule wins
#[derive(Debug, Clone)]
pub struct RuleBook {
    rules: Vec<TacticalRule>,
}

impl RuleBook {
    /// Name reported when no rule applies
    pub const FALLBACK: &'static str = "fallback";

    pub fn new(rules: Vec<TacticalRule>) -> Self {
        Self { rules }
    }

    /// The shipped cascade, survival first
    pub fn standard() -> Self {
        Self::new(vec![
            TacticalRule {
                name: "no_target",
                applies: |s| s.reading.target.is_none(),
                decide: |_| Decision::new(ActionType::Observe, Movement::Hold),
            },
            TacticalRule {
                name: "hold_distance",
                applies: |s| {
                    s.morale < s.tactics.low_morale
                        && s.reading.distance <= s.tactics.close_range
                        && s.state(NeuronKind::Reflex) < s.tactics.reflex_evade
                },
                decide: |s| {
                    Decision::new(
                        ActionType::Observe,
                        Movement::KeepDistance {
                            range: s.tactics.close_range,
                        },
                    )
                    .with_target(s.reading.target)
                    .with_utterance("Easy now...")
                },
            },
            TacticalRule {
                name: "evade",
                applies: |s| s.state(NeuronKind::Reflex) >= s.tactics.reflex_evade,
                decide: |s| {
                    let movement = if s.state(NeuronKind::Fear) > EVADE_BACKSTEP_FEAR {
                        Movement::Backstep
                    } else {
                        Movement::Sidestep
                    };
                    Decision::new(ActionType::Evade, movement).with_target(s.reading.target)
                },
            },
            TacticalRule {
                name: "punish_bait",
                applies: |s| s.reading.baiting && s.morale >= s.tactics.attack_morale,
                decide: |s| {
                    Decision::new(ActionType::Counter, Movement::Approach)
                        .with_target(s.reading.target)
                        .with_utterance("Not falling for that!")
                },
            },
            TacticalRule {
                name: "press_attack",
                applies: |s| s.morale >= s.tactics.attack_morale,
                decide: |s| {
                    let decision = Decision::new(ActionType::Attack, Movement::Approach)
                        .with_target(s.reading.target);
                    if s.reading.burst_ability && s.affect.adrenaline >= s.tactics.adrenaline_burst {
                        decision
                            .with_ability(s.tactics.burst_ability.clone())
                            .with_utterance("No mercy!")
                    } else {
                        decision
                    }
                },
            },
            TacticalRule {
                name: "fall_back",
                applies: |_| true,
                decide: |s| {
                    let movement = match s.reading.cover {
                        Some(position) => Movement::TakeCover { position },
                        None => Movement::Withdraw,
                    };
                    Decision::new(ActionType::Retreat, movement)
                        .with_target(s.reading.target)
                        .with_utterance("Fall back!")
                },
            },
        ])
    }

    pub fn rules(&self) -> &[TacticalRule] {
        &self.rules
    }

    /// Evaluate the cascade; an empty or exhausted book observes in place
    pub fn resolve(&self, situation: &Situation) -> (&'static str, Decision) {
        self.rules
            .iter()
            .find(|rule| (rule.applies)(situation))
            .map(|rule| (rule.name, (rule.decide)(situation)))
            .unwrap_or_else(|| {
                (
                    Self::FALLBACK,
                    Decision::new(ActionType::Observe, Movement::Hold).with_target(situation.reading.target),
                )
            })
    }
}

impl Default for RuleBook {
    fn default() -> Self {
        Self::standard()
    }
}

/// Result of a think pass
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub decision: Decision,
    /// Name of the rule that fired
    pub rule: &'static str,
    pub morale: f32,
    /// Whether the regulator intervened during this pass
    pub regulated: bool,
}

/// Stateless decision maker shared by every brain
#[derive(Debug, Clone)]
pub struct CombatEngine {
    tactics: TacticsConfig,
    rules: RuleBook,
    knowledge: Arc<CollectiveKnowledge>,
}

impl CombatEngine {
    pub fn new(tactics: TacticsConfig, knowledge: Arc<CollectiveKnowledge>) -> Self {
        Self {
            tactics,
            rules: RuleBook::standard(),
            knowledge,
        }
    }

    /// Replace the rule cascade
    pub fn with_rules(mut self, rules: RuleBook) -> Self {
        self.rules = rules;
        self
    }

    pub fn tactics(&self) -> &TacticsConfig {
        &self.tactics
    }

    pub fn knowledge(&self) -> &Arc<CollectiveKnowledge> {
        &self.knowledge
    }

    /// Read the context against the nearest opponent and collective knowledge
    pub fn assess(&self, context: &CombatContext) -> ThreatReading {
        let me = &context.me;
        let hp_stress = saturate(1.0 - me.hp_pct / 100.0);
        let biases = self.knowledge.biases();
        let burst_ability = me.has_ability(&self.tactics.burst_ability);

        let Some(opponent) = context.nearest_opponent() else {
            return ThreatReading {
                hp_stress,
                urgency: hp_stress,
                biases,
                cover: context.cover,
                burst_ability,
                ..ThreatReading::default()
            };
        };

        let distance = opponent.distance.max(0.0);
        let (imminence, baiting) = attack_imminence(me, opponent);
        ThreatReading {
            target: Some(opponent.id),
            distance,
            hp_stress,
            imminence,
            urgency: hp_stress.max(imminence),
            proximity: saturate(1.0 - distance / (2.0 * self.tactics.close_range)),
            engage_closeness: saturate(1.0 - distance / self.tactics.engage_range),
            baiting,
            danger: self.knowledge.danger_of(opponent.id),
            biases,
            cover: context.cover,
            burst_ability,
        }
    }

    /// Map a reading onto per-neuron drive
    pub fn stimulus(&self, reading: &ThreatReading) -> Stimulus {
        Stimulus {
            aggression: saturate(AGGRESSION_BASELINE + AGGRESSION_RANGE_GAIN * reading.engage_closeness),
            fear: FEAR_HP_GAIN * reading.hp_stress
                + FEAR_IMMINENCE_GAIN * reading.imminence
                + FEAR_DANGER_GAIN * reading.danger.min(1.0)
                + FEAR_BIAS_GAIN * reading.biases.fear,
            tactical: reading.proximity,
            reflex: reading.imminence,
        }
    }

    /// Full think pass: settle the brain against the context, then decide
    pub fn think(&self, brain: &mut Brain, context: &CombatContext) -> Verdict {
        let reading = self.assess(context);
        let stimulus = self.stimulus(&reading);

        brain.perceive(&stimulus, reading.urgency);
        let regulated = brain.regulate();
        brain.recompute_affect(reading.urgency);

        let mut verdict = self.decide(brain, &reading);
        verdict.regulated = regulated;
        brain.record(verdict.decision.action, verdict.morale);

        tracing::debug!(
            brain = %brain.id(),
            rule = verdict.rule,
            action = %verdict.decision.action,
            morale = verdict.morale,
            imminence = reading.imminence,
            "Decision made"
        );
        verdict
    }

    /// Run the cascade against the brain's current state without touching it
    pub fn decide(&self, brain: &Brain, reading: &ThreatReading) -> Verdict {
        let morale = brain.morale(reading.biases, self.tactics.bias_weight);
        let situation = Situation {
            reading,
            tactics: &self.tactics,
            states: brain.ensemble(),
            affect: brain.affect(),
            morale,
        };
        let (rule, decision) = self.rules.resolve(&situation);
        Verdict {
            decision,
            rule,
            morale,
            regulated: false,
        }
    }
}
