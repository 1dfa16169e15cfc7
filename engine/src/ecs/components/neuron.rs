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

//! Leaky-integrator neuron with an adaptive time constant

use super::saturate;
use crate::error::WiringError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lower bound of a neuron's intrinsic decay
pub const DECAY_FLOOR: f32 = 0.05;
/// Upper bound of a neuron's intrinsic decay
pub const DECAY_CEILING: f32 = 0.95;
/// How strongly system temperature shortens the time constant
pub const THERMAL_GAIN: f32 = 0.2;

const ALPHA_FLOOR: f32 = 0.01;

/// The fixed neuron roster of every brain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NeuronKind {
    Aggression,
    Fear,
    Tactical,
    Reflex,
}

impl NeuronKind {
    pub const COUNT: usize = 4;
    pub const ALL: [NeuronKind; NeuronKind::COUNT] = [
        NeuronKind::Aggression,
        NeuronKind::Fear,
        NeuronKind::Tactical,
        NeuronKind::Reflex,
    ];

    /// Stable index into a brain's neuron array
    pub const fn index(self) -> usize {
        match self {
            NeuronKind::Aggression => 0,
            NeuronKind::Fear => 1,
            NeuronKind::Tactical => 2,
            NeuronKind::Reflex => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NeuronKind::Aggression => "aggression",
            NeuronKind::Fear => "fear",
            NeuronKind::Tactical => "tactical",
            NeuronKind::Reflex => "reflex",
        }
    }
}

impl fmt::Display for NeuronKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pre-update activation of every neuron in a brain, indexed by `NeuronKind::index`
pub type Ensemble = [f32; NeuronKind::COUNT];

/// Incoming weighted connection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Synapse {
    pub source: NeuronKind,
    pub weight: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neuron {
    kind: NeuronKind,
    state: f32,
    base_decay: f32,
    synapses: Vec<Synapse>,
}

impl Neuron {
    /// Create a resting neuron; `base_decay` is clamped into the safe band
    pub fn new(kind: NeuronKind, base_decay: f32) -> Self {
        Self {
            kind,
            state: 0.0,
            base_decay: clamp_decay(base_decay),
            synapses: Vec::new(),
        }
    }

    pub fn kind(&self) -> NeuronKind {
        self.kind
    }

    pub fn state(&self) -> f32 {
        self.state
    }

    pub fn base_decay(&self) -> f32 {
        self.base_decay
    }

    pub fn synapses(&self) -> &[Synapse] {
        &self.synapses
    }

    /// Force the activation, e.g. when restoring or scripting a brain
    pub fn set_state(&mut self, state: f32) {
        self.state = saturate(state);
    }

    /// Listen to `source` with the given weight, replacing any existing synapse from it
    pub fn connect(&mut self, source: NeuronKind, weight: f32) -> Result<(), WiringError> {
        if source == self.kind {
            return Err(WiringError::SelfSynapse(source));
        }
        if !weight.is_finite() {
            return Err(WiringError::NonFiniteWeight {
                from: source,
                to: self.kind,
                weight,
            });
        }

        match self.synapses.iter_mut().find(|s| s.source == source) {
            Some(existing) => existing.weight = weight,
            None => self.synapses.push(Synapse { source, weight }),
        }
        Ok(())
    }

    /// External input plus weighted activation of the connected neurons
    pub fn synaptic_input(&self, input: f32, ensemble: &Ensemble) -> f32 {
        self.synapses
            .iter()
            .fold(input, |acc, s| acc + ensemble[s.source.index()] * s.weight)
    }

    /// Mixing coefficient: urgency and heat make the neuron track its input faster
    pub fn alpha(&self, urgency: f32, temperature: f32) -> f32 {
        let urgency = if urgency.is_nan() { 0.0 } else { urgency };
        let thermal = if temperature.is_nan() {
            0.0
        } else {
            (temperature * THERMAL_GAIN).max(0.0)
        };
        let alpha = self.base_decay + urgency * (1.0 - self.base_decay) + thermal;
        if alpha.is_nan() {
            ALPHA_FLOOR
        } else {
            alpha.clamp(ALPHA_FLOOR, 1.0)
        }
    }

    /// Exponential-smoothing step toward the synaptic input; returns the new state
    pub fn update(&mut self, input: f32, urgency: f32, temperature: f32, ensemble: &Ensemble) -> f32 {
        let target = self.synaptic_input(input, ensemble);
        let alpha = self.alpha(urgency, temperature);
        let next = self.state + alpha * (target - self.state);
        self.state = if next.is_finite() {
            saturate(next)
        } else if target.is_nan() {
            self.state
        } else {
            // infinite drive saturates in its direction
            saturate(target)
        };
        self.state
    }

    /// Additive nudge used when folding experience into the brain
    pub fn stimulate(&mut self, delta: f32) {
        if delta.is_finite() {
            self.state = saturate(self.state + delta);
        }
    }

    /// Shift the reaction profile; positive makes the neuron track its input faster
    pub fn adapt(&mut self, delta: f32) {
        if delta.is_finite() {
            self.base_decay = clamp_decay(self.base_decay + delta);
        }
    }

    /// Pull activation toward zero by the given fraction
    pub fn apply_inhibition(&mut self, strength: f32) {
        self.state = saturate(self.state * (1.0 - saturate(strength)));
    }

    /// Drift this neuron's decay toward the leader's reaction profile
    pub fn mimic(&mut self, leader: &Neuron, rate: f32) {
        let rate = saturate(rate);
        self.base_decay = clamp_decay(self.base_decay + (leader.base_decay - self.base_decay) * rate);
    }
}

fn clamp_decay(decay: f32) -> f32 {
    if decay.is_nan() {
        DECAY_FLOOR
    } else {
        decay.clamp(DECAY_FLOOR, DECAY_CEILING)
    }
}
