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

//! Homeostatic regulator (astrocyte) watching a zone of neurons
//!
//! Mutually reinforcing synapses plus high urgency can drive a brain into a
//! saturated or oscillating state. The regulator keeps a decaying memory of zone
//! excitation and, when the brain runs hot, damps every over-excited neuron in
//! its zone. It never fails; a degenerate state is simply pulled back.

use super::neuron::{Neuron, NeuronKind};
use crate::config::RegulatorConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Regulator {
    zone: Vec<NeuronKind>,
    glutamate: f32,
    last_activity: f32,
    interventions: u64,
    config: RegulatorConfig,
}

impl Regulator {
    /// Zone watched when none is given explicitly
    pub const DEFAULT_ZONE: [NeuronKind; 3] =
        [NeuronKind::Aggression, NeuronKind::Fear, NeuronKind::Reflex];

    pub fn new(zone: impl IntoIterator<Item = NeuronKind>, config: RegulatorConfig) -> Self {
        let mut kinds: Vec<NeuronKind> = Vec::new();
        for kind in zone {
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        Self {
            zone: kinds,
            glutamate: 0.0,
            last_activity: 0.0,
            interventions: 0,
            config,
        }
    }

    pub fn zone(&self) -> &[NeuronKind] {
        &self.zone
    }

    /// Decaying memory of zone excitation
    pub fn glutamate(&self) -> f32 {
        self.glutamate
    }

    /// Summed zone activation seen on the last pass
    pub fn last_activity(&self) -> f32 {
        self.last_activity
    }

    /// Number of passes that applied inhibition
    pub fn interventions(&self) -> u64 {
        self.interventions
    }

    /// One homeostatic pass; returns whether inhibition was applied
    pub fn regulate(&mut self, neurons: &mut [Neuron; NeuronKind::COUNT], temperature: f32) -> bool {
        let total: f32 = self.zone.iter().map(|k| neurons[k.index()].state()).sum();
        self.last_activity = total;
        self.glutamate = (self.glutamate * self.config.glutamate_retention
            + total * self.config.glutamate_gain)
            .max(0.0);

        let runaway = total > self.config.activity_threshold * self.zone.len() as f32
            || self.glutamate > self.config.glutamate_threshold;
        if !(temperature > self.config.hot_threshold && runaway) {
            return false;
        }

        for kind in &self.zone {
            let neuron = &mut neurons[kind.index()];
            if neuron.state() > self.config.activation_floor {
                neuron.apply_inhibition(self.config.inhibition_strength);
            }
        }
        self.interventions += 1;
        tracing::trace!(
            total,
            glutamate = self.glutamate,
            temperature,
            "Regulator damped over-excited zone"
        );
        true
    }
}
