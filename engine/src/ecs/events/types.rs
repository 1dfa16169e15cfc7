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

//! Event type definitions

use banditry_common::CombatantId;
use serde::{Deserialize, Serialize};

/// Combat events that feed brains and collective knowledge
///
/// Events use CombatantId rather than hecs entities because the cognition
/// engine never sees host-world handles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CombatEvent {
    /// `attacker` hit `victim`; `severity` is damage as a fraction of the
    /// victim's maximum health
    HitLanded {
        attacker: CombatantId,
        victim: CombatantId,
        severity: f32,
    },

    /// A bandit was killed `distance` away from its pack
    AllyDied {
        victim: CombatantId,
        killer: CombatantId,
        distance: f32,
        weapon: Option<String>,
    },

    /// Someone noticed an exploitable habit of `opponent`
    WeaknessSpotted {
        opponent: CombatantId,
        weakness: String,
    },

    CombatantDespawned {
        combatant: CombatantId,
    },
}

impl CombatEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            CombatEvent::HitLanded { .. } => "hit_landed",
            CombatEvent::AllyDied { .. } => "ally_died",
            CombatEvent::WeaknessSpotted { .. } => "weakness_spotted",
            CombatEvent::CombatantDespawned { .. } => "combatant_despawned",
        }
    }
}
