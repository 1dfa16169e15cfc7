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

//! Tactical decision handed to the actuation layer

use crate::context::CombatantId;
use crate::geometry::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete tactical action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionType {
    Attack,
    Counter,
    Evade,
    Observe,
    Retreat,
}

impl ActionType {
    pub const ALL: [ActionType; 5] = [
        ActionType::Attack,
        ActionType::Counter,
        ActionType::Evade,
        ActionType::Observe,
        ActionType::Retreat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Attack => "attack",
            ActionType::Counter => "counter",
            ActionType::Evade => "evade",
            ActionType::Observe => "observe",
            ActionType::Retreat => "retreat",
        }
    }

    /// Whether the action involves striking the target
    pub fn is_offensive(&self) -> bool {
        matches!(self, ActionType::Attack | ActionType::Counter)
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Movement directive accompanying an action
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Movement {
    Hold,
    /// Close in on the decision's target
    Approach,
    /// Step straight back, away from the target
    Backstep,
    /// Step perpendicular to the line to the target
    Sidestep,
    /// Keep roughly this far from the target
    KeepDistance { range: f32 },
    TakeCover { position: Vec3 },
    /// Move directly away from the target with no cover to aim for
    Withdraw,
}

/// Output of one think pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub action: ActionType,
    pub movement: Movement,
    pub target: Option<CombatantId>,
    pub ability: Option<String>,
    pub utterance: Option<String>,
}

impl Decision {
    pub fn new(action: ActionType, movement: Movement) -> Self {
        Self {
            action,
            movement,
            target: None,
            ability: None,
            utterance: None,
        }
    }

    pub fn with_target(mut self, target: Option<CombatantId>) -> Self {
        self.target = target;
        self
    }

    pub fn with_ability(mut self, ability: impl Into<String>) -> Self {
        self.ability = Some(ability.into());
        self
    }

    pub fn with_utterance(mut self, utterance: impl Into<String>) -> Self {
        self.utterance = Some(utterance.into());
        self
    }
}
