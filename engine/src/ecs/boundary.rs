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

//! Host-world boundary
//!
//! The cognition engine never touches the host world directly. A host
//! implements [`Sensor`] to describe what a combatant perceives and
//! [`Actuator`] to carry out what it decided.

use crate::error::SenseError;
use banditry_common::{CombatContext, CombatantId, Decision};

/// Produces a combat context snapshot for one combatant
pub trait Sensor {
    fn sense(&self, combatant: CombatantId) -> Result<CombatContext, SenseError>;
}

/// Applies a decision to the host world
///
/// Execution is fire-and-forget; failures are the host's business.
pub trait Actuator {
    fn execute(&mut self, combatant: CombatantId, decision: &Decision);
}
