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

//! Identity registry between arena entities and combatant ids
//!
//! - `EcsEntity`: hecs runtime handle, only meaningful inside one arena
//! - `CombatantId`: the stable identity brains, events and knowledge are keyed by

use crate::ecs::EcsEntity;
use crate::error::RegistryError;
use banditry_common::CombatantId;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct EntityRegistry {
    id_to_entity: HashMap<CombatantId, EcsEntity>,
    entity_to_id: HashMap<EcsEntity, CombatantId>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mapping; fails if either side is already taken
    pub fn register(&mut self, entity: EcsEntity, id: CombatantId) -> Result<(), RegistryError> {
        if self.entity_to_id.contains_key(&entity) {
            return Err(RegistryError::EntityRegistered(entity));
        }
        if self.id_to_entity.contains_key(&id) {
            return Err(RegistryError::IdRegistered(id));
        }

        self.id_to_entity.insert(id, entity);
        self.entity_to_id.insert(entity, id);
        Ok(())
    }

    /// Unregister by entity, returning the combatant it mapped to
    pub fn unregister_entity(&mut self, entity: EcsEntity) -> Option<CombatantId> {
        let id = self.entity_to_id.remove(&entity)?;
        self.id_to_entity.remove(&id);
        Some(id)
    }

    /// Unregister by combatant, returning the entity it mapped to
    pub fn unregister_id(&mut self, id: CombatantId) -> Option<EcsEntity> {
        let entity = self.id_to_entity.remove(&id)?;
        self.entity_to_id.remove(&entity);
        Some(entity)
    }

    pub fn get_entity(&self, id: CombatantId) -> Option<EcsEntity> {
        self.id_to_entity.get(&id).copied()
    }

    pub fn get_id(&self, entity: EcsEntity) -> Option<CombatantId> {
        self.entity_to_id.get(&entity).copied()
    }

    pub fn contains_id(&self, id: CombatantId) -> bool {
        self.id_to_entity.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entity_to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entity_to_id.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &CombatantId> {
        self.id_to_entity.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::ArenaWorld;
    use uuid::Uuid;

    #[test]
    fn test_register_and_lookup() {
        let mut registry = EntityRegistry::new();
        let mut world = ArenaWorld::new();

        let entity = world.spawn(());
        let id = Uuid::new_v4();

        assert!(registry.register(entity, id).is_ok());
        assert_eq!(registry.get_entity(id), Some(entity));
        assert_eq!(registry.get_id(entity), Some(id));
        assert!(registry.contains_id(id));
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = EntityRegistry::new();
        let mut world = ArenaWorld::new();

        let entity = world.spawn(());
        let id = Uuid::new_v4();
        registry.register(entity, id).unwrap();

        assert!(matches!(
            registry.register(entity, Uuid::new_v4()),
            Err(RegistryError::EntityRegistered(e)) if e == entity
        ));

        let entity2 = world.spawn(());
        assert!(matches!(
            registry.register(entity2, id),
            Err(RegistryError::IdRegistered(i)) if i == id
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unregister() {
        let mut registry = EntityRegistry::new();
        let mut world = ArenaWorld::new();

        let entity = world.spawn(());
        let id = Uuid::new_v4();
        registry.register(entity, id).unwrap();

        assert_eq!(registry.unregister_entity(entity), Some(id));
        assert_eq!(registry.get_entity(id), None);
        assert_eq!(registry.get_id(entity), None);

        registry.register(entity, id).unwrap();
        assert_eq!(registry.unregister_id(id), Some(entity));
        assert!(registry.is_empty());
        assert_eq!(registry.unregister_id(id), None);
    }
}
