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

//! Between-tick delivery of combat events
//!
//! The arena publishes while it resolves strikes, possibly from several threads.
//! Nothing is delivered until the tick loop calls `process_events`, so a brain
//! never sees experience arrive in the middle of a think pass. Routers into the
//! cognition system are fed before plain observers, which therefore see the
//! knowledge an event produced.

use super::types::CombatEvent;
use crate::ecs::systems::CombatEventRouter;
use std::sync::{Arc, PoisonError, RwLock};

pub type EventObserver = Box<dyn Fn(&CombatEvent) + Send + Sync>;

/// Per-kind tally of one `process_events` pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Delivery {
    pub hits: usize,
    pub deaths: usize,
    pub weaknesses: usize,
    pub despawns: usize,
}

impl Delivery {
    pub fn total(&self) -> usize {
        self.hits + self.deaths + self.weaknesses + self.despawns
    }

    fn count(&mut self, event: &CombatEvent) {
        match event {
            CombatEvent::HitLanded { .. } => self.hits += 1,
            CombatEvent::AllyDied { .. } => self.deaths += 1,
            CombatEvent::WeaknessSpotted { .. } => self.weaknesses += 1,
            CombatEvent::CombatantDespawned { .. } => self.despawns += 1,
        }
    }
}

/// Queue of combat events shared by the arena and the tick loop
pub struct EventBus {
    routers: Arc<RwLock<Vec<CombatEventRouter>>>,
    observers: Arc<RwLock<Vec<EventObserver>>>,
    queue: Arc<RwLock<Vec<CombatEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            routers: Arc::new(RwLock::new(Vec::new())),
            observers: Arc::new(RwLock::new(Vec::new())),
            queue: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Feed every delivered event into a cognition system's ledgers and knowledge
    pub fn attach(&self, router: CombatEventRouter) {
        let mut routers = self.routers.write().unwrap_or_else(PoisonError::into_inner);
        routers.push(router);
    }

    /// Watch delivered events without feeding cognition (logging, tests, replays)
    pub fn observe<F>(&self, observer: F)
    where
        F: Fn(&CombatEvent) + Send + Sync + 'static,
    {
        let mut observers = self.observers.write().unwrap_or_else(PoisonError::into_inner);
        observers.push(Box::new(observer));
    }

    pub fn publish(&self, event: CombatEvent) {
        let mut queue = self.queue.write().unwrap_or_else(PoisonError::into_inner);
        queue.push(event);
    }

    /// Drain the queue in publication order, routers first
    pub fn process_events(&self) -> Delivery {
        let events: Vec<CombatEvent> = {
            let mut queue = self.queue.write().unwrap_or_else(PoisonError::into_inner);
            queue.drain(..).collect()
        };

        let routers = self.routers.read().unwrap_or_else(PoisonError::into_inner);
        let observers = self.observers.read().unwrap_or_else(PoisonError::into_inner);
        let mut delivery = Delivery::default();
        for event in &events {
            for router in routers.iter() {
                router.route(event);
            }
            for observer in observers.iter() {
                observer(event);
            }
            delivery.count(event);
            metrics::counter!("banditry_events_delivered_total", "kind" => event.kind()).increment(1);
        }

        if !events.is_empty() {
            tracing::trace!(
                hits = delivery.hits,
                deaths = delivery.deaths,
                weaknesses = delivery.weaknesses,
                despawns = delivery.despawns,
                "Delivered combat events"
            );
        }
        delivery
    }

    /// Drop everything queued without delivering it
    pub fn clear(&self) {
        let mut queue = self.queue.write().unwrap_or_else(PoisonError::into_inner);
        queue.clear();
    }

    pub fn queue_len(&self) -> usize {
        let queue = self.queue.read().unwrap_or_else(PoisonError::into_inner);
        queue.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            routers: Arc::clone(&self.routers),
            observers: Arc::clone(&self.observers),
            queue: Arc::clone(&self.queue),
        }
    }
}
