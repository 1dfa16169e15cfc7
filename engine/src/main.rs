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

use anyhow::Context;
use banditry_engine::config::{Arguments, Configuration};
use banditry_engine::ecs::components::Faction;
use banditry_engine::ecs::events::EventBus;
use banditry_engine::ecs::systems::{Arena, CognitionSystem};
use banditry_engine::ecs::CollectiveKnowledge;
use banditry_engine::error::ConfigError;
use clap::Parser;
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load arguments from the command line
    let arguments: Arguments = Parser::parse();

    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .with_ansi(true)
        .init();

    // Load environment variables from .env file if specified
    if let Some(ref env_file) = arguments.env_file {
        if std::path::Path::new(env_file).exists() {
            tracing::debug!("Loading environment variables from file: {}", env_file);
            dotenv::from_filename(env_file).ok();
        }
    } else {
        tracing::debug!("Loading environment variables from default file");
        dotenv::dotenv().ok();
    }

    // A missing file runs the defaults; a malformed one is fatal
    let config = match Configuration::load(&arguments.config_file) {
        Ok(config) => config,
        Err(ConfigError::Io(err)) => {
            tracing::warn!(
                "Unable to open {} ({}), using default configuration",
                arguments.config_file,
                err
            );
            Configuration::default()
        }
        Err(err) => {
            return Err(err)
                .with_context(|| format!("Unable to load configuration file {}", arguments.config_file));
        }
    };

    tracing::debug!("Configuration loaded: {:?}", config);
    tracing::info!("Starting Banditry arena simulation...");

    let simulation = &config.simulation;
    let knowledge = Arc::new(CollectiveKnowledge::new(config.cognition.knowledge.clone()));
    let mut system = CognitionSystem::new(config.cognition.clone(), Arc::clone(&knowledge));

    let bus = EventBus::new();
    bus.attach(system.router());

    let mut arena = Arena::new(simulation.arena_radius, bus.clone(), simulation.seed)
        .with_burst_ability(config.cognition.tactics.burst_ability.clone());
    arena
        .populate(simulation.bandits, simulation.defenders)
        .context("Unable to populate arena")?;

    let tick = *simulation.tick_interval;
    let limit = *simulation.max_ticks;
    tracing::info!("Ticking every {} for up to {} ticks (0 = unlimited)", tick, limit);

    let mut interval = tokio::time::interval(tick.as_duration());
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut strikes = 0usize;
    let mut decisions = 0usize;
    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = &mut shutdown => {
                tracing::info!("Interrupted, stopping simulation");
                break;
            }
        }

        // Events from the previous tick are folded in before anyone thinks
        let delivered = bus.process_events();
        let step = arena.step(tick.as_secs_f32());
        strikes += step.strikes;

        let roster = arena.bandits();
        let summary = system.run_tick(&roster, &mut arena);
        decisions += summary.acted;
        tracing::debug!(
            tick = summary.tick,
            acted = summary.acted,
            skipped = summary.skipped,
            discarded = summary.discarded,
            regulated = summary.regulated,
            strikes = step.strikes,
            events = delivered.total(),
            "Tick complete"
        );

        if arena.living(Faction::Bandit) == 0 || arena.living(Faction::Defender) == 0 {
            tracing::info!("Combat resolved after {} ticks", summary.tick);
            break;
        }
        if limit.reached(summary.tick) {
            tracing::info!("Tick limit reached");
            break;
        }
    }
    bus.process_events();

    let biases = knowledge.biases();
    tracing::info!(
        ticks = system.world_tick(),
        decisions,
        strikes,
        bandits = arena.living(Faction::Bandit),
        defenders = arena.living(Faction::Defender),
        known_opponents = knowledge.len(),
        aggression_bias = biases.aggression,
        fear_bias = biases.fear,
        "Simulation finished"
    );

    if let Some(path) = &arguments.history_out {
        let histories = system.histories();
        let json = serde_json::to_vec_pretty(&histories).context("Unable to serialize brain histories")?;
        std::fs::write(path, json).with_context(|| format!("Unable to write brain histories to {}", path))?;
        tracing::info!("Wrote {} brain histories to {}", histories.len(), path);
    }

    Ok(())
}
