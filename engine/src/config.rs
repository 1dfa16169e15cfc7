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

use crate::error::ConfigError;
use clap::Parser;
use serde::{Deserialize, Serialize};
use serde_env_field::EnvField;
use std::num::ParseIntError;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Arguments {
    #[arg(
        short = 'c',
        long = "config",
        help = "Path to configuration file",
        default_value = "engine/config.yaml"
    )]
    pub config_file: String,

    #[arg(
        short = 'e',
        long = "env",
        help = "Path to environment file",
        default_value = "engine/.env"
    )]
    pub env_file: Option<String>,

    #[arg(
        long = "history-out",
        help = "Write surviving brain histories to this JSON file on exit"
    )]
    pub history_out: Option<String>,
}

impl Default for Arguments {
    fn default() -> Self {
        Self {
            config_file: "config.yaml".to_string(),
            env_file: Some(".env".to_string()),
            history_out: None,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub simulation: SimulationConfig,
    pub cognition: CognitionConfig,
}

impl Configuration {
    pub fn load(path: &str) -> Result<Configuration, ConfigError> {
        let conf = serde_yaml::from_reader(std::fs::File::open(path)?)?;
        Ok(conf)
    }
}

/// Reference arena simulation driven by the binary
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub tick_interval: EnvField<TickInterval>,
    pub max_ticks: EnvField<TickLimit>,
    pub bandits: usize,
    pub defenders: usize,
    pub arena_radius: f32,
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval: Default::default(),
            max_ticks: Default::default(),
            bandits: 6,
            defenders: 3,
            arena_radius: 20.0,
            seed: None,
        }
    }
}

/// Wall-clock time between world ticks, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickInterval(u64);

impl TickInterval {
    pub fn as_duration(&self) -> Duration {
        Duration::from_millis(self.0.max(1))
    }

    /// Seconds of simulated time per tick
    pub fn as_secs_f32(&self) -> f32 {
        self.as_duration().as_secs_f32()
    }
}

impl FromStr for TickInterval {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        tracing::debug!("Parsing tick interval from string: {}", s);
        Ok(Self(u64::from_str(s.trim())?))
    }
}

impl Default for TickInterval {
    fn default() -> Self {
        Self(100)
    }
}

impl std::fmt::Display for TickInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Number of world ticks to run before stopping; zero runs until interrupted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickLimit(u64);

impl TickLimit {
    pub fn reached(&self, tick: u64) -> bool {
        self.0 != 0 && tick >= self.0
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl FromStr for TickLimit {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(u64::from_str(s.trim())?))
    }
}

impl Default for TickLimit {
    fn default() -> Self {
        Self(600)
    }
}

impl std::fmt::Display for TickLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tuning for brains, the regulator, the combat engine and collective knowledge
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CognitionConfig {
    /// Snapshots retained per brain for post-combat analysis
    pub history_capacity: usize,
    /// How strongly a novice imitates the most experienced sensed ally each tick
    pub mimic_rate: f32,
    /// World ticks between collective knowledge decay passes (0 means every tick)
    pub knowledge_decay_interval: u64,
    pub regulator: RegulatorConfig,
    pub tactics: TacticsConfig,
    pub knowledge: KnowledgeConfig,
}

impl Default for CognitionConfig {
    fn default() -> Self {
        Self {
            history_capacity: 64,
            mimic_rate: 0.01,
            knowledge_decay_interval: 10,
            regulator: RegulatorConfig::default(),
            tactics: TacticsConfig::default(),
            knowledge: KnowledgeConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegulatorConfig {
    /// Temperature above which the regulator may intervene
    pub hot_threshold: f32,
    /// Mean zone activation that counts as runaway
    pub activity_threshold: f32,
    pub glutamate_threshold: f32,
    pub glutamate_retention: f32,
    pub glutamate_gain: f32,
    pub inhibition_strength: f32,
    /// Only neurons above this activation are inhibited
    pub activation_floor: f32,
}

impl Default for RegulatorConfig {
    fn default() -> Self {
        Self {
            hot_threshold: 0.6,
            activity_threshold: 0.7,
            glutamate_threshold: 2.0,
            glutamate_retention: 0.92,
            glutamate_gain: 0.1,
            inhibition_strength: 0.15,
            activation_floor: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TacticsConfig {
    /// Distance inside which a low-morale bandit holds rather than retreats
    pub close_range: f32,
    /// Distance beyond which an opponent no longer excites aggression
    pub engage_range: f32,
    pub low_morale: f32,
    pub attack_morale: f32,
    pub reflex_evade: f32,
    pub adrenaline_burst: f32,
    /// Ability invoked on a saturated-adrenaline attack, if the bandit has it
    pub burst_ability: String,
    /// Weight of the collective biases on morale
    pub bias_weight: f32,
}

impl Default for TacticsConfig {
    fn default() -> Self {
        Self {
            close_range: 4.0,
            engage_range: 12.0,
            low_morale: 0.0,
            attack_morale: 0.3,
            reflex_evade: 0.7,
            adrenaline_burst: 0.9,
            burst_ability: "frenzy".to_string(),
            bias_weight: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    /// Multiplicative decay applied to danger and biases per decay pass
    pub decay: f32,
    pub fear_per_death: f32,
    /// Ally deaths beyond this distance do not raise fear
    pub alarm_radius: f32,
    pub danger_per_kill: f32,
    pub aggression_per_weakness: f32,
    /// Forget profiles whose danger decays below this and that hold no weakness
    pub evict_below: Option<f32>,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            decay: 0.98,
            fear_per_death: 0.3,
            alarm_radius: 30.0,
            danger_per_kill: 0.5,
            aggression_per_weakness: 0.05,
            evict_below: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_arguments_default() {
        let args = Arguments::default();
        assert_eq!(args.config_file, "config.yaml");
        assert_eq!(args.env_file, Some(".env".to_string()));
        assert!(args.history_out.is_none());
    }

    #[test]
    fn test_configuration_default() {
        let config = Configuration::default();
        assert_eq!(config.simulation.tick_interval.as_duration(), Duration::from_millis(100));
        assert_eq!(config.simulation.max_ticks.get(), 600);
        assert_eq!(config.cognition.history_capacity, 64);
        assert_eq!(config.cognition.regulator.glutamate_retention, 0.92);
        assert_eq!(config.cognition.tactics.burst_ability, "frenzy");
        assert!(config.cognition.knowledge.evict_below.is_none());
    }

    #[test]
    fn test_tick_limit() {
        assert!(!TickLimit(0).reached(1_000_000));
        assert!(TickLimit(10).reached(10));
        assert!(!TickLimit(10).reached(9));
    }

    #[test]
    fn test_configuration_load_missing_file() {
        let result = Configuration::load("non_existent.yaml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_configuration_load_from_file() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        unsafe {
            std::env::remove_var("BANDITRY_TICK_MS");
        }

        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("config.yaml");
        std::fs::write(
            &file_path,
            "simulation:\n  tick_interval: 50\n  bandits: 2\ncognition:\n  mimic_rate: 0.05\n  tactics:\n    reflex_evade: 0.8\n",
        )
        .unwrap();

        let config = Configuration::load(file_path.to_str().unwrap()).unwrap();
        assert_eq!(config.simulation.tick_interval.as_duration(), Duration::from_millis(50));
        assert_eq!(config.simulation.bandits, 2);
        assert_eq!(config.simulation.defenders, 3);
        assert_eq!(config.cognition.mimic_rate, 0.05);
        assert_eq!(config.cognition.tactics.reflex_evade, 0.8);
        assert_eq!(config.cognition.tactics.attack_morale, 0.3);
    }

    #[test]
    fn test_configuration_load_with_env_substitution() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        unsafe {
            std::env::set_var("BANDITRY_TICK_MS", "250");
        }

        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("config.yaml");
        std::fs::write(
            &file_path,
            "simulation:\n  tick_interval: \"${BANDITRY_TICK_MS}\"\n  max_ticks: \"${BANDITRY_MAX_TICKS:-0}\"\n",
        )
        .unwrap();

        let config = Configuration::load(file_path.to_str().unwrap());

        unsafe {
            std::env::remove_var("BANDITRY_TICK_MS");
        }

        let config = config.unwrap();
        assert_eq!(config.simulation.tick_interval.as_duration(), Duration::from_millis(250));
        assert_eq!(config.simulation.max_ticks.get(), 0);
    }
}
