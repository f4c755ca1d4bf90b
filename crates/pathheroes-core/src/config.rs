//! Battle configuration.
//!
//! Every cadence, multiplier, chance and reward amount the engine uses lives
//! in [`BattleConfig`]. The defaults reproduce the shipped game balance; a
//! JSON document may override any subset of fields.
//!
//! # Example
//!
//! ```
//! use pathheroes_core::config::BattleConfig;
//!
//! let config = BattleConfig::from_json_str(r#"{ "tick_ms": 10 }"#).unwrap();
//! assert_eq!(config.tick_ms, 10);
//! assert_eq!(config.abilities.buff_multiplier, 3.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::clock::{Millis, DEFAULT_TICK_MS};
use crate::error::ConfigError;
use crate::outcome::RewardTable;

/// Lowest attack rate used when computing strike intervals.
pub const MIN_ATTACK_RATE: f64 = 0.0001;

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// Simulated milliseconds per tick.
    pub tick_ms: Millis,
    /// Attack rates below this are clamped before computing intervals.
    pub min_attack_rate: f64,
    /// Ability cadences and effect sizes.
    pub abilities: AbilityTuning,
    /// Victory rewards.
    pub rewards: RewardTable,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            tick_ms: DEFAULT_TICK_MS,
            min_attack_rate: MIN_ATTACK_RATE,
            abilities: AbilityTuning::default(),
            rewards: RewardTable::default(),
        }
    }
}

impl BattleConfig {
    /// Parses a JSON document, filling unspecified fields with defaults, and
    /// validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::Invalid`] for values the engine cannot run with.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every field holds a usable value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_ms == 0 {
            return Err(invalid("tick_ms", "at least 1"));
        }
        if !(self.min_attack_rate.is_finite() && self.min_attack_rate > 0.0) {
            return Err(invalid("min_attack_rate", "a positive number"));
        }
        self.abilities.validate()
    }
}

fn invalid(field: &'static str, requirement: &'static str) -> ConfigError {
    ConfigError::Invalid { field, requirement }
}

/// Cadences and effect sizes of every ability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityTuning {
    /// Bonus strike cadence.
    pub bonus_strike_interval_ms: Millis,
    /// Bonus strike damage multiplier.
    pub bonus_strike_multiplier: f64,
    /// Heavy strike cadence.
    pub heavy_strike_interval_ms: Millis,
    /// Delay between heavy strike launch and impact.
    pub heavy_strike_travel_ms: Millis,
    /// Heavy strike damage multiplier.
    pub heavy_strike_multiplier: f64,
    /// All-target strike cadence.
    pub all_target_interval_ms: Millis,
    /// All-target strike damage multiplier.
    pub all_target_multiplier: f64,
    /// Scatter strike cadence.
    pub scatter_strike_interval_ms: Millis,
    /// Fixed scatter strike damage.
    pub scatter_strike_damage: f64,
    /// Number of distinct targets hit by a multi-hit basic strike.
    pub multi_hit_targets: usize,
    /// Self-heal roll cadence.
    pub self_heal_interval_ms: Millis,
    /// Chance of a self-heal roll restoring full health.
    pub self_heal_chance: f64,
    /// Island whose non-boss monsters roll self-heals.
    pub regeneration_island: u8,
    /// Buff pulse cadence.
    pub buff_interval_ms: Millis,
    /// Length of an opened buff window.
    pub buff_duration_ms: Millis,
    /// Damage multiplier while a side's buff window is open.
    pub buff_multiplier: f64,
    /// Summon cadence.
    pub summon_interval_ms: Millis,
    /// Delay from round start to the impostor transformation.
    pub transform_delay_ms: Millis,
    /// Maximum health multiplier applied by the transformation.
    pub impostor_health_multiplier: f64,
    /// Invulnerability window granted at spawn.
    pub spawn_shield_ms: Millis,
    /// Chance of a life stone per player-side kill.
    pub kill_reward_chance: f64,
}

impl Default for AbilityTuning {
    fn default() -> Self {
        Self {
            bonus_strike_interval_ms: 2000,
            bonus_strike_multiplier: 2.0,
            heavy_strike_interval_ms: 3000,
            heavy_strike_travel_ms: 500,
            heavy_strike_multiplier: 3.0,
            all_target_interval_ms: 5000,
            all_target_multiplier: 2.0,
            scatter_strike_interval_ms: 1000,
            scatter_strike_damage: 300.0,
            multi_hit_targets: 2,
            self_heal_interval_ms: 1000,
            self_heal_chance: 0.2,
            regeneration_island: 6,
            buff_interval_ms: 3000,
            buff_duration_ms: 2000,
            buff_multiplier: 3.0,
            summon_interval_ms: 3000,
            transform_delay_ms: 1000,
            impostor_health_multiplier: 3.0,
            spawn_shield_ms: 3000,
            kill_reward_chance: 0.5,
        }
    }
}

impl AbilityTuning {
    fn validate(&self) -> Result<(), ConfigError> {
        let intervals = [
            ("abilities.bonus_strike_interval_ms", self.bonus_strike_interval_ms),
            ("abilities.heavy_strike_interval_ms", self.heavy_strike_interval_ms),
            ("abilities.all_target_interval_ms", self.all_target_interval_ms),
            ("abilities.scatter_strike_interval_ms", self.scatter_strike_interval_ms),
            ("abilities.self_heal_interval_ms", self.self_heal_interval_ms),
            ("abilities.buff_interval_ms", self.buff_interval_ms),
            ("abilities.summon_interval_ms", self.summon_interval_ms),
        ];
        if let Some((field, _)) = intervals.iter().find(|(_, ms)| *ms == 0) {
            return Err(invalid(field, "at least 1"));
        }

        let chances = [
            ("abilities.self_heal_chance", self.self_heal_chance),
            ("abilities.kill_reward_chance", self.kill_reward_chance),
        ];
        if let Some((field, _)) = chances
            .iter()
            .find(|(_, p)| !(0.0..=1.0).contains(p))
        {
            return Err(invalid(field, "between 0 and 1"));
        }

        let factors = [
            ("abilities.bonus_strike_multiplier", self.bonus_strike_multiplier),
            ("abilities.heavy_strike_multiplier", self.heavy_strike_multiplier),
            ("abilities.all_target_multiplier", self.all_target_multiplier),
            ("abilities.scatter_strike_damage", self.scatter_strike_damage),
            ("abilities.buff_multiplier", self.buff_multiplier),
            ("abilities.impostor_health_multiplier", self.impostor_health_multiplier),
        ];
        if let Some((field, _)) = factors.iter().find(|(_, v)| !(v.is_finite() && *v >= 0.0)) {
            return Err(invalid(field, "a non-negative number"));
        }
        if self.impostor_health_multiplier <= 0.0 {
            return Err(invalid("abilities.impostor_health_multiplier", "positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(BattleConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            BattleConfig::from_json_str(r#"{ "abilities": { "buff_duration_ms": 4000 } }"#)
                .unwrap();
        assert_eq!(config.abilities.buff_duration_ms, 4000);
        assert_eq!(config.abilities.buff_interval_ms, 3000);
        assert_eq!(config.tick_ms, DEFAULT_TICK_MS);
    }

    #[test]
    fn zero_tick_is_rejected() {
        let err = BattleConfig::from_json_str(r#"{ "tick_ms": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "tick_ms", .. }));
    }

    #[test]
    fn chance_above_one_is_rejected() {
        let mut config = BattleConfig::default();
        config.abilities.kill_reward_chance = 1.5;
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "abilities.kill_reward_chance",
                ..
            }
        ));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let mut config = BattleConfig::default();
        config.abilities.summon_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = BattleConfig::from_json_str("{ tick_ms").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
