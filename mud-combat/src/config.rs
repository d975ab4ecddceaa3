//! Tunable combat constants.

use crate::error::CombatError;
use serde::{Deserialize, Serialize};

/// Configuration for a [`CombatEngine`](crate::engine::CombatEngine).
///
/// Every field has a default, so a config file only needs the values it
/// changes:
///
/// ```
/// use mud_combat::CombatConfig;
///
/// let config = CombatConfig::from_json(r#"{ "attack_lag_ms": 3000 }"#).unwrap();
/// assert_eq!(config.attack_lag_ms, 3000);
/// assert_eq!(config.defender_lag_ms, 2500);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Lag added to an attacker after each round it fights.
    pub attack_lag_ms: i64,

    /// Starting lag for a combatant dragged into a fight by someone else.
    pub defender_lag_ms: i64,

    /// Armor class of NPCs without a stored value.
    pub default_armor_class: i32,

    /// Strength of the regeneration effect started after combat.
    pub regen_magnitude: i32,

    /// Damage dice for a player swinging without a weapon.
    pub unarmed_damage: String,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            attack_lag_ms: 5_000,
            defender_lag_ms: 2_500,
            default_armor_class: 10,
            regen_magnitude: 15,
            unarmed_damage: "1d2".to_string(),
        }
    }
}

impl CombatConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON config, filling gaps with defaults.
    pub fn from_json(json: &str) -> Result<Self, CombatError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_attack_lag(mut self, ms: i64) -> Self {
        self.attack_lag_ms = ms;
        self
    }

    pub fn with_defender_lag(mut self, ms: i64) -> Self {
        self.defender_lag_ms = ms;
        self
    }

    pub fn with_default_armor_class(mut self, ac: i32) -> Self {
        self.default_armor_class = ac;
        self
    }

    pub fn with_regen_magnitude(mut self, magnitude: i32) -> Self {
        self.regen_magnitude = magnitude;
        self
    }

    pub fn with_unarmed_damage(mut self, dice: impl Into<String>) -> Self {
        self.unarmed_damage = dice.into();
        self
    }
}
