//! Error types for combat operations.

use crate::dice::DiceError;
use crate::world::CombatantId;
use thiserror::Error;

/// Errors raised while targeting or resolving combat.
///
/// The first five variants carry player-facing text; the attack command
/// shows them verbatim instead of treating them as failures.
#[derive(Debug, Error)]
pub enum CombatError {
    #[error("You smack yourself in the face. Ouch!")]
    SelfTarget,

    #[error("{name} has not opted into PvP.")]
    NonPvp { name: String },

    #[error("{name} is a pacifist and will not fight you.")]
    Pacifist { name: String },

    #[error("You can't attack that target")]
    InvalidTarget { name: String },

    #[error("You are in no condition to fight.")]
    Incapacitated,

    #[error("Unknown combatant: {0}")]
    UnknownCombatant(CombatantId),

    #[error("Dice error: {0}")]
    Dice(#[from] DiceError),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

impl CombatError {
    /// Whether the attack command should show this error to the player.
    pub fn is_command_recoverable(&self) -> bool {
        matches!(
            self,
            CombatError::SelfTarget
                | CombatError::NonPvp { .. }
                | CombatError::Pacifist { .. }
                | CombatError::InvalidTarget { .. }
                | CombatError::Incapacitated
        )
    }
}
