//! Hit and damage resolution for one attack round.
//!
//! The pipeline is pure up to the commit:
//! 1. the attacker's profile is expanded into sub-attacks
//! 2. each sub-attack rolls a d20 against the target's armor class
//! 3. each hit rolls its damage dice
//! 4. the result is packed into a [`DamageEvent`], which is the only thing
//!    that touches the target's health
//!
//! Nothing is committed if any dice expression fails to parse.

use crate::armor::armor_class_with_default;
use crate::attack::{expand, AttackDef, SubAttack};
use crate::dice::{DiceError, DiceRoller};
use crate::error::CombatError;
use crate::world::{Combatant, CombatantId};
use serde::{Deserialize, Serialize};

/// Natural roll that always misses.
pub const NATURAL_MISS: i32 = 1;
/// Natural roll that always hits.
pub const NATURAL_HIT: i32 = 20;

/// Whether a d20 `roll` lands against `target_ac`.
///
/// A natural 1 always misses and a natural 20 always hits. Otherwise the
/// roll must reach `to_hit_bonus_sum - target_ac`, so a lower (better)
/// armor class raises the bar.
pub fn hit_succeeds(roll: i32, to_hit_bonus_sum: i32, target_ac: i32) -> bool {
    match roll {
        NATURAL_MISS => false,
        NATURAL_HIT => true,
        _ => roll >= to_hit_bonus_sum - target_ac,
    }
}

/// Roll a d20 for `sub_attack` against a target with `target_ac`.
pub fn roll_to_hit(dice: &mut dyn DiceRoller, sub_attack: &SubAttack, target_ac: i32) -> bool {
    let roll = dice.d20();
    hit_succeeds(roll, sub_attack.to_hit_bonus_sum, target_ac)
}

/// Damage for a landed sub-attack. Never negative.
pub fn roll_damage(dice: &mut dyn DiceRoller, sub_attack: &SubAttack) -> Result<i32, DiceError> {
    Ok(dice.roll_notation(&sub_attack.damage_dice)?.max(0))
}

/// Roll hit and damage for every sub-attack, returning the total.
pub fn resolve_sub_attacks(
    dice: &mut dyn DiceRoller,
    sub_attacks: &mut [SubAttack],
    target_ac: i32,
) -> Result<i32, DiceError> {
    let mut total: i32 = 0;
    for sub_attack in sub_attacks.iter_mut() {
        if roll_to_hit(dice, sub_attack, target_ac) {
            sub_attack.hit = true;
            sub_attack.rolled_damage = roll_damage(dice, sub_attack)?;
            total = total
                .checked_add(sub_attack.rolled_damage)
                .ok_or_else(|| DiceError::OutOfRange(sub_attack.damage_dice.clone()))?;
        } else {
            sub_attack.hit = false;
            sub_attack.rolled_damage = 0;
        }
    }
    Ok(total)
}

/// Attribute a damage event applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Attribute {
    Health,
}

/// Everything that happened in one attacker's round against one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageEvent {
    pub source: CombatantId,
    pub target: CombatantId,
    pub attribute: Attribute,
    pub amount: i32,
    pub sub_attacks: Vec<SubAttack>,
    pub target_health_before: i32,
}

impl DamageEvent {
    /// Roll a full round of `profile` from `attacker` against `target`.
    pub fn roll(
        attacker: &Combatant,
        target: &Combatant,
        profile: &[AttackDef],
        dice: &mut dyn DiceRoller,
        default_ac: i32,
    ) -> Result<Self, CombatError> {
        let target_health_before = target.health.ok_or_else(|| CombatError::InvalidTarget {
            name: target.name.clone(),
        })?;
        let target_ac = armor_class_with_default(target, default_ac);

        let mut sub_attacks = expand(profile, dice);
        let amount = resolve_sub_attacks(dice, &mut sub_attacks, target_ac)?;

        Ok(Self {
            source: attacker.id,
            target: target.id,
            attribute: Attribute::Health,
            amount,
            sub_attacks,
            target_health_before,
        })
    }

    pub fn hits(&self) -> usize {
        self.sub_attacks.iter().filter(|s| s.hit).count()
    }

    pub fn misses(&self) -> usize {
        self.sub_attacks.len() - self.hits()
    }

    /// Subtract the damage from `target`, returning its new health.
    ///
    /// Health is not floored; it may go negative.
    pub fn commit(&self, target: &mut Combatant) -> Result<i32, CombatError> {
        let health = target
            .health
            .as_mut()
            .ok_or_else(|| CombatError::InvalidTarget {
                name: target.name.clone(),
            })?;
        *health = health.saturating_sub(self.amount);
        Ok(*health)
    }
}
