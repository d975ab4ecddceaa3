//! Attack profiles and their expansion into per-round sub-attacks.
//!
//! An [`AttackDef`] is a configured attack source (a sword, a claw) with a
//! possibly fractional number of attacks per round. Each round it is expanded
//! into discrete [`SubAttack`]s: `floor(attacks_per_round)` guaranteed strikes
//! plus one more with probability equal to the fractional remainder.

use crate::dice::DiceRoller;
use crate::world::{Archetype, Combatant, CombatantKind, PlayerData};
use serde::{Deserialize, Serialize};

/// One configured attack source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackDef {
    pub name: String,
    /// May be fractional; the remainder is the chance of one extra attack.
    pub attacks_per_round: f64,
    pub damage_dice: String,
    /// THAC0-style to-hit value; lower is better.
    pub to_hit_bonus_sum: i32,
}

impl AttackDef {
    pub fn new(
        name: impl Into<String>,
        attacks_per_round: f64,
        damage_dice: impl Into<String>,
        to_hit_bonus_sum: i32,
    ) -> Self {
        Self {
            name: name.into(),
            attacks_per_round,
            damage_dice: damage_dice.into(),
            to_hit_bonus_sum,
        }
    }

    /// A fresh, unrolled sub-attack carrying this definition's hit and damage fields.
    pub fn sub_attack(&self) -> SubAttack {
        SubAttack {
            name: self.name.clone(),
            damage_dice: self.damage_dice.clone(),
            to_hit_bonus_sum: self.to_hit_bonus_sum,
            hit: false,
            rolled_damage: 0,
        }
    }
}

/// One resolved strike within a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubAttack {
    pub name: String,
    pub damage_dice: String,
    pub to_hit_bonus_sum: i32,
    pub hit: bool,
    pub rolled_damage: i32,
}

/// How many strikes an attack source gets this round.
///
/// Draws from `dice` only when `attacks_per_round` has a fractional part.
pub fn attacks_this_round(attacks_per_round: f64, dice: &mut dyn DiceRoller) -> usize {
    if attacks_per_round.is_nan() || attacks_per_round <= 0.0 {
        return 0;
    }
    let base = attacks_per_round.floor();
    let remainder = attacks_per_round - base;
    let mut count = base as usize;
    if remainder > 0.0 && dice.chance() < remainder {
        count += 1;
    }
    count
}

/// Expand a profile into this round's sub-attacks.
///
/// Output follows profile order and strikes from one source are contiguous.
pub fn expand(profile: &[AttackDef], dice: &mut dyn DiceRoller) -> Vec<SubAttack> {
    let mut sub_attacks = Vec::new();
    for attack in profile {
        let count = attacks_this_round(attack.attacks_per_round, dice);
        sub_attacks.extend(std::iter::repeat_with(|| attack.sub_attack()).take(count));
    }
    sub_attacks
}

// ============================================================================
// Profile sources
// ============================================================================

/// Produces the attack list a combatant uses this round.
pub trait AttackProfileSource {
    fn attack_profile(&self, combatant: &Combatant) -> Vec<AttackDef>;
}

/// Archetype tables for players, behavior-attached attacks for NPCs.
#[derive(Debug, Clone)]
pub struct StandardProfiles {
    pub unarmed_damage: String,
}

impl Default for StandardProfiles {
    fn default() -> Self {
        Self {
            unarmed_damage: "1d2".to_string(),
        }
    }
}

impl StandardProfiles {
    pub fn new(unarmed_damage: impl Into<String>) -> Self {
        Self {
            unarmed_damage: unarmed_damage.into(),
        }
    }

    fn player_profile(&self, player: &PlayerData) -> Vec<AttackDef> {
        let Some(thac0) = base_thac0(&player.archetype, player.level) else {
            return Vec::new();
        };
        let (name, damage, hit_bonus) = match &player.equipment.wield {
            Some(weapon) => (
                weapon.name.clone(),
                weapon
                    .metadata
                    .damage
                    .clone()
                    .unwrap_or_else(|| self.unarmed_damage.clone()),
                weapon.metadata.hit_bonus,
            ),
            None => ("fists".to_string(), self.unarmed_damage.clone(), 0),
        };
        vec![AttackDef::new(
            name,
            attacks_per_round(&player.archetype, player.level),
            damage,
            thac0 - hit_bonus,
        )]
    }
}

impl AttackProfileSource for StandardProfiles {
    fn attack_profile(&self, combatant: &Combatant) -> Vec<AttackDef> {
        match &combatant.kind {
            CombatantKind::Npc(npc) => npc.attacks.clone(),
            CombatantKind::Player(player) => self.player_profile(player),
        }
    }
}

/// THAC0 by archetype and level; `None` for archetypes without a table.
pub fn base_thac0(archetype: &Archetype, level: u8) -> Option<i32> {
    let level = level.max(1) as i32;
    let thac0 = match archetype {
        Archetype::Fighter => 21 - level,
        Archetype::Cleric => 20 - 2 * ((level - 1) / 3),
        Archetype::Thief => 20 - (level - 1) / 2,
        Archetype::Wizard => 20 - (level - 1) / 3,
        Archetype::Other(_) => return None,
    };
    Some(thac0.max(1))
}

/// Only fighters gain extra attacks as they level.
pub fn attacks_per_round(archetype: &Archetype, level: u8) -> f64 {
    match (archetype, level) {
        (Archetype::Fighter, 0..=6) => 1.0,
        (Archetype::Fighter, 7..=12) => 1.5,
        (Archetype::Fighter, _) => 2.0,
        _ => 1.0,
    }
}
