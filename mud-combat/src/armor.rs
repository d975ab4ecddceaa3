//! Armor class resolution.
//!
//! Lower is better. Players start from 10, subtract their body armor and
//! shield bonuses, and add the dexterity defensive adjustment (negative for
//! nimble characters). NPCs use their stored value, or 10.

use crate::world::{Combatant, CombatantKind, EquipSlot};

/// AC of an unarmored, average-dexterity combatant.
pub const BASE_ARMOR_CLASS: i32 = 10;

/// Dexterity defensive adjustment, indexed by score 0-25.
///
/// Already sign-adjusted: the value is added to armor class.
const DEX_AC_ADJUSTMENT: [i32; 26] = [
    5, 5, 5, 4, 3, 2, 1, 0, 0, 0, 0, 0, 0, 0, 0, -1, -2, -3, -4, -4, -4, -5, -5, -5, -6, -6,
];

/// Armor class modifier for a dexterity score. Scores outside 0-25 clamp.
pub fn dex_ac_modifier(dexterity: u8) -> i32 {
    let index = (dexterity as usize).min(DEX_AC_ADJUSTMENT.len() - 1);
    DEX_AC_ADJUSTMENT[index]
}

/// Effective armor class of `entity`, falling back to `default_ac` for NPCs
/// without a stored value.
pub fn armor_class_with_default(entity: &Combatant, default_ac: i32) -> i32 {
    match &entity.kind {
        CombatantKind::Npc(npc) => npc.armor_class.unwrap_or(default_ac),
        CombatantKind::Player(player) => {
            let armor = player.equipment.ac_bonus(EquipSlot::Body);
            let shield = player.equipment.ac_bonus(EquipSlot::Shield);
            BASE_ARMOR_CLASS - armor - shield + dex_ac_modifier(player.dexterity)
        }
    }
}

/// Effective armor class of `entity`.
pub fn armor_class(entity: &Combatant) -> i32 {
    armor_class_with_default(entity, BASE_ARMOR_CLASS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Archetype, Item};

    #[test]
    fn test_unarmored_player_is_ten() {
        let player = Combatant::player("Aria", Archetype::Fighter, 1).with_dexterity(10);
        assert_eq!(armor_class(&player), 10);
    }

    #[test]
    fn test_player_armor_and_shield() {
        let player = Combatant::player("Aria", Archetype::Fighter, 1)
            .equipped(Item::armor("chain mail", 5))
            .equipped(Item::shield("medium shield", 1));
        assert_eq!(armor_class(&player), 4);
    }

    #[test]
    fn test_dexterity_adjustment() {
        let nimble = Combatant::player("Aria", Archetype::Thief, 1)
            .with_dexterity(18)
            .equipped(Item::armor("leather armor", 2));
        assert_eq!(armor_class(&nimble), 4);

        let clumsy = Combatant::player("Oaf", Archetype::Fighter, 1).with_dexterity(3);
        assert_eq!(armor_class(&clumsy), 14);
    }

    #[test]
    fn test_dex_table_edges() {
        assert_eq!(dex_ac_modifier(0), 5);
        assert_eq!(dex_ac_modifier(7), 0);
        assert_eq!(dex_ac_modifier(14), 0);
        assert_eq!(dex_ac_modifier(15), -1);
        assert_eq!(dex_ac_modifier(25), -6);
        assert_eq!(dex_ac_modifier(200), -6);
    }

    #[test]
    fn test_weapon_does_not_change_ac() {
        let player = Combatant::player("Aria", Archetype::Fighter, 1)
            .equipped(Item::weapon("dagger", "1d4"));
        assert_eq!(armor_class(&player), 10);
    }

    #[test]
    fn test_npc_stored_or_default() {
        let ogre = Combatant::npc("ogre").with_armor_class(5);
        assert_eq!(armor_class(&ogre), 5);

        let rat = Combatant::npc("rat");
        assert_eq!(armor_class(&rat), 10);
        assert_eq!(armor_class_with_default(&rat, 8), 8);
    }
}
