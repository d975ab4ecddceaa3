//! Standard equipment tables.
//!
//! Weapons carry their damage dice, armor and shields the number of points
//! they take off a wearer's armor class.

use crate::world::{EquipSlot, Item};

/// Get a standard weapon by name.
pub fn get_weapon(name: &str) -> Option<Item> {
    find_in(&WEAPONS, name)
}

/// Get a standard suit of body armor by name.
pub fn get_armor(name: &str) -> Option<Item> {
    find_in(&ARMORS, name)
}

/// Get a standard shield by name.
pub fn get_shield(name: &str) -> Option<Item> {
    find_in(&SHIELDS, name)
}

/// Try to find any standard item by name.
pub fn find_item(name: &str) -> Option<Item> {
    get_weapon(name)
        .or_else(|| get_armor(name))
        .or_else(|| get_shield(name))
}

/// Every standard item that fits `slot`.
pub fn for_slot(slot: EquipSlot) -> &'static [Item] {
    match slot {
        EquipSlot::Wield => &WEAPONS,
        EquipSlot::Body => &ARMORS,
        EquipSlot::Shield => &SHIELDS,
    }
}

fn find_in(table: &[Item], name: &str) -> Option<Item> {
    table
        .iter()
        .find(|item| item.name.eq_ignore_ascii_case(name.trim()))
        .cloned()
}

// ============================================================================
// Weapons
// ============================================================================

lazy_static::lazy_static! {
    /// Weapons with their damage against man-sized foes.
    pub static ref WEAPONS: Vec<Item> = vec![
        Item::weapon("club", "1d6"),
        Item::weapon("dagger", "1d4"),
        Item::weapon("hand axe", "1d6"),
        Item::weapon("mace", "1d6+1"),
        Item::weapon("morning star", "2d4"),
        Item::weapon("flail", "1d6+1"),
        Item::weapon("warhammer", "1d4+1"),
        Item::weapon("quarterstaff", "1d6"),
        Item::weapon("spear", "1d6"),
        Item::weapon("short sword", "1d6"),
        Item::weapon("long sword", "1d8"),
        Item::weapon("broad sword", "2d4"),
        Item::weapon("scimitar", "1d8"),
        Item::weapon("bastard sword", "2d4"),
        Item::weapon("two-handed sword", "1d10"),
        Item::weapon("battle axe", "1d8"),
        Item::weapon("halberd", "1d10"),
        Item::weapon("long sword +1", "1d8+1").with_hit_bonus(1),
        Item::weapon("dagger +2", "1d4+2").with_hit_bonus(2),
    ];
}

// ============================================================================
// Armor
// ============================================================================

lazy_static::lazy_static! {
    /// Body armor, from lightest to heaviest.
    pub static ref ARMORS: Vec<Item> = vec![
        Item::armor("padded armor", 2),
        Item::armor("leather armor", 2),
        Item::armor("studded leather", 3),
        Item::armor("ring mail", 3),
        Item::armor("hide armor", 4),
        Item::armor("scale mail", 4),
        Item::armor("chain mail", 5),
        Item::armor("splint mail", 6),
        Item::armor("banded mail", 6),
        Item::armor("plate mail", 7),
        Item::armor("field plate", 8),
        Item::armor("full plate", 9),
    ];

    pub static ref SHIELDS: Vec<Item> = vec![
        Item::shield("buckler", 1),
        Item::shield("small shield", 1),
        Item::shield("medium shield", 1),
        Item::shield("body shield", 2),
    ];
}
