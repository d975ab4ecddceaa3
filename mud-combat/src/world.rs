//! Combatants and the arena that holds them.
//!
//! Contains the entity-side types the engine reads and writes: identifiers,
//! player and NPC data, equipment, per-combatant round state, and the
//! [`Arena`] registry that owns every combatant plus the engagement graph.

use crate::attack::AttackDef;
use crate::engagement::Engagements;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for combatants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CombatantId(pub Uuid);

impl CombatantId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CombatantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for rooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomId(pub Uuid);

impl RoomId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RoomId {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Archetypes
// ============================================================================

/// Player class, used to pick an attack table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    Fighter,
    Thief,
    Cleric,
    Wizard,
    /// Anything the attack tables do not know about.
    Other(String),
}

impl Archetype {
    pub fn name(&self) -> &str {
        match self {
            Archetype::Fighter => "fighter",
            Archetype::Thief => "thief",
            Archetype::Cleric => "cleric",
            Archetype::Wizard => "wizard",
            Archetype::Other(name) => name,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "fighter" | "warrior" => Archetype::Fighter,
            "thief" | "rogue" => Archetype::Thief,
            "cleric" | "priest" => Archetype::Cleric,
            "wizard" | "mage" => Archetype::Wizard,
            other => Archetype::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Equipment
// ============================================================================

/// Where an item is worn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipSlot {
    Body,
    Shield,
    Wield,
}

/// Item metadata the combat rules look at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMetadata {
    /// Armor class bonus; subtracted from the wearer's AC.
    pub ac: Option<i32>,
    /// Damage dice for weapons.
    pub damage: Option<String>,
    /// Magical to-hit bonus; lowers the wielder's THAC0.
    pub hit_bonus: i32,
}

/// An equippable item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub slot: EquipSlot,
    pub metadata: ItemMetadata,
}

impl Item {
    pub fn armor(name: impl Into<String>, ac: i32) -> Self {
        Self {
            name: name.into(),
            slot: EquipSlot::Body,
            metadata: ItemMetadata {
                ac: Some(ac),
                damage: None,
                hit_bonus: 0,
            },
        }
    }

    pub fn shield(name: impl Into<String>, ac: i32) -> Self {
        Self {
            slot: EquipSlot::Shield,
            ..Self::armor(name, ac)
        }
    }

    pub fn weapon(name: impl Into<String>, damage: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slot: EquipSlot::Wield,
            metadata: ItemMetadata {
                ac: None,
                damage: Some(damage.into()),
                hit_bonus: 0,
            },
        }
    }

    pub fn with_hit_bonus(mut self, bonus: i32) -> Self {
        self.metadata.hit_bonus = bonus;
        self
    }
}

/// Equipment slots for what's actively equipped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Equipment {
    pub body: Option<Item>,
    pub shield: Option<Item>,
    pub wield: Option<Item>,
}

impl Equipment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: EquipSlot) -> Option<&Item> {
        match slot {
            EquipSlot::Body => self.body.as_ref(),
            EquipSlot::Shield => self.shield.as_ref(),
            EquipSlot::Wield => self.wield.as_ref(),
        }
    }

    /// Put `item` in its slot, returning whatever was there.
    pub fn equip(&mut self, item: Item) -> Option<Item> {
        let slot = match item.slot {
            EquipSlot::Body => &mut self.body,
            EquipSlot::Shield => &mut self.shield,
            EquipSlot::Wield => &mut self.wield,
        };
        slot.replace(item)
    }

    /// AC bonus from the item in `slot`, 0 if empty or unrated.
    pub fn ac_bonus(&self, slot: EquipSlot) -> i32 {
        self.get(slot).and_then(|i| i.metadata.ac).unwrap_or(0)
    }
}

// ============================================================================
// Combatant kinds
// ============================================================================

/// Data only player-controlled combatants carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerData {
    pub archetype: Archetype,
    pub level: u8,
    pub dexterity: u8,
    pub equipment: Equipment,
}

/// Data only NPCs carry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NpcData {
    /// Stored armor class; the resolver defaults it when absent.
    pub armor_class: Option<i32>,
    /// Behavior-attached attack list.
    pub attacks: Vec<AttackDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CombatantKind {
    Player(PlayerData),
    Npc(NpcData),
}

// ============================================================================
// Round state
// ============================================================================

/// Per-combatant cooldown tracking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundState {
    /// When the last scheduler pass for this combatant started (ms).
    pub last_round_started_at: Option<u64>,
    /// Lag still to burn before the next attack.
    pub remaining_lag_ms: i64,
    /// Whoever committed the damage that dropped this combatant.
    pub killed_by: Option<CombatantId>,
}

impl RoundState {
    /// Zero every field in place.
    pub fn reset(&mut self) {
        self.last_round_started_at = None;
        self.remaining_lag_ms = 0;
        self.killed_by = None;
    }

    /// Reset and start a fresh session at `now` with `lag_ms` of lag.
    pub fn begin(&mut self, now: u64, lag_ms: i64) {
        self.reset();
        self.last_round_started_at = Some(now);
        self.remaining_lag_ms = lag_ms;
    }
}

/// A status effect currently on a combatant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub kind: String,
    pub magnitude: i32,
    pub hidden: bool,
}

// ============================================================================
// Combatant
// ============================================================================

/// Anything that can fight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Combatant {
    pub id: CombatantId,
    pub name: String,
    /// Extra words the target finder matches against.
    pub keywords: Vec<String>,
    pub room: Option<RoomId>,
    /// `None` means the entity has no health attribute at all.
    pub health: Option<i32>,
    pub max_health: i32,
    pub kind: CombatantKind,
    pub pacifist: bool,
    pub pvp: bool,
    pub round_state: RoundState,
    /// Whether the "combat" status display is shown (players only).
    pub combat_prompt: bool,
    /// Set once the death handler has run.
    pub dead: bool,
    pub effects: Vec<ActiveEffect>,
}

impl Combatant {
    fn base(name: String, kind: CombatantKind) -> Self {
        Self {
            id: CombatantId::new(),
            name,
            keywords: Vec::new(),
            room: None,
            health: Some(10),
            max_health: 10,
            kind,
            pacifist: false,
            pvp: false,
            round_state: RoundState::default(),
            combat_prompt: false,
            dead: false,
            effects: Vec::new(),
        }
    }

    pub fn player(name: impl Into<String>, archetype: Archetype, level: u8) -> Self {
        Self::base(
            name.into(),
            CombatantKind::Player(PlayerData {
                archetype,
                level: level.max(1),
                dexterity: 10,
                equipment: Equipment::new(),
            }),
        )
    }

    pub fn npc(name: impl Into<String>) -> Self {
        Self::base(name.into(), CombatantKind::Npc(NpcData::default()))
    }

    pub fn with_health(mut self, health: i32) -> Self {
        self.health = Some(health);
        self.max_health = health;
        self
    }

    /// An entity that cannot be damaged (a signpost, a fountain).
    pub fn without_health(mut self) -> Self {
        self.health = None;
        self
    }

    pub fn with_room(mut self, room: RoomId) -> Self {
        self.room = Some(room);
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_pvp(mut self) -> Self {
        self.pvp = true;
        self
    }

    pub fn pacifist(mut self) -> Self {
        self.pacifist = true;
        self
    }

    /// Stored armor class. No effect on players, whose AC is derived.
    pub fn with_armor_class(mut self, ac: i32) -> Self {
        if let CombatantKind::Npc(npc) = &mut self.kind {
            npc.armor_class = Some(ac);
        }
        self
    }

    /// Append a behavior attack. No effect on players.
    pub fn with_attack(mut self, attack: AttackDef) -> Self {
        if let CombatantKind::Npc(npc) = &mut self.kind {
            npc.attacks.push(attack);
        }
        self
    }

    pub fn with_dexterity(mut self, dexterity: u8) -> Self {
        if let CombatantKind::Player(player) = &mut self.kind {
            player.dexterity = dexterity;
        }
        self
    }

    pub fn equipped(mut self, item: Item) -> Self {
        if let CombatantKind::Player(player) = &mut self.kind {
            player.equipment.equip(item);
        }
        self
    }

    pub fn is_player(&self) -> bool {
        matches!(self.kind, CombatantKind::Player(_))
    }

    pub fn is_npc(&self) -> bool {
        !self.is_player()
    }

    pub fn has_health(&self) -> bool {
        self.health.is_some()
    }

    /// Has health and it is above zero.
    pub fn is_alive(&self) -> bool {
        self.health.is_some_and(|hp| hp > 0)
    }

    /// Health is present and at or below zero.
    pub fn is_down(&self) -> bool {
        self.health.is_some_and(|hp| hp <= 0)
    }

    /// Down or already through the death handler; cannot start a fight.
    pub fn is_incapacitated(&self) -> bool {
        self.dead || self.is_down()
    }

    pub fn is_wounded(&self) -> bool {
        self.health.is_some_and(|hp| hp < self.max_health)
    }

    pub fn has_effect_type(&self, kind: &str) -> bool {
        self.effects.iter().any(|e| e.kind == kind)
    }

    /// Whether `query` names this combatant (case-insensitive prefix of the
    /// name or any keyword).
    pub fn answers_to(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        if query.is_empty() {
            return false;
        }
        std::iter::once(&self.name)
            .chain(self.keywords.iter())
            .any(|word| word.to_lowercase().starts_with(&query))
    }
}

// ============================================================================
// Arena
// ============================================================================

/// Registry of every combatant plus the engagement graph between them.
#[derive(Debug, Default)]
pub struct Arena {
    combatants: HashMap<CombatantId, Combatant>,
    roster: Vec<CombatantId>,
    engagements: Engagements,
}

impl Arena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a combatant, returning its id.
    pub fn add(&mut self, combatant: Combatant) -> CombatantId {
        let id = combatant.id;
        if self.combatants.insert(id, combatant).is_none() {
            self.roster.push(id);
        }
        id
    }

    /// Deregister a combatant and drop every engagement it had.
    pub fn remove(&mut self, id: CombatantId) -> Option<Combatant> {
        let combatant = self.combatants.remove(&id)?;
        self.roster.retain(|&other| other != id);
        self.engagements.disengage_all(id);
        Some(combatant)
    }

    pub fn get(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.get(&id)
    }

    pub fn get_mut(&mut self, id: CombatantId) -> Option<&mut Combatant> {
        self.combatants.get_mut(&id)
    }

    pub fn contains(&self, id: CombatantId) -> bool {
        self.combatants.contains_key(&id)
    }

    /// Ids in registration order.
    pub fn ids(&self) -> &[CombatantId] {
        &self.roster
    }

    pub fn len(&self) -> usize {
        self.roster.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roster.is_empty()
    }

    /// Everyone standing in `room`, in registration order.
    pub fn occupants(&self, room: RoomId) -> impl Iterator<Item = &Combatant> + '_ {
        self.roster
            .iter()
            .filter_map(|id| self.combatants.get(id))
            .filter(move |c| c.room == Some(room))
    }

    pub fn engagements(&self) -> &Engagements {
        &self.engagements
    }

    pub fn opponents(&self, id: CombatantId) -> &[CombatantId] {
        self.engagements.opponents(id)
    }

    pub fn is_in_combat(&self, id: CombatantId) -> bool {
        self.engagements.is_engaged(id)
    }

    /// Engage two registered combatants with each other.
    pub fn engage(&mut self, a: CombatantId, b: CombatantId) -> bool {
        if !self.contains(a) || !self.contains(b) {
            return false;
        }
        self.engagements.engage(a, b)
    }

    /// Pull `id` out of every fight: clears its edges on both sides, resets
    /// its round state and drops its combat display. Returns former opponents.
    pub fn withdraw(&mut self, id: CombatantId) -> Vec<CombatantId> {
        let former = self.engagements.disengage_all(id);
        if let Some(combatant) = self.combatants.get_mut(&id) {
            combatant.round_state.reset();
            combatant.combat_prompt = false;
        }
        former
    }

    /// Heal a combatant, clearing the dead flag once it is back above zero.
    pub fn restore_health(&mut self, id: CombatantId, amount: i32) -> Option<i32> {
        let combatant = self.combatants.get_mut(&id)?;
        let current = combatant.health?;
        let healed = (current + amount).min(combatant.max_health);
        combatant.health = Some(healed);
        if healed > 0 {
            combatant.dead = false;
        }
        Some(healed)
    }
}
