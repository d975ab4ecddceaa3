//! Collaborators the engine calls out to.
//!
//! The engine owns combat state only. Message delivery, world bookkeeping,
//! the status-effect system, name matching and the wall clock all live
//! elsewhere and are reached through these traits.

use crate::world::{Combatant, CombatantId, RoomId};
use serde::{Deserialize, Serialize};
use tracing::debug;

// ============================================================================
// Clock
// ============================================================================

/// Millisecond wall clock.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// The real clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        chrono::Utc::now().timestamp_millis().max(0) as u64
    }
}

// ============================================================================
// Messaging
// ============================================================================

/// Player-facing message delivery.
pub trait Notifier {
    /// Send `message` to one combatant. NPCs may ignore it.
    fn notify(&mut self, recipient: &Combatant, message: &str);

    /// Send `message` to everyone in `room` except `excluded`.
    fn notify_except(&mut self, room: RoomId, message: &str, excluded: &[CombatantId]);
}

/// Drops messages after logging them at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, recipient: &Combatant, message: &str) {
        debug!(to = %recipient.name, text = message, "notify");
    }

    fn notify_except(&mut self, _room: RoomId, message: &str, excluded: &[CombatantId]) {
        debug!(excluded = excluded.len(), text = message, "notify room");
    }
}

// ============================================================================
// World bookkeeping and effects
// ============================================================================

/// A status effect to apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectSpec {
    pub kind: String,
    pub magnitude: i32,
    pub hidden: bool,
}

impl EffectSpec {
    pub fn regeneration(magnitude: i32) -> Self {
        Self {
            kind: "regen".to_string(),
            magnitude,
            hidden: true,
        }
    }
}

/// Area/mob management and the effect system.
pub trait WorldHooks {
    /// A defeated NPC is leaving the world for good.
    fn on_entity_removed(&mut self, entity: &Combatant);

    /// Ask the effect system to attach `effect`. Returns whether it took.
    fn apply_effect(&mut self, entity: &Combatant, effect: &EffectSpec) -> bool;
}

/// Accepts every effect and keeps no world of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedWorld;

impl WorldHooks for DetachedWorld {
    fn on_entity_removed(&mut self, entity: &Combatant) {
        debug!(name = %entity.name, "entity removed");
    }

    fn apply_effect(&mut self, _entity: &Combatant, _effect: &EffectSpec) -> bool {
        true
    }
}

// ============================================================================
// Target lookup
// ============================================================================

/// Resolves a typed name against the combatants in view.
pub trait TargetFinder {
    fn find_target<'a>(&self, query: &str, candidates: &[&'a Combatant]) -> Option<&'a Combatant>;
}

/// Prefix matching with `N.name` selection: `2.rat` is the second rat.
#[derive(Debug, Clone, Copy, Default)]
pub struct DotSyntaxFinder;

impl DotSyntaxFinder {
    fn split(query: &str) -> (usize, &str) {
        if let Some((index, rest)) = query.split_once('.') {
            if let Ok(n) = index.trim().parse::<usize>() {
                return (n.max(1), rest.trim());
            }
        }
        (1, query.trim())
    }
}

impl TargetFinder for DotSyntaxFinder {
    fn find_target<'a>(&self, query: &str, candidates: &[&'a Combatant]) -> Option<&'a Combatant> {
        let (nth, name) = Self::split(query);
        candidates
            .iter()
            .copied()
            .filter(|c| c.answers_to(name))
            .nth(nth - 1)
    }
}
