//! Combat events and the bus that carries them.
//!
//! Systems outside the core (loot drops, quest triggers, experience) learn
//! about fights by subscribing here instead of being called directly.

use crate::hooks::EffectSpec;
use crate::rules::DamageEvent;
use crate::world::CombatantId;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Everything the engine announces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatEvent {
    /// `combatant` entered combat, pulled in by or attacking `opponent`.
    CombatStarted {
        combatant: CombatantId,
        opponent: CombatantId,
    },
    /// A round's damage was committed.
    Damaged(DamageEvent),
    /// `killer` landed the killing blow on `victim`.
    Deathblow {
        killer: CombatantId,
        victim: CombatantId,
    },
    /// `victim` died; `killer` is `None` for environmental deaths.
    Killed {
        victim: CombatantId,
        killer: Option<CombatantId>,
    },
    /// `combatant` left combat.
    CombatEnded { combatant: CombatantId },
    /// An effect was attached to `target`.
    EffectApplied {
        target: CombatantId,
        effect: EffectSpec,
    },
}

impl CombatEvent {
    /// Stable event name.
    pub fn name(&self) -> &'static str {
        match self {
            CombatEvent::CombatStarted { .. } => "combatStart",
            CombatEvent::Damaged(_) => "damaged",
            CombatEvent::Deathblow { .. } => "deathblow",
            CombatEvent::Killed { .. } => "killed",
            CombatEvent::CombatEnded { .. } => "combatEnd",
            CombatEvent::EffectApplied { .. } => "effectAdded",
        }
    }
}

/// Something interested in combat events.
pub trait CombatObserver {
    fn on_event(&mut self, event: &CombatEvent);
}

impl<F> CombatObserver for F
where
    F: FnMut(&CombatEvent),
{
    fn on_event(&mut self, event: &CombatEvent) {
        self(event)
    }
}

/// Fan-out of events to every subscribed observer, in subscription order.
#[derive(Default)]
pub struct EventBus {
    observers: Vec<Box<dyn CombatObserver>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: impl CombatObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn emit(&mut self, event: CombatEvent) {
        trace!(event = event.name(), "combat event");
        for observer in &mut self.observers {
            observer.on_event(&event);
        }
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("observers", &self.observers.len())
            .finish()
    }
}
