//! Real-time combat rounds for text MUDs.
//!
//! This crate provides:
//! - THAC0 hit resolution against descending armor class
//! - Fractional attacks per round and dice-notation damage
//! - Wall-clock lag between rounds
//! - A symmetric engagement graph and a fail-safe round scheduler
//! - Death handling with `deathblow`/`killed` events for other systems
//!
//! # Quick Start
//!
//! ```
//! use mud_combat::{Archetype, Arena, CombatConfig, CombatEngine, Combatant, RoomId};
//!
//! let mut engine = CombatEngine::new(CombatConfig::default());
//! let mut arena = Arena::new();
//! let room = RoomId::new();
//!
//! let hero = arena.add(Combatant::player("Aria", Archetype::Fighter, 3).with_room(room));
//! let rat = arena.add(Combatant::npc("a rat").with_room(room).with_health(4));
//!
//! engine.initiate_combat(&mut arena, hero, rat).unwrap();
//! let report = engine.tick(&mut arena);
//! assert!(report.faults.is_empty());
//! ```

pub mod armor;
pub mod attack;
pub mod command;
pub mod config;
pub mod dice;
pub mod engagement;
pub mod engine;
pub mod error;
pub mod events;
pub mod hooks;
pub mod items;
pub mod narrate;
pub mod rules;
pub mod testing;
pub mod world;

// Primary public API
pub use attack::{AttackDef, AttackProfileSource, StandardProfiles, SubAttack};
pub use config::CombatConfig;
pub use dice::{DiceExpression, DiceRoller, RngDice};
pub use engine::{CombatEngine, TickReport};
pub use error::CombatError;
pub use events::{CombatEvent, CombatObserver};
pub use hooks::{Clock, EffectSpec, Notifier, TargetFinder, WorldHooks};
pub use rules::DamageEvent;
pub use world::{Archetype, Arena, Combatant, CombatantId, Item, RoomId};
