//! Testing utilities for combat.
//!
//! This module provides tools for deterministic tests:
//! - `ScriptedDice` for queued rolls instead of randomness
//! - `ManualClock` for stepping wall-clock time by hand
//! - recording doubles for the notifier, world hooks and event bus
//! - `Scenario` for running fights in a single room
//! - Assertion helpers for verifying combat state

use crate::command;
use crate::config::CombatConfig;
use crate::dice::{DiceExpression, DiceRoller};
use crate::engine::{CombatEngine, TickReport};
use crate::error::CombatError;
use crate::events::{CombatEvent, CombatObserver};
use crate::hooks::{Clock, EffectSpec, Notifier, WorldHooks};
use crate::world::{Arena, Combatant, CombatantId, RoomId};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

// ============================================================================
// Dice
// ============================================================================

/// Dice that return queued values.
///
/// Once a queue runs dry the dice fall back to fixed answers: ranges give
/// their maximum (a d20 is a natural 20) unless [`always_roll`] set
/// something else, chances give `0.5`, and expressions give their maximum.
///
/// [`always_roll`]: ScriptedDice::always_roll
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    ranges: VecDeque<i32>,
    chances: VecDeque<f64>,
    damage: VecDeque<i32>,
    range_fallback: Option<i32>,
    chance_draws: usize,
}

impl ScriptedDice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue results for range rolls, d20s included.
    pub fn with_d20s(mut self, rolls: impl IntoIterator<Item = i32>) -> Self {
        self.ranges.extend(rolls);
        self
    }

    /// Queue results for uniform `[0, 1)` draws.
    pub fn with_chances(mut self, draws: impl IntoIterator<Item = f64>) -> Self {
        self.chances.extend(draws);
        self
    }

    /// Queue results for damage expressions.
    pub fn with_damage(mut self, rolls: impl IntoIterator<Item = i32>) -> Self {
        self.damage.extend(rolls);
        self
    }

    /// Range result once the queue is empty.
    pub fn always_roll(mut self, value: i32) -> Self {
        self.range_fallback = Some(value);
        self
    }

    /// How many uniform draws have been taken.
    pub fn chance_draws(&self) -> usize {
        self.chance_draws
    }
}

impl DiceRoller for ScriptedDice {
    fn roll(&mut self, expression: &DiceExpression) -> i32 {
        self.damage
            .pop_front()
            .unwrap_or_else(|| expression.max_total())
    }

    fn roll_range(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        let value = self
            .ranges
            .pop_front()
            .or(self.range_fallback)
            .unwrap_or(max);
        value.clamp(min, max)
    }

    fn chance(&mut self) -> f64 {
        self.chance_draws += 1;
        self.chances.pop_front().unwrap_or(0.5)
    }
}

// ============================================================================
// Clock
// ============================================================================

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

// ============================================================================
// Recording doubles
// ============================================================================

/// One delivered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Direct {
        to: CombatantId,
        text: String,
    },
    Room {
        room: RoomId,
        text: String,
        excluded: Vec<CombatantId>,
    },
}

/// Notifier that keeps everything it is asked to send.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    log: Rc<RefCell<Vec<Delivery>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.log.borrow().clone()
    }

    /// Direct messages sent to `id`, oldest first.
    pub fn messages_for(&self, id: CombatantId) -> Vec<String> {
        self.log
            .borrow()
            .iter()
            .filter_map(|d| match d {
                Delivery::Direct { to, text } if *to == id => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn room_messages(&self) -> Vec<String> {
        self.log
            .borrow()
            .iter()
            .filter_map(|d| match d {
                Delivery::Room { text, .. } => Some(text.clone()),
                Delivery::Direct { .. } => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&mut self, recipient: &Combatant, message: &str) {
        self.log.borrow_mut().push(Delivery::Direct {
            to: recipient.id,
            text: message.to_string(),
        });
    }

    fn notify_except(&mut self, room: RoomId, message: &str, excluded: &[CombatantId]) {
        self.log.borrow_mut().push(Delivery::Room {
            room,
            text: message.to_string(),
            excluded: excluded.to_vec(),
        });
    }
}

#[derive(Debug, Default)]
struct HooksLog {
    removed: Vec<CombatantId>,
    effects: Vec<(CombatantId, EffectSpec)>,
    reject_effects: bool,
}

/// World hooks that remember removals and effect requests.
#[derive(Debug, Clone, Default)]
pub struct RecordingHooks {
    log: Rc<RefCell<HooksLog>>,
}

impl RecordingHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse every effect, as an effect system at capacity would.
    pub fn rejecting_effects(self) -> Self {
        self.log.borrow_mut().reject_effects = true;
        self
    }

    pub fn removed(&self) -> Vec<CombatantId> {
        self.log.borrow().removed.clone()
    }

    /// Effects that were accepted.
    pub fn effects(&self) -> Vec<(CombatantId, EffectSpec)> {
        self.log.borrow().effects.clone()
    }
}

impl WorldHooks for RecordingHooks {
    fn on_entity_removed(&mut self, entity: &Combatant) {
        self.log.borrow_mut().removed.push(entity.id);
    }

    fn apply_effect(&mut self, entity: &Combatant, effect: &EffectSpec) -> bool {
        let mut log = self.log.borrow_mut();
        if log.reject_effects {
            return false;
        }
        log.effects.push((entity.id, effect.clone()));
        true
    }
}

/// Collects every event the engine emits.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    log: Rc<RefCell<Vec<CombatEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// An observer feeding this recorder, for [`CombatEngine::subscribe`].
    pub fn observer(&self) -> impl CombatObserver + 'static {
        let log = Rc::clone(&self.log);
        move |event: &CombatEvent| log.borrow_mut().push(event.clone())
    }

    pub fn events(&self) -> Vec<CombatEvent> {
        self.log.borrow().clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.log.borrow().iter().map(CombatEvent::name).collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.log.borrow().iter().filter(|e| e.name() == name).count()
    }
}

// ============================================================================
// Scenario harness
// ============================================================================

/// A single room with an engine wired to recording doubles.
pub struct Scenario {
    pub engine: CombatEngine,
    pub arena: Arena,
    pub clock: ManualClock,
    pub notifier: RecordingNotifier,
    pub hooks: RecordingHooks,
    pub events: RecordingObserver,
    pub room: RoomId,
}

impl Scenario {
    pub fn new(dice: ScriptedDice) -> Self {
        Self::with_config(CombatConfig::default(), dice)
    }

    pub fn with_config(config: CombatConfig, dice: ScriptedDice) -> Self {
        let clock = ManualClock::new(1_000_000);
        let notifier = RecordingNotifier::new();
        let hooks = RecordingHooks::new();
        let events = RecordingObserver::new();
        let mut engine = CombatEngine::new(config)
            .with_clock(clock.clone())
            .with_dice(dice)
            .with_notifier(notifier.clone())
            .with_world_hooks(hooks.clone());
        engine.subscribe(events.observer());

        Self {
            engine,
            arena: Arena::new(),
            clock,
            notifier,
            hooks,
            events,
            room: RoomId::new(),
        }
    }

    /// Register `combatant` in the scenario's room.
    pub fn add(&mut self, combatant: Combatant) -> CombatantId {
        let room = self.room;
        self.arena.add(combatant.with_room(room))
    }

    pub fn engage(
        &mut self,
        attacker: CombatantId,
        target: CombatantId,
    ) -> Result<(), CombatError> {
        self.engine.initiate_combat(&mut self.arena, attacker, target)
    }

    /// Run the attack command as `player`.
    pub fn command(&mut self, player: CombatantId, args: &str) -> bool {
        command::attack(&mut self.engine, &mut self.arena, player, args)
    }

    pub fn tick(&mut self) -> TickReport {
        self.engine.tick(&mut self.arena)
    }

    /// Move the clock forward, then tick.
    pub fn advance(&mut self, ms: u64) -> TickReport {
        self.clock.advance(ms);
        self.tick()
    }

    pub fn get(&self, id: CombatantId) -> Option<&Combatant> {
        self.arena.get(id)
    }

    pub fn health(&self, id: CombatantId) -> Option<i32> {
        self.arena.get(id).and_then(|c| c.health)
    }

    pub fn in_combat(&self, id: CombatantId) -> bool {
        self.arena.is_in_combat(id)
    }

    pub fn lag(&self, id: CombatantId) -> Option<i64> {
        self.arena.get(id).map(|c| c.round_state.remaining_lag_ms)
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert a combatant's current health.
#[track_caller]
pub fn assert_health(scenario: &Scenario, id: CombatantId, expected: i32) {
    assert_eq!(
        scenario.health(id),
        Some(expected),
        "Expected health {expected} for {id}"
    );
}

#[track_caller]
pub fn assert_in_combat(scenario: &Scenario, id: CombatantId) {
    assert!(scenario.in_combat(id), "Expected {id} to be in combat");
}

#[track_caller]
pub fn assert_not_in_combat(scenario: &Scenario, id: CombatantId) {
    assert!(!scenario.in_combat(id), "Expected {id} to NOT be in combat");
}

/// Assert `id` was sent a message containing `needle`.
#[track_caller]
pub fn assert_told(scenario: &Scenario, id: CombatantId, needle: &str) {
    let messages = scenario.notifier.messages_for(id);
    assert!(
        messages.iter().any(|m| m.contains(needle)),
        "Expected a message containing '{needle}', got {messages:?}"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_dice_queues_then_falls_back() {
        let mut dice = ScriptedDice::new().with_d20s([7, 30]).with_damage([2]);
        assert_eq!(dice.d20(), 7);
        assert_eq!(dice.d20(), 20);
        assert_eq!(dice.d20(), 20);
        assert_eq!(dice.roll_notation("2d4+1").unwrap(), 2);
        assert_eq!(dice.roll_notation("2d4+1").unwrap(), 9);
    }

    #[test]
    fn test_always_roll() {
        let mut dice = ScriptedDice::new().with_d20s([3]).always_roll(11);
        assert_eq!(dice.d20(), 3);
        assert_eq!(dice.d20(), 11);
        assert_eq!(dice.roll_range(1, 6), 6);
    }

    #[test]
    fn test_chance_counts_draws() {
        let mut dice = ScriptedDice::new().with_chances([0.1]);
        assert_eq!(dice.chance(), 0.1);
        assert_eq!(dice.chance(), 0.5);
        assert_eq!(dice.chance_draws(), 2);
    }

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::new(100);
        let handle = clock.clone();
        handle.advance(50);
        assert_eq!(clock.now_ms(), 150);
        clock.set(10);
        assert_eq!(handle.now_ms(), 10);
    }

    #[test]
    fn test_recording_hooks_can_reject() {
        let mut hooks = RecordingHooks::new().rejecting_effects();
        let wolf = Combatant::npc("wolf");
        assert!(!hooks.apply_effect(&wolf, &EffectSpec::regeneration(5)));
        assert!(hooks.effects().is_empty());
    }

    #[test]
    fn test_scenario_places_combatants_in_room() {
        let mut scenario = Scenario::new(ScriptedDice::new());
        let id = scenario.add(Combatant::npc("rat"));
        assert_eq!(scenario.get(id).unwrap().room, Some(scenario.room));
        assert_eq!(scenario.arena.occupants(scenario.room).count(), 1);
    }
}
