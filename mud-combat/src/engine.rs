//! The combat round engine.
//!
//! [`CombatEngine::tick`] is called once per scheduler interval and gives
//! every registered combatant a chance to act:
//!
//! 1. combatants at or below zero health go through the death handler
//! 2. combatants not engaged with anyone drop their combat display
//! 3. wall-clock time since the last pass is burned off their lag
//! 4. once lag is spent, the first living opponent is attacked and the
//!    attacker picks up fresh lag
//!
//! Errors from one combatant's round never stop the tick: the combatant is
//! pulled out of combat, the fault is logged and the loop moves on.

use crate::attack::{AttackProfileSource, StandardProfiles};
use crate::config::CombatConfig;
use crate::dice::{DiceRoller, RngDice};
use crate::error::CombatError;
use crate::events::{CombatEvent, CombatObserver, EventBus};
use crate::hooks::{
    Clock, DetachedWorld, DotSyntaxFinder, EffectSpec, LogNotifier, Notifier, SystemClock,
    TargetFinder, WorldHooks,
};
use crate::narrate;
use crate::rules::DamageEvent;
use crate::world::{ActiveEffect, Arena, Combatant, CombatantId, RoomId};
use tracing::{debug, error, info, warn};

/// What happened during one [`CombatEngine::tick`].
#[derive(Debug, Default)]
pub struct TickReport {
    /// Combatants that attacked this tick, in processing order.
    pub acted: Vec<CombatantId>,
    /// Combatants whose round failed; each has been pulled out of combat.
    pub faults: Vec<(CombatantId, CombatError)>,
}

/// Drives combat rounds for every combatant in an [`Arena`].
pub struct CombatEngine {
    config: CombatConfig,
    clock: Box<dyn Clock>,
    dice: Box<dyn DiceRoller>,
    profiles: Box<dyn AttackProfileSource>,
    finder: Box<dyn TargetFinder>,
    notifier: Box<dyn Notifier>,
    world: Box<dyn WorldHooks>,
    events: EventBus,
}

impl CombatEngine {
    /// An engine on the system clock with entropy-seeded dice and the
    /// standard attack tables.
    pub fn new(config: CombatConfig) -> Self {
        let profiles = StandardProfiles::new(config.unarmed_damage.clone());
        Self {
            config,
            clock: Box::new(SystemClock),
            dice: Box::new(RngDice::from_entropy()),
            profiles: Box::new(profiles),
            finder: Box::new(DotSyntaxFinder),
            notifier: Box::new(LogNotifier),
            world: Box::new(DetachedWorld),
            events: EventBus::new(),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_dice(mut self, dice: impl DiceRoller + 'static) -> Self {
        self.dice = Box::new(dice);
        self
    }

    pub fn with_profiles(mut self, profiles: impl AttackProfileSource + 'static) -> Self {
        self.profiles = Box::new(profiles);
        self
    }

    pub fn with_finder(mut self, finder: impl TargetFinder + 'static) -> Self {
        self.finder = Box::new(finder);
        self
    }

    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    pub fn with_world_hooks(mut self, world: impl WorldHooks + 'static) -> Self {
        self.world = Box::new(world);
        self
    }

    /// Register an observer for combat events.
    pub fn subscribe(&mut self, observer: impl CombatObserver + 'static) {
        self.events.subscribe(observer);
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    // ========================================================================
    // Scheduling
    // ========================================================================

    /// Run one scheduler pass over every registered combatant.
    pub fn tick(&mut self, arena: &mut Arena) -> TickReport {
        let mut report = TickReport::default();
        let ids = arena.ids().to_vec();

        for id in ids {
            // Killed and deregistered earlier in this tick.
            if !arena.contains(id) {
                continue;
            }
            match self.advance_round(arena, id) {
                Ok(true) => report.acted.push(id),
                Ok(false) => {}
                Err(err) => {
                    if matches!(err, CombatError::InvalidTarget { .. }) {
                        warn!(combatant = %id, error = %err, "invalid opponent, disengaging");
                    } else {
                        error!(combatant = %id, error = %err, "combat round failed, disengaging");
                    }
                    if arena.is_in_combat(id) {
                        self.end_combat(arena, id);
                    }
                    report.faults.push((id, err));
                }
            }
        }

        report
    }

    /// One combatant's turn. Returns whether it attacked.
    pub fn advance_round(
        &mut self,
        arena: &mut Arena,
        id: CombatantId,
    ) -> Result<bool, CombatError> {
        let combatant = arena.get(id).ok_or(CombatError::UnknownCombatant(id))?;

        if combatant.is_down() {
            self.handle_death(arena, id, None);
            return Ok(false);
        }

        if !arena.is_in_combat(id) {
            if let Some(combatant) = arena.get_mut(id) {
                if combatant.is_player() {
                    combatant.combat_prompt = false;
                }
            }
            return Ok(false);
        }

        let now = self.clock.now_ms();
        let combatant = arena
            .get_mut(id)
            .ok_or(CombatError::UnknownCombatant(id))?;
        let state = &mut combatant.round_state;
        let elapsed = state
            .last_round_started_at
            .map_or(0, |started| now.saturating_sub(started)) as i64;
        state.last_round_started_at = Some(now);
        state.remaining_lag_ms -= elapsed;
        if state.remaining_lag_ms > 0 {
            debug!(combatant = %combatant.name, lag_ms = state.remaining_lag_ms, "still lagged");
            return Ok(false);
        }
        // Overshoot stays negative and is paid back by the next round's lag.

        let target = match self.choose_combatant(arena, id) {
            Ok(target) => target,
            Err(err) => {
                self.end_combat(arena, id);
                return Err(err);
            }
        };
        let Some(target) = target else {
            self.end_combat(arena, id);
            return Ok(false);
        };

        self.resolve_attack_round(arena, id, target)?;

        if arena.get(target).is_some_and(Combatant::is_down) {
            self.handle_death(arena, target, Some(id));
        }
        Ok(true)
    }

    /// First opponent, in engagement order, with health above zero.
    ///
    /// An opponent with no health attribute at all means the engagement
    /// graph holds something that never should have been attacked; that is
    /// an error, not a skip.
    pub fn choose_combatant(
        &self,
        arena: &Arena,
        id: CombatantId,
    ) -> Result<Option<CombatantId>, CombatError> {
        for &other in arena.opponents(id) {
            let target = arena
                .get(other)
                .ok_or(CombatError::UnknownCombatant(other))?;
            match target.health {
                None => {
                    return Err(CombatError::InvalidTarget {
                        name: target.name.clone(),
                    })
                }
                Some(hp) if hp > 0 => return Ok(Some(other)),
                Some(_) => {}
            }
        }
        Ok(None)
    }

    // ========================================================================
    // Attack resolution
    // ========================================================================

    /// Roll and commit one round of attacks, then lag the attacker.
    pub fn resolve_attack_round(
        &mut self,
        arena: &mut Arena,
        attacker_id: CombatantId,
        target_id: CombatantId,
    ) -> Result<DamageEvent, CombatError> {
        let attacker = arena
            .get(attacker_id)
            .ok_or(CombatError::UnknownCombatant(attacker_id))?;
        let target = arena
            .get(target_id)
            .ok_or(CombatError::UnknownCombatant(target_id))?;

        let profile = self.profiles.attack_profile(attacker);
        let event = DamageEvent::roll(
            attacker,
            target,
            &profile,
            self.dice.as_mut(),
            self.config.default_armor_class,
        )?;
        let narration = narrate::round(&event, &attacker.name, &target.name);
        let room = attacker.room;

        let target = arena
            .get_mut(target_id)
            .ok_or(CombatError::UnknownCombatant(target_id))?;
        let health = event.commit(target)?;
        if health <= 0 {
            target.round_state.killed_by = Some(attacker_id);
        }

        let attacker = arena
            .get_mut(attacker_id)
            .ok_or(CombatError::UnknownCombatant(attacker_id))?;
        attacker.round_state.remaining_lag_ms += self.config.attack_lag_ms;

        debug!(
            attacker = %attacker.name,
            sub_attacks = event.sub_attacks.len(),
            hits = event.hits(),
            damage = event.amount,
            target_health = health,
            lag_ms = attacker.round_state.remaining_lag_ms,
            "attack round"
        );

        self.tell(arena, attacker_id, &narration.attacker);
        self.tell(arena, target_id, &narration.target);
        if let Some(room) = room {
            self.tell_room(room, &narration.room, &[attacker_id, target_id]);
        }
        self.events.emit(CombatEvent::Damaged(event.clone()));

        Ok(event)
    }

    // ========================================================================
    // Death
    // ========================================================================

    /// Terminal transition for a combatant at or below zero health.
    ///
    /// `killer` overrides whoever is recorded as having landed the last
    /// blow. Calling this again for a combatant already handled (or already
    /// deregistered) does nothing.
    pub fn handle_death(
        &mut self,
        arena: &mut Arena,
        dead_id: CombatantId,
        killer: Option<CombatantId>,
    ) {
        let Some(dead) = arena.get_mut(dead_id) else {
            debug!(combatant = %dead_id, "death for unregistered combatant ignored");
            return;
        };
        if dead.dead {
            debug!(combatant = %dead.name, "already dead");
            return;
        }
        dead.dead = true;
        let killer = killer.or(dead.round_state.killed_by);
        let room = dead.room;
        let is_npc = dead.is_npc();
        let victim_name = dead.name.clone();

        self.end_combat(arena, dead_id);

        let killer_name = killer.and_then(|k| arena.get(k)).map(|k| k.name.clone());
        info!(
            "{} killed {}.",
            killer_name.as_deref().unwrap_or("Something"),
            victim_name
        );

        let narration = narrate::death(&victim_name, killer_name.as_deref());
        if let Some(killer) = killer {
            if let Some(text) = narration.killer.as_deref() {
                self.tell(arena, killer, text);
            }
            self.events.emit(CombatEvent::Deathblow {
                killer,
                victim: dead_id,
            });
        }
        self.tell(arena, dead_id, &narration.victim);
        if let Some(room) = room {
            let mut excluded = vec![dead_id];
            excluded.extend(killer);
            self.tell_room(room, &narration.room, &excluded);
        }
        self.events.emit(CombatEvent::Killed {
            victim: dead_id,
            killer,
        });

        if is_npc {
            if let Some(corpse) = arena.remove(dead_id) {
                self.world.on_entity_removed(&corpse);
                info!(npc = %corpse.name, "removed from world");
            }
        }
    }

    // ========================================================================
    // Entering and leaving combat
    // ========================================================================

    /// Engage `attacker` and `target` with each other.
    ///
    /// A side not already fighting starts a fresh round state: the attacker
    /// with no lag, the target with the configured defender lag. Neither
    /// side may be down or dead.
    pub fn initiate_combat(
        &mut self,
        arena: &mut Arena,
        attacker: CombatantId,
        target: CombatantId,
    ) -> Result<(), CombatError> {
        if attacker == target {
            return Err(CombatError::SelfTarget);
        }
        let attacking = arena
            .get(attacker)
            .ok_or(CombatError::UnknownCombatant(attacker))?;
        let defending = arena
            .get(target)
            .ok_or(CombatError::UnknownCombatant(target))?;
        if attacking.is_incapacitated() {
            return Err(CombatError::Incapacitated);
        }
        if defending.is_incapacitated() {
            return Err(CombatError::InvalidTarget {
                name: defending.name.clone(),
            });
        }

        let now = self.clock.now_ms();
        let sides = [
            (attacker, target, arena.is_in_combat(attacker), 0),
            (target, attacker, arena.is_in_combat(target), self.config.defender_lag_ms),
        ];
        arena.engage(attacker, target);

        for (id, opponent, already_fighting, lag_ms) in sides {
            if already_fighting {
                continue;
            }
            if let Some(combatant) = arena.get_mut(id) {
                combatant.round_state.begin(now, lag_ms);
                if combatant.is_player() {
                    combatant.combat_prompt = true;
                }
                info!(combatant = %combatant.name, lag_ms, "entered combat");
            }
            self.events.emit(CombatEvent::CombatStarted {
                combatant: id,
                opponent,
            });
        }
        Ok(())
    }

    /// Pull a combatant out of every fight it is in (fleeing, teleporting).
    pub fn remove_from_combat(&mut self, arena: &mut Arena, id: CombatantId) {
        if arena.is_in_combat(id) {
            self.end_combat(arena, id);
        }
    }

    /// Withdraw `id`, and anyone left without an opponent because of it.
    fn end_combat(&mut self, arena: &mut Arena, id: CombatantId) {
        let former = self.leave_combat(arena, id);
        for other in former {
            if !arena.is_in_combat(other) {
                self.leave_combat(arena, other);
            }
        }
    }

    fn leave_combat(&mut self, arena: &mut Arena, id: CombatantId) -> Vec<CombatantId> {
        let former = arena.withdraw(id);
        self.events.emit(CombatEvent::CombatEnded { combatant: id });
        if arena
            .get(id)
            .is_some_and(|c| c.is_alive() && c.is_wounded())
        {
            self.start_regeneration(arena, id);
        }
        former
    }

    /// Start health regeneration unless one is already running.
    pub fn start_regeneration(&mut self, arena: &mut Arena, id: CombatantId) -> bool {
        let Some(combatant) = arena.get(id) else {
            return false;
        };
        if combatant.has_effect_type("regen") {
            return false;
        }
        let spec = EffectSpec::regeneration(self.config.regen_magnitude);
        if !self.world.apply_effect(combatant, &spec) {
            return false;
        }
        if let Some(combatant) = arena.get_mut(id) {
            combatant.effects.push(ActiveEffect {
                kind: spec.kind.clone(),
                magnitude: spec.magnitude,
                hidden: spec.hidden,
            });
        }
        self.events.emit(CombatEvent::EffectApplied {
            target: id,
            effect: spec,
        });
        true
    }

    // ========================================================================
    // Targeting
    // ========================================================================

    /// Resolve `query` to something `attacker_id` may attack.
    ///
    /// Looks at NPCs in the attacker's room, players too when the attacker
    /// has opted into PvP, and the attacker itself. The fallen are skipped,
    /// and a fallen attacker gets [`CombatError::Incapacitated`].
    pub fn find_combatant(
        &self,
        arena: &Arena,
        attacker_id: CombatantId,
        query: &str,
    ) -> Result<Option<CombatantId>, CombatError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(None);
        }
        let attacker = arena
            .get(attacker_id)
            .ok_or(CombatError::UnknownCombatant(attacker_id))?;
        if attacker.is_incapacitated() {
            return Err(CombatError::Incapacitated);
        }

        let candidates: Vec<&Combatant> = match attacker.room {
            Some(room) => arena
                .occupants(room)
                .filter(|c| c.id == attacker_id || !c.is_incapacitated())
                .filter(|c| c.id == attacker_id || c.is_npc() || attacker.pvp)
                .collect(),
            None => vec![attacker],
        };

        let Some(target) = self.finder.find_target(query, &candidates) else {
            return Ok(None);
        };

        if target.id == attacker_id {
            return Err(CombatError::SelfTarget);
        }
        if !target.has_health() {
            return Err(CombatError::InvalidTarget {
                name: target.name.clone(),
            });
        }
        if target.is_player() && !target.pvp {
            return Err(CombatError::NonPvp {
                name: target.name.clone(),
            });
        }
        if target.pacifist {
            return Err(CombatError::Pacifist {
                name: target.name.clone(),
            });
        }
        Ok(Some(target.id))
    }

    // ========================================================================
    // Messaging
    // ========================================================================

    /// Message a player. NPCs are skipped.
    pub(crate) fn tell(&mut self, arena: &Arena, id: CombatantId, text: &str) {
        if let Some(recipient) = arena.get(id) {
            if recipient.is_player() {
                self.notifier.notify(recipient, text);
            }
        }
    }

    pub(crate) fn tell_room(&mut self, room: RoomId, text: &str, excluded: &[CombatantId]) {
        self.notifier.notify_except(room, text, excluded);
    }
}

impl std::fmt::Debug for CombatEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombatEngine")
            .field("config", &self.config)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}
