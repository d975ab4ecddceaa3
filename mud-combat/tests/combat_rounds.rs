//! Scenario tests for the round scheduler, damage and death.

use mud_combat::armor::armor_class;
use mud_combat::attack::AttackDef;
use mud_combat::dice::DiceError;
use mud_combat::testing::{
    assert_health, assert_in_combat, assert_not_in_combat, assert_told, ManualClock,
    RecordingObserver, Scenario, ScriptedDice,
};
use mud_combat::{
    Archetype, Arena, CombatConfig, CombatEngine, CombatError, CombatEvent, Combatant,
    CombatantId, RngDice, RoomId,
};
use proptest::prelude::*;

fn brute(name: &str, health: i32, attack: AttackDef) -> Combatant {
    Combatant::npc(name)
        .with_keywords([name])
        .with_health(health)
        .with_attack(attack)
}

// =============================================================================
// Hit, damage and death
// =============================================================================

#[test]
fn test_lethal_round_runs_death_handler() {
    let mut s = Scenario::new(ScriptedDice::new().always_roll(20));
    let attacker = s.add(brute("ogre", 20, AttackDef::new("club", 1.0, "1d1", 15)));
    let target = s.add(
        Combatant::npc("kobold")
            .with_health(1)
            .with_armor_class(10),
    );
    s.engage(attacker, target).unwrap();

    let report = s.tick();
    assert_eq!(report.acted, vec![attacker]);
    assert!(report.faults.is_empty());

    let damaged = s
        .events
        .events()
        .into_iter()
        .find_map(|e| match e {
            CombatEvent::Damaged(event) => Some(event),
            _ => None,
        })
        .unwrap();
    assert_eq!(damaged.amount, 1);
    assert_eq!(damaged.target_health_before, 1);

    assert!(s.events.events().contains(&CombatEvent::Deathblow {
        killer: attacker,
        victim: target,
    }));
    assert!(s.events.events().contains(&CombatEvent::Killed {
        victim: target,
        killer: Some(attacker),
    }));
    assert_eq!(s.hooks.removed(), vec![target]);
    assert!(s.get(target).is_none());
    assert_not_in_combat(&s, attacker);
}

#[test]
fn test_player_narration_for_a_kill() {
    let mut s = Scenario::new(ScriptedDice::new());
    let hero = s.add(Combatant::player("Aria", Archetype::Fighter, 1));
    let rat = s.add(Combatant::npc("a rat").with_keywords(["rat"]).with_health(2));
    assert!(s.command(hero, "rat"));
    s.notifier.clear();

    s.tick();

    assert_told(&s, hero, "You hit a rat with your fists for 2 damage.");
    assert_told(&s, hero, "You killed a rat!");
    let room = s.notifier.room_messages();
    assert!(room.contains(&"Aria hits a rat.".to_string()));
    assert!(room.contains(&"a rat is dead!".to_string()));
    assert!(s.get(rat).is_none());
}

#[test]
fn test_misses_are_narrated() {
    let mut s = Scenario::new(ScriptedDice::new().always_roll(1));
    let hero = s.add(Combatant::player("Aria", Archetype::Thief, 1));
    let wolf = s.add(Combatant::npc("a wolf").with_keywords(["wolf"]).with_health(8));
    assert!(s.command(hero, "wolf"));

    s.tick();

    assert_told(&s, hero, "You swing your fists at a wolf and miss.");
    assert_health(&s, wolf, 8);
    assert_eq!(s.lag(hero), Some(5_000));
}

#[test]
fn test_fighter_extra_attack() {
    let mut s = Scenario::new(ScriptedDice::new().with_chances([0.2]));
    let hero = s.add(Combatant::player("Aria", Archetype::Fighter, 7));
    let ogre = s.add(Combatant::npc("an ogre").with_keywords(["ogre"]).with_health(100));
    s.engage(hero, ogre).unwrap();

    s.tick();

    assert_health(&s, ogre, 96);
    assert_told(&s, hero, "Total: 4 damage.");
}

#[test]
fn test_unarmored_player_ac() {
    let hero = Combatant::player("Aria", Archetype::Wizard, 1);
    assert_eq!(armor_class(&hero), 10);
}

#[test]
fn test_armor_makes_player_harder_to_hit() {
    // THAC0 15 needs a 5 against AC 10 but a 13 against plate and shield.
    let mut s = Scenario::new(ScriptedDice::new().with_d20s([10]));
    let troll = s.add(brute("troll", 30, AttackDef::new("claw", 1.0, "1d4", 15)));
    let knight = s.add(
        Combatant::player("Bran", Archetype::Fighter, 1)
            .with_health(20)
            .equipped(mud_combat::items::get_armor("plate mail").unwrap())
            .equipped(mud_combat::items::get_shield("small shield").unwrap()),
    );
    assert_eq!(armor_class(s.get(knight).unwrap()), 2);
    s.engage(troll, knight).unwrap();

    s.tick();
    assert_health(&s, knight, 20);
    assert_told(&s, knight, "troll swings their claw at you and misses.");
}

// =============================================================================
// Lag
// =============================================================================

#[test]
fn test_lag_decays_by_elapsed_time() {
    let mut s = Scenario::new(ScriptedDice::new().always_roll(20));
    let a = s.add(brute("ogre", 20, AttackDef::new("club", 1.0, "1d4", 15)));
    let b = s.add(brute("kobold", 20, AttackDef::new("spear", 1.0, "1d4", 15)));
    s.engage(a, b).unwrap();
    s.arena.get_mut(a).unwrap().round_state.remaining_lag_ms = 3_000;

    let report = s.advance(1_000);

    assert!(report.acted.is_empty());
    assert_eq!(s.lag(a), Some(2_000));
    assert_eq!(s.lag(b), Some(1_500));
    assert_health(&s, b, 20);
}

#[test]
fn test_defender_answers_after_its_lag() {
    let mut s = Scenario::new(ScriptedDice::new().always_roll(20));
    let a = s.add(brute("ogre", 50, AttackDef::new("club", 1.0, "1d4", 15)));
    let b = s.add(brute("kobold", 50, AttackDef::new("spear", 1.0, "1d4", 15)));
    s.engage(a, b).unwrap();

    assert_eq!(s.tick().acted, vec![a]);
    assert_eq!(s.advance(2_000).acted, Vec::<CombatantId>::new());
    assert_eq!(s.advance(500).acted, vec![b]);
    assert_health(&s, a, 46);
    assert_health(&s, b, 46);
}

#[test]
fn test_configured_lag_from_json() {
    let config = CombatConfig::from_json(r#"{ "attack_lag_ms": 1000, "defender_lag_ms": 0 }"#)
        .unwrap();
    let mut s = Scenario::with_config(config, ScriptedDice::new().always_roll(20));
    let a = s.add(brute("ogre", 50, AttackDef::new("club", 1.0, "1d1", 15)));
    let b = s.add(brute("kobold", 50, AttackDef::new("spear", 1.0, "1d1", 15)));
    s.engage(a, b).unwrap();

    assert_eq!(s.tick().acted, vec![a, b]);
    assert_eq!(s.advance(1_000).acted, vec![a, b]);
    assert_health(&s, a, 48);
}

// =============================================================================
// Death
// =============================================================================

#[test]
fn test_death_is_idempotent() {
    let mut s = Scenario::new(ScriptedDice::new());
    let hero = s.add(Combatant::player("Aria", Archetype::Cleric, 1).with_health(0));

    s.engine.handle_death(&mut s.arena, hero, None);
    s.engine.handle_death(&mut s.arena, hero, None);
    s.tick();

    assert_eq!(s.events.count("killed"), 1);
    assert_eq!(s.events.count("deathblow"), 0);
    assert!(s.get(hero).unwrap().dead);
    assert_eq!(s.notifier.messages_for(hero), vec!["You have died.".to_string()]);
}

#[test]
fn test_dead_opponent_is_never_targeted() {
    let mut s = Scenario::new(ScriptedDice::new().always_roll(20));
    let a = s.add(brute("ogre", 50, AttackDef::new("club", 1.0, "1d4", 15)));
    let corpse = s.add(Combatant::npc("goblin").with_health(10));
    let live = s.add(Combatant::npc("kobold").with_health(10));
    s.engage(a, corpse).unwrap();
    s.engage(a, live).unwrap();
    s.arena.get_mut(corpse).unwrap().health = Some(-3);

    s.tick();

    assert_health(&s, live, 6);
    assert!(s.get(corpse).is_none());
    assert!(s.events.events().contains(&CombatEvent::Killed {
        victim: corpse,
        killer: None,
    }));
    assert_in_combat(&s, a);
    assert!(s.arena.engagements().are_engaged(a, live));
}

#[test]
fn test_killer_is_remembered_across_ticks() {
    let mut s = Scenario::new(ScriptedDice::new());
    let a = s.add(brute("ogre", 50, AttackDef::new("club", 1.0, "1d4", 15)));
    let b = s.add(Combatant::npc("kobold").with_health(10));
    s.engage(a, b).unwrap();
    s.arena.get_mut(b).unwrap().health = Some(0);
    s.arena.get_mut(b).unwrap().round_state.killed_by = Some(a);

    s.engine.handle_death(&mut s.arena, b, None);

    assert!(s.events.events().contains(&CombatEvent::Deathblow {
        killer: a,
        victim: b,
    }));
}

#[test]
fn test_dead_player_can_be_revived() {
    let mut s = Scenario::new(ScriptedDice::new().always_roll(20));
    let troll = s.add(brute("troll", 50, AttackDef::new("claw", 1.0, "1d8", 15)));
    let hero = s.add(Combatant::player("Aria", Archetype::Fighter, 1).with_health(5));
    s.engage(troll, hero).unwrap();

    s.tick();
    assert!(s.get(hero).unwrap().dead);
    assert_told(&s, hero, "You were killed by troll.");
    assert_not_in_combat(&s, troll);

    assert_eq!(s.arena.restore_health(hero, 8), Some(5));
    assert!(!s.get(hero).unwrap().dead);
    s.engage(hero, troll).unwrap();
    assert_in_combat(&s, hero);
}

// =============================================================================
// Leaving combat
// =============================================================================

#[test]
fn test_wounded_survivor_regenerates() {
    let mut s = Scenario::new(ScriptedDice::new().always_roll(20));
    let a = s.add(brute("ogre", 20, AttackDef::new("club", 1.0, "1d6", 15)));
    let b = s.add(brute("kobold", 1, AttackDef::new("spear", 1.0, "1d1", 15)));
    s.engage(b, a).unwrap();

    // kobold strikes first, then the ogre answers after its defender lag.
    s.tick();
    assert_health(&s, a, 19);
    s.advance(2_500);

    assert!(s.get(b).is_none());
    let effects = s.hooks.effects();
    assert_eq!(effects.len(), 1);
    assert_eq!(effects[0].0, a);
    assert_eq!(effects[0].1.kind, "regen");
    assert!(s.get(a).unwrap().has_effect_type("regen"));
    assert_eq!(s.events.count("effectAdded"), 1);
}

#[test]
fn test_rejected_regeneration_leaves_no_effect() {
    let mut s = Scenario::new(ScriptedDice::new());
    s.engine = CombatEngine::new(CombatConfig::default())
        .with_clock(s.clock.clone())
        .with_world_hooks(s.hooks.clone().rejecting_effects());
    let id = s.add(Combatant::npc("wolf").with_health(10));
    s.arena.get_mut(id).unwrap().health = Some(3);

    assert!(!s.engine.start_regeneration(&mut s.arena, id));
    assert!(!s.get(id).unwrap().has_effect_type("regen"));
}

#[test]
fn test_flee_ends_lonely_opponents() {
    let mut s = Scenario::new(ScriptedDice::new());
    let a = s.add(Combatant::npc("ogre").with_health(10));
    let b = s.add(Combatant::npc("kobold").with_health(10));
    let c = s.add(Combatant::npc("goblin").with_health(10));
    s.engage(a, b).unwrap();
    s.engage(c, b).unwrap();

    s.engine.remove_from_combat(&mut s.arena, a);

    assert_not_in_combat(&s, a);
    assert_in_combat(&s, b);
    assert!(s.arena.engagements().are_engaged(b, c));
    assert!(!s.arena.engagements().are_engaged(b, a));

    s.engine.remove_from_combat(&mut s.arena, c);
    assert_not_in_combat(&s, b);
    assert_eq!(s.events.count("combatEnd"), 3);
}

// =============================================================================
// Fail-safe scheduling
// =============================================================================

#[test]
fn test_bad_dice_disengages_only_the_faulting_combatant() {
    let mut s = Scenario::new(ScriptedDice::new().always_roll(20));
    let broken = s.add(brute("imp", 10, AttackDef::new("sting", 1.0, "xd", 15)));
    let victim = s.add(Combatant::npc("rat").with_health(10));
    let ogre = s.add(brute("ogre", 20, AttackDef::new("club", 1.0, "1d4", 15)));
    let kobold = s.add(Combatant::npc("kobold").with_health(20));
    s.engage(broken, victim).unwrap();
    s.engage(ogre, kobold).unwrap();

    let report = s.tick();

    assert_eq!(report.faults.len(), 1);
    assert_eq!(report.faults[0].0, broken);
    assert!(matches!(report.faults[0].1, CombatError::Dice(_)));
    assert_not_in_combat(&s, broken);
    assert_not_in_combat(&s, victim);
    assert_eq!(report.acted, vec![ogre]);
    assert_health(&s, kobold, 16);
}

#[test]
fn test_overflowing_dice_is_a_fault_not_a_panic() {
    let mut s = Scenario::new(ScriptedDice::new().always_roll(20));
    let giant = s.add(brute("giant", 10, AttackDef::new("stomp", 1.0, "2147483647+1", 15)));
    let victim = s.add(Combatant::npc("rat").with_health(10));
    let ogre = s.add(brute("ogre", 20, AttackDef::new("club", 1.0, "1d4", 15)));
    let kobold = s.add(Combatant::npc("kobold").with_health(20));
    s.engage(giant, victim).unwrap();
    s.engage(ogre, kobold).unwrap();

    let report = s.tick();

    assert_eq!(report.faults.len(), 1);
    assert_eq!(report.faults[0].0, giant);
    assert!(matches!(
        report.faults[0].1,
        CombatError::Dice(DiceError::OutOfRange(_))
    ));
    assert_not_in_combat(&s, giant);
    assert_health(&s, victim, 10);
    assert_eq!(report.acted, vec![ogre]);
    assert_health(&s, kobold, 16);
}

#[test]
fn test_opponent_without_health_is_a_fault() {
    let mut s = Scenario::new(ScriptedDice::new());
    let a = s.add(brute("ogre", 20, AttackDef::new("club", 1.0, "1d4", 15)));
    let statue = s.add(Combatant::npc("statue").without_health());
    s.arena.engage(a, statue);

    let report = s.tick();

    assert!(matches!(
        report.faults.as_slice(),
        [(id, CombatError::InvalidTarget { .. })] if *id == a
    ));
    assert_not_in_combat(&s, a);
    assert_not_in_combat(&s, statue);
}

// =============================================================================
// Properties
// =============================================================================

fn melee(seed: u64) -> (CombatEngine, Arena, ManualClock, RecordingObserver, Vec<CombatantId>) {
    let clock = ManualClock::new(0);
    let events = RecordingObserver::new();
    let mut engine = CombatEngine::new(CombatConfig::default())
        .with_clock(clock.clone())
        .with_dice(RngDice::seeded(seed));
    engine.subscribe(events.observer());

    let mut arena = Arena::new();
    let room = RoomId::new();
    let ids: Vec<_> = [
        brute("ogre", 30, AttackDef::new("club", 1.5, "2d4", 15)),
        brute("kobold", 12, AttackDef::new("spear", 1.0, "1d6", 18)),
        brute("troll", 25, AttackDef::new("claw", 2.0, "1d4+1", 14)).with_armor_class(4),
    ]
    .into_iter()
    .map(|c| arena.add(c.with_room(room)))
    .collect();
    for pair in [(ids[0], ids[1]), (ids[2], ids[0]), (ids[1], ids[2])] {
        engine.initiate_combat(&mut arena, pair.0, pair.1).unwrap();
    }
    (engine, arena, clock, events, ids)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn health_only_goes_down_in_combat(seed in any::<u64>()) {
        let (mut engine, mut arena, clock, events, ids) = melee(seed);

        for _ in 0..30 {
            let before: Vec<_> = ids
                .iter()
                .map(|&id| arena.get(id).and_then(|c| c.health))
                .collect();
            clock.advance(1_250);
            let report = engine.tick(&mut arena);
            prop_assert!(report.faults.is_empty());

            for (&id, hp_before) in ids.iter().zip(before) {
                let hp_after = arena.get(id).and_then(|c| c.health);
                if let (Some(before), Some(after)) = (hp_before, hp_after) {
                    prop_assert!(after <= before);
                }
            }
        }

        for event in events.events() {
            if let CombatEvent::Damaged(damage) = event {
                prop_assert!(damage.amount >= 0);
                let sum: i32 = damage.sub_attacks.iter().map(|s| s.rolled_damage).sum();
                prop_assert_eq!(damage.amount, sum);
            }
        }
    }

    #[test]
    fn engagement_stays_symmetric(seed in any::<u64>()) {
        let (mut engine, mut arena, clock, _events, ids) = melee(seed);

        for _ in 0..30 {
            clock.advance(1_250);
            engine.tick(&mut arena);

            for &a in &ids {
                for &b in arena.opponents(a) {
                    prop_assert!(arena.opponents(b).contains(&a));
                    prop_assert!(arena.contains(b));
                }
                prop_assert!(!arena.opponents(a).contains(&a));
            }
        }
    }
}
