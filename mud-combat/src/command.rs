//! The player `attack` command.

use crate::engine::CombatEngine;
use crate::narrate;
use crate::world::{Arena, CombatantId};
use tracing::{error, info};

/// Verbs that run [`attack`].
pub const ALIASES: [&str; 3] = ["attack", "kill", "hit"];

/// Whether `verb` names the attack command.
pub fn matches(verb: &str) -> bool {
    ALIASES.iter().any(|alias| alias.eq_ignore_ascii_case(verb))
}

/// Start a fight between `player` and whatever `args` names.
///
/// Every failure is reported to the player. Returns whether combat started.
pub fn attack(
    engine: &mut CombatEngine,
    arena: &mut Arena,
    player: CombatantId,
    args: &str,
) -> bool {
    let args = args.trim();
    if args.is_empty() {
        engine.tell(arena, player, "Attack whom?");
        return false;
    }

    let target = match engine.find_combatant(arena, player, args) {
        Ok(target) => target,
        Err(err) if err.is_command_recoverable() => {
            engine.tell(arena, player, &err.to_string());
            return false;
        }
        Err(err) => {
            error!(error = %err, "attack target lookup failed");
            None
        }
    };
    let Some(target) = target else {
        engine.tell(arena, player, "They aren't here.");
        return false;
    };

    let (Some(attacker), Some(victim)) = (arena.get(player), arena.get(target)) else {
        return false;
    };
    let attacker_name = attacker.name.clone();
    let target_name = victim.name.clone();
    let room = attacker.room;

    engine.tell(arena, player, &narrate::approach_attacker(&target_name));
    if let Err(err) = engine.initiate_combat(arena, player, target) {
        error!(error = %err, "could not start combat");
        return false;
    }
    if let Some(room) = room {
        engine.tell_room(
            room,
            &narrate::approach_room(&attacker_name, &target_name),
            &[player, target],
        );
    }
    engine.tell(arena, target, &narrate::approach_target(&attacker_name));
    info!(attacker = %attacker_name, target = %target_name, "attack command");
    true
}
