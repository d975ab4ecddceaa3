//! Player-facing combat text.

use crate::rules::DamageEvent;

/// Text for one committed round, one string per audience.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundNarration {
    pub attacker: String,
    pub target: String,
    pub room: String,
}

/// Describe `event` sub-attack by sub-attack, misses included.
pub fn round(event: &DamageEvent, attacker: &str, target: &str) -> RoundNarration {
    if event.sub_attacks.is_empty() {
        return RoundNarration {
            attacker: format!("You can't find an opening against {target}."),
            target: format!("{attacker} circles you, looking for an opening."),
            room: format!("{attacker} circles {target}, looking for an opening."),
        };
    }

    let mut to_attacker = Vec::with_capacity(event.sub_attacks.len() + 1);
    let mut to_target = Vec::with_capacity(event.sub_attacks.len() + 1);
    for strike in &event.sub_attacks {
        if strike.hit {
            to_attacker.push(format!(
                "You hit {target} with your {} for {} damage.",
                strike.name, strike.rolled_damage
            ));
            to_target.push(format!(
                "{attacker} hits you with their {} for {} damage.",
                strike.name, strike.rolled_damage
            ));
        } else {
            to_attacker.push(format!(
                "You swing your {} at {target} and miss.",
                strike.name
            ));
            to_target.push(format!(
                "{attacker} swings their {} at you and misses.",
                strike.name
            ));
        }
    }
    if event.sub_attacks.len() > 1 {
        to_attacker.push(format!("Total: {} damage.", event.amount));
        to_target.push(format!("Total: {} damage.", event.amount));
    }

    let room = match event.hits() {
        0 => format!("{attacker} attacks {target} but misses."),
        1 => format!("{attacker} hits {target}."),
        n => format!("{attacker} hits {target} {n} times."),
    };

    RoundNarration {
        attacker: to_attacker.join("\n"),
        target: to_target.join("\n"),
        room,
    }
}

/// Text for a death.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeathNarration {
    pub killer: Option<String>,
    pub victim: String,
    pub room: String,
}

pub fn death(victim: &str, killer: Option<&str>) -> DeathNarration {
    DeathNarration {
        killer: killer.map(|_| format!("You killed {victim}!")),
        victim: match killer {
            Some(name) => format!("You were killed by {name}."),
            None => "You have died.".to_string(),
        },
        room: format!("{victim} is dead!"),
    }
}

pub fn approach_attacker(target: &str) -> String {
    format!("You approach {target} to attack them...")
}

pub fn approach_room(attacker: &str, target: &str) -> String {
    format!("{attacker} approaches to attack {target}...")
}

pub fn approach_target(attacker: &str) -> String {
    format!("{attacker} approaches to attack you...")
}
