//! Who is fighting whom.
//!
//! Engagement is symmetric: every edge is stored on both endpoints and only
//! ever added or removed through [`Engagements`], so a combatant can never be
//! half-registered in someone else's fight.

use crate::world::CombatantId;
use std::collections::HashMap;

/// Bidirectional engagement graph.
///
/// Opponent lists keep insertion order; target selection walks them front to
/// back, so whoever was engaged first is attacked first.
#[derive(Debug, Clone, Default)]
pub struct Engagements {
    edges: HashMap<CombatantId, Vec<CombatantId>>,
}

impl Engagements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engage `a` and `b` with each other. Returns false for self-engagement
    /// or an edge that already exists.
    pub fn engage(&mut self, a: CombatantId, b: CombatantId) -> bool {
        if a == b || self.are_engaged(a, b) {
            return false;
        }
        self.edges.entry(a).or_default().push(b);
        self.edges.entry(b).or_default().push(a);
        true
    }

    /// Remove the edge between `a` and `b`. Returns whether one existed.
    pub fn disengage(&mut self, a: CombatantId, b: CombatantId) -> bool {
        let removed = self.remove_half(a, b);
        self.remove_half(b, a);
        removed
    }

    /// Remove every edge touching `id`, returning its former opponents in
    /// engagement order.
    pub fn disengage_all(&mut self, id: CombatantId) -> Vec<CombatantId> {
        let opponents = self.edges.remove(&id).unwrap_or_default();
        for &other in &opponents {
            self.remove_half(other, id);
        }
        opponents
    }

    pub fn are_engaged(&self, a: CombatantId, b: CombatantId) -> bool {
        self.edges.get(&a).is_some_and(|list| list.contains(&b))
    }

    pub fn opponents(&self, id: CombatantId) -> &[CombatantId] {
        self.edges.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_engaged(&self, id: CombatantId) -> bool {
        !self.opponents(id).is_empty()
    }

    fn remove_half(&mut self, from: CombatantId, to: CombatantId) -> bool {
        let Some(list) = self.edges.get_mut(&from) else {
            return false;
        };
        let before = list.len();
        list.retain(|&id| id != to);
        let removed = list.len() != before;
        if list.is_empty() {
            self.edges.remove(&from);
        }
        removed
    }
}
