//! Participant identity and the registry the game lock protects.

use std::collections::BTreeMap;
use std::fmt;

use crate::{SYMBOLS, Symbol};

/// A participant's slot number, `0..participants`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParticipantId(pub u32);

impl ParticipantId {
    /// Index into per-slot tables such as the score ledger.
    pub fn slot(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player {}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub symbol: Symbol,
    pub active: bool,
}

/// Every participant slot of an arena, keyed by id.
///
/// Slots are never removed; leaving only clears `active`, so ids stay
/// stable for the score ledger and the ring order stays well-defined.
#[derive(Debug, Clone, Default)]
pub struct ParticipantRegistry {
    slots: BTreeMap<ParticipantId, Participant>,
}

impl ParticipantRegistry {
    /// `count` active participants with ids `0..count` and symbols in
    /// [`SYMBOLS`] order. `count` must not exceed `SYMBOLS.len()`.
    pub fn with_active(count: usize) -> Self {
        let slots = SYMBOLS
            .iter()
            .take(count)
            .enumerate()
            .map(|(i, symbol)| {
                (
                    ParticipantId(i as u32),
                    Participant {
                        symbol: Symbol(*symbol),
                        active: true,
                    },
                )
            })
            .collect();
        Self { slots }
    }

    pub fn symbol(&self, id: ParticipantId) -> Option<Symbol> {
        self.slots.get(&id).map(|p| p.symbol)
    }

    pub fn is_active(&self, id: ParticipantId) -> bool {
        self.slots.get(&id).is_some_and(|p| p.active)
    }

    pub fn active_count(&self) -> usize {
        self.slots.values().filter(|p| p.active).count()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Marks `id` inactive. Returns `true` only if this call changed it.
    pub fn deactivate(&mut self, id: ParticipantId) -> bool {
        match self.slots.get_mut(&id) {
            Some(p) if p.active => {
                p.active = false;
                true
            }
            _ => false,
        }
    }

    /// The first active participant strictly after `current` in ring
    /// order, wrapping around. With no `current`, the lowest active id.
    /// `current` itself is only chosen when it is the sole active one.
    pub fn next_active_after(&self, current: Option<ParticipantId>) -> Option<ParticipantId> {
        let active = |(id, p): (&ParticipantId, &Participant)| p.active.then_some(*id);
        match current {
            None => self.slots.iter().find_map(active),
            Some(current) => {
                let after = self.slots.range(current..).skip_while(|(id, _)| **id == current);
                let before = self.slots.range(..=current);
                after.chain(before).find_map(active)
            }
        }
    }
}
