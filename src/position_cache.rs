use crate::evaluation::{Completeness, Evaluation};

/// Number of slots in the position cache
pub const TABLE_SIZE: usize = 30_000;

#[derive(Copy, Clone)]
struct Entry {
    key: u64,
    eval: Evaluation,
}

/// Fixed-size open-addressed table from board key to the last exhaustive
/// evaluation of that position. Slot is `key % TABLE_SIZE` with no chaining:
/// two positions landing in the same slot simply compete for it.
///
/// This table is what makes the search resumable across ticks; it lives on
/// the `SearchEngine` and persists between calls.
pub struct PositionCache {
    slots: Vec<Option<Entry>>,
}

impl PositionCache {
    pub fn new() -> Self {
        Self {
            slots: vec![None; TABLE_SIZE],
        }
    }

    /// Looks up the evaluation stored for exactly this key. A slot occupied
    /// by a colliding key returns `None`; callers still have to check depth
    /// sufficiency before trusting the result.
    pub fn get(&self, key: u64) -> Option<Evaluation> {
        match self.slots[Self::index(key)] {
            Some(entry) if entry.key == key => Some(entry.eval),
            _ => None,
        }
    }

    /// Stores an exhaustive evaluation, keeping whichever of the incumbent
    /// slot occupant and the newcomer proves the deeper subtree. The depth
    /// comparison applies even across colliding keys, so a deep entry is
    /// never evicted by a shallow alias.
    pub fn set(&mut self, key: u64, eval: Evaluation) {
        if eval.completeness != Completeness::Exhaustive {
            return;
        }

        let slot = &mut self.slots[Self::index(key)];
        match slot {
            Some(existing) if existing.eval.relative_depth >= eval.relative_depth => {}
            _ => *slot = Some(Entry { key, eval }),
        }
    }

    fn index(key: u64) -> usize {
        (key % TABLE_SIZE as u64) as usize
    }
}

impl Default for PositionCache {
    fn default() -> Self {
        Self::new()
    }
}
