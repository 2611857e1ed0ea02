//! # Entity: Stable Handles to Actors
//!
//! An [`Entity`] names one actor in the [`World`](super::World). Handles are
//! copied freely: into a projectile's target list, into the
//! [`Blackboard`](crate::context::Blackboard), into closures. Because actors are
//! created and removed every few frames, a slot in the registry is recycled
//! long before old handles stop circulating. Each slot therefore carries a
//! generation. Removing the actor bumps it, so a handle held across the
//! removal no longer resolves:
//!
//! ```text
//! create "hostile"    → 3v0
//! projectile hits it  → slot 3 freed, generation → 1
//! spawner creates one → 3v1
//! lookup(3v0)         → None
//! ```

use std::fmt;

/// A handle to an actor in the [`World`](super::World). Valid only while its
/// generation matches the slot's current one.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl Entity {
    /// Slot index in the registry.
    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Hands out [`Entity`] handles and recycles freed slots.
///
/// ```text
/// generations: [2, 0, 1]   ← current generation per slot
/// free:        [0]         ← slot 0 is free; its next handle is 0v2
/// ```
#[derive(Debug, Default)]
pub(crate) struct EntityAllocator {
    generations: Vec<u32>,
    free: Vec<u32>,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuse the most recently freed slot, or open a new one.
    pub fn allocate(&mut self) -> Entity {
        match self.free.pop() {
            Some(index) => Entity {
                index,
                generation: self.generations[index as usize],
            },
            None => {
                let index = self.generations.len() as u32;
                self.generations.push(0);
                Entity {
                    index,
                    generation: 0,
                }
            }
        }
    }

    /// Free the slot behind `entity`. `false` for a stale handle, so freeing
    /// twice is harmless.
    pub fn deallocate(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        self.generations[entity.index as usize] = entity.generation.wrapping_add(1);
        self.free.push(entity.index);
        true
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.generations
            .get(entity.index as usize)
            .is_some_and(|&generation| generation == entity.generation)
    }

    pub fn alive_count(&self) -> usize {
        self.generations.len() - self.free.len()
    }

    /// Number of slots ever opened.
    pub fn capacity(&self) -> usize {
        self.generations.len()
    }
}
