//! Change tracking for fetched entities.

use std::ops::Deref;

/// An entity paired with a dirty flag.
///
/// Reads go through `Deref`; writes go through [`Tracked::modify`], which
/// marks the entity dirty so an update can be skipped when nothing changed.
#[derive(Debug, Clone, PartialEq)]
pub struct Tracked<T> {
    entity: T,
    dirty: bool,
}

impl<T> Tracked<T> {
    /// Start tracking a clean entity.
    pub fn new(entity: T) -> Self {
        Self { entity, dirty: false }
    }

    /// Mutate the entity and mark it dirty.
    pub fn modify<R>(&mut self, f: impl FnOnce(&mut T) -> R) -> R {
        self.dirty = true;
        f(&mut self.entity)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark the entity as persisted.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn get(&self) -> &T {
        &self.entity
    }

    pub fn into_inner(self) -> T {
        self.entity
    }
}

impl<T> Deref for Tracked<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.entity
    }
}
