//! Arena-style interning
//!
//! Facts and names are hashed once and referred to by a dense `u32` id
//! afterwards, so solver tables are keyed by small `Copy` values instead of
//! cloned facts.

use rustc_hash::FxHashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Dense id handed out by an [`Interner`]
pub type InternId = u32;

/// Bidirectional map between values and dense ids
///
/// Ids are assigned in first-seen order starting at 0 and are never reused.
#[derive(Debug, Clone)]
pub struct Interner<T> {
    ids: FxHashMap<T, InternId>,
    values: Vec<T>,
}

impl<T: Clone + Eq + Hash> Interner<T> {
    pub fn new() -> Self {
        Self {
            ids: FxHashMap::default(),
            values: Vec::new(),
        }
    }

    /// Intern `value`, returning its id (existing or freshly assigned)
    pub fn intern(&mut self, value: &T) -> InternId {
        if let Some(&id) = self.ids.get(value) {
            return id;
        }
        let id = self.values.len() as InternId;
        self.values.push(value.clone());
        self.ids.insert(value.clone(), id);
        id
    }

    /// Id of an already interned value
    pub fn get(&self, value: &T) -> Option<InternId> {
        self.ids.get(value).copied()
    }

    /// Value behind an id
    ///
    /// Ids only come from this interner, so a miss is a caller bug.
    pub fn resolve(&self, id: InternId) -> &T {
        &self.values[id as usize]
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All (id, value) pairs in id order
    pub fn iter(&self) -> impl Iterator<Item = (InternId, &T)> {
        self.values
            .iter()
            .enumerate()
            .map(|(id, value)| (id as InternId, value))
    }
}

impl<T: Clone + Eq + Hash> Default for Interner<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_is_stable() {
        let mut interner = Interner::new();
        let a = interner.intern(&"a".to_string());
        let b = interner.intern(&"b".to_string());
        let a_again = interner.intern(&"a".to_string());

        assert_eq!(a, 0);
        assert_eq!(b, 1);
        assert_eq!(a, a_again);
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn test_resolve_and_get() {
        let mut interner = Interner::new();
        let id = interner.intern(&42u64);

        assert_eq!(*interner.resolve(id), 42);
        assert_eq!(interner.get(&42), Some(id));
        assert_eq!(interner.get(&7), None);
    }

    #[test]
    fn test_iter_in_id_order() {
        let mut interner = Interner::new();
        for v in ["x", "y", "z", "y"] {
            interner.intern(&v);
        }
        let collected: Vec<_> = interner.iter().map(|(id, v)| (id, *v)).collect();
        assert_eq!(collected, vec![(0, "x"), (1, "y"), (2, "z")]);
    }
}
