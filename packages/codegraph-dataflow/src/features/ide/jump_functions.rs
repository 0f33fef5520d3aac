//! Jump function table
//!
//! A jump function <sp, d1> -> <n, d2> is the composed edge function of all
//! paths from the method's start point with fact d1 to node n with fact d2.
//! The start point is implicit. `AllTop` means "no path"; callers never
//! store it.

use rustc_hash::FxHashMap;
use std::hash::Hash;

use crate::shared::InternId;

type FactId = InternId;

#[derive(Debug, Clone)]
pub struct JumpFunctions<N, E> {
    /// (n, d2) -> d1 -> f
    reverse: FxHashMap<(N, FactId), FxHashMap<FactId, E>>,
    /// (d1, n) -> d2 -> f
    forward: FxHashMap<(FactId, N), FxHashMap<FactId, E>>,
    /// n -> (d1, d2) -> f
    by_target: FxHashMap<N, FxHashMap<(FactId, FactId), E>>,
}

impl<N: Copy + Eq + Hash, E: Clone + Eq> JumpFunctions<N, E> {
    pub fn new() -> Self {
        Self {
            reverse: FxHashMap::default(),
            forward: FxHashMap::default(),
            by_target: FxHashMap::default(),
        }
    }

    /// Record (or replace) the jump function for <d1> -> <target, d2>
    pub fn add_function(&mut self, d1: FactId, target: N, d2: FactId, function: E) {
        self.reverse
            .entry((target, d2))
            .or_default()
            .insert(d1, function.clone());
        self.forward
            .entry((d1, target))
            .or_default()
            .insert(d2, function.clone());
        self.by_target
            .entry(target)
            .or_default()
            .insert((d1, d2), function);
    }

    pub fn get(&self, d1: FactId, target: N, d2: FactId) -> Option<&E> {
        self.forward.get(&(d1, target)).and_then(|by_fact| by_fact.get(&d2))
    }

    /// Source facts (and functions) reaching <target, d2>
    pub fn reverse_lookup(&self, target: N, d2: FactId) -> Option<&FxHashMap<FactId, E>> {
        self.reverse.get(&(target, d2))
    }

    /// Target facts (and functions) at `target` reached from d1
    pub fn forward_lookup(&self, d1: FactId, target: N) -> Option<&FxHashMap<FactId, E>> {
        self.forward.get(&(d1, target))
    }

    /// All (d1, d2, f) records ending at `target`
    pub fn lookup_by_target(&self, target: N) -> Option<&FxHashMap<(FactId, FactId), E>> {
        self.by_target.get(&target)
    }

    pub fn targets(&self) -> impl Iterator<Item = &N> {
        self.by_target.keys()
    }

    pub fn len(&self) -> usize {
        self.by_target.values().map(FxHashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_target.is_empty()
    }
}

impl<N: Copy + Eq + Hash, E: Clone + Eq> Default for JumpFunctions<N, E> {
    fn default() -> Self {
        Self::new()
    }
}
