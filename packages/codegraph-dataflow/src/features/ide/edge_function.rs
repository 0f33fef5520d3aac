/*
 * IDE Edge Functions
 *
 * An edge function maps the lattice value of a fact at one supergraph node
 * to its value at the next. Jump functions are compositions of these along
 * a path, joined pointwise where paths meet. See Sagiv, Reps, Horwitz 1996.
 *
 * EdgeFn is closed under both operations:
 *
 *   Identity          x ↦ x
 *   AllTop            x ↦ ⊤
 *   AllBottom         x ↦ ⊥
 *   Constant(c)       x ↦ c
 *   JoinConstant(c)   x ↦ x ⊔ c
 *
 * Constructors normalize degenerate forms (Constant(⊤) is AllTop, ...) so
 * structural equality matches functional equality, which the solver
 * relies on to detect that a jump function stopped changing.
 */

use std::fmt::Debug;

use crate::features::lattice::BoundedLattice;

/// Composable lattice value transformer
pub trait EdgeFunction<V>: Clone + Eq + Debug {
    /// Apply to a source value
    fn compute_target(&self, source: &V) -> V;

    /// Function that applies `self` first, then `second`
    fn compose_with(&self, second: &Self) -> Self;

    /// Pointwise join
    fn join_with(&self, other: &Self) -> Self;

    fn identity() -> Self;

    /// Neutral element of `join_with`; marks "no path"
    fn all_top() -> Self;

    fn is_all_top(&self) -> bool {
        *self == Self::all_top()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EdgeFn<V> {
    Identity,
    AllTop,
    AllBottom,
    Constant(V),
    JoinConstant(V),
}

impl<V: BoundedLattice> EdgeFn<V> {
    /// x ↦ value
    pub fn constant(value: V) -> Self {
        if value.is_top() {
            EdgeFn::AllTop
        } else if value.is_bottom() {
            EdgeFn::AllBottom
        } else {
            EdgeFn::Constant(value)
        }
    }

    /// x ↦ x ⊔ value
    pub fn join_constant(value: V) -> Self {
        if value.is_top() {
            EdgeFn::Identity
        } else if value.is_bottom() {
            EdgeFn::AllBottom
        } else {
            EdgeFn::JoinConstant(value)
        }
    }
}

impl<V: BoundedLattice> EdgeFunction<V> for EdgeFn<V> {
    fn compute_target(&self, source: &V) -> V {
        match self {
            EdgeFn::Identity => source.clone(),
            EdgeFn::AllTop => V::top(),
            EdgeFn::AllBottom => V::bottom(),
            EdgeFn::Constant(value) => value.clone(),
            EdgeFn::JoinConstant(value) => source.join(value),
        }
    }

    fn compose_with(&self, second: &Self) -> Self {
        match second {
            EdgeFn::Identity => self.clone(),
            EdgeFn::AllTop | EdgeFn::AllBottom | EdgeFn::Constant(_) => second.clone(),
            EdgeFn::JoinConstant(c) => match self {
                EdgeFn::Identity => second.clone(),
                EdgeFn::AllTop => EdgeFn::constant(c.clone()),
                EdgeFn::AllBottom => EdgeFn::AllBottom,
                EdgeFn::Constant(k) => EdgeFn::constant(k.join(c)),
                EdgeFn::JoinConstant(k) => EdgeFn::join_constant(k.join(c)),
            },
        }
    }

    fn join_with(&self, other: &Self) -> Self {
        use EdgeFn::*;

        match (self, other) {
            (AllTop, f) | (f, AllTop) => f.clone(),
            (AllBottom, _) | (_, AllBottom) => AllBottom,
            (Identity, Identity) => Identity,
            (Identity, Constant(c))
            | (Constant(c), Identity)
            | (Identity, JoinConstant(c))
            | (JoinConstant(c), Identity) => EdgeFn::join_constant(c.clone()),
            (Constant(a), Constant(b)) => EdgeFn::constant(a.join(b)),
            (Constant(a), JoinConstant(b))
            | (JoinConstant(a), Constant(b))
            | (JoinConstant(a), JoinConstant(b)) => EdgeFn::join_constant(a.join(b)),
        }
    }

    fn identity() -> Self {
        EdgeFn::Identity
    }

    fn all_top() -> Self {
        EdgeFn::AllTop
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::lattice::{Lattice, MinValue};

    fn all_fns() -> Vec<EdgeFn<MinValue>> {
        vec![
            EdgeFn::Identity,
            EdgeFn::AllTop,
            EdgeFn::AllBottom,
            EdgeFn::constant(MinValue(3)),
            EdgeFn::constant(MinValue(7)),
            EdgeFn::join_constant(MinValue(5)),
        ]
    }

    fn samples() -> Vec<MinValue> {
        vec![MinValue::top(), MinValue(0), MinValue(4), MinValue(6), MinValue(9)]
    }

    #[test]
    fn test_normalization() {
        assert_eq!(EdgeFn::constant(MinValue::top()), EdgeFn::AllTop);
        assert_eq!(EdgeFn::constant(MinValue(0)), EdgeFn::AllBottom);
        assert_eq!(EdgeFn::join_constant(MinValue::top()), EdgeFn::Identity);
    }

    #[test]
    fn test_compose_matches_sequential_application() {
        for f in all_fns() {
            for g in all_fns() {
                let composed = f.compose_with(&g);
                for x in samples() {
                    assert_eq!(
                        composed.compute_target(&x),
                        g.compute_target(&f.compute_target(&x)),
                        "{:?} then {:?} at {:?}",
                        f,
                        g,
                        x
                    );
                }
            }
        }
    }

    #[test]
    fn test_join_is_pointwise() {
        for f in all_fns() {
            for g in all_fns() {
                let joined = f.join_with(&g);
                assert_eq!(joined, g.join_with(&f));
                for x in samples() {
                    assert_eq!(
                        joined.compute_target(&x),
                        f.compute_target(&x).join(&g.compute_target(&x)),
                        "{:?} join {:?} at {:?}",
                        f,
                        g,
                        x
                    );
                }
            }
        }
    }

    #[test]
    fn test_all_top_is_neutral() {
        for f in all_fns() {
            assert_eq!(f.join_with(&EdgeFn::all_top()), f);
        }
    }
}
