/*
 * Lattice Domain Traits
 *
 * Orientation follows the IDE literature: values start at TOP ("no
 * information yet") and move down as paths are joined.
 *
 *   join(a, TOP)    = a          (TOP is neutral)
 *   join(a, BOTTOM) = BOTTOM     (BOTTOM absorbs)
 *
 * join must be idempotent, commutative and associative, and every
 * descending chain must be finite. The solvers do not check this: a
 * lattice of unbounded height makes them diverge.
 */

use std::fmt::Debug;

/// Join semi-lattice with a neutral TOP element
pub trait Lattice: Clone + Eq + Debug {
    /// Neutral element of [`Lattice::join`]
    fn top() -> Self;

    /// Combine values arriving over different paths
    fn join(&self, other: &Self) -> Self;

    fn is_top(&self) -> bool {
        *self == Self::top()
    }

    /// `other` already subsumes `self` (`join(self, other) == other`)
    fn leq(&self, other: &Self) -> bool {
        self.join(other) == *other
    }
}

/// Lattice that also has an absorbing BOTTOM element
///
/// Needed by the IDE solver: `AllBottom` edge functions and seed values.
pub trait BoundedLattice: Lattice {
    fn bottom() -> Self;

    fn is_bottom(&self) -> bool {
        *self == Self::bottom()
    }
}
