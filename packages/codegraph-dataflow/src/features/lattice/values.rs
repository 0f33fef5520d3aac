//! Stock lattices used by the built-in analyses and tests

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::domain::{BoundedLattice, Lattice};

/// Two-point lattice; BOTTOM encodes "reachable"
///
/// This is the value domain an IFDS problem has when solved as IDE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryDomain {
    Top,
    Bottom,
}

impl Lattice for BinaryDomain {
    fn top() -> Self {
        BinaryDomain::Top
    }

    fn join(&self, other: &Self) -> Self {
        if *self == BinaryDomain::Top && *other == BinaryDomain::Top {
            BinaryDomain::Top
        } else {
            BinaryDomain::Bottom
        }
    }
}

impl BoundedLattice for BinaryDomain {
    fn bottom() -> Self {
        BinaryDomain::Bottom
    }
}

/// Natural numbers under minimum
///
/// TOP is `u64::MAX` (nothing seen yet), BOTTOM is 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MinValue(pub u64);

impl Lattice for MinValue {
    fn top() -> Self {
        MinValue(u64::MAX)
    }

    fn join(&self, other: &Self) -> Self {
        MinValue(self.0.min(other.0))
    }
}

impl BoundedLattice for MinValue {
    fn bottom() -> Self {
        MinValue(0)
    }
}

impl fmt::Display for MinValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_top() {
            write!(f, "⊤")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Flat constant lattice: TOP, one level of constants, BOTTOM
///
/// Two different constants join to BOTTOM ("not a single constant").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstantLattice<T> {
    Top,
    Const(T),
    Bottom,
}

impl<T: Clone + Eq + fmt::Debug> Lattice for ConstantLattice<T> {
    fn top() -> Self {
        ConstantLattice::Top
    }

    fn join(&self, other: &Self) -> Self {
        match (self, other) {
            (ConstantLattice::Top, x) | (x, ConstantLattice::Top) => x.clone(),
            (ConstantLattice::Bottom, _) | (_, ConstantLattice::Bottom) => ConstantLattice::Bottom,
            (ConstantLattice::Const(a), ConstantLattice::Const(b)) => {
                if a == b {
                    ConstantLattice::Const(a.clone())
                } else {
                    ConstantLattice::Bottom
                }
            }
        }
    }
}

impl<T: Clone + Eq + fmt::Debug> BoundedLattice for ConstantLattice<T> {
    fn bottom() -> Self {
        ConstantLattice::Bottom
    }
}

impl<T> ConstantLattice<T> {
    pub fn as_const(&self) -> Option<&T> {
        match self {
            ConstantLattice::Const(value) => Some(value),
            _ => None,
        }
    }
}

/// Powerset under union; TOP is the empty set
///
/// Unbounded, so only usable with the monotone solvers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SetLattice<T: Ord>(pub BTreeSet<T>);

impl<T: Ord> SetLattice<T> {
    pub fn new() -> Self {
        SetLattice(BTreeSet::new())
    }

    pub fn singleton(value: T) -> Self {
        let mut set = BTreeSet::new();
        set.insert(value);
        SetLattice(set)
    }

    pub fn contains(&self, value: &T) -> bool {
        self.0.contains(value)
    }

    pub fn insert(&mut self, value: T) -> bool {
        self.0.insert(value)
    }

    pub fn remove(&mut self, value: &T) -> bool {
        self.0.remove(value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }
}

impl<T: Ord> Default for SetLattice<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord> FromIterator<T> for SetLattice<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        SetLattice(iter.into_iter().collect())
    }
}

impl<T: Ord + Clone + fmt::Debug> Lattice for SetLattice<T> {
    fn top() -> Self {
        SetLattice(BTreeSet::new())
    }

    fn join(&self, other: &Self) -> Self {
        SetLattice(self.0.union(&other.0).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_domain_join() {
        assert_eq!(BinaryDomain::Top.join(&BinaryDomain::Top), BinaryDomain::Top);
        assert_eq!(
            BinaryDomain::Top.join(&BinaryDomain::Bottom),
            BinaryDomain::Bottom
        );
        assert!(BinaryDomain::bottom().is_bottom());
    }

    #[test]
    fn test_min_value_join_takes_minimum() {
        assert_eq!(MinValue(3).join(&MinValue(5)), MinValue(3));
        assert_eq!(MinValue(5).join(&MinValue::top()), MinValue(5));
        assert_eq!(MinValue(5).join(&MinValue::bottom()), MinValue(0));
        assert!(MinValue(5).leq(&MinValue(3)));
        assert_eq!(MinValue::top().to_string(), "⊤");
    }

    #[test]
    fn test_constant_lattice_join() {
        let c1: ConstantLattice<i64> = ConstantLattice::Const(1);
        let c2 = ConstantLattice::Const(2);

        assert_eq!(c1.join(&ConstantLattice::Top), c1);
        assert_eq!(c1.join(&c1), c1);
        assert_eq!(c1.join(&c2), ConstantLattice::Bottom);
        assert_eq!(c1.as_const(), Some(&1));
    }

    #[test]
    fn test_set_lattice_union() {
        let a: SetLattice<u32> = [1, 2].into_iter().collect();
        let b: SetLattice<u32> = [2, 3].into_iter().collect();
        let joined = a.join(&b);

        assert_eq!(joined.len(), 3);
        assert!(SetLattice::<u32>::top().is_top());
        assert!(a.leq(&joined));
    }
}
