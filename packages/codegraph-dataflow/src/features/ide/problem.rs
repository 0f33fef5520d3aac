//! IDE problem definition
//!
//! An IDE problem is an IFDS problem whose facts carry lattice values. Each
//! flow-function edge d -> d' gets an edge function describing how the
//! value of d' is derived from the value of d. The lattice must have finite
//! height; the solver does not detect infinite descending chains.
//!
//! Values are always combined with the `Value`'s own [`Lattice::join`]:
//! jump functions, start values and node values all use the same join.

use super::edge_function::EdgeFunction;
use crate::features::ifds::IfdsProblem;
use crate::features::lattice::{BoundedLattice, Lattice};
use crate::features::supergraph::Icfg;

pub trait IdeProblem<I: Icfg>: IfdsProblem<I> {
    type Value: BoundedLattice;
    type EdgeFn: EdgeFunction<Self::Value>;

    /// Value of a seed fact at its seed point
    fn initial_seed_value(&self, _node: I::Node, _fact: &Self::Fact) -> Self::Value {
        Self::Value::bottom()
    }

    /// Edge function for `curr_fact` at `curr` -> `succ_fact` at `succ`
    fn normal_edge_function(
        &self,
        curr: I::Node,
        curr_fact: &Self::Fact,
        succ: I::Node,
        succ_fact: &Self::Fact,
    ) -> Self::EdgeFn;

    /// Edge function for the call edge into `callee`
    fn call_edge_function(
        &self,
        call_site: I::Node,
        src_fact: &Self::Fact,
        callee: I::Method,
        dest_fact: &Self::Fact,
    ) -> Self::EdgeFn;

    /// Edge function for the return edge out of `callee`
    fn return_edge_function(
        &self,
        call_site: I::Node,
        callee: I::Method,
        exit: I::Node,
        exit_fact: &Self::Fact,
        return_site: I::Node,
        ret_fact: &Self::Fact,
    ) -> Self::EdgeFn;

    fn call_to_return_edge_function(
        &self,
        call_site: I::Node,
        call_fact: &Self::Fact,
        return_site: I::Node,
        ret_fact: &Self::Fact,
    ) -> Self::EdgeFn;
}

/// TOP and join of an IDE problem's values
///
/// Implemented for every [`IdeProblem`] and not overridable; a different
/// join means a different `Value` type.
pub trait IdeValues<I: Icfg>: IdeProblem<I> {
    fn top_value(&self) -> Self::Value {
        Self::Value::top()
    }

    fn join_values(&self, a: &Self::Value, b: &Self::Value) -> Self::Value {
        a.join(b)
    }
}

impl<I: Icfg, P: IdeProblem<I> + ?Sized> IdeValues<I> for P {}
