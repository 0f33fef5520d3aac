/*
 * Interprocedural Control-Flow Graph (ICFG) Abstraction
 *
 * The solvers never see the program itself. They walk this view:
 *
 *   - intraprocedural successors/predecessors
 *   - call sites with their resolved callees (0..n)
 *   - return sites of a call (the call-to-return targets)
 *   - start points and exit points of a method
 *
 * The exploded supergraph (ICFG node x fact) is never materialized; it is
 * generated on demand from flow functions while solving.
 */

use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use std::hash::Hash;

/// Kind of a supergraph edge; selects the flow function that applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Intraprocedural edge
    Normal,

    /// Call site → callee start point
    Call,

    /// Call site → return site, bypassing the callee
    CallToReturn,

    /// Callee exit → return site
    Return,
}

impl EdgeKind {
    pub fn is_interprocedural(&self) -> bool {
        matches!(self, EdgeKind::Call | EdgeKind::Return)
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::Normal => write!(f, "normal"),
            EdgeKind::Call => write!(f, "call"),
            EdgeKind::CallToReturn => write!(f, "call-to-return"),
            EdgeKind::Return => write!(f, "return"),
        }
    }
}

/// View of a program as nodes with call and return structure
pub trait Icfg {
    /// Program point
    type Node: Copy + Eq + Hash + Ord + Debug;

    /// Procedure
    type Method: Copy + Eq + Hash + Ord + Debug;

    /// Method containing `node`
    fn method_of(&self, node: Self::Node) -> Self::Method;

    /// Start points of `method`; empty for external methods
    fn start_points_of(&self, method: Self::Method) -> Vec<Self::Node>;

    /// Exit points of `method`
    fn exit_points_of(&self, method: Self::Method) -> Vec<Self::Node>;

    /// Intraprocedural successors; for a call site these are its return sites
    fn successors_of(&self, node: Self::Node) -> Vec<Self::Node>;

    /// Intraprocedural predecessors
    fn predecessors_of(&self, node: Self::Node) -> Vec<Self::Node>;

    fn is_call(&self, node: Self::Node) -> bool;

    fn is_exit(&self, node: Self::Node) -> bool;

    fn is_start_point(&self, node: Self::Node) -> bool;

    /// Resolved callees of a call site; may be empty (unresolved) or have
    /// several entries (indirect call)
    fn callees_of_call_at(&self, node: Self::Node) -> Vec<Self::Method>;

    /// Nodes control returns to after the call at `node`
    fn return_sites_of_call_at(&self, node: Self::Node) -> Vec<Self::Node>;

    /// Call sites that may invoke `method`
    fn callers_of(&self, method: Self::Method) -> Vec<Self::Node>;

    fn call_sites_within(&self, method: Self::Method) -> Vec<Self::Node>;

    fn nodes_of(&self, method: Self::Method) -> Vec<Self::Node>;

    fn all_nodes(&self) -> Vec<Self::Node>;

    fn methods(&self) -> Vec<Self::Method>;

    /// Stable numeric id used in exports
    fn node_id(&self, node: Self::Node) -> u32;

    /// Human-readable label used in exports
    fn node_label(&self, node: Self::Node) -> String;

    fn method_name(&self, method: Self::Method) -> String;

    /// Every supergraph edge, derived from the queries above
    fn edges(&self) -> Vec<(Self::Node, Self::Node, EdgeKind)> {
        let mut edges = Vec::new();
        for node in self.all_nodes() {
            if self.is_call(node) {
                for callee in self.callees_of_call_at(node) {
                    for start in self.start_points_of(callee) {
                        edges.push((node, start, EdgeKind::Call));
                    }
                }
                for ret in self.return_sites_of_call_at(node) {
                    edges.push((node, ret, EdgeKind::CallToReturn));
                }
            } else {
                for succ in self.successors_of(node) {
                    edges.push((node, succ, EdgeKind::Normal));
                }
            }

            if self.is_exit(node) {
                for call_site in self.callers_of(self.method_of(node)) {
                    for ret in self.return_sites_of_call_at(call_site) {
                        edges.push((node, ret, EdgeKind::Return));
                    }
                }
            }
        }
        edges.sort();
        edges.dedup();
        edges
    }
}
