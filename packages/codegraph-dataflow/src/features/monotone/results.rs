//! Per-point result table of the monotone solvers

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::hash::Hash;

use crate::errors::Result;
use crate::features::lattice::Lattice;
use crate::features::supergraph::Icfg;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonotoneStatistics {
    /// Number of points with a computed value
    pub num_points: usize,

    /// Number of transfer function applications
    pub num_transfers: usize,

    pub num_iterations: usize,

    pub analysis_time_ms: u64,
}

/// Export record: one per program point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonotoneRecord {
    pub point_id: u32,
    pub point: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct MonotoneResults<N, V> {
    before: FxHashMap<N, V>,
    after: FxHashMap<N, V>,
    stats: MonotoneStatistics,
}

impl<N: Copy + Eq + Hash + Ord, V: Lattice> MonotoneResults<N, V> {
    pub(crate) fn new(
        before: FxHashMap<N, V>,
        after: FxHashMap<N, V>,
        stats: MonotoneStatistics,
    ) -> Self {
        Self {
            before,
            after,
            stats,
        }
    }

    /// Value reaching `node` (after the merge, before its transfer); TOP
    /// if the point was never reached
    pub fn value_at(&self, node: N) -> V {
        self.before.get(&node).cloned().unwrap_or_else(V::top)
    }

    /// Value leaving `node`
    pub fn value_after(&self, node: N) -> V {
        self.after.get(&node).cloned().unwrap_or_else(V::top)
    }

    pub fn is_reached(&self, node: N) -> bool {
        self.before.contains_key(&node)
    }

    /// Reached points in node order
    pub fn nodes(&self) -> Vec<N> {
        let mut nodes: Vec<N> = self.before.keys().copied().collect();
        nodes.sort();
        nodes
    }

    pub fn statistics(&self) -> &MonotoneStatistics {
        &self.stats
    }

    pub fn records<I: Icfg<Node = N>>(&self, icfg: &I) -> Result<Vec<MonotoneRecord>>
    where
        V: Serialize,
    {
        self.nodes()
            .into_iter()
            .map(|node| {
                Ok(MonotoneRecord {
                    point_id: icfg.node_id(node),
                    point: icfg.node_label(node),
                    value: serde_json::to_value(self.value_at(node))?,
                })
            })
            .collect()
    }
}
