//! Read-only IFDS result table

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

use super::edge_recorder::EdgeRecorder;
use crate::features::supergraph::Icfg;

/// IFDS Analysis Statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IfdsStatistics {
    /// Number of path edges discovered
    pub num_path_edges: usize,

    /// Number of summary edges (call site, fact) -> (return site, fact)
    pub num_summary_edges: usize,

    /// Number of (callee entry, fact) end summaries
    pub num_end_summaries: usize,

    /// Number of times a callee's existing end summary was applied at a
    /// call instead of waiting for the callee to be re-analyzed
    pub num_summary_reuses: usize,

    /// Number of distinct facts interned (ZERO included)
    pub num_facts: usize,

    /// Number of worklist iterations
    pub num_iterations: usize,

    /// Analysis time (milliseconds)
    pub analysis_time_ms: u64,
}

/// Summary edge: (call_site, d1) -> (return_site, d2)
///
/// Example:
///   SummaryEdge(n5, Tainted(arg), n6, Tainted(ret))
///   → "calling at n5 with tainted arg yields tainted ret at n6"
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SummaryEdge<N, F> {
    pub call_site: N,
    pub call_fact: F,
    pub return_site: N,
    pub return_fact: F,
}

/// Export record: one per program point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IfdsRecord {
    pub point_id: u32,
    pub point: String,
    pub facts: Vec<String>,
}

pub struct IfdsResults<N, F> {
    table: FxHashMap<N, FxHashSet<F>>,
    summary_edges: Vec<SummaryEdge<N, F>>,
    stats: IfdsStatistics,
    recorder: Option<EdgeRecorder<N, F>>,
}

impl<N, F> IfdsResults<N, F>
where
    N: Copy + Eq + Hash + Ord,
    F: Clone + Eq + Hash + Debug,
{
    pub(crate) fn new(
        table: FxHashMap<N, FxHashSet<F>>,
        summary_edges: Vec<SummaryEdge<N, F>>,
        stats: IfdsStatistics,
        recorder: Option<EdgeRecorder<N, F>>,
    ) -> Self {
        Self {
            table,
            summary_edges,
            stats,
            recorder,
        }
    }

    /// Facts holding at `node` (ZERO excluded)
    pub fn facts_at(&self, node: N) -> FxHashSet<F> {
        self.table.get(&node).cloned().unwrap_or_default()
    }

    pub fn holds_at(&self, node: N, fact: &F) -> bool {
        self.table
            .get(&node)
            .map_or(false, |facts| facts.contains(fact))
    }

    /// Points where `fact` holds, in node order
    pub fn points_with(&self, fact: &F) -> Vec<N> {
        let mut points: Vec<N> = self
            .table
            .iter()
            .filter(|(_, facts)| facts.contains(fact))
            .map(|(node, _)| *node)
            .collect();
        points.sort();
        points
    }

    /// Points reached by the analysis (possibly with ZERO only), in node order
    pub fn nodes(&self) -> Vec<N> {
        let mut nodes: Vec<N> = self.table.keys().copied().collect();
        nodes.sort();
        nodes
    }

    /// Whole point → facts table
    pub fn table(&self) -> &FxHashMap<N, FxHashSet<F>> {
        &self.table
    }

    pub fn summary_edges(&self) -> &[SummaryEdge<N, F>] {
        &self.summary_edges
    }

    pub fn statistics(&self) -> &IfdsStatistics {
        &self.stats
    }

    /// Recorded exploded edges, when recording was enabled
    pub fn edge_recorder(&self) -> Option<&EdgeRecorder<N, F>> {
        self.recorder.as_ref()
    }

    /// One record per reached point, sorted by point id; facts rendered
    /// with `Debug` and sorted
    pub fn records<I: Icfg<Node = N>>(&self, icfg: &I) -> Vec<IfdsRecord> {
        let mut records: Vec<IfdsRecord> = self
            .table
            .iter()
            .map(|(node, facts)| {
                let mut facts: Vec<String> =
                    facts.iter().map(|fact| format!("{:?}", fact)).collect();
                facts.sort();
                IfdsRecord {
                    point_id: icfg.node_id(*node),
                    point: icfg.node_label(*node),
                    facts,
                }
            })
            .collect();
        records.sort_by_key(|record| record.point_id);
        records
    }
}
