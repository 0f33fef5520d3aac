//! IDE result table with lazily evaluated values

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

use super::edge_function::EdgeFunction;
use super::jump_functions::JumpFunctions;
use crate::errors::Result;
use crate::features::ifds::EdgeRecorder;
use crate::features::lattice::BoundedLattice;
use crate::features::supergraph::Icfg;
use crate::shared::{InternId, Interner};

/// IDE Analysis Statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdeStatistics {
    /// Number of (d1, n, d2) jump functions at fixpoint
    pub num_jump_functions: usize,

    /// Number of times a jump function was strictly lowered
    pub num_propagations: usize,

    /// Number of (call site, fact) -> (return site, fact) summary functions
    pub num_summary_functions: usize,

    /// Number of times a callee's existing end summary was applied at a call
    pub num_summary_reuses: usize,

    /// Number of (method, fact) entries processed in phase II
    pub num_value_computations: usize,

    pub num_facts: usize,

    pub num_iterations: usize,

    pub analysis_time_ms: u64,
}

/// Export record: one per (program point, fact)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdeRecord {
    pub point_id: u32,
    pub point: String,
    pub fact: String,
    pub value: serde_json::Value,
}

pub struct IdeResults<N, M, F, V, E> {
    facts: Interner<F>,
    jump_functions: JumpFunctions<N, E>,
    node_methods: FxHashMap<N, M>,
    start_values: FxHashMap<(M, InternId), V>,
    top: V,
    stats: IdeStatistics,
    recorder: Option<EdgeRecorder<N, F>>,
}

impl<N, M, F, V, E> IdeResults<N, M, F, V, E>
where
    N: Copy + Eq + Hash + Ord,
    M: Copy + Eq + Hash,
    F: Clone + Eq + Hash + Debug,
    V: BoundedLattice,
    E: EdgeFunction<V>,
{
    pub(crate) fn new(
        facts: Interner<F>,
        jump_functions: JumpFunctions<N, E>,
        node_methods: FxHashMap<N, M>,
        start_values: FxHashMap<(M, InternId), V>,
        top: V,
        stats: IdeStatistics,
        recorder: Option<EdgeRecorder<N, F>>,
    ) -> Self {
        Self {
            facts,
            jump_functions,
            node_methods,
            start_values,
            top,
            stats,
            recorder,
        }
    }

    /// Value of `fact` at `node`; TOP when the fact does not reach `node`
    ///
    /// Paths are combined with the value lattice's
    /// [`Lattice::join`](crate::features::lattice::Lattice::join), the same
    /// join the solver uses for jump functions and start values.
    pub fn value_at(&self, node: N, fact: &F) -> V {
        match self.facts.get(fact) {
            Some(id) => self.value_of(node, id),
            None => self.top.clone(),
        }
    }

    fn value_of(&self, node: N, d2: InternId) -> V {
        let method = match self.node_methods.get(&node) {
            Some(method) => *method,
            None => return self.top.clone(),
        };
        let mut value = self.top.clone();
        if let Some(by_source) = self.jump_functions.reverse_lookup(node, d2) {
            for (d1, jump) in by_source {
                if let Some(entry) = self.start_values.get(&(method, *d1)) {
                    value = value.join(&jump.compute_target(entry));
                }
            }
        }
        value
    }

    /// Facts reaching `node` (ZERO excluded)
    ///
    /// A fact whose only jump functions are `AllTop` is never stored, so it
    /// is missing here even where the IFDS solver reports it.
    pub fn facts_at(&self, node: N) -> FxHashSet<F> {
        self.fact_ids_at(node)
            .into_iter()
            .map(|id| self.facts.resolve(id).clone())
            .collect()
    }

    fn fact_ids_at(&self, node: N) -> Vec<InternId> {
        let mut ids: Vec<InternId> = self
            .jump_functions
            .lookup_by_target(node)
            .map(|records| records.keys().map(|(_, d2)| *d2).filter(|d2| *d2 != 0).collect())
            .unwrap_or_default();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Every (fact, value) pair at `node`, ZERO excluded, ordered by the
    /// facts' `Debug` rendering
    pub fn values_at(&self, node: N) -> Vec<(F, V)> {
        let mut values: Vec<(F, V)> = self
            .fact_ids_at(node)
            .into_iter()
            .map(|id| (self.facts.resolve(id).clone(), self.value_of(node, id)))
            .collect();
        values.sort_by_cached_key(|(fact, _)| format!("{:?}", fact));
        values
    }

    /// Points with at least one jump function, in node order
    pub fn nodes(&self) -> Vec<N> {
        let mut nodes: Vec<N> = self.node_methods.keys().copied().collect();
        nodes.sort();
        nodes
    }

    pub fn statistics(&self) -> &IdeStatistics {
        &self.stats
    }

    pub fn edge_recorder(&self) -> Option<&EdgeRecorder<N, F>> {
        self.recorder.as_ref()
    }

    /// One record per (point, fact), sorted by point id then fact
    pub fn records<I: Icfg<Node = N>>(&self, icfg: &I) -> Result<Vec<IdeRecord>>
    where
        V: Serialize,
    {
        let mut records = Vec::new();
        for node in self.nodes() {
            for (fact, value) in self.values_at(node) {
                records.push(IdeRecord {
                    point_id: icfg.node_id(node),
                    point: icfg.node_label(node),
                    fact: format!("{:?}", fact),
                    value: serde_json::to_value(&value)?,
                });
            }
        }
        records.sort_by(|a, b| (a.point_id, &a.fact).cmp(&(b.point_id, &b.fact)));
        Ok(records)
    }
}
