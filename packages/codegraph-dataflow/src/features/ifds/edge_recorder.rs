//! Recorder for computed exploded-supergraph edges
//!
//! Off by default. When enabled the IFDS and IDE solvers log every flow
//! function application `(from, d) -> (to, {d'...})`, split into
//! intraprocedural and interprocedural edges, for export and debugging.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

use crate::features::supergraph::{EdgeKind, Icfg};

type EdgeTable<N, F> = FxHashMap<(N, N), FxHashMap<F, FxHashSet<F>>>;

/// One recorded exploded edge group, ready for serialization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplodedEdgeRecord {
    pub from_id: u32,
    pub from: String,
    pub to_id: u32,
    pub to: String,
    pub interprocedural: bool,
    pub source_fact: String,
    pub target_facts: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct EdgeRecorder<N, F> {
    intra: EdgeTable<N, F>,
    inter: EdgeTable<N, F>,
}

impl<N, F> EdgeRecorder<N, F>
where
    N: Copy + Eq + Hash,
    F: Clone + Eq + Hash + Debug,
{
    pub fn new() -> Self {
        Self {
            intra: FxHashMap::default(),
            inter: FxHashMap::default(),
        }
    }

    pub fn record<'f>(
        &mut self,
        from: N,
        to: N,
        kind: EdgeKind,
        source: &F,
        targets: impl IntoIterator<Item = &'f F>,
    ) where
        F: 'f,
    {
        let table = if kind.is_interprocedural() {
            &mut self.inter
        } else {
            &mut self.intra
        };
        table
            .entry((from, to))
            .or_default()
            .entry(source.clone())
            .or_default()
            .extend(targets.into_iter().cloned());
    }

    pub fn intra_edges(&self) -> &EdgeTable<N, F> {
        &self.intra
    }

    pub fn inter_edges(&self) -> &EdgeTable<N, F> {
        &self.inter
    }

    /// Number of (from, d) -> (to, d') edges recorded
    pub fn len(&self) -> usize {
        self.intra
            .values()
            .chain(self.inter.values())
            .flat_map(|by_source| by_source.values())
            .map(FxHashSet::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into sorted records with node ids and labels from `icfg`
    pub fn records<I: Icfg<Node = N>>(&self, icfg: &I) -> Vec<ExplodedEdgeRecord> {
        let mut records = Vec::new();
        for (table, interprocedural) in [(&self.intra, false), (&self.inter, true)] {
            for ((from, to), by_source) in table {
                for (source, targets) in by_source {
                    let mut target_facts: Vec<String> =
                        targets.iter().map(|fact| format!("{:?}", fact)).collect();
                    target_facts.sort();
                    records.push(ExplodedEdgeRecord {
                        from_id: icfg.node_id(*from),
                        from: icfg.node_label(*from),
                        to_id: icfg.node_id(*to),
                        to: icfg.node_label(*to),
                        interprocedural,
                        source_fact: format!("{:?}", source),
                        target_facts,
                    });
                }
            }
        }
        records.sort_by(|a, b| {
            (a.from_id, a.to_id, &a.source_fact).cmp(&(b.from_id, b.to_id, &b.source_fact))
        });
        records
    }
}

impl<N, F> Default for EdgeRecorder<N, F>
where
    N: Copy + Eq + Hash,
    F: Clone + Eq + Hash + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}
