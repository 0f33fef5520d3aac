/*
 * IFDS Tabulation Solver
 *
 * Worklist fixpoint over path edges <sp, d1> -> <n, d2>. The start point
 * sp is always the entry of n's method and stays implicit, so a path edge
 * is stored as (n, d2) <- d1.
 *
 * Tables (all append-only while solving):
 * - path_edges:  n -> d2 -> {d1}
 * - incoming:    (sp, d) -> call site -> {facts at the call site}
 * - end_summary: (sp, d) -> {(exit, d')}   callee effect, per entry fact
 * - summaries:   (call site, d) -> {(return site, d')}
 *
 * `incoming`/`end_summary` follow Naeem, Lhoták, Rodriguez (2010): the
 * callers of <sp, d> are recorded as they are discovered instead of
 * inverting the call flow function. A summary is applied to a caller as
 * soon as either side shows up, which is what lets recursion terminate.
 *
 * Facts are interned; ZERO is always FactId 0.
 */

use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::{HashSet, VecDeque};
use std::time::Instant;

use super::edge_recorder::EdgeRecorder;
use super::problem::IfdsProblem;
use super::results::{IfdsResults, IfdsStatistics, SummaryEdge};
use super::special_summaries::SpecialSummaries;
use crate::features::supergraph::{EdgeKind, Icfg};
use crate::shared::{InternId, Interner};

pub(crate) type FactId = InternId;

/// Path edge <sp, source> -> <target, fact>
#[derive(Debug, Clone, Copy)]
struct PathEdge<N> {
    source: FactId,
    target: N,
    fact: FactId,
}

type FactOf<I, P> = <P as IfdsProblem<I>>::Fact;

pub struct IfdsSolver<'a, I, P>
where
    I: Icfg,
    P: IfdsProblem<I>,
{
    icfg: &'a I,
    problem: P,
    special: SpecialSummaries<I::Method, FactOf<I, P>>,
    facts: Interner<FactOf<I, P>>,
    path_edges: FxHashMap<I::Node, FxHashMap<FactId, FxHashSet<FactId>>>,
    incoming: FxHashMap<(I::Node, FactId), FxHashMap<I::Node, FxHashSet<FactId>>>,
    end_summary: FxHashMap<(I::Node, FactId), FxHashSet<(I::Node, FactId)>>,
    summaries: FxHashMap<(I::Node, FactId), FxHashSet<(I::Node, FactId)>>,
    worklist: VecDeque<PathEdge<I::Node>>,
    recorder: Option<EdgeRecorder<I::Node, FactOf<I, P>>>,
    stats: IfdsStatistics,
}

impl<'a, I, P> IfdsSolver<'a, I, P>
where
    I: Icfg,
    P: IfdsProblem<I>,
{
    pub fn new(problem: P, icfg: &'a I) -> Self {
        let mut facts = Interner::new();
        facts.intern(&problem.zero_value());
        Self {
            icfg,
            problem,
            special: SpecialSummaries::new(),
            facts,
            path_edges: FxHashMap::default(),
            incoming: FxHashMap::default(),
            end_summary: FxHashMap::default(),
            summaries: FxHashMap::default(),
            worklist: VecDeque::new(),
            recorder: None,
            stats: IfdsStatistics::default(),
        }
    }

    /// Use hand-written summaries for the listed callees
    pub fn with_special_summaries(
        mut self,
        special: SpecialSummaries<I::Method, FactOf<I, P>>,
    ) -> Self {
        self.special = special;
        self
    }

    /// Record every computed exploded edge
    pub fn with_edge_recording(mut self, enabled: bool) -> Self {
        self.recorder = enabled.then(EdgeRecorder::new);
        self
    }

    pub fn problem(&self) -> &P {
        &self.problem
    }

    /// Run to fixpoint and fold the path edges into a result table
    pub fn solve(mut self) -> IfdsResults<I::Node, FactOf<I, P>> {
        let start_time = Instant::now();

        self.seed();
        while let Some(edge) = self.worklist.pop_front() {
            self.stats.num_iterations += 1;
            let known = self.stats.num_path_edges;
            self.process(edge);
            debug_assert!(self.stats.num_path_edges >= known);
        }

        self.stats.num_facts = self.facts.len();
        self.stats.num_summary_edges = self.summaries.values().map(FxHashSet::len).sum();
        self.stats.num_end_summaries = self.end_summary.values().map(FxHashSet::len).sum();
        self.stats.analysis_time_ms = start_time.elapsed().as_millis() as u64;

        tracing::info!(
            path_edges = self.stats.num_path_edges,
            summary_edges = self.stats.num_summary_edges,
            summary_reuses = self.stats.num_summary_reuses,
            iterations = self.stats.num_iterations,
            elapsed_ms = self.stats.analysis_time_ms,
            "IFDS solver reached fixpoint"
        );

        self.into_results()
    }

    fn seed(&mut self) {
        let mut seeds: Vec<_> = self.problem.initial_seeds().into_iter().collect();
        seeds.sort_by(|a, b| a.0.cmp(&b.0));
        for (node, facts) in seeds {
            for fact in facts {
                let id = self.facts.intern(&fact);
                self.propagate(id, node, id);
            }
        }
    }

    fn process(&mut self, edge: PathEdge<I::Node>) {
        if self.icfg.is_call(edge.target) {
            tracing::trace!(node = ?edge.target, "process call");
            self.process_call(edge);
            return;
        }
        if self.icfg.is_exit(edge.target) {
            tracing::trace!(node = ?edge.target, "process exit");
            self.process_exit(edge);
        }
        self.process_normal(edge);
    }

    /// Intraprocedural step along every successor
    fn process_normal(&mut self, edge: PathEdge<I::Node>) {
        let PathEdge {
            source: d1,
            target: n,
            fact: d2,
        } = edge;
        let fact = self.facts.resolve(d2).clone();

        for succ in self.icfg.successors_of(n) {
            let targets = self.problem.normal_flow(n, succ).compute(&fact);
            self.record(n, succ, EdgeKind::Normal, &fact, &targets);
            for target in &targets {
                let d3 = self.facts.intern(target);
                self.propagate(d1, succ, d3);
            }
        }
    }

    /// Enter every resolved callee, apply known end summaries, and let
    /// call-independent facts bypass the call
    fn process_call(&mut self, edge: PathEdge<I::Node>) {
        let PathEdge {
            source: d1,
            target: n,
            fact: d2,
        } = edge;
        let fact = self.facts.resolve(d2).clone();
        let return_sites = self.icfg.return_sites_of_call_at(n);

        for callee in self.icfg.callees_of_call_at(n) {
            let special_targets = self.special.get(callee).map(|summary| summary.compute(&fact));
            if let Some(targets) = special_targets {
                for &return_site in &return_sites {
                    self.record(n, return_site, EdgeKind::CallToReturn, &fact, &targets);
                    for target in &targets {
                        let d3 = self.facts.intern(target);
                        self.propagate(d1, return_site, d3);
                    }
                }
                continue;
            }

            let start_points = self.icfg.start_points_of(callee);
            if start_points.is_empty() {
                continue;
            }
            let entry_facts = self.problem.call_flow(n, callee).compute(&fact);

            for start in start_points {
                self.record(n, start, EdgeKind::Call, &fact, &entry_facts);
                for entry_fact in &entry_facts {
                    let d3 = self.facts.intern(entry_fact);
                    self.propagate(d3, start, d3);

                    self.incoming
                        .entry((start, d3))
                        .or_default()
                        .entry(n)
                        .or_default()
                        .insert(d2);

                    let ends: Vec<(I::Node, FactId)> = match self.end_summary.get(&(start, d3)) {
                        Some(ends) if !ends.is_empty() => ends.iter().copied().collect(),
                        _ => continue,
                    };
                    self.stats.num_summary_reuses += 1;
                    for (exit, d4) in ends {
                        let exit_fact = self.facts.resolve(d4).clone();
                        for &return_site in &return_sites {
                            let targets = self
                                .problem
                                .return_flow(n, callee, exit, return_site)
                                .compute(&exit_fact);
                            self.record(exit, return_site, EdgeKind::Return, &exit_fact, &targets);
                            for target in &targets {
                                let d5 = self.facts.intern(target);
                                self.add_summary(n, d2, return_site, d5);
                                self.propagate(d1, return_site, d5);
                            }
                        }
                    }
                }
            }
        }

        for return_site in return_sites {
            let targets = self
                .problem
                .call_to_return_flow(n, return_site)
                .compute(&fact);
            self.record(n, return_site, EdgeKind::CallToReturn, &fact, &targets);
            for target in &targets {
                let d3 = self.facts.intern(target);
                self.propagate(d1, return_site, d3);
            }
        }
    }

    /// Register the end summary and push it to every caller seen so far
    fn process_exit(&mut self, edge: PathEdge<I::Node>) {
        let PathEdge {
            source: d1,
            target: exit,
            fact: d2,
        } = edge;
        let method = self.icfg.method_of(exit);
        let exit_fact = self.facts.resolve(d2).clone();

        for start in self.icfg.start_points_of(method) {
            self.end_summary
                .entry((start, d1))
                .or_default()
                .insert((exit, d2));

            let callers: Vec<(I::Node, Vec<FactId>)> = self
                .incoming
                .get(&(start, d1))
                .map(|callers| {
                    callers
                        .iter()
                        .map(|(call_site, facts)| (*call_site, facts.iter().copied().collect()))
                        .collect()
                })
                .unwrap_or_default();

            for (call_site, call_facts) in callers {
                for return_site in self.icfg.return_sites_of_call_at(call_site) {
                    let targets = self
                        .problem
                        .return_flow(call_site, method, exit, return_site)
                        .compute(&exit_fact);
                    self.record(exit, return_site, EdgeKind::Return, &exit_fact, &targets);

                    for target in &targets {
                        let d5 = self.facts.intern(target);
                        for &d4 in &call_facts {
                            self.add_summary(call_site, d4, return_site, d5);
                            let caller_sources: Vec<FactId> = self
                                .path_edges
                                .get(&call_site)
                                .and_then(|by_fact| by_fact.get(&d4))
                                .map(|sources| sources.iter().copied().collect())
                                .unwrap_or_default();
                            for d0 in caller_sources {
                                self.propagate(d0, return_site, d5);
                            }
                        }
                    }
                }
            }
        }
    }

    /// Add path edge <sp, d1> -> <n, d2> unless already known
    fn propagate(&mut self, d1: FactId, n: I::Node, d2: FactId) {
        let inserted = self
            .path_edges
            .entry(n)
            .or_default()
            .entry(d2)
            .or_default()
            .insert(d1);
        if inserted {
            self.stats.num_path_edges += 1;
            self.worklist.push_back(PathEdge {
                source: d1,
                target: n,
                fact: d2,
            });
        }
    }

    fn add_summary(
        &mut self,
        call_site: I::Node,
        d_call: FactId,
        return_site: I::Node,
        d_ret: FactId,
    ) {
        self.summaries
            .entry((call_site, d_call))
            .or_default()
            .insert((return_site, d_ret));
    }

    fn record(
        &mut self,
        from: I::Node,
        to: I::Node,
        kind: EdgeKind,
        source: &FactOf<I, P>,
        targets: &HashSet<FactOf<I, P>>,
    ) {
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.record(from, to, kind, source, targets);
        }
    }

    fn into_results(self) -> IfdsResults<I::Node, FactOf<I, P>> {
        let facts = self.facts;

        let mut table: FxHashMap<I::Node, FxHashSet<FactOf<I, P>>> = FxHashMap::default();
        for (node, by_fact) in &self.path_edges {
            let entry = table.entry(*node).or_default();
            for &fact in by_fact.keys() {
                if fact != 0 {
                    entry.insert(facts.resolve(fact).clone());
                }
            }
        }

        let mut summary_edges = Vec::new();
        for ((call_site, d_call), targets) in &self.summaries {
            for (return_site, d_ret) in targets {
                summary_edges.push(SummaryEdge {
                    call_site: *call_site,
                    call_fact: facts.resolve(*d_call).clone(),
                    return_site: *return_site,
                    return_fact: facts.resolve(*d_ret).clone(),
                });
            }
        }
        summary_edges.sort_by(|a, b| {
            (a.call_site, a.return_site).cmp(&(b.call_site, b.return_site))
        });

        IfdsResults::new(table, summary_edges, self.stats, self.recorder)
    }
}
