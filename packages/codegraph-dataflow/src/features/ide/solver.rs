/*
 * IDE Solver (Sagiv, Reps, Horwitz 1996)
 *
 * Phase I   - tabulation as in IFDS, but every path edge carries a jump
 *             function. Reaching an existing (d1, n, d2) joins the new
 *             function into the old one; the edge is processed again only
 *             if that changes it.
 * Phase II  - (i) push seed values through call edges to get a value for
 *             every (method, entry fact); (ii) values at ordinary nodes are
 *             computed lazily by the result table as
 *             join over d1 of jump(d1 -> n, d2)(value(method, d1)).
 *
 * Composition order: extending a path by one step with edge function g
 * turns jump function f into f.compose_with(g) (f first, then g).
 */

use rustc_hash::FxHashMap;
use std::collections::{HashSet, VecDeque};
use std::hash::Hash;
use std::time::Instant;

use super::edge_function::EdgeFunction;
use super::jump_functions::JumpFunctions;
use super::problem::{IdeProblem, IdeValues};
use super::results::{IdeResults, IdeStatistics};
use crate::features::ifds::{EdgeRecorder, IfdsProblem, SpecialSummaries};
use crate::features::supergraph::{EdgeKind, Icfg};
use crate::shared::{InternId, Interner};

type FactId = InternId;
type FactOf<I, P> = <P as IfdsProblem<I>>::Fact;
type ValueOf<I, P> = <P as IdeProblem<I>>::Value;
type EdgeFnOf<I, P> = <P as IdeProblem<I>>::EdgeFn;
type EdgeTable<N, E> = FxHashMap<(N, FactId), FxHashMap<(N, FactId), E>>;

fn identity_fn<I: Icfg, P: IdeProblem<I>>() -> EdgeFnOf<I, P> {
    <EdgeFnOf<I, P> as EdgeFunction<ValueOf<I, P>>>::identity()
}

fn all_top_fn<I: Icfg, P: IdeProblem<I>>() -> EdgeFnOf<I, P> {
    <EdgeFnOf<I, P> as EdgeFunction<ValueOf<I, P>>>::all_top()
}

#[derive(Debug, Clone, Copy)]
struct PathEdge<N> {
    source: FactId,
    target: N,
    fact: FactId,
}

pub struct IdeSolver<'a, I, P>
where
    I: Icfg,
    P: IdeProblem<I>,
{
    icfg: &'a I,
    problem: P,
    special: SpecialSummaries<I::Method, FactOf<I, P>>,
    facts: Interner<FactOf<I, P>>,
    jump_functions: JumpFunctions<I::Node, EdgeFnOf<I, P>>,
    incoming: FxHashMap<(I::Node, FactId), FxHashMap<I::Node, HashSet<FactId>>>,
    /// (sp, d1) -> (exit, d2) -> jump function through the callee
    end_summary: EdgeTable<I::Node, EdgeFnOf<I, P>>,
    /// (call site, d) -> (return site, d') -> call ; callee ; return
    summary_functions: EdgeTable<I::Node, EdgeFnOf<I, P>>,
    worklist: VecDeque<PathEdge<I::Node>>,
    seeds: Vec<(I::Node, FactId)>,
    recorder: Option<EdgeRecorder<I::Node, FactOf<I, P>>>,
    stats: IdeStatistics,
}

impl<'a, I, P> IdeSolver<'a, I, P>
where
    I: Icfg,
    P: IdeProblem<I>,
{
    pub fn new(problem: P, icfg: &'a I) -> Self {
        let mut facts = Interner::new();
        facts.intern(&problem.zero_value());
        Self {
            icfg,
            problem,
            special: SpecialSummaries::new(),
            facts,
            jump_functions: JumpFunctions::new(),
            incoming: FxHashMap::default(),
            end_summary: FxHashMap::default(),
            summary_functions: FxHashMap::default(),
            worklist: VecDeque::new(),
            seeds: Vec::new(),
            recorder: None,
            stats: IdeStatistics::default(),
        }
    }

    /// Use hand-written summaries for the listed callees; values cross them
    /// with the call-to-return edge function
    pub fn with_special_summaries(
        mut self,
        special: SpecialSummaries<I::Method, FactOf<I, P>>,
    ) -> Self {
        self.special = special;
        self
    }

    pub fn with_edge_recording(mut self, enabled: bool) -> Self {
        self.recorder = enabled.then(EdgeRecorder::new);
        self
    }

    pub fn solve(
        mut self,
    ) -> IdeResults<I::Node, I::Method, FactOf<I, P>, ValueOf<I, P>, EdgeFnOf<I, P>> {
        let start_time = Instant::now();

        self.seed();
        while let Some(edge) = self.worklist.pop_front() {
            self.stats.num_iterations += 1;
            self.process(edge);
        }
        tracing::debug!(
            jump_functions = self.jump_functions.len(),
            "IDE phase I (jump functions) done"
        );

        let start_values = self.compute_start_values();

        self.stats.num_jump_functions = self.jump_functions.len();
        self.stats.num_facts = self.facts.len();
        self.stats.num_summary_functions =
            self.summary_functions.values().map(FxHashMap::len).sum();
        self.stats.analysis_time_ms = start_time.elapsed().as_millis() as u64;

        tracing::info!(
            jump_functions = self.stats.num_jump_functions,
            summary_functions = self.stats.num_summary_functions,
            summary_reuses = self.stats.num_summary_reuses,
            iterations = self.stats.num_iterations,
            elapsed_ms = self.stats.analysis_time_ms,
            "IDE solver reached fixpoint"
        );

        let mut node_methods = FxHashMap::default();
        for node in self.jump_functions.targets() {
            node_methods.insert(*node, self.icfg.method_of(*node));
        }

        IdeResults::new(
            self.facts,
            self.jump_functions,
            node_methods,
            start_values,
            IdeValues::<I>::top_value(&self.problem),
            self.stats,
            self.recorder,
        )
    }

    fn seed(&mut self) {
        let mut seeds: Vec<_> = self.problem.initial_seeds().into_iter().collect();
        seeds.sort_by(|a, b| a.0.cmp(&b.0));
        for (node, facts) in seeds {
            for fact in facts {
                let id = self.facts.intern(&fact);
                self.seeds.push((node, id));
                self.propagate(id, node, id, identity_fn::<I, P>());
            }
        }
    }

    fn process(&mut self, edge: PathEdge<I::Node>) {
        if self.icfg.is_call(edge.target) {
            self.process_call(edge);
            return;
        }
        if self.icfg.is_exit(edge.target) {
            self.process_exit(edge);
        }
        self.process_normal(edge);
    }

    fn jump_function(&self, d1: FactId, n: I::Node, d2: FactId) -> EdgeFnOf<I, P> {
        self.jump_functions
            .get(d1, n, d2)
            .cloned()
            .unwrap_or_else(all_top_fn::<I, P>)
    }

    fn process_normal(&mut self, edge: PathEdge<I::Node>) {
        let PathEdge {
            source: d1,
            target: n,
            fact: d2,
        } = edge;
        let jump = self.jump_function(d1, n, d2);
        let fact = self.facts.resolve(d2).clone();

        for succ in self.icfg.successors_of(n) {
            let targets = self.problem.normal_flow(n, succ).compute(&fact);
            self.record(n, succ, EdgeKind::Normal, &fact, &targets);
            for target in targets {
                let step = self.problem.normal_edge_function(n, &fact, succ, &target);
                let d3 = self.facts.intern(&target);
                self.propagate(d1, succ, d3, jump.compose_with(&step));
            }
        }
    }

    fn process_call(&mut self, edge: PathEdge<I::Node>) {
        let PathEdge {
            source: d1,
            target: n,
            fact: d2,
        } = edge;
        let jump = self.jump_function(d1, n, d2);
        let fact = self.facts.resolve(d2).clone();
        let return_sites = self.icfg.return_sites_of_call_at(n);

        for callee in self.icfg.callees_of_call_at(n) {
            let special_targets = self.special.get(callee).map(|summary| summary.compute(&fact));
            if let Some(targets) = special_targets {
                for &return_site in &return_sites {
                    self.record(n, return_site, EdgeKind::CallToReturn, &fact, &targets);
                    for target in &targets {
                        let step = self
                            .problem
                            .call_to_return_edge_function(n, &fact, return_site, target);
                        let d3 = self.facts.intern(target);
                        self.propagate(d1, return_site, d3, jump.compose_with(&step));
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
                    self.propagate(d3, start, d3, identity_fn::<I, P>());

                    self.incoming
                        .entry((start, d3))
                        .or_default()
                        .entry(n)
                        .or_default()
                        .insert(d2);

                    let ends: Vec<((I::Node, FactId), EdgeFnOf<I, P>)> =
                        match self.end_summary.get(&(start, d3)) {
                            Some(ends) if !ends.is_empty() => {
                                ends.iter().map(|(k, f)| (*k, f.clone())).collect()
                            }
                            _ => continue,
                        };
                    self.stats.num_summary_reuses += 1;

                    let call_fn = self.problem.call_edge_function(n, &fact, callee, entry_fact);
                    for ((exit, d4), callee_fn) in ends {
                        let exit_fact = self.facts.resolve(d4).clone();
                        for &return_site in &return_sites {
                            let targets = self
                                .problem
                                .return_flow(n, callee, exit, return_site)
                                .compute(&exit_fact);
                            self.record(exit, return_site, EdgeKind::Return, &exit_fact, &targets);
                            for target in &targets {
                                let return_fn = self.problem.return_edge_function(
                                    n,
                                    callee,
                                    exit,
                                    &exit_fact,
                                    return_site,
                                    target,
                                );
                                let summary =
                                    call_fn.compose_with(&callee_fn).compose_with(&return_fn);
                                let d5 = self.facts.intern(target);
                                self.add_summary(n, d2, return_site, d5, &summary);
                                self.propagate(d1, return_site, d5, jump.compose_with(&summary));
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
            for target in targets {
                let step = self
                    .problem
                    .call_to_return_edge_function(n, &fact, return_site, &target);
                let d3 = self.facts.intern(&target);
                self.propagate(d1, return_site, d3, jump.compose_with(&step));
            }
        }
    }

    fn process_exit(&mut self, edge: PathEdge<I::Node>) {
        let PathEdge {
            source: d1,
            target: exit,
            fact: d2,
        } = edge;
        let callee_fn = self.jump_function(d1, exit, d2);
        let method = self.icfg.method_of(exit);
        let exit_fact = self.facts.resolve(d2).clone();
        let entry_fact = self.facts.resolve(d1).clone();

        for start in self.icfg.start_points_of(method) {
            self.end_summary
                .entry((start, d1))
                .or_default()
                .insert((exit, d2), callee_fn.clone());

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
                        let return_fn = self.problem.return_edge_function(
                            call_site,
                            method,
                            exit,
                            &exit_fact,
                            return_site,
                            target,
                        );
                        let d5 = self.facts.intern(target);

                        for &d4 in &call_facts {
                            let call_fact = self.facts.resolve(d4).clone();
                            let call_fn = self.problem.call_edge_function(
                                call_site,
                                &call_fact,
                                method,
                                &entry_fact,
                            );
                            let summary =
                                call_fn.compose_with(&callee_fn).compose_with(&return_fn);
                            self.add_summary(call_site, d4, return_site, d5, &summary);

                            let caller_jumps: Vec<(FactId, EdgeFnOf<I, P>)> = self
                                .jump_functions
                                .reverse_lookup(call_site, d4)
                                .map(|by_source| {
                                    by_source.iter().map(|(d0, f)| (*d0, f.clone())).collect()
                                })
                                .unwrap_or_default();
                            for (d0, caller_fn) in caller_jumps {
                                self.propagate(
                                    d0,
                                    return_site,
                                    d5,
                                    caller_fn.compose_with(&summary),
                                );
                            }
                        }
                    }
                }
            }
        }
    }

    /// Join `function` into the jump function <d1> -> <n, d2>; requeue on change
    fn propagate(&mut self, d1: FactId, n: I::Node, d2: FactId, function: EdgeFnOf<I, P>) {
        let old = self.jump_function(d1, n, d2);
        let joined = old.join_with(&function);
        if joined != old {
            self.stats.num_propagations += 1;
            self.jump_functions.add_function(d1, n, d2, joined);
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
        function: &EdgeFnOf<I, P>,
    ) {
        let entry = self
            .summary_functions
            .entry((call_site, d_call))
            .or_default()
            .entry((return_site, d_ret))
            .or_insert_with(all_top_fn::<I, P>);
        *entry = entry.join_with(function);
    }

    /// Phase II (i): value of every (method, entry fact), joined over all
    /// seeds and call sites reaching it
    fn compute_start_values(&mut self) -> FxHashMap<(I::Method, FactId), ValueOf<I, P>> {
        let mut start_values: FxHashMap<(I::Method, FactId), ValueOf<I, P>> =
            FxHashMap::default();
        let mut call_values: FxHashMap<(I::Node, FactId), ValueOf<I, P>> = FxHashMap::default();
        let mut worklist: VecDeque<(I::Method, FactId)> = VecDeque::new();

        for (node, d) in self.seeds.clone() {
            let fact = self.facts.resolve(d).clone();
            let value = self.problem.initial_seed_value(node, &fact);
            let method = self.icfg.method_of(node);
            if self.join_into(&mut start_values, (method, d), &value) {
                worklist.push_back((method, d));
            }
        }

        while let Some((method, d1)) = worklist.pop_front() {
            self.stats.num_value_computations += 1;
            let entry_value = match start_values.get(&(method, d1)) {
                Some(value) => value.clone(),
                None => continue,
            };

            for call_site in self.icfg.call_sites_within(method) {
                let reached: Vec<(FactId, EdgeFnOf<I, P>)> = self
                    .jump_functions
                    .forward_lookup(d1, call_site)
                    .map(|by_fact| by_fact.iter().map(|(d2, f)| (*d2, f.clone())).collect())
                    .unwrap_or_default();

                for (d2, jump) in reached {
                    let value = jump.compute_target(&entry_value);
                    if !self.join_into(&mut call_values, (call_site, d2), &value) {
                        continue;
                    }
                    let call_value = match call_values.get(&(call_site, d2)) {
                        Some(value) => value.clone(),
                        None => continue,
                    };
                    let call_fact = self.facts.resolve(d2).clone();

                    for callee in self.icfg.callees_of_call_at(call_site) {
                        if self.special.contains(callee) {
                            continue;
                        }
                        let start_points = self.icfg.start_points_of(callee);
                        if start_points.is_empty() {
                            continue;
                        }
                        let entry_facts =
                            self.problem.call_flow(call_site, callee).compute(&call_fact);
                        for entry_fact in entry_facts {
                            let call_fn = self.problem.call_edge_function(
                                call_site,
                                &call_fact,
                                callee,
                                &entry_fact,
                            );
                            let d3 = self.facts.intern(&entry_fact);
                            let value = call_fn.compute_target(&call_value);
                            if self.join_into(&mut start_values, (callee, d3), &value) {
                                worklist.push_back((callee, d3));
                            }
                        }
                    }
                }
            }
        }

        start_values
    }

    /// Join `value` into `table[key]`; true if the stored value changed
    fn join_into<K: Copy + Eq + Hash>(
        &self,
        table: &mut FxHashMap<K, ValueOf<I, P>>,
        key: K,
        value: &ValueOf<I, P>,
    ) -> bool {
        let old = table
            .get(&key)
            .cloned()
            .unwrap_or_else(|| IdeValues::<I>::top_value(&self.problem));
        let joined = IdeValues::<I>::join_values(&self.problem, &old, value);
        if table.contains_key(&key) && joined == old {
            return false;
        }
        table.insert(key, joined);
        true
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
}
