/*
 * Interprocedural Monotone Solver
 *
 * Same per-point fixpoint as the intraprocedural solver, threaded through
 * the ICFG:
 *
 *   call site  -> callee start points   (call_transfer)
 *   call site  -> return sites          (call_to_return_transfer)
 *   exit       -> return sites of every reached caller (return_transfer)
 *   other      -> successors            (normal_transfer)
 *
 * Context-insensitive: a callee has one value per point, joined over all
 * callers, and its exit value flows back to every caller. Values arriving
 * at a point are accumulated with join, so each point's value only moves
 * down the lattice.
 */

use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::time::Instant;

use super::problem::InterMonotoneProblem;
use super::results::{MonotoneResults, MonotoneStatistics};
use crate::features::lattice::Lattice;
use crate::features::supergraph::Icfg;

type ValueOf<I, P> = <P as InterMonotoneProblem<I>>::Value;

pub struct InterMonotoneSolver<'a, I, P>
where
    I: Icfg,
    P: InterMonotoneProblem<I>,
{
    icfg: &'a I,
    problem: P,
    before: FxHashMap<I::Node, ValueOf<I, P>>,
    after: FxHashMap<I::Node, ValueOf<I, P>>,
    worklist: VecDeque<I::Node>,
    queued: FxHashSet<I::Node>,
    stats: MonotoneStatistics,
}

impl<'a, I, P> InterMonotoneSolver<'a, I, P>
where
    I: Icfg,
    P: InterMonotoneProblem<I>,
{
    pub fn new(problem: P, icfg: &'a I) -> Self {
        Self {
            icfg,
            problem,
            before: FxHashMap::default(),
            after: FxHashMap::default(),
            worklist: VecDeque::new(),
            queued: FxHashSet::default(),
            stats: MonotoneStatistics::default(),
        }
    }

    pub fn solve(mut self) -> MonotoneResults<I::Node, ValueOf<I, P>> {
        let start_time = Instant::now();

        let mut seeds = self.problem.initial_values();
        seeds.sort_by(|a, b| a.0.cmp(&b.0));
        for (node, value) in seeds {
            self.flow_into(node, &value);
        }

        while let Some(node) = self.worklist.pop_front() {
            self.queued.remove(&node);
            self.stats.num_iterations += 1;
            let input = match self.before.get(&node) {
                Some(value) => value.clone(),
                None => continue,
            };

            if self.icfg.is_call(node) {
                self.process_call(node, &input);
            } else {
                self.process_normal(node, &input);
            }
        }

        self.stats.num_points = self.before.len();
        self.stats.analysis_time_ms = start_time.elapsed().as_millis() as u64;
        tracing::info!(
            points = self.stats.num_points,
            iterations = self.stats.num_iterations,
            transfers = self.stats.num_transfers,
            "interprocedural monotone solver reached fixpoint"
        );

        MonotoneResults::new(self.before, self.after, self.stats)
    }

    fn process_call(&mut self, call_site: I::Node, input: &ValueOf<I, P>) {
        self.after.insert(call_site, input.clone());
        let return_sites = self.icfg.return_sites_of_call_at(call_site);

        for callee in self.icfg.callees_of_call_at(call_site) {
            let start_points = self.icfg.start_points_of(callee);
            if start_points.is_empty() {
                continue;
            }
            let entry = self.problem.call_transfer(call_site, callee, input);
            self.stats.num_transfers += 1;
            for start in start_points {
                self.flow_into(start, &entry);
            }

            // The callee may already have been analyzed for another caller
            for exit in self.icfg.exit_points_of(callee) {
                let exit_value = match self.after.get(&exit) {
                    Some(value) => value.clone(),
                    None => continue,
                };
                for &return_site in &return_sites {
                    let value = self.problem.return_transfer(
                        call_site,
                        callee,
                        exit,
                        return_site,
                        &exit_value,
                    );
                    self.stats.num_transfers += 1;
                    self.flow_into(return_site, &value);
                }
            }
        }

        for return_site in return_sites {
            let value = self
                .problem
                .call_to_return_transfer(call_site, return_site, input);
            self.stats.num_transfers += 1;
            self.flow_into(return_site, &value);
        }
    }

    fn process_normal(&mut self, node: I::Node, input: &ValueOf<I, P>) {
        let output = self.problem.normal_transfer(node, input);
        self.stats.num_transfers += 1;
        if self.after.get(&node) == Some(&output) {
            return;
        }
        self.after.insert(node, output.clone());

        for succ in self.icfg.successors_of(node) {
            self.flow_into(succ, &output);
        }

        if self.icfg.is_exit(node) {
            let method = self.icfg.method_of(node);
            for call_site in self.icfg.callers_of(method) {
                if !self.before.contains_key(&call_site) {
                    continue;
                }
                for return_site in self.icfg.return_sites_of_call_at(call_site) {
                    let value = self.problem.return_transfer(
                        call_site,
                        method,
                        node,
                        return_site,
                        &output,
                    );
                    self.stats.num_transfers += 1;
                    self.flow_into(return_site, &value);
                }
            }
        }
    }

    /// Join `value` into the value reaching `node`; requeue on change
    fn flow_into(&mut self, node: I::Node, value: &ValueOf<I, P>) {
        let joined = match self.before.get(&node) {
            Some(old) => {
                let joined = old.join(value);
                if joined == *old {
                    return;
                }
                joined
            }
            None => value.clone(),
        };
        self.before.insert(node, joined);
        if self.queued.insert(node) {
            self.worklist.push_back(node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::ir::{Function, Instruction, Program};
    use crate::features::lattice::SetLattice;
    use crate::features::supergraph::{FunctionId, PointId, ProgramIcfg};

    /// Collects the names of the functions whose code was executed
    struct Touched<'a> {
        icfg: &'a ProgramIcfg,
    }

    impl InterMonotoneProblem<ProgramIcfg> for Touched<'_> {
        type Value = SetLattice<String>;

        fn initial_values(&self) -> Vec<(PointId, SetLattice<String>)> {
            self.icfg
                .entry_of("main")
                .map(|entry| (entry, SetLattice::new()))
                .into_iter()
                .collect()
        }

        fn normal_transfer(&self, node: PointId, input: &SetLattice<String>) -> SetLattice<String> {
            let mut out = input.clone();
            out.insert(self.icfg.method_name(self.icfg.method_of(node)));
            out
        }

        fn call_transfer(
            &self,
            _call_site: PointId,
            _callee: FunctionId,
            input: &SetLattice<String>,
        ) -> SetLattice<String> {
            input.clone()
        }

        fn return_transfer(
            &self,
            _call_site: PointId,
            _callee: FunctionId,
            _exit: PointId,
            _return_site: PointId,
            exit_value: &SetLattice<String>,
        ) -> SetLattice<String> {
            exit_value.clone()
        }

        fn call_to_return_transfer(
            &self,
            _call_site: PointId,
            _return_site: PointId,
            input: &SetLattice<String>,
        ) -> SetLattice<String> {
            input.clone()
        }
    }

    #[test]
    fn test_values_flow_through_callee() {
        let program = Program::new("calls")
            .with_function(Function::new("main").body(vec![
                Instruction::Nop,
                Instruction::call(None, "helper", Vec::<String>::new()),
                Instruction::call(None, "puts", Vec::<String>::new()),
                Instruction::ret(None),
            ]))
            .with_function(Function::new("helper").body(vec![Instruction::ret(None)]))
            .with_function(Function::new("puts"));
        let icfg = ProgramIcfg::build(&program).unwrap();
        let results = InterMonotoneSolver::new(Touched { icfg: &icfg }, &icfg).solve();

        let helper_entry = icfg.entry_of("helper").unwrap();
        assert_eq!(results.value_at(helper_entry), SetLattice::from_iter(["main".to_string()]));

        let after_helper = icfg.point_at("main", 2).unwrap();
        assert!(results.value_at(after_helper).contains(&"helper".to_string()));

        // external callee: only the call-to-return path reaches the exit
        let exit = icfg.point_at("main", 3).unwrap();
        assert!(results.is_reached(exit));
    }
}
