/*
 * Intraprocedural Monotone Solver
 *
 * Kildall (1973) worklist iteration over one method:
 *
 *   in[n]  = entry (start points) ⊔ out[p] for every predecessor p
 *   out[n] = transfer(n, in[n])
 *
 * A node is revisited whenever one of its predecessors' out value changes.
 * Calls are ordinary nodes here: the transfer function decides what a
 * call does, nothing is propagated into callees.
 *
 * References:
 * - Kildall, G. (1973). "A Unified Approach to Global Program Optimization"
 * - Kam, J. & Ullman, J. (1977). "Monotone Data Flow Analysis Frameworks"
 */

use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::time::Instant;

use super::problem::IntraMonotoneProblem;
use super::results::{MonotoneResults, MonotoneStatistics};
use crate::features::lattice::Lattice;
use crate::features::supergraph::Icfg;

type ValueOf<I, P> = <P as IntraMonotoneProblem<I>>::Value;

pub struct IntraMonotoneSolver<'a, I, P>
where
    I: Icfg,
    P: IntraMonotoneProblem<I>,
{
    icfg: &'a I,
    problem: P,
    before: FxHashMap<I::Node, ValueOf<I, P>>,
    after: FxHashMap<I::Node, ValueOf<I, P>>,
    worklist: VecDeque<I::Node>,
    queued: FxHashSet<I::Node>,
    stats: MonotoneStatistics,
}

impl<'a, I, P> IntraMonotoneSolver<'a, I, P>
where
    I: Icfg,
    P: IntraMonotoneProblem<I>,
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
        let method = self.problem.method();

        for start in self.icfg.start_points_of(method) {
            self.enqueue(start);
        }

        while let Some(node) = self.worklist.pop_front() {
            self.queued.remove(&node);
            self.stats.num_iterations += 1;

            let mut input = if self.icfg.is_start_point(node) {
                self.problem.entry_value()
            } else {
                <ValueOf<I, P> as Lattice>::top()
            };
            for pred in self.icfg.predecessors_of(node) {
                if let Some(out) = self.after.get(&pred) {
                    input = input.join(out);
                }
            }

            let output = self.problem.transfer(node, &input);
            self.stats.num_transfers += 1;
            self.before.insert(node, input);

            if self.after.get(&node) != Some(&output) {
                self.after.insert(node, output);
                for succ in self.icfg.successors_of(node) {
                    self.enqueue(succ);
                }
            }
        }

        self.stats.num_points = self.before.len();
        self.stats.analysis_time_ms = start_time.elapsed().as_millis() as u64;
        tracing::info!(
            method = %self.icfg.method_name(method),
            points = self.stats.num_points,
            iterations = self.stats.num_iterations,
            "intraprocedural monotone solver reached fixpoint"
        );

        MonotoneResults::new(self.before, self.after, self.stats)
    }

    fn enqueue(&mut self, node: I::Node) {
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

    /// Collects the index of every visited instruction
    struct Visited<'a> {
        icfg: &'a ProgramIcfg,
        method: FunctionId,
    }

    impl IntraMonotoneProblem<ProgramIcfg> for Visited<'_> {
        type Value = SetLattice<usize>;

        fn method(&self) -> FunctionId {
            self.method
        }

        fn transfer(&self, node: PointId, input: &SetLattice<usize>) -> SetLattice<usize> {
            let mut out = input.clone();
            out.insert(self.icfg.node(node).index);
            out
        }
    }

    #[test]
    fn test_loop_reaches_fixpoint() {
        // 0 -> 1 -> 2 -> {1, 3}
        let program = Program::new("loop").with_function(Function::new("main").body(vec![
            Instruction::Nop,
            Instruction::Nop,
            Instruction::branch(vec![1, 3]),
            Instruction::ret(None),
        ]));
        let icfg = ProgramIcfg::build(&program).unwrap();
        let method = icfg.function_id("main").unwrap();
        let results = IntraMonotoneSolver::new(Visited { icfg: &icfg, method }, &icfg).solve();

        let header = icfg.point_at("main", 1).unwrap();
        let exit = icfg.point_at("main", 3).unwrap();
        assert_eq!(results.value_at(header), SetLattice::from_iter([0, 1, 2]));
        assert_eq!(results.value_after(exit), SetLattice::from_iter([0, 1, 2, 3]));
        assert_eq!(results.statistics().num_points, 4);
    }

    #[test]
    fn test_unreachable_point_stays_top() {
        let program = Program::new("dead").with_function(Function::new("main").body(vec![
            Instruction::branch(vec![2]),
            Instruction::Nop,
            Instruction::ret(None),
        ]));
        let icfg = ProgramIcfg::build(&program).unwrap();
        let method = icfg.function_id("main").unwrap();
        let results = IntraMonotoneSolver::new(Visited { icfg: &icfg, method }, &icfg).solve();

        let dead = icfg.point_at("main", 1).unwrap();
        assert!(!results.is_reached(dead));
        assert!(results.value_at(dead).is_top());
    }
}
