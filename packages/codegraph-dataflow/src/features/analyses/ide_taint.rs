//! IDE taint analysis
//!
//! Same facts and flow functions as the IFDS taint analysis; the value of a
//! tainted variable records where the taint came from. `Const(p)` means the
//! single source at point p, BOTTOM means several sources.

use rustc_hash::FxHashMap;
use std::collections::HashSet;

use super::taint::{leaked_variable, IfdsTaintProblem, TaintFact};
use super::Finding;
use crate::features::ide::{EdgeFn, IdeProblem, IdeResults};
use crate::features::ifds::{DataflowFact, FlowFn, IfdsProblem};
use crate::features::ir::Instruction;
use crate::features::lattice::ConstantLattice;
use crate::features::supergraph::{FunctionId, Icfg, PointId, ProgramIcfg};

/// Origin of a taint: the source point, if unique
pub type TaintOrigin = ConstantLattice<PointId>;

pub struct IdeTaintProblem<'a> {
    taint: IfdsTaintProblem<'a>,
}

impl<'a> IdeTaintProblem<'a> {
    pub fn new(icfg: &'a ProgramIcfg, entry_points: &[String]) -> Self {
        Self {
            taint: IfdsTaintProblem::new(icfg, entry_points),
        }
    }
}

impl IfdsProblem<ProgramIcfg> for IdeTaintProblem<'_> {
    type Fact = TaintFact;

    fn initial_seeds(&self) -> FxHashMap<PointId, HashSet<TaintFact>> {
        self.taint.initial_seeds()
    }

    fn normal_flow(&self, curr: PointId, succ: PointId) -> FlowFn<'_, TaintFact> {
        self.taint.normal_flow(curr, succ)
    }

    fn call_flow(&self, call_site: PointId, callee: FunctionId) -> FlowFn<'_, TaintFact> {
        self.taint.call_flow(call_site, callee)
    }

    fn return_flow(
        &self,
        call_site: PointId,
        callee: FunctionId,
        exit: PointId,
        return_site: PointId,
    ) -> FlowFn<'_, TaintFact> {
        self.taint.return_flow(call_site, callee, exit, return_site)
    }

    fn call_to_return_flow(
        &self,
        call_site: PointId,
        return_site: PointId,
    ) -> FlowFn<'_, TaintFact> {
        self.taint.call_to_return_flow(call_site, return_site)
    }
}

impl IdeProblem<ProgramIcfg> for IdeTaintProblem<'_> {
    type Value = TaintOrigin;
    type EdgeFn = EdgeFn<TaintOrigin>;

    fn normal_edge_function(
        &self,
        curr: PointId,
        curr_fact: &TaintFact,
        _succ: PointId,
        succ_fact: &TaintFact,
    ) -> EdgeFn<TaintOrigin> {
        let generated = curr_fact.is_zero()
            && matches!(succ_fact, TaintFact::Tainted(_))
            && matches!(
                self.taint.icfg().instruction_at(curr),
                Instruction::Source { .. }
            );
        if generated {
            EdgeFn::constant(ConstantLattice::Const(curr))
        } else {
            EdgeFn::Identity
        }
    }

    fn call_edge_function(
        &self,
        _call_site: PointId,
        _src_fact: &TaintFact,
        _callee: FunctionId,
        _dest_fact: &TaintFact,
    ) -> EdgeFn<TaintOrigin> {
        EdgeFn::Identity
    }

    fn return_edge_function(
        &self,
        _call_site: PointId,
        _callee: FunctionId,
        _exit: PointId,
        _exit_fact: &TaintFact,
        _return_site: PointId,
        _ret_fact: &TaintFact,
    ) -> EdgeFn<TaintOrigin> {
        EdgeFn::Identity
    }

    fn call_to_return_edge_function(
        &self,
        _call_site: PointId,
        _call_fact: &TaintFact,
        _return_site: PointId,
        _ret_fact: &TaintFact,
    ) -> EdgeFn<TaintOrigin> {
        EdgeFn::Identity
    }
}

/// Sinks reached by a tainted value, with the originating source
pub fn ide_taint_findings(
    icfg: &ProgramIcfg,
    results: &IdeResults<PointId, FunctionId, TaintFact, TaintOrigin, EdgeFn<TaintOrigin>>,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    for point in icfg.all_nodes() {
        let var = match leaked_variable(icfg, point) {
            Some(var) => var,
            None => continue,
        };
        let fact = TaintFact::Tainted(var.clone());
        if !results.facts_at(point).contains(&fact) {
            continue;
        }
        let origin = match results.value_at(point, &fact) {
            ConstantLattice::Const(source) => format!("source {}", icfg.node_label(source)),
            ConstantLattice::Bottom => "several sources".to_string(),
            ConstantLattice::Top => "an unknown source".to_string(),
        };
        findings.push(Finding::new(
            "taint-leak",
            icfg,
            point,
            format!("tainted value '{}' from {} reaches a sink", var, origin),
        ));
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::analyses::test_programs::taint_program;
    use crate::features::analyses::Variable;
    use crate::features::ide::IdeSolver;
    use crate::features::ir::{Function, Operand, Program};

    #[test]
    fn test_origin_tracked_through_call() {
        let icfg = ProgramIcfg::build(&taint_program()).unwrap();
        let problem = IdeTaintProblem::new(&icfg, &["main".to_string()]);
        let results = IdeSolver::new(problem, &icfg).solve();

        let source = icfg.point_at("main", 0).unwrap();
        let sink = icfg.point_at("main", 3).unwrap();
        let r = TaintFact::Tainted(Variable::new("main", "r"));
        assert_eq!(results.value_at(sink, &r), ConstantLattice::Const(source));

        let findings = ide_taint_findings(&icfg, &results);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("main#0: x = source()"));
    }

    #[test]
    fn test_two_sources_join_to_bottom() {
        // 0: a = source(); 1: br [2, 4]; 2: b = source(); 3: br [5]; 4: b = a; 5: sink(b)
        let program = Program::new("two").with_function(Function::new("main").body(vec![
            Instruction::source("a"),
            Instruction::branch(vec![2, 4]),
            Instruction::source("b"),
            Instruction::branch(vec![5]),
            Instruction::assign("b", Operand::var("a")),
            Instruction::sink("b"),
            Instruction::ret(None),
        ]));
        let icfg = ProgramIcfg::build(&program).unwrap();
        let problem = IdeTaintProblem::new(&icfg, &["main".to_string()]);
        let results = IdeSolver::new(problem, &icfg).solve();

        let sink = icfg.point_at("main", 5).unwrap();
        let b = TaintFact::Tainted(Variable::new("main", "b"));
        assert_eq!(results.value_at(sink, &b), ConstantLattice::Bottom);
    }
}
