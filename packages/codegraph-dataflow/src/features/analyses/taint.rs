//! IFDS taint analysis
//!
//! `source()` taints its destination, assignments and arithmetic propagate
//! taint, `sanitize()` produces a clean value and any redefinition kills
//! taint. A leak is a tainted variable reaching a `sink`.

use rustc_hash::FxHashMap;
use std::collections::HashSet;
use std::fmt;

use super::{bind_arguments, call_parts, returned_var, value_sources, Finding, Variable};
use crate::features::ifds::{lambda_flow, DataflowFact, FlowFn, IfdsProblem, IfdsResults};
use crate::features::ir::{Instruction, Operand};
use crate::features::supergraph::{FunctionId, Icfg, PointId, ProgramIcfg};

#[derive(Clone, PartialEq, Eq, Hash)]
pub enum TaintFact {
    Zero,
    Tainted(Variable),
}

impl DataflowFact for TaintFact {
    fn is_zero(&self) -> bool {
        matches!(self, TaintFact::Zero)
    }

    fn zero() -> Self {
        TaintFact::Zero
    }
}

impl fmt::Debug for TaintFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaintFact::Zero => write!(f, "Λ"),
            TaintFact::Tainted(var) => write!(f, "Tainted({})", var),
        }
    }
}

pub struct IfdsTaintProblem<'a> {
    icfg: &'a ProgramIcfg,
    entry_points: Vec<String>,
}

impl<'a> IfdsTaintProblem<'a> {
    pub fn new(icfg: &'a ProgramIcfg, entry_points: &[String]) -> Self {
        Self {
            icfg,
            entry_points: entry_points.to_vec(),
        }
    }

    pub fn icfg(&self) -> &'a ProgramIcfg {
        self.icfg
    }

    /// Normal flow of `fact` across the instruction at `curr`
    pub(crate) fn step(&self, curr: PointId, fact: &TaintFact) -> HashSet<TaintFact> {
        let instruction = self.icfg.instruction_at(curr);
        let defined = instruction.defined_var();
        let mut out = HashSet::new();

        match fact {
            TaintFact::Zero => {
                out.insert(TaintFact::Zero);
                if let Instruction::Source { dst } = instruction {
                    out.insert(TaintFact::Tainted(Variable::at(self.icfg, curr, dst)));
                }
            }
            TaintFact::Tainted(var) => {
                if defined != Some(var.name.as_str()) {
                    out.insert(fact.clone());
                }
                if let Some(dst) = defined {
                    if value_sources(instruction).contains(&var.name.as_str()) {
                        out.insert(TaintFact::Tainted(Variable::at(self.icfg, curr, dst)));
                    }
                }
            }
        }
        out
    }
}

impl IfdsProblem<ProgramIcfg> for IfdsTaintProblem<'_> {
    type Fact = TaintFact;

    fn initial_seeds(&self) -> FxHashMap<PointId, HashSet<TaintFact>> {
        self.entry_points
            .iter()
            .filter_map(|name| self.icfg.entry_of(name))
            .map(|entry| (entry, HashSet::from([TaintFact::Zero])))
            .collect()
    }

    fn normal_flow(&self, curr: PointId, _succ: PointId) -> FlowFn<'_, TaintFact> {
        lambda_flow(move |fact: &TaintFact| self.step(curr, fact))
    }

    fn call_flow(&self, call_site: PointId, callee: FunctionId) -> FlowFn<'_, TaintFact> {
        let bindings = bind_arguments(self.icfg, call_site, callee);
        lambda_flow(move |fact: &TaintFact| match fact {
            TaintFact::Zero => HashSet::from([TaintFact::Zero]),
            TaintFact::Tainted(var) => bindings
                .iter()
                .filter(|(arg, _)| *arg == var.name)
                .map(|(_, param)| TaintFact::Tainted(Variable::of(self.icfg, callee, param)))
                .collect(),
        })
    }

    fn return_flow(
        &self,
        call_site: PointId,
        _callee: FunctionId,
        exit: PointId,
        _return_site: PointId,
    ) -> FlowFn<'_, TaintFact> {
        let (dst, _) = call_parts(self.icfg, call_site);
        let returned = returned_var(self.icfg, exit);
        lambda_flow(move |fact: &TaintFact| match (fact, dst, returned) {
            (TaintFact::Zero, _, _) => HashSet::from([TaintFact::Zero]),
            (TaintFact::Tainted(var), Some(dst), Some(returned)) if var.name == returned => {
                HashSet::from([TaintFact::Tainted(Variable::at(self.icfg, call_site, dst))])
            }
            _ => HashSet::new(),
        })
    }

    fn call_to_return_flow(
        &self,
        call_site: PointId,
        _return_site: PointId,
    ) -> FlowFn<'_, TaintFact> {
        let (dst, _) = call_parts(self.icfg, call_site);
        lambda_flow(move |fact: &TaintFact| match fact {
            TaintFact::Tainted(var) if Some(var.name.as_str()) == dst => HashSet::new(),
            _ => HashSet::from([fact.clone()]),
        })
    }
}

/// Tainted variable at the sink `point`, if any
pub(crate) fn leaked_variable(icfg: &ProgramIcfg, point: PointId) -> Option<Variable> {
    match icfg.instruction_at(point) {
        Instruction::Sink {
            arg: Operand::Var(name),
        } => Some(Variable::at(icfg, point, name)),
        _ => None,
    }
}

/// Sinks reached by a tainted value
pub fn taint_findings(
    icfg: &ProgramIcfg,
    results: &IfdsResults<PointId, TaintFact>,
) -> Vec<Finding> {
    icfg.all_nodes()
        .into_iter()
        .filter_map(|point| {
            let var = leaked_variable(icfg, point)?;
            results
                .holds_at(point, &TaintFact::Tainted(var.clone()))
                .then(|| {
                    Finding::new(
                        "taint-leak",
                        icfg,
                        point,
                        format!("tainted value '{}' reaches a sink", var),
                    )
                })
        })
        .collect()
}
