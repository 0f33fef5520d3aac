//! IFDS uninitialized-variable analysis
//!
//! `alloca x` makes x uninitialized; a definition from initialized operands
//! clears it, a definition computed from an uninitialized operand keeps the
//! destination uninitialized. Uninitialized arguments make the bound
//! parameters uninitialized in the callee.

use rustc_hash::FxHashMap;
use std::collections::HashSet;
use std::fmt;

use super::{bind_arguments, call_parts, returned_var, Finding, Variable};
use crate::features::ifds::{lambda_flow, DataflowFact, FlowFn, IfdsProblem, IfdsResults};
use crate::features::ir::Instruction;
use crate::features::supergraph::{FunctionId, Icfg, PointId, ProgramIcfg};

#[derive(Clone, PartialEq, Eq, Hash)]
pub enum UninitFact {
    Zero,
    Uninit(Variable),
}

impl DataflowFact for UninitFact {
    fn is_zero(&self) -> bool {
        matches!(self, UninitFact::Zero)
    }

    fn zero() -> Self {
        UninitFact::Zero
    }
}

impl fmt::Debug for UninitFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UninitFact::Zero => write!(f, "Λ"),
            UninitFact::Uninit(var) => write!(f, "Uninit({})", var),
        }
    }
}

pub struct IfdsUninitializedVariables<'a> {
    icfg: &'a ProgramIcfg,
    entry_points: Vec<String>,
}

impl<'a> IfdsUninitializedVariables<'a> {
    pub fn new(icfg: &'a ProgramIcfg, entry_points: &[String]) -> Self {
        Self {
            icfg,
            entry_points: entry_points.to_vec(),
        }
    }

    fn step(&self, curr: PointId, fact: &UninitFact) -> HashSet<UninitFact> {
        let instruction = self.icfg.instruction_at(curr);
        let mut out = HashSet::new();

        match (fact, instruction) {
            (UninitFact::Zero, Instruction::Alloca { var }) => {
                out.insert(UninitFact::Zero);
                out.insert(UninitFact::Uninit(Variable::at(self.icfg, curr, var)));
            }
            (UninitFact::Zero, _) => {
                out.insert(UninitFact::Zero);
            }
            (UninitFact::Uninit(var), Instruction::Alloca { .. }) => {
                out.insert(UninitFact::Uninit(var.clone()));
            }
            (UninitFact::Uninit(var), _) => {
                let defined = instruction.defined_var();
                if defined != Some(var.name.as_str()) {
                    out.insert(fact.clone());
                }
                if let Some(dst) = defined {
                    if instruction.used_vars().contains(&var.name.as_str()) {
                        out.insert(UninitFact::Uninit(Variable::at(self.icfg, curr, dst)));
                    }
                }
            }
        }
        out
    }
}

impl IfdsProblem<ProgramIcfg> for IfdsUninitializedVariables<'_> {
    type Fact = UninitFact;

    fn initial_seeds(&self) -> FxHashMap<PointId, HashSet<UninitFact>> {
        self.entry_points
            .iter()
            .filter_map(|name| self.icfg.entry_of(name))
            .map(|entry| (entry, HashSet::from([UninitFact::Zero])))
            .collect()
    }

    fn normal_flow(&self, curr: PointId, _succ: PointId) -> FlowFn<'_, UninitFact> {
        lambda_flow(move |fact: &UninitFact| self.step(curr, fact))
    }

    fn call_flow(&self, call_site: PointId, callee: FunctionId) -> FlowFn<'_, UninitFact> {
        let bindings = bind_arguments(self.icfg, call_site, callee);
        lambda_flow(move |fact: &UninitFact| match fact {
            UninitFact::Zero => HashSet::from([UninitFact::Zero]),
            UninitFact::Uninit(var) => bindings
                .iter()
                .filter(|(arg, _)| *arg == var.name)
                .map(|(_, param)| UninitFact::Uninit(Variable::of(self.icfg, callee, param)))
                .collect(),
        })
    }

    fn return_flow(
        &self,
        call_site: PointId,
        _callee: FunctionId,
        exit: PointId,
        _return_site: PointId,
    ) -> FlowFn<'_, UninitFact> {
        let (dst, _) = call_parts(self.icfg, call_site);
        let returned = returned_var(self.icfg, exit);
        lambda_flow(move |fact: &UninitFact| match (fact, dst, returned) {
            (UninitFact::Zero, _, _) => HashSet::from([UninitFact::Zero]),
            (UninitFact::Uninit(var), Some(dst), Some(returned)) if var.name == returned => {
                HashSet::from([UninitFact::Uninit(Variable::at(self.icfg, call_site, dst))])
            }
            _ => HashSet::new(),
        })
    }

    fn call_to_return_flow(
        &self,
        call_site: PointId,
        _return_site: PointId,
    ) -> FlowFn<'_, UninitFact> {
        let (dst, _) = call_parts(self.icfg, call_site);
        lambda_flow(move |fact: &UninitFact| match fact {
            UninitFact::Uninit(var) if Some(var.name.as_str()) == dst => HashSet::new(),
            _ => HashSet::from([fact.clone()]),
        })
    }
}

/// Reads of possibly uninitialized variables
pub fn uninitialized_findings(
    icfg: &ProgramIcfg,
    results: &IfdsResults<PointId, UninitFact>,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    for point in icfg.all_nodes() {
        for name in icfg.instruction_at(point).used_vars() {
            let var = Variable::at(icfg, point, name);
            if results.holds_at(point, &UninitFact::Uninit(var.clone())) {
                findings.push(Finding::new(
                    "uninitialized-use",
                    icfg,
                    point,
                    format!("'{}' may be used uninitialized", var),
                ));
            }
        }
    }
    findings
}
