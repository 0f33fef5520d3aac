//! IFDS type analysis
//!
//! Tracks which allocated types (`new T`) a variable may hold. Copies
//! propagate types; any other definition drops them.

use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use super::{bind_arguments, call_parts, returned_var, Finding, Variable};
use crate::features::ifds::{lambda_flow, DataflowFact, FlowFn, IfdsProblem, IfdsResults};
use crate::features::ir::{Instruction, Operand};
use crate::features::supergraph::{FunctionId, Icfg, PointId, ProgramIcfg};

#[derive(Clone, PartialEq, Eq, Hash)]
pub enum TypeFact {
    Zero,
    HasType(Variable, String),
}

impl DataflowFact for TypeFact {
    fn is_zero(&self) -> bool {
        matches!(self, TypeFact::Zero)
    }

    fn zero() -> Self {
        TypeFact::Zero
    }
}

impl fmt::Debug for TypeFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeFact::Zero => write!(f, "Λ"),
            TypeFact::HasType(var, ty) => write!(f, "{}: {}", var, ty),
        }
    }
}

pub struct IfdsTypeAnalysis<'a> {
    icfg: &'a ProgramIcfg,
    entry_points: Vec<String>,
}

impl<'a> IfdsTypeAnalysis<'a> {
    pub fn new(icfg: &'a ProgramIcfg, entry_points: &[String]) -> Self {
        Self {
            icfg,
            entry_points: entry_points.to_vec(),
        }
    }

    fn step(&self, curr: PointId, fact: &TypeFact) -> HashSet<TypeFact> {
        let instruction = self.icfg.instruction_at(curr);
        let mut out = HashSet::new();

        match fact {
            TypeFact::Zero => {
                out.insert(TypeFact::Zero);
                if let Instruction::New { dst, ty } = instruction {
                    out.insert(TypeFact::HasType(
                        Variable::at(self.icfg, curr, dst),
                        ty.clone(),
                    ));
                }
            }
            TypeFact::HasType(var, ty) => {
                let defined = instruction.defined_var();
                if defined != Some(var.name.as_str()) {
                    out.insert(fact.clone());
                }
                if let Instruction::Assign {
                    dst,
                    src: Operand::Var(src),
                } = instruction
                {
                    if *src == var.name {
                        out.insert(TypeFact::HasType(
                            Variable::at(self.icfg, curr, dst),
                            ty.clone(),
                        ));
                    }
                }
            }
        }
        out
    }
}

impl IfdsProblem<ProgramIcfg> for IfdsTypeAnalysis<'_> {
    type Fact = TypeFact;

    fn initial_seeds(&self) -> FxHashMap<PointId, HashSet<TypeFact>> {
        self.entry_points
            .iter()
            .filter_map(|name| self.icfg.entry_of(name))
            .map(|entry| (entry, HashSet::from([TypeFact::Zero])))
            .collect()
    }

    fn normal_flow(&self, curr: PointId, _succ: PointId) -> FlowFn<'_, TypeFact> {
        lambda_flow(move |fact: &TypeFact| self.step(curr, fact))
    }

    fn call_flow(&self, call_site: PointId, callee: FunctionId) -> FlowFn<'_, TypeFact> {
        let bindings = bind_arguments(self.icfg, call_site, callee);
        lambda_flow(move |fact: &TypeFact| match fact {
            TypeFact::Zero => HashSet::from([TypeFact::Zero]),
            TypeFact::HasType(var, ty) => bindings
                .iter()
                .filter(|(arg, _)| *arg == var.name)
                .map(|(_, param)| {
                    TypeFact::HasType(Variable::of(self.icfg, callee, param), ty.clone())
                })
                .collect(),
        })
    }

    fn return_flow(
        &self,
        call_site: PointId,
        _callee: FunctionId,
        exit: PointId,
        _return_site: PointId,
    ) -> FlowFn<'_, TypeFact> {
        let (dst, _) = call_parts(self.icfg, call_site);
        let returned = returned_var(self.icfg, exit);
        lambda_flow(move |fact: &TypeFact| match (fact, dst, returned) {
            (TypeFact::Zero, _, _) => HashSet::from([TypeFact::Zero]),
            (TypeFact::HasType(var, ty), Some(dst), Some(returned)) if var.name == returned => {
                HashSet::from([TypeFact::HasType(
                    Variable::at(self.icfg, call_site, dst),
                    ty.clone(),
                )])
            }
            _ => HashSet::new(),
        })
    }

    fn call_to_return_flow(
        &self,
        call_site: PointId,
        _return_site: PointId,
    ) -> FlowFn<'_, TypeFact> {
        let (dst, _) = call_parts(self.icfg, call_site);
        lambda_flow(move |fact: &TypeFact| match fact {
            TypeFact::HasType(var, _) if Some(var.name.as_str()) == dst => HashSet::new(),
            _ => HashSet::from([fact.clone()]),
        })
    }
}

/// Possible types of every variable at each function exit
pub fn type_findings(icfg: &ProgramIcfg, results: &IfdsResults<PointId, TypeFact>) -> Vec<Finding> {
    let mut findings = Vec::new();
    for method in icfg.methods() {
        for exit in icfg.exit_points_of(method) {
            let mut types: BTreeMap<Variable, BTreeSet<String>> = BTreeMap::new();
            for fact in results.facts_at(exit) {
                if let TypeFact::HasType(var, ty) = fact {
                    types.entry(var).or_default().insert(ty);
                }
            }
            for (var, tys) in types {
                let tys: Vec<String> = tys.into_iter().collect();
                findings.push(Finding::new(
                    "possible-types",
                    icfg,
                    exit,
                    format!("'{}' may hold {}", var, tys.join(" | ")),
                ));
            }
        }
    }
    findings
}
