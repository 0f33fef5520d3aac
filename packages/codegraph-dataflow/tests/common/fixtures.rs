//! Fixture problems over program-wide ("global") variable names
//!
//! Facts are bare variable names shared by every function:
//! - `x = source()` generates `x`, `x = <const>` generates `x` with a value
//! - `alloca x` and any other definition of `x` kill it
//! - calls pass every fact into callees and back out unchanged
//! - facts only bypass a call when no callee has a body

use codegraph_dataflow::features::ide::{EdgeFn, IdeProblem};
use codegraph_dataflow::features::ifds::{lambda_flow, DataflowFact, FlowFn, IfdsProblem};
use codegraph_dataflow::features::ir::{Instruction, Operand};
use codegraph_dataflow::features::lattice::MinValue;
use codegraph_dataflow::features::supergraph::{FunctionId, Icfg, PointId, ProgramIcfg};
use rustc_hash::FxHashMap;
use std::collections::HashSet;
use std::fmt;

#[derive(Clone, PartialEq, Eq, Hash)]
pub enum GlobalFact {
    Zero,
    Var(String),
}

impl GlobalFact {
    pub fn var(name: &str) -> Self {
        GlobalFact::Var(name.to_string())
    }
}

impl DataflowFact for GlobalFact {
    fn is_zero(&self) -> bool {
        matches!(self, GlobalFact::Zero)
    }

    fn zero() -> Self {
        GlobalFact::Zero
    }
}

impl fmt::Debug for GlobalFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GlobalFact::Zero => write!(f, "Λ"),
            GlobalFact::Var(name) => write!(f, "{}", name),
        }
    }
}

/// IFDS gen/kill problem over global names, seeded at `main`
pub struct GlobalFacts<'a> {
    pub icfg: &'a ProgramIcfg,
}

impl<'a> GlobalFacts<'a> {
    pub fn new(icfg: &'a ProgramIcfg) -> Self {
        Self { icfg }
    }

    fn generated(&self, point: PointId) -> Option<&'a str> {
        match self.icfg.instruction_at(point) {
            Instruction::Source { dst } => Some(dst),
            Instruction::Assign {
                dst,
                src: Operand::Const(_),
            } => Some(dst),
            _ => None,
        }
    }

    fn has_body_callee(&self, call_site: PointId) -> bool {
        self.icfg
            .callees_of_call_at(call_site)
            .into_iter()
            .any(|callee| !self.icfg.start_points_of(callee).is_empty())
    }
}

impl IfdsProblem<ProgramIcfg> for GlobalFacts<'_> {
    type Fact = GlobalFact;

    fn initial_seeds(&self) -> FxHashMap<PointId, HashSet<GlobalFact>> {
        self.icfg
            .entry_of("main")
            .map(|entry| (entry, HashSet::from([GlobalFact::Zero])))
            .into_iter()
            .collect()
    }

    fn normal_flow(&self, curr: PointId, _succ: PointId) -> FlowFn<'_, GlobalFact> {
        let defined = self.icfg.instruction_at(curr).defined_var();
        let generated = self.generated(curr);
        lambda_flow(move |fact: &GlobalFact| match fact {
            GlobalFact::Zero => {
                let mut out = HashSet::from([GlobalFact::Zero]);
                if let Some(name) = generated {
                    out.insert(GlobalFact::var(name));
                }
                out
            }
            GlobalFact::Var(name) if Some(name.as_str()) == defined => HashSet::new(),
            _ => HashSet::from([fact.clone()]),
        })
    }

    fn call_flow(&self, _call_site: PointId, _callee: FunctionId) -> FlowFn<'_, GlobalFact> {
        lambda_flow(|fact: &GlobalFact| HashSet::from([fact.clone()]))
    }

    fn return_flow(
        &self,
        _call_site: PointId,
        _callee: FunctionId,
        _exit: PointId,
        _return_site: PointId,
    ) -> FlowFn<'_, GlobalFact> {
        lambda_flow(|fact: &GlobalFact| HashSet::from([fact.clone()]))
    }

    fn call_to_return_flow(
        &self,
        call_site: PointId,
        _return_site: PointId,
    ) -> FlowFn<'_, GlobalFact> {
        let bypass = !self.has_body_callee(call_site);
        lambda_flow(move |fact: &GlobalFact| {
            if bypass || fact.is_zero() {
                HashSet::from([fact.clone()])
            } else {
                HashSet::new()
            }
        })
    }
}

/// [`GlobalFacts`] with the smallest constant assigned on any path
pub struct GlobalMinConstant<'a> {
    pub facts: GlobalFacts<'a>,
    /// Give facts generated by `source()` the `AllTop` edge function
    pub top_sources: bool,
}

impl<'a> GlobalMinConstant<'a> {
    pub fn new(icfg: &'a ProgramIcfg) -> Self {
        Self {
            facts: GlobalFacts::new(icfg),
            top_sources: false,
        }
    }

    pub fn with_top_sources(mut self) -> Self {
        self.top_sources = true;
        self
    }
}

impl IfdsProblem<ProgramIcfg> for GlobalMinConstant<'_> {
    type Fact = GlobalFact;

    fn initial_seeds(&self) -> FxHashMap<PointId, HashSet<GlobalFact>> {
        self.facts.initial_seeds()
    }

    fn normal_flow(&self, curr: PointId, succ: PointId) -> FlowFn<'_, GlobalFact> {
        self.facts.normal_flow(curr, succ)
    }

    fn call_flow(&self, call_site: PointId, callee: FunctionId) -> FlowFn<'_, GlobalFact> {
        self.facts.call_flow(call_site, callee)
    }

    fn return_flow(
        &self,
        call_site: PointId,
        callee: FunctionId,
        exit: PointId,
        return_site: PointId,
    ) -> FlowFn<'_, GlobalFact> {
        self.facts.return_flow(call_site, callee, exit, return_site)
    }

    fn call_to_return_flow(
        &self,
        call_site: PointId,
        return_site: PointId,
    ) -> FlowFn<'_, GlobalFact> {
        self.facts.call_to_return_flow(call_site, return_site)
    }
}

impl IdeProblem<ProgramIcfg> for GlobalMinConstant<'_> {
    type Value = MinValue;
    type EdgeFn = EdgeFn<MinValue>;

    fn normal_edge_function(
        &self,
        curr: PointId,
        curr_fact: &GlobalFact,
        _succ: PointId,
        succ_fact: &GlobalFact,
    ) -> EdgeFn<MinValue> {
        match (curr_fact, self.facts.icfg.instruction_at(curr)) {
            (
                GlobalFact::Zero,
                Instruction::Assign {
                    src: Operand::Const(value),
                    ..
                },
            ) if !succ_fact.is_zero() => EdgeFn::constant(MinValue(*value as u64)),
            (GlobalFact::Zero, Instruction::Source { .. })
                if self.top_sources && !succ_fact.is_zero() =>
            {
                EdgeFn::AllTop
            }
            (GlobalFact::Zero, _) if !succ_fact.is_zero() => EdgeFn::AllBottom,
            _ => EdgeFn::Identity,
        }
    }

    fn call_edge_function(
        &self,
        _call_site: PointId,
        _src_fact: &GlobalFact,
        _callee: FunctionId,
        _dest_fact: &GlobalFact,
    ) -> EdgeFn<MinValue> {
        EdgeFn::Identity
    }

    fn return_edge_function(
        &self,
        _call_site: PointId,
        _callee: FunctionId,
        _exit: PointId,
        _exit_fact: &GlobalFact,
        _return_site: PointId,
        _ret_fact: &GlobalFact,
    ) -> EdgeFn<MinValue> {
        EdgeFn::Identity
    }

    fn call_to_return_edge_function(
        &self,
        _call_site: PointId,
        _call_fact: &GlobalFact,
        _return_site: PointId,
        _ret_fact: &GlobalFact,
    ) -> EdgeFn<MinValue> {
        EdgeFn::Identity
    }
}
