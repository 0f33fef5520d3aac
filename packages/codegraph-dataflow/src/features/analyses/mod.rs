//! Built-in analyses over [`ProgramIcfg`]
//!
//! Each analysis is a problem for one of the solvers plus a post-solve pass
//! that turns the result table into findings.

pub mod ide_taint;
pub mod taint;
pub mod type_analysis;
pub mod uninitialized;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::features::ir::{Instruction, Operand};
use crate::features::supergraph::{FunctionId, Icfg, PointId, ProgramIcfg};

pub use ide_taint::{ide_taint_findings, IdeTaintProblem, TaintOrigin};
pub use solver_tests::{
    DefinitionFact, IdeSolverTest, IfdsSolverTest, InterMonotoneSolverTest, IntraMonotoneSolverTest,
};
pub use taint::{taint_findings, IfdsTaintProblem, TaintFact};
pub use type_analysis::{type_findings, IfdsTypeAnalysis, TypeFact};
pub use uninitialized::{uninitialized_findings, IfdsUninitializedVariables, UninitFact};

/// Function-qualified variable name
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Variable {
    pub function: String,
    pub name: String,
}

impl Variable {
    pub fn new(function: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            name: name.into(),
        }
    }

    /// Variable `name` of the function containing `point`
    pub fn at(icfg: &ProgramIcfg, point: PointId, name: &str) -> Self {
        Self::new(icfg.method_name(icfg.method_of(point)), name)
    }

    /// Variable `name` of `function`
    pub fn of(icfg: &ProgramIcfg, function: FunctionId, name: &str) -> Self {
        Self::new(icfg.function(function).name.clone(), name)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.function, self.name)
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Something an analysis wants a human to look at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Stable identifier, e.g. `taint-leak`
    pub code: String,
    pub point_id: u32,
    pub point: String,
    pub message: String,
}

impl Finding {
    pub fn new(
        code: impl Into<String>,
        icfg: &ProgramIcfg,
        point: PointId,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            point_id: icfg.node_id(point),
            point: icfg.node_label(point),
            message: message.into(),
        }
    }
}

/// Destination and arguments of the call at `point`
pub(crate) fn call_parts(icfg: &ProgramIcfg, point: PointId) -> (Option<&str>, &[Operand]) {
    match icfg.instruction_at(point) {
        Instruction::Call { dst, args, .. } => (dst.as_deref(), args.as_slice()),
        _ => (None, &[]),
    }
}

/// Variable returned by the exit instruction at `exit`, if any
pub(crate) fn returned_var(icfg: &ProgramIcfg, exit: PointId) -> Option<&str> {
    match icfg.instruction_at(exit) {
        Instruction::Return { value: Some(value) } => value.as_var(),
        _ => None,
    }
}

/// Pairs of (argument variable, parameter) for a call into `callee`
pub(crate) fn bind_arguments<'a>(
    icfg: &'a ProgramIcfg,
    call_site: PointId,
    callee: FunctionId,
) -> Vec<(&'a str, &'a str)> {
    let (_, args) = call_parts(icfg, call_site);
    args.iter()
        .zip(icfg.function(callee).params.iter())
        .filter_map(|(arg, param)| arg.as_var().map(|arg| (arg, param.as_str())))
        .collect()
}

/// Variables whose value flows into the variable defined at `instruction`
pub(crate) fn value_sources(instruction: &Instruction) -> Vec<&str> {
    match instruction {
        Instruction::Assign { .. } | Instruction::BinOp { .. } => instruction.used_vars(),
        _ => Vec::new(),
    }
}
