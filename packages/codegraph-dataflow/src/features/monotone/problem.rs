//! Monotone framework problems
//!
//! One lattice value per program point instead of one per fact. Transfer
//! functions must be monotone and the lattice of finite height; then the
//! iterative fixpoint terminates.

use crate::features::lattice::Lattice;
use crate::features::supergraph::Icfg;

/// Intraprocedural problem over a single method
pub trait IntraMonotoneProblem<I: Icfg> {
    type Value: Lattice;

    /// Method to analyze
    fn method(&self) -> I::Method;

    /// Value flowing into the method's start points
    fn entry_value(&self) -> Self::Value {
        Self::Value::top()
    }

    /// Effect of `node` on the value that reaches it
    fn transfer(&self, node: I::Node, input: &Self::Value) -> Self::Value;
}

/// Interprocedural problem threaded through call sites (context-insensitive)
pub trait InterMonotoneProblem<I: Icfg> {
    type Value: Lattice;

    /// Seeds: (point, value flowing into it)
    fn initial_values(&self) -> Vec<(I::Node, Self::Value)>;

    /// Effect of a non-call node
    fn normal_transfer(&self, node: I::Node, input: &Self::Value) -> Self::Value;

    /// Value entering `callee` from `call_site`
    fn call_transfer(
        &self,
        call_site: I::Node,
        callee: I::Method,
        input: &Self::Value,
    ) -> Self::Value;

    /// Value reaching `return_site` from the exit of `callee`
    fn return_transfer(
        &self,
        call_site: I::Node,
        callee: I::Method,
        exit: I::Node,
        return_site: I::Node,
        exit_value: &Self::Value,
    ) -> Self::Value;

    /// Value bypassing the call
    fn call_to_return_transfer(
        &self,
        call_site: I::Node,
        return_site: I::Node,
        input: &Self::Value,
    ) -> Self::Value;
}
