/*
 * IFDS Problem Definition (Interprocedural Finite Distributive Subset Problems)
 *
 * An analysis is described by:
 * - a finite fact domain D with a distinguished ZERO fact
 * - initial seeds (program point -> facts)
 * - one flow function D -> 2^D per supergraph edge kind
 *
 * Flow functions must be pure: the solver may ask for the same function
 * many times and apply it to the same fact repeatedly. ZERO is never
 * added by the solver; a problem that wants unconditional facts keeps ZERO
 * alive in its flow functions (identity does) and generates from it.
 *
 * References:
 * - Reps, Horwitz, Sagiv (1995): "Precise Interprocedural Dataflow Analysis via Graph Reachability"
 * - Naeem, Lhoták, Rodriguez (2010): "Practical Extensions to the IFDS Algorithm"
 */

use rustc_hash::FxHashMap;
use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;

use crate::features::supergraph::Icfg;

/// Dataflow fact (abstract domain element)
///
/// Example:
///   - Taint analysis: Tainted(x) for a variable x
///   - Uninitialized variables: Uninit(x)
pub trait DataflowFact: Clone + Eq + Hash + Debug {
    /// Check if this is the special ZERO fact
    fn is_zero(&self) -> bool;

    /// Create the ZERO fact ("no information", always reachable)
    fn zero() -> Self;
}

/// Flow function: D → 2^D (maps one fact to set of facts)
///
/// Example (taint propagation):
///   Statement: x = y
///   Input fact: Tainted(y)
///   Output facts: {Tainted(x), Tainted(y)}
pub trait FlowFunction<F: DataflowFact> {
    /// Compute output facts given input fact
    fn compute(&self, input: &F) -> HashSet<F>;

    /// Check if this flow function is identity (f(d) = {d})
    fn is_identity(&self) -> bool {
        false
    }
}

/// Boxed flow function handed out by problems
pub type FlowFn<'a, F> = Box<dyn FlowFunction<F> + 'a>;

/// Identity flow function: f(d) = {d}
pub struct IdentityFlowFunction;

impl<F: DataflowFact> FlowFunction<F> for IdentityFlowFunction {
    fn compute(&self, input: &F) -> HashSet<F> {
        HashSet::from([input.clone()])
    }

    fn is_identity(&self) -> bool {
        true
    }
}

/// Kill flow function: f(d) = ∅ for every non-zero d, f(0) = {0}
pub struct KillFlowFunction;

impl<F: DataflowFact> FlowFunction<F> for KillFlowFunction {
    fn compute(&self, input: &F) -> HashSet<F> {
        if input.is_zero() {
            HashSet::from([input.clone()])
        } else {
            HashSet::new()
        }
    }
}

/// Gen flow function: f(d) = {d}, plus `gen_fact` when d is ZERO
pub struct GenFlowFunction<F: DataflowFact> {
    pub gen_fact: F,
}

impl<F: DataflowFact> FlowFunction<F> for GenFlowFunction<F> {
    fn compute(&self, input: &F) -> HashSet<F> {
        let mut result = HashSet::from([input.clone()]);
        if input.is_zero() {
            result.insert(self.gen_fact.clone());
        }
        result
    }
}

/// Flow function backed by a closure
pub struct LambdaFlowFunction<C> {
    compute: C,
}

impl<C> LambdaFlowFunction<C> {
    pub fn new(compute: C) -> Self {
        Self { compute }
    }
}

impl<F, C> FlowFunction<F> for LambdaFlowFunction<C>
where
    F: DataflowFact,
    C: Fn(&F) -> HashSet<F>,
{
    fn compute(&self, input: &F) -> HashSet<F> {
        (self.compute)(input)
    }
}

/// Box a closure as a flow function
pub fn lambda_flow<'a, F, C>(compute: C) -> FlowFn<'a, F>
where
    F: DataflowFact + 'a,
    C: Fn(&F) -> HashSet<F> + 'a,
{
    Box::new(LambdaFlowFunction::new(compute))
}

/// IFDS problem definition over an ICFG `I`
pub trait IfdsProblem<I: Icfg> {
    type Fact: DataflowFact;

    /// The distinguished ZERO fact
    fn zero_value(&self) -> Self::Fact {
        Self::Fact::zero()
    }

    /// Facts holding unconditionally at the given points (usually entry
    /// points, usually including ZERO)
    fn initial_seeds(&self) -> FxHashMap<I::Node, HashSet<Self::Fact>>;

    /// Intraprocedural edge `curr -> succ`
    fn normal_flow(&self, curr: I::Node, succ: I::Node) -> FlowFn<'_, Self::Fact>;

    /// Call site → start point of `callee` (maps actuals to formals)
    fn call_flow(&self, call_site: I::Node, callee: I::Method) -> FlowFn<'_, Self::Fact>;

    /// Exit of `callee` → `return_site` of `call_site` (maps returned values back)
    fn return_flow(
        &self,
        call_site: I::Node,
        callee: I::Method,
        exit: I::Node,
        return_site: I::Node,
    ) -> FlowFn<'_, Self::Fact>;

    /// Call site → return site, for facts the call does not touch
    fn call_to_return_flow(
        &self,
        call_site: I::Node,
        return_site: I::Node,
    ) -> FlowFn<'_, Self::Fact>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    enum TestFact {
        Zero,
        Tainted(String),
    }

    impl DataflowFact for TestFact {
        fn is_zero(&self) -> bool {
            matches!(self, TestFact::Zero)
        }

        fn zero() -> Self {
            TestFact::Zero
        }
    }

    fn tainted(name: &str) -> TestFact {
        TestFact::Tainted(name.to_string())
    }

    #[test]
    fn test_identity_flow_function() {
        let ff = IdentityFlowFunction;
        let result = FlowFunction::<TestFact>::compute(&ff, &tainted("x"));
        assert_eq!(result, HashSet::from([tainted("x")]));
        assert!(FlowFunction::<TestFact>::is_identity(&ff));
    }

    #[test]
    fn test_kill_flow_function_keeps_zero() {
        let ff = KillFlowFunction;
        assert!(ff.compute(&tainted("x")).is_empty());
        assert_eq!(ff.compute(&TestFact::Zero), HashSet::from([TestFact::Zero]));
    }

    #[test]
    fn test_gen_flow_function() {
        let ff = GenFlowFunction {
            gen_fact: tainted("y"),
        };
        assert_eq!(
            ff.compute(&TestFact::Zero),
            HashSet::from([TestFact::Zero, tainted("y")])
        );
        assert_eq!(ff.compute(&tainted("x")), HashSet::from([tainted("x")]));
    }

    #[test]
    fn test_lambda_flow_function() {
        let ff = lambda_flow(|fact: &TestFact| match fact {
            TestFact::Tainted(name) if name == "a" => HashSet::from([tainted("p")]),
            _ => HashSet::new(),
        });
        assert_eq!(ff.compute(&tainted("a")), HashSet::from([tainted("p")]));
        assert!(ff.compute(&tainted("b")).is_empty());
        assert!(!ff.is_identity());
    }
}
