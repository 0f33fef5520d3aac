//! Hand-written summaries for well-known callees
//!
//! Built by the setup step and handed to the solver, which reads it only.
//! A call to a summarized method is never descended into: the summary flow
//! function is applied from the call site straight to its return sites.

use rustc_hash::FxHashMap;
use std::hash::Hash;

use super::problem::{DataflowFact, FlowFunction, IdentityFlowFunction, KillFlowFunction};

pub struct SpecialSummaries<M, F> {
    summaries: FxHashMap<M, Box<dyn FlowFunction<F>>>,
}

impl<M: Copy + Eq + Hash, F: DataflowFact> SpecialSummaries<M, F> {
    pub fn new() -> Self {
        Self {
            summaries: FxHashMap::default(),
        }
    }

    /// Register (or replace) the summary of `method`
    pub fn insert(&mut self, method: M, summary: Box<dyn FlowFunction<F>>) {
        self.summaries.insert(method, summary);
    }

    /// Facts pass through calls to `method` unchanged
    pub fn insert_identity(&mut self, method: M) {
        self.insert(method, Box::new(IdentityFlowFunction));
    }

    /// Calls to `method` kill every non-zero fact
    pub fn insert_kill(&mut self, method: M) {
        self.insert(method, Box::new(KillFlowFunction));
    }

    pub fn get(&self, method: M) -> Option<&dyn FlowFunction<F>> {
        self.summaries.get(&method).map(|summary| summary.as_ref())
    }

    pub fn contains(&self, method: M) -> bool {
        self.summaries.contains_key(&method)
    }

    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }
}

impl<M: Copy + Eq + Hash, F: DataflowFact> Default for SpecialSummaries<M, F> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    enum Fact {
        Zero,
        Var(&'static str),
    }

    impl DataflowFact for Fact {
        fn is_zero(&self) -> bool {
            matches!(self, Fact::Zero)
        }

        fn zero() -> Self {
            Fact::Zero
        }
    }

    #[test]
    fn test_identity_and_kill_entries() {
        let mut table: SpecialSummaries<u32, Fact> = SpecialSummaries::new();
        table.insert_identity(1);
        table.insert_kill(2);

        assert_eq!(table.len(), 2);
        assert!(table.contains(1));
        assert!(!table.contains(3));

        let id = table.get(1).unwrap();
        assert!(id.compute(&Fact::Var("x")).contains(&Fact::Var("x")));

        let kill = table.get(2).unwrap();
        assert!(kill.compute(&Fact::Var("x")).is_empty());
        assert!(kill.compute(&Fact::Zero).contains(&Fact::Zero));
    }
}
