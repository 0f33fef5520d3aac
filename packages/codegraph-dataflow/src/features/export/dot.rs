//! Graphviz renderings of the ICFG, the call graph and recorded exploded
//! edges (petgraph `Dot`)

use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::fmt::Debug;

use crate::features::ifds::EdgeRecorder;
use crate::features::supergraph::{EdgeKind, Icfg};

/// ICFG with one vertex per program point and edges labeled by kind
pub fn icfg_to_dot<I: Icfg>(icfg: &I) -> String {
    let mut graph: DiGraph<String, EdgeKind> = DiGraph::new();
    let mut indices = FxHashMap::default();
    for node in icfg.all_nodes() {
        indices.insert(node, graph.add_node(icfg.node_label(node)));
    }
    for (from, to, kind) in icfg.edges() {
        if let (Some(&a), Some(&b)) = (indices.get(&from), indices.get(&to)) {
            graph.add_edge(a, b, kind);
        }
    }
    format!("{}", Dot::new(&graph))
}

/// Method-level call graph
pub fn call_graph_to_dot<I: Icfg>(icfg: &I) -> String {
    let mut graph: DiGraph<String, &'static str> = DiGraph::new();
    let mut indices = FxHashMap::default();
    for method in icfg.methods() {
        indices.insert(method, graph.add_node(icfg.method_name(method)));
    }

    let mut calls = BTreeSet::new();
    for caller in icfg.methods() {
        for call_site in icfg.call_sites_within(caller) {
            for callee in icfg.callees_of_call_at(call_site) {
                calls.insert((caller, callee));
            }
        }
    }
    for (caller, callee) in calls {
        if let (Some(&a), Some(&b)) = (indices.get(&caller), indices.get(&callee)) {
            graph.add_edge(a, b, "");
        }
    }
    format!("{}", Dot::with_config(&graph, &[Config::EdgeNoLabel]))
}

/// Exploded supergraph restricted to the recorded edges; vertices are
/// `point | fact`
pub fn exploded_to_dot<I, F>(icfg: &I, recorder: &EdgeRecorder<I::Node, F>) -> String
where
    I: Icfg,
    F: Clone + Eq + std::hash::Hash + Debug,
{
    let mut graph: DiGraph<String, &'static str> = DiGraph::new();
    let mut indices: FxHashMap<(u32, String), NodeIndex> = FxHashMap::default();
    let mut vertex = |graph: &mut DiGraph<String, &'static str>, id: u32, label: &str, fact: &str| {
        *indices
            .entry((id, fact.to_string()))
            .or_insert_with(|| graph.add_node(format!("{} | {}", label, fact)))
    };

    for record in recorder.records(icfg) {
        let from = vertex(&mut graph, record.from_id, &record.from, &record.source_fact);
        let kind = if record.interprocedural { "inter" } else { "intra" };
        for target in &record.target_facts {
            let to = vertex(&mut graph, record.to_id, &record.to, target);
            graph.add_edge(from, to, kind);
        }
    }
    format!("{}", Dot::new(&graph))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::ir::{Function, Instruction, Program};
    use crate::features::supergraph::ProgramIcfg;

    fn icfg() -> ProgramIcfg {
        let program = Program::new("dot")
            .with_function(Function::new("main").body(vec![
                Instruction::call(None, "f", Vec::<String>::new()),
                Instruction::ret(None),
            ]))
            .with_function(Function::new("f").body(vec![Instruction::ret(None)]));
        ProgramIcfg::build(&program).unwrap()
    }

    #[test]
    fn test_icfg_dot_contains_kinds() {
        let dot = icfg_to_dot(&icfg());
        assert!(dot.starts_with("digraph"));
        assert!(dot.contains("call-to-return"));
        assert!(dot.contains("main#0: call f()"));
    }

    #[test]
    fn test_call_graph_dot() {
        let dot = call_graph_to_dot(&icfg());
        assert!(dot.contains("\"main\""));
        assert!(dot.contains("0 -> 1"));
    }

    #[test]
    fn test_exploded_dot() {
        let icfg = icfg();
        let mut recorder: EdgeRecorder<_, &str> = EdgeRecorder::new();
        let call = icfg.point_at("main", 0).unwrap();
        let ret = icfg.point_at("main", 1).unwrap();
        recorder.record(call, ret, EdgeKind::CallToReturn, &"x", &["x", "y"]);

        let dot = exploded_to_dot(&icfg, &recorder);
        assert!(dot.contains("main#0: call f() | "));
        assert_eq!(dot.matches("intra").count(), 2);
    }
}
