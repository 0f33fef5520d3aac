//! Custom assertions for result tables

use codegraph_dataflow::features::ifds::{DataflowFact, IfdsResults};
use codegraph_dataflow::features::supergraph::{PointId, ProgramIcfg};
use pretty_assertions::assert_eq;

/// Facts at `function#index`, rendered with `Debug` and sorted
pub fn facts_at<F: DataflowFact>(
    icfg: &ProgramIcfg,
    results: &IfdsResults<PointId, F>,
    function: &str,
    index: usize,
) -> Vec<String> {
    let point = point(icfg, function, index);
    let mut facts: Vec<String> = results
        .facts_at(point)
        .iter()
        .map(|fact| format!("{:?}", fact))
        .collect();
    facts.sort();
    facts
}

/// Assert the exact fact set at `function#index`
pub fn assert_facts<F: DataflowFact>(
    icfg: &ProgramIcfg,
    results: &IfdsResults<PointId, F>,
    function: &str,
    index: usize,
    expected: &[&str],
) {
    assert_eq!(
        facts_at(icfg, results, function, index),
        expected.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
        "facts at {}#{}",
        function,
        index
    );
}

pub fn point(icfg: &ProgramIcfg, function: &str, index: usize) -> PointId {
    icfg.point_at(function, index)
        .unwrap_or_else(|| panic!("no point {}#{}", function, index))
}
