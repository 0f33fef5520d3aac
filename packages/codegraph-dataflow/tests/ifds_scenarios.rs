//! IFDS solver scenarios over small programs

mod common;

use codegraph_dataflow::features::ifds::{IfdsResults, IfdsSolver, SpecialSummaries};
use codegraph_dataflow::features::ir::Instruction;
use codegraph_dataflow::features::supergraph::{PointId, ProgramIcfg};
use common::*;
use pretty_assertions::assert_eq;

fn solve(icfg: &ProgramIcfg) -> IfdsResults<PointId, GlobalFact> {
    IfdsSolver::new(GlobalFacts::new(icfg), icfg).solve()
}

#[test]
fn test_straight_line_gen_and_kill() {
    let icfg = ProgramBuilder::new("straight")
        .function(
            "main",
            vec![
                Instruction::source("a"),
                Instruction::source("b"),
                alloca("a"),
                ret(),
            ],
        )
        .build_icfg();
    let results = solve(&icfg);

    assert_facts(&icfg, &results, "main", 0, &[]);
    assert_facts(&icfg, &results, "main", 1, &["a"]);
    assert_facts(&icfg, &results, "main", 2, &["a", "b"]);
    assert_facts(&icfg, &results, "main", 3, &["b"]);
}

#[test]
fn test_callee_kills_and_generates() {
    // F enters the callee, is killed there; G is generated and returned
    let icfg = ProgramBuilder::new("callee")
        .function("main", vec![Instruction::source("f"), call("k"), ret()])
        .function("k", vec![alloca("f"), Instruction::source("g"), ret()])
        .build_icfg();
    let results = solve(&icfg);

    assert_facts(&icfg, &results, "k", 0, &["f"]);
    assert_facts(&icfg, &results, "main", 2, &["g"]);

    let summaries = results.summary_edges();
    assert!(!summaries.is_empty());
}

#[test]
fn test_summary_reused_at_second_call_site() {
    let icfg = ProgramBuilder::new("reuse")
        .function(
            "main",
            vec![Instruction::source("a"), call("k"), call("k"), ret()],
        )
        .function("k", vec![ret()])
        .build_icfg();
    let results = solve(&icfg);

    assert_facts(&icfg, &results, "main", 3, &["a"]);
    // one reuse per fact (ZERO and a) at the second call
    assert_eq!(results.statistics().num_summary_reuses, 2);

    let summary_at = |index| {
        let call_site = point(&icfg, "main", index);
        let mut edges: Vec<(String, String)> = results
            .summary_edges()
            .iter()
            .filter(|edge| edge.call_site == call_site)
            .map(|edge| {
                (
                    format!("{:?}", edge.call_fact),
                    format!("{:?}", edge.return_fact),
                )
            })
            .collect();
        edges.sort();
        edges
    };
    assert_eq!(
        summary_at(1),
        vec![
            ("a".to_string(), "a".to_string()),
            ("Λ".to_string(), "Λ".to_string()),
        ]
    );
    assert_eq!(summary_at(1), summary_at(2));
}

#[test]
fn test_recursion_reaches_fixpoint() {
    // main -> a -> b -> c -> a; c generates g on its non-recursive path
    let icfg = ProgramBuilder::new("recursion")
        .function("main", vec![call("a"), ret()])
        .function("a", vec![call("b"), ret()])
        .function("b", vec![call("c"), ret()])
        .function(
            "c",
            vec![
                Instruction::branch(vec![1, 3]),
                call("a"),
                ret(),
                Instruction::source("g"),
                ret(),
            ],
        )
        .build_icfg();
    let results = solve(&icfg);

    assert_facts(&icfg, &results, "main", 1, &["g"]);
    assert_facts(&icfg, &results, "a", 1, &["g"]);
    assert_facts(&icfg, &results, "c", 2, &["g"]);
}

#[test]
fn test_external_and_unresolved_calls_bypass() {
    let icfg = ProgramBuilder::new("external")
        .function(
            "main",
            vec![
                Instruction::source("a"),
                call("puts"),
                call("missing"),
                ret(),
            ],
        )
        .external("puts")
        .build_icfg();
    let results = solve(&icfg);

    assert_facts(&icfg, &results, "main", 2, &["a"]);
    assert_facts(&icfg, &results, "main", 3, &["a"]);
}

#[test]
fn test_special_summary_replaces_callee() {
    let icfg = ProgramBuilder::new("special")
        .function("main", vec![Instruction::source("a"), call("k"), ret()])
        .function("k", vec![alloca("a"), ret()])
        .build_icfg();

    let mut special = SpecialSummaries::new();
    special.insert_identity(icfg.function_id("k").unwrap());
    let results = IfdsSolver::new(GlobalFacts::new(&icfg), &icfg)
        .with_special_summaries(special)
        .solve();

    // without the summary, k would kill a
    assert_facts(&icfg, &results, "main", 2, &["a"]);
    assert_eq!(results.facts_at(point(&icfg, "k", 0)).len(), 0);
}

#[test]
fn test_solving_is_deterministic() {
    let build = || {
        ProgramBuilder::new("twice")
            .function(
                "main",
                vec![
                    Instruction::source("a"),
                    Instruction::branch(vec![2, 3]),
                    call("k"),
                    Instruction::source("b"),
                    ret(),
                ],
            )
            .function("k", vec![alloca("a"), ret()])
            .build_icfg()
    };
    let icfg = build();
    let first = solve(&icfg);
    let second = solve(&build());

    assert_eq!(first.records(&icfg), second.records(&icfg));
    assert_eq!(
        first.statistics().num_path_edges,
        second.statistics().num_path_edges
    );
}

#[test]
fn test_direct_recursion_passes_fact_through() {
    // rec recurses three levels deep in the unrolled view; a is untouched
    let icfg = ProgramBuilder::new("direct")
        .function("main", vec![Instruction::source("a"), call("rec"), ret()])
        .function(
            "rec",
            vec![Instruction::branch(vec![1, 3]), call("rec"), ret(), ret()],
        )
        .build_icfg();
    let results = solve(&icfg);

    assert_facts(&icfg, &results, "rec", 0, &["a"]);
    assert_facts(&icfg, &results, "rec", 2, &["a"]);
    assert_facts(&icfg, &results, "main", 2, &["a"]);
}

#[test]
fn test_summary_reuse_matches_inlining() {
    // the nops let k finish before main reaches the second call
    let with_calls = ProgramBuilder::new("calls")
        .function(
            "main",
            vec![
                Instruction::source("a"),
                call("k"),
                Instruction::Nop,
                Instruction::Nop,
                Instruction::source("a"),
                call("k"),
                ret(),
            ],
        )
        .function("k", vec![alloca("a"), Instruction::source("g"), ret()])
        .build_icfg();
    let inlined = ProgramBuilder::new("inlined")
        .function(
            "main",
            vec![
                Instruction::source("a"),
                alloca("a"),
                Instruction::source("g"),
                Instruction::Nop,
                Instruction::Nop,
                Instruction::source("a"),
                alloca("a"),
                Instruction::source("g"),
                ret(),
            ],
        )
        .build_icfg();

    let called = solve(&with_calls);
    let reference = solve(&inlined);

    // only ZERO reaches k's exit, so only its summary is reused
    assert_eq!(called.statistics().num_summary_reuses, 1);
    assert_eq!(
        facts_at(&with_calls, &called, "main", 6),
        facts_at(&inlined, &reference, "main", 8)
    );
    assert_facts(&with_calls, &called, "main", 6, &["g"]);
}
