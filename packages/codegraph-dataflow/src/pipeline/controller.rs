/*
 * Analysis Controller
 *
 * Drives one batch:
 *
 *   Program ──verify──▶ diagnostics
 *      │
 *      └──build once──▶ ProgramIcfg ──▶ [analysis 1] ──▶ outcome
 *                            │          [analysis 2] ──▶ outcome
 *                            │              ...
 *                            └──export──▶ icfg.dot, callgraph.dot
 *
 * Every analysis gets a fresh problem and solver instance; the ICFG is
 * shared read-only, so analyses can run on the rayon pool. Only
 * whole-program mode exists: module-wise merging is reported and the
 * controller falls back to whole-program analysis.
 */

use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

use super::analysis_kind::{AnalysisKind, SolverKind};
use super::report::{AnalysisOutcome, AnalysisReport};
use crate::config::AnalysisConfig;
use crate::errors::{DataflowError, Result};
use crate::features::analyses::{
    ide_taint_findings, taint_findings, type_findings, uninitialized_findings, Finding,
    IdeSolverTest, IdeTaintProblem, IfdsSolverTest, IfdsTaintProblem, IfdsTypeAnalysis,
    IfdsUninitializedVariables, InterMonotoneSolverTest, IntraMonotoneSolverTest,
};
use crate::features::export::{
    call_graph_to_dot, exploded_to_dot, icfg_to_dot, write_json, write_text,
};
use crate::features::ide::{IdeProblem, IdeResults, IdeSolver};
use crate::features::ifds::{
    DataflowFact, EdgeRecorder, ExplodedEdgeRecord, IfdsProblem, IfdsResults, IfdsSolver,
    SpecialSummaries,
};
use crate::features::ir::{is_fatal, verify, Program};
use crate::features::monotone::{InterMonotoneSolver, IntraMonotoneSolver};
use crate::features::supergraph::{FunctionId, Icfg, PointId, ProgramIcfg};
use crate::shared::Diagnostic;

type IdeResultsOf<P> = IdeResults<
    PointId,
    FunctionId,
    <P as IfdsProblem<ProgramIcfg>>::Fact,
    <P as IdeProblem<ProgramIcfg>>::Value,
    <P as IdeProblem<ProgramIcfg>>::EdgeFn,
>;

pub struct AnalysisController {
    config: AnalysisConfig,
    program_name: String,
    /// `None` when verification found the program unusable
    icfg: Option<ProgramIcfg>,
    diagnostics: Vec<Diagnostic>,
}

impl AnalysisController {
    /// Verify `program` and build its ICFG
    ///
    /// Fails only on an invalid configuration. A program that cannot be
    /// turned into a supergraph is reported through diagnostics and the
    /// run is skipped.
    pub fn new(program: &Program, config: AnalysisConfig) -> Result<Self> {
        config.validate()?;

        let mut diagnostics = verify(program);
        let icfg = if is_fatal(&diagnostics) {
            None
        } else {
            match ProgramIcfg::build(program) {
                Ok(icfg) => Some(icfg),
                Err(err) => {
                    diagnostics.push(Diagnostic::error("supergraph", err.to_string()));
                    None
                }
            }
        };

        if let Some(icfg) = &icfg {
            for entry in &config.entry_points {
                if icfg.function_id(entry).is_none() {
                    diagnostics.push(
                        Diagnostic::warning(
                            "unknown-entry",
                            DataflowError::UnknownEntry(entry.clone()).to_string(),
                        )
                        .at(entry),
                    );
                }
            }
            tracing::info!(
                program = %icfg.name(),
                functions = icfg.methods().len(),
                points = icfg.num_nodes(),
                "built ICFG"
            );
        }

        Ok(Self {
            config,
            program_name: program.name.clone(),
            icfg,
            diagnostics,
        })
    }

    pub fn icfg(&self) -> Option<&ProgramIcfg> {
        self.icfg.as_ref()
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Selected analyses in configuration order, duplicates dropped;
    /// unknown names become diagnostics
    pub fn selected_analyses(&self) -> (Vec<AnalysisKind>, Vec<Diagnostic>) {
        let mut kinds = Vec::new();
        let mut diagnostics = Vec::new();
        for name in &self.config.analyses {
            match name.parse::<AnalysisKind>() {
                Ok(kind) if !kinds.contains(&kind) => kinds.push(kind),
                Ok(_) => {}
                Err(err) => {
                    diagnostics.push(Diagnostic::warning("unknown-analysis", err.to_string()))
                }
            }
        }
        (kinds, diagnostics)
    }

    /// Run every selected analysis
    pub fn run(&self) -> Result<AnalysisReport> {
        let start = Instant::now();
        let mut report = AnalysisReport {
            program: self.program_name.clone(),
            outcomes: Vec::new(),
            diagnostics: self.diagnostics.clone(),
        };

        let (kinds, selection_diagnostics) = self.selected_analyses();
        report.diagnostics.extend(selection_diagnostics);

        if !self.config.whole_program {
            report.diagnostics.push(Diagnostic::warning(
                "module-wise-unsupported",
                "module-wise analysis with summary merging is not supported; running whole-program analysis",
            ));
        }

        let icfg = match &self.icfg {
            Some(icfg) => icfg,
            None => {
                report.diagnostics.push(Diagnostic::error(
                    "run-skipped",
                    "program could not be turned into a supergraph",
                ));
                report.diagnostics.iter().for_each(Diagnostic::log);
                return Ok(report);
            }
        };

        if self.config.export_dot || kinds.contains(&AnalysisKind::None) {
            self.export_graphs(icfg)?;
        }

        let outcomes: Vec<Result<(AnalysisOutcome, Vec<Diagnostic>)>> =
            if self.config.parallel_analyses {
                kinds
                    .par_iter()
                    .map(|kind| self.run_analysis(icfg, *kind))
                    .collect()
            } else {
                kinds
                    .iter()
                    .map(|kind| self.run_analysis(icfg, *kind))
                    .collect()
            };

        for outcome in outcomes {
            let (outcome, diagnostics) = outcome?;
            report.diagnostics.extend(diagnostics);
            report.outcomes.push(outcome);
        }

        if let Some(path) = self.export_path("report.json") {
            write_json(&path, &report)?;
        }

        report.diagnostics.iter().for_each(Diagnostic::log);
        tracing::info!(
            analyses = report.outcomes.len(),
            findings = report.findings().count(),
            diagnostics = report.diagnostics.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "analysis batch finished"
        );
        Ok(report)
    }

    /// Solve `kind` with a fresh solver and collect its outcome
    fn run_analysis(
        &self,
        icfg: &ProgramIcfg,
        kind: AnalysisKind,
    ) -> Result<(AnalysisOutcome, Vec<Diagnostic>)> {
        let entries = &self.config.entry_points;
        tracing::info!(analysis = %kind, solver = %kind.solver_kind(), "running analysis");

        let mut diagnostics = Vec::new();
        let outcome = match kind {
            AnalysisKind::IfdsUninitializedVariables => self.run_ifds(
                icfg,
                kind,
                IfdsUninitializedVariables::new(icfg, entries),
                |results| uninitialized_findings(icfg, results),
            )?,
            AnalysisKind::IfdsTaint => self.run_ifds(
                icfg,
                kind,
                IfdsTaintProblem::new(icfg, entries),
                |results| taint_findings(icfg, results),
            )?,
            AnalysisKind::IfdsType => self.run_ifds(
                icfg,
                kind,
                IfdsTypeAnalysis::new(icfg, entries),
                |results| type_findings(icfg, results),
            )?,
            AnalysisKind::IfdsSolverTest => {
                self.run_ifds(icfg, kind, IfdsSolverTest::new(icfg, entries), |_| Vec::new())?
            }
            AnalysisKind::IdeTaint => self.run_ide(
                icfg,
                kind,
                IdeTaintProblem::new(icfg, entries),
                |results| ide_taint_findings(icfg, results),
            )?,
            AnalysisKind::IdeSolverTest => {
                self.run_ide(icfg, kind, IdeSolverTest::new(icfg, entries), |_| Vec::new())?
            }
            AnalysisKind::MonoIntraSolverTest => {
                match icfg.function_id(&self.config.intra_function) {
                    Some(function) => {
                        let problem = IntraMonotoneSolverTest::new(icfg, function);
                        let results = IntraMonotoneSolver::new(problem, icfg).solve();
                        let mut outcome = AnalysisOutcome::new(kind);
                        outcome.records = serde_json::to_value(results.records(icfg)?)?;
                        outcome.statistics = serde_json::to_value(results.statistics())?;
                        outcome
                    }
                    None => {
                        diagnostics.push(
                            Diagnostic::warning(
                                "unknown-function",
                                format!(
                                    "intra_function '{}' is not defined; {} skipped",
                                    self.config.intra_function, kind
                                ),
                            )
                            .at(&self.config.intra_function),
                        );
                        AnalysisOutcome::new(kind)
                    }
                }
            }
            AnalysisKind::MonoInterSolverTest => {
                let problem = InterMonotoneSolverTest::new(icfg, entries);
                let results = InterMonotoneSolver::new(problem, icfg).solve();
                let mut outcome = AnalysisOutcome::new(kind);
                outcome.records = serde_json::to_value(results.records(icfg)?)?;
                outcome.statistics = serde_json::to_value(results.statistics())?;
                outcome
            }
            AnalysisKind::None => AnalysisOutcome::new(kind),
        };

        debug_assert_eq!(outcome.solver, kind.solver_kind());
        if kind.solver_kind() != SolverKind::None {
            if let Some(path) = self.export_path(&format!("{}.json", kind)) {
                write_json(&path, &outcome)?;
            }
        }
        Ok((outcome, diagnostics))
    }

    fn run_ifds<P>(
        &self,
        icfg: &ProgramIcfg,
        kind: AnalysisKind,
        problem: P,
        findings: impl FnOnce(&IfdsResults<PointId, P::Fact>) -> Vec<Finding>,
    ) -> Result<AnalysisOutcome>
    where
        P: IfdsProblem<ProgramIcfg>,
    {
        let results = IfdsSolver::new(problem, icfg)
            .with_special_summaries(self.special_summaries(icfg))
            .with_edge_recording(self.config.record_edges)
            .solve();

        let mut outcome = AnalysisOutcome::new(kind);
        outcome.records = serde_json::to_value(results.records(icfg))?;
        outcome.statistics = serde_json::to_value(results.statistics())?;
        outcome.findings = findings(&results);
        if let Some(recorder) = results.edge_recorder() {
            outcome.exploded_edges = self.export_exploded(icfg, kind, recorder)?;
        }
        Ok(outcome)
    }

    fn run_ide<P>(
        &self,
        icfg: &ProgramIcfg,
        kind: AnalysisKind,
        problem: P,
        findings: impl FnOnce(&IdeResultsOf<P>) -> Vec<Finding>,
    ) -> Result<AnalysisOutcome>
    where
        P: IdeProblem<ProgramIcfg>,
        P::Value: Serialize,
    {
        let results = IdeSolver::new(problem, icfg)
            .with_special_summaries(self.special_summaries(icfg))
            .with_edge_recording(self.config.record_edges)
            .solve();

        let mut outcome = AnalysisOutcome::new(kind);
        outcome.records = serde_json::to_value(results.records(icfg)?)?;
        outcome.statistics = serde_json::to_value(results.statistics())?;
        outcome.findings = findings(&results);
        if let Some(recorder) = results.edge_recorder() {
            outcome.exploded_edges = self.export_exploded(icfg, kind, recorder)?;
        }
        Ok(outcome)
    }

    /// Identity / kill summaries for the configured functions that exist
    fn special_summaries<F>(&self, icfg: &ProgramIcfg) -> SpecialSummaries<FunctionId, F>
    where
        F: DataflowFact,
    {
        let mut special = SpecialSummaries::new();
        for name in &self.config.identity_summaries {
            if let Some(function) = icfg.function_id(name) {
                special.insert_identity(function);
            }
        }
        for name in &self.config.kill_summaries {
            if let Some(function) = icfg.function_id(name) {
                special.insert_kill(function);
            }
        }
        special
    }

    fn export_exploded<F: DataflowFact>(
        &self,
        icfg: &ProgramIcfg,
        kind: AnalysisKind,
        recorder: &EdgeRecorder<PointId, F>,
    ) -> Result<Vec<ExplodedEdgeRecord>> {
        if self.config.export_dot {
            if let Some(dir) = &self.config.output_dir {
                let path = dir.join(format!("{}-exploded.dot", kind));
                write_text(&path, &exploded_to_dot(icfg, recorder))?;
            }
        }
        Ok(recorder.records(icfg))
    }

    fn export_graphs(&self, icfg: &ProgramIcfg) -> Result<()> {
        if let Some(dir) = &self.config.output_dir {
            write_text(&dir.join("icfg.dot"), &icfg_to_dot(icfg))?;
            write_text(&dir.join("callgraph.dot"), &call_graph_to_dot(icfg))?;
            tracing::info!(dir = %dir.display(), "exported ICFG and call graph");
        }
        Ok(())
    }

    fn export_path(&self, file_name: &str) -> Option<PathBuf> {
        match (&self.config.output_dir, self.config.export_json) {
            (Some(dir), true) => Some(dir.join(file_name)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::ir::{Function, Instruction};

    fn leaky_program() -> Program {
        Program::new("leaky").with_function(Function::new("main").body(vec![
            Instruction::source("x"),
            Instruction::sink("x"),
            Instruction::ret(None),
        ]))
    }

    #[test]
    fn test_unknown_analysis_is_skipped() {
        let config = AnalysisConfig::default().with_analyses(["ifds-taint", "ifds-foo"]);
        let controller = AnalysisController::new(&leaky_program(), config).unwrap();
        let report = controller.run().unwrap();

        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.outcomes[0].findings.len(), 1);
        assert!(report
            .diagnostics
            .iter()
            .any(|d| d.code == "unknown-analysis" && d.message.contains("ifds-foo")));
    }

    #[test]
    fn test_duplicate_functions_skip_the_run() {
        let program = leaky_program().with_function(Function::new("main"));
        let config = AnalysisConfig::default().with_analyses(["ifds-taint"]);
        let controller = AnalysisController::new(&program, config).unwrap();
        assert!(controller.icfg().is_none());

        let report = controller.run().unwrap();
        assert!(report.outcomes.is_empty());
        assert!(report.has_errors());
    }

    #[test]
    fn test_module_wise_mode_falls_back() {
        let mut config = AnalysisConfig::default().with_analyses(["ifds-taint"]);
        config.whole_program = false;
        let report = AnalysisController::new(&leaky_program(), config)
            .unwrap()
            .run()
            .unwrap();

        assert_eq!(report.outcomes.len(), 1);
        assert!(report
            .diagnostics
            .iter()
            .any(|d| d.code == "module-wise-unsupported"));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let names = ["ifds-taint", "ide-taint", "ifds-solvertest", "mono-inter-solvertest"];
        let sequential = AnalysisController::new(
            &leaky_program(),
            AnalysisConfig::default().with_analyses(names),
        )
        .unwrap()
        .run()
        .unwrap();

        let mut config = AnalysisConfig::default().with_analyses(names);
        config.parallel_analyses = true;
        let parallel = AnalysisController::new(&leaky_program(), config)
            .unwrap()
            .run()
            .unwrap();

        for (a, b) in sequential.outcomes.iter().zip(&parallel.outcomes) {
            assert_eq!(a.analysis, b.analysis);
            assert_eq!(a.records, b.records);
            assert_eq!(a.findings, b.findings);
        }
    }
}
