//! Structural verification of a [`Program`]
//!
//! Problems are reported as diagnostics, never thrown. Only an `Error`
//! diagnostic prevents building the supergraph.

use rustc_hash::FxHashSet;

use super::program::{Instruction, Program};
use crate::shared::{Diagnostic, Severity};

/// Check `program` and return every finding
pub fn verify(program: &Program) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut seen = FxHashSet::default();
    let defined: FxHashSet<&str> = program.functions.iter().map(|f| f.name.as_str()).collect();

    for function in &program.functions {
        if !seen.insert(function.name.as_str()) {
            diagnostics.push(
                Diagnostic::error(
                    "duplicate-function",
                    format!("function '{}' is defined more than once", function.name),
                )
                .at(&function.name),
            );
        }

        if function.is_external() {
            continue;
        }

        let len = function.body.len();
        for (index, instruction) in function.body.iter().enumerate() {
            let location = format!("{}#{}", function.name, index);
            match instruction {
                Instruction::Branch { targets } if targets.is_empty() => {
                    diagnostics.push(
                        Diagnostic::warning("empty-branch", "branch has no targets").at(location),
                    );
                }
                Instruction::Branch { targets } => {
                    for target in targets.iter().filter(|t| **t >= len) {
                        diagnostics.push(
                            Diagnostic::warning(
                                "branch-out-of-range",
                                format!("branch target {} is outside 0..{}", target, len),
                            )
                            .at(location.clone()),
                        );
                    }
                }
                Instruction::Call { callee, .. } => {
                    for name in callee.names() {
                        if !defined.contains(name) {
                            diagnostics.push(
                                Diagnostic::info(
                                    "unresolved-call",
                                    format!("call target '{}' is not defined", name),
                                )
                                .at(location.clone()),
                            );
                        }
                    }
                }
                _ => {}
            }
        }

        if let Some(last) = function.body.last() {
            if !last.is_terminator() {
                diagnostics.push(
                    Diagnostic::warning(
                        "missing-return",
                        "body does not end in a return or branch; an implicit return is added",
                    )
                    .at(&function.name),
                );
            }
        }
    }

    diagnostics
}

/// Whether any diagnostic makes the program unusable
pub fn is_fatal(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(|d| d.severity == Severity::Error)
}
