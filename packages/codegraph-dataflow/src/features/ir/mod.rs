//! Program representation consumed by the supergraph adapter

pub mod program;
pub mod verifier;

pub use program::{Callee, Function, Instruction, Operand, Program};
pub use verifier::{is_fatal, verify};
