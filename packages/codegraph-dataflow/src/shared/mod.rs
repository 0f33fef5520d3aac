//! Shared building blocks used by every feature

pub mod diagnostics;
pub mod interner;

pub use diagnostics::{Diagnostic, Severity};
pub use interner::{InternId, Interner};
