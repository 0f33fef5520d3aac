//! Minimal three-address IR consumed by [`ProgramIcfg`]
//!
//! Loaded from JSON. Control flow falls through to the next instruction
//! unless the instruction is a `branch` or a `return`. A function without a
//! body is an external declaration.
//!
//! ```json
//! { "name": "demo",
//!   "functions": [
//!     { "name": "main", "body": [
//!         { "op": "source", "dst": "x" },
//!         { "op": "call", "dst": "y", "callee": "id", "args": ["x"] },
//!         { "op": "sink", "arg": "y" },
//!         { "op": "return" } ] },
//!     { "name": "id", "params": ["p"], "body": [
//!         { "op": "return", "value": "p" } ] } ] }
//! ```
//!
//! [`ProgramIcfg`]: crate::features::supergraph::ProgramIcfg

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::errors::Result;

/// Whole program: a flat list of functions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub name: String,

    pub functions: Vec<Function>,
}

impl Program {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: Vec::new(),
        }
    }

    pub fn with_function(mut self, function: Function) -> Self {
        self.functions.push(function);
        self
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,

    #[serde(default)]
    pub params: Vec<String>,

    #[serde(default)]
    pub body: Vec<Instruction>,
}

impl Function {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn body(mut self, body: Vec<Instruction>) -> Self {
        self.body = body;
        self
    }

    pub fn is_external(&self) -> bool {
        self.body.is_empty()
    }
}

/// Instruction operand: a variable or an integer literal
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    Var(String),
    Const(i64),
}

impl Operand {
    pub fn var(name: impl Into<String>) -> Self {
        Operand::Var(name.into())
    }

    pub fn as_var(&self) -> Option<&str> {
        match self {
            Operand::Var(name) => Some(name),
            Operand::Const(_) => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Var(name) => write!(f, "{}", name),
            Operand::Const(value) => write!(f, "{}", value),
        }
    }
}

/// Call target as written at the call site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Callee {
    /// Single named target (may be undefined, i.e. unresolved)
    Direct(String),

    /// Indirect call with a candidate target set
    Indirect(Vec<String>),
}

impl Callee {
    pub fn names(&self) -> Vec<&str> {
        match self {
            Callee::Direct(name) => vec![name.as_str()],
            Callee::Indirect(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Instruction {
    /// Declare a local without initializing it
    Alloca { var: String },

    /// `dst = src`
    Assign { dst: String, src: Operand },

    /// `dst = lhs <op> rhs`
    BinOp {
        dst: String,
        lhs: Operand,
        rhs: Operand,
    },

    /// `dst = new ty`
    New { dst: String, ty: String },

    /// `dst = <untrusted input>`
    Source { dst: String },

    /// `dst = sanitize(src)`
    Sanitize { dst: String, src: String },

    /// Security-sensitive use of `arg`
    Sink { arg: Operand },

    /// `dst = callee(args...)`
    Call {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dst: Option<String>,
        callee: Callee,
        #[serde(default)]
        args: Vec<Operand>,
    },

    /// Jump to one of `targets` (instruction indices within the function)
    Branch { targets: Vec<usize> },

    Return {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Operand>,
    },

    Nop,
}

impl Instruction {
    pub fn assign(dst: impl Into<String>, src: Operand) -> Self {
        Instruction::Assign {
            dst: dst.into(),
            src,
        }
    }

    pub fn source(dst: impl Into<String>) -> Self {
        Instruction::Source { dst: dst.into() }
    }

    pub fn sink(arg: impl Into<String>) -> Self {
        Instruction::Sink {
            arg: Operand::var(arg),
        }
    }

    pub fn call<I, S>(dst: Option<&str>, callee: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Instruction::Call {
            dst: dst.map(str::to_string),
            callee: Callee::Direct(callee.into()),
            args: args.into_iter().map(|a| Operand::Var(a.into())).collect(),
        }
    }

    pub fn ret(value: Option<&str>) -> Self {
        Instruction::Return {
            value: value.map(Operand::var),
        }
    }

    pub fn branch(targets: impl Into<Vec<usize>>) -> Self {
        Instruction::Branch {
            targets: targets.into(),
        }
    }

    /// Variable written by this instruction
    pub fn defined_var(&self) -> Option<&str> {
        match self {
            Instruction::Alloca { var } => Some(var),
            Instruction::Assign { dst, .. }
            | Instruction::BinOp { dst, .. }
            | Instruction::New { dst, .. }
            | Instruction::Source { dst }
            | Instruction::Sanitize { dst, .. } => Some(dst),
            Instruction::Call { dst, .. } => dst.as_deref(),
            _ => None,
        }
    }

    /// Variables read by this instruction
    pub fn used_vars(&self) -> Vec<&str> {
        match self {
            Instruction::Assign { src, .. } => src.as_var().into_iter().collect(),
            Instruction::BinOp { lhs, rhs, .. } => {
                lhs.as_var().into_iter().chain(rhs.as_var()).collect()
            }
            Instruction::Sanitize { src, .. } => vec![src.as_str()],
            Instruction::Sink { arg } => arg.as_var().into_iter().collect(),
            Instruction::Call { args, .. } => args.iter().filter_map(Operand::as_var).collect(),
            Instruction::Return { value } => value.iter().filter_map(Operand::as_var).collect(),
            _ => Vec::new(),
        }
    }

    pub fn is_terminator(&self) -> bool {
        matches!(self, Instruction::Branch { .. } | Instruction::Return { .. })
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Alloca { var } => write!(f, "alloca {}", var),
            Instruction::Assign { dst, src } => write!(f, "{} = {}", dst, src),
            Instruction::BinOp { dst, lhs, rhs } => write!(f, "{} = {} op {}", dst, lhs, rhs),
            Instruction::New { dst, ty } => write!(f, "{} = new {}", dst, ty),
            Instruction::Source { dst } => write!(f, "{} = source()", dst),
            Instruction::Sanitize { dst, src } => write!(f, "{} = sanitize({})", dst, src),
            Instruction::Sink { arg } => write!(f, "sink({})", arg),
            Instruction::Call { dst, callee, args } => {
                let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                let target = callee.names().join("|");
                match dst {
                    Some(dst) => write!(f, "{} = call {}({})", dst, target, args.join(", ")),
                    None => write!(f, "call {}({})", target, args.join(", ")),
                }
            }
            Instruction::Branch { targets } => write!(f, "br {:?}", targets),
            Instruction::Return { value: Some(v) } => write!(f, "ret {}", v),
            Instruction::Return { value: None } => write!(f, "ret"),
            Instruction::Nop => write!(f, "nop"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_from_json() {
        let program = Program::from_json_str(
            r#"{ "name": "demo", "functions": [
                { "name": "main", "body": [
                    { "op": "source", "dst": "x" },
                    { "op": "call", "dst": "y", "callee": "id", "args": ["x", 3] },
                    { "op": "call", "callee": ["f", "g"] },
                    { "op": "return" } ] },
                { "name": "id", "params": ["p"], "body": [
                    { "op": "return", "value": "p" } ] },
                { "name": "puts" } ] }"#,
        )
        .unwrap();

        assert_eq!(program.functions.len(), 3);
        let main = program.function("main").unwrap();
        assert_eq!(
            main.body[1],
            Instruction::Call {
                dst: Some("y".to_string()),
                callee: Callee::Direct("id".to_string()),
                args: vec![Operand::var("x"), Operand::Const(3)],
            }
        );
        assert!(matches!(
            &main.body[2],
            Instruction::Call { callee: Callee::Indirect(names), .. } if names.len() == 2
        ));
        assert!(program.function("puts").unwrap().is_external());
    }

    #[test]
    fn test_defined_and_used_vars() {
        let inst = Instruction::BinOp {
            dst: "z".to_string(),
            lhs: Operand::var("x"),
            rhs: Operand::Const(1),
        };
        assert_eq!(inst.defined_var(), Some("z"));
        assert_eq!(inst.used_vars(), vec!["x"]);

        let call = Instruction::call(None, "f", ["a", "b"]);
        assert_eq!(call.defined_var(), None);
        assert_eq!(call.used_vars(), vec!["a", "b"]);
    }

    #[test]
    fn test_display() {
        assert_eq!(Instruction::call(Some("r"), "f", ["a"]).to_string(), "r = call f(a)");
        assert_eq!(Instruction::ret(None).to_string(), "ret");
        assert_eq!(Instruction::source("x").to_string(), "x = source()");
    }
}
