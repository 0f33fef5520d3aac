//! Test data builders

use codegraph_dataflow::features::ir::{Function, Instruction, Operand, Program};
use codegraph_dataflow::features::supergraph::ProgramIcfg;

/// Builder for a [`Program`] made of plain instruction lists
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    name: String,
    functions: Vec<Function>,
}

impl ProgramBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            functions: Vec::new(),
        }
    }

    /// Add a function with a body
    pub fn function(mut self, name: &str, body: Vec<Instruction>) -> Self {
        self.functions.push(Function::new(name).body(body));
        self
    }

    /// Add a function with parameters and a body
    pub fn function_with_params(mut self, name: &str, params: &[&str], body: Vec<Instruction>) -> Self {
        self.functions
            .push(Function::new(name).params(params.iter().copied()).body(body));
        self
    }

    /// Add a bodiless (external) function
    pub fn external(mut self, name: &str) -> Self {
        self.functions.push(Function::new(name));
        self
    }

    pub fn build(self) -> Program {
        self.functions
            .into_iter()
            .fold(Program::new(self.name), Program::with_function)
    }

    pub fn build_icfg(self) -> ProgramIcfg {
        ProgramIcfg::build(&self.build()).expect("test program must build")
    }
}

/// `var = value`
pub fn constant(var: &str, value: i64) -> Instruction {
    Instruction::assign(var, Operand::Const(value))
}

/// `call callee()` without arguments or result
pub fn call(callee: &str) -> Instruction {
    Instruction::call(None, callee, Vec::<String>::new())
}

pub fn alloca(var: &str) -> Instruction {
    Instruction::Alloca {
        var: var.to_string(),
    }
}

pub fn ret() -> Instruction {
    Instruction::ret(None)
}
