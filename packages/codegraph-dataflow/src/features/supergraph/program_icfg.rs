//! ICFG adapter over the [`Program`] IR
//!
//! Every instruction becomes one program point. A body that does not end in
//! a terminator gets an implicit `ret` so each method has proper exits and
//! every call site has a return site.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::icfg::Icfg;
use crate::errors::{DataflowError, Result};
use crate::features::ir::{Instruction, Program};

/// Program point: dense index into the ICFG node table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointId(pub u32);

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Function handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionId(pub u32);

#[derive(Debug, Clone)]
pub struct FunctionInfo {
    pub name: String,
    pub params: Vec<String>,
    pub start: Option<PointId>,
    pub exits: Vec<PointId>,
    pub nodes: Vec<PointId>,
    pub call_sites: Vec<PointId>,
}

impl FunctionInfo {
    pub fn is_external(&self) -> bool {
        self.start.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub function: FunctionId,

    /// Position in the function body (the implicit return sits at `len`)
    pub index: usize,

    pub instruction: Instruction,
}

/// Interprocedural CFG of a whole program
#[derive(Debug, Clone)]
pub struct ProgramIcfg {
    name: String,
    functions: Vec<FunctionInfo>,
    function_ids: FxHashMap<String, FunctionId>,
    nodes: Vec<NodeInfo>,
    successors: Vec<Vec<PointId>>,
    predecessors: Vec<Vec<PointId>>,
    callees: FxHashMap<PointId, Vec<FunctionId>>,
    callers: Vec<Vec<PointId>>,
}

impl ProgramIcfg {
    /// Build the ICFG
    ///
    /// Fails only when function names are ambiguous; every other structural
    /// oddity (out-of-range branch targets, unresolved callees) is tolerated.
    pub fn build(program: &Program) -> Result<Self> {
        let mut function_ids = FxHashMap::default();
        for (index, function) in program.functions.iter().enumerate() {
            if function_ids
                .insert(function.name.clone(), FunctionId(index as u32))
                .is_some()
            {
                return Err(DataflowError::malformed(format!(
                    "function '{}' is defined more than once",
                    function.name
                )));
            }
        }

        let mut functions = Vec::with_capacity(program.functions.len());
        let mut nodes = Vec::new();
        let mut successors: Vec<Vec<PointId>> = Vec::new();

        for (fid, function) in program.functions.iter().enumerate() {
            let fid = FunctionId(fid as u32);
            let mut body = function.body.clone();
            if body.last().map_or(false, |last| !last.is_terminator()) {
                body.push(Instruction::ret(None));
            }

            let base = nodes.len() as u32;
            let len = body.len();
            let mut info = FunctionInfo {
                name: function.name.clone(),
                params: function.params.clone(),
                start: (len > 0).then_some(PointId(base)),
                exits: Vec::new(),
                nodes: Vec::with_capacity(len),
                call_sites: Vec::new(),
            };

            for (index, instruction) in body.into_iter().enumerate() {
                let point = PointId(base + index as u32);
                let succs: Vec<PointId> = match &instruction {
                    Instruction::Return { .. } => Vec::new(),
                    Instruction::Branch { targets } => targets
                        .iter()
                        .filter(|t| **t < len)
                        .map(|t| PointId(base + *t as u32))
                        .collect(),
                    _ if index + 1 < len => vec![PointId(point.0 + 1)],
                    _ => Vec::new(),
                };

                if succs.is_empty() {
                    info.exits.push(point);
                }
                if matches!(instruction, Instruction::Call { .. }) {
                    info.call_sites.push(point);
                }
                info.nodes.push(point);
                successors.push(succs);
                nodes.push(NodeInfo {
                    function: fid,
                    index,
                    instruction,
                });
            }
            functions.push(info);
        }

        let mut predecessors = vec![Vec::new(); nodes.len()];
        for (from, succs) in successors.iter().enumerate() {
            for to in succs {
                predecessors[to.0 as usize].push(PointId(from as u32));
            }
        }

        let mut callees = FxHashMap::default();
        let mut callers = vec![Vec::new(); functions.len()];
        for (index, node) in nodes.iter().enumerate() {
            if let Instruction::Call { callee, .. } = &node.instruction {
                let point = PointId(index as u32);
                let mut resolved: Vec<FunctionId> = callee
                    .names()
                    .into_iter()
                    .filter_map(|name| function_ids.get(name).copied())
                    .collect();
                resolved.sort();
                resolved.dedup();
                for target in &resolved {
                    callers[target.0 as usize].push(point);
                }
                callees.insert(point, resolved);
            }
        }

        tracing::debug!(
            program = %program.name,
            functions = functions.len(),
            nodes = nodes.len(),
            "built ICFG"
        );

        Ok(Self {
            name: program.name.clone(),
            functions,
            function_ids,
            nodes,
            successors,
            predecessors,
            callees,
            callers,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn function_id(&self, name: &str) -> Option<FunctionId> {
        self.function_ids.get(name).copied()
    }

    pub fn function(&self, id: FunctionId) -> &FunctionInfo {
        &self.functions[id.0 as usize]
    }

    pub fn node(&self, point: PointId) -> &NodeInfo {
        &self.nodes[point.0 as usize]
    }

    pub fn instruction_at(&self, point: PointId) -> &Instruction {
        &self.node(point).instruction
    }

    /// Entry point of the named function, if defined with a body
    pub fn entry_of(&self, name: &str) -> Option<PointId> {
        self.function_id(name).and_then(|id| self.function(id).start)
    }

    /// Program point at `index` of the named function
    pub fn point_at(&self, name: &str, index: usize) -> Option<PointId> {
        let id = self.function_id(name)?;
        self.function(id).nodes.get(index).copied()
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }
}

impl Icfg for ProgramIcfg {
    type Node = PointId;
    type Method = FunctionId;

    fn method_of(&self, node: PointId) -> FunctionId {
        self.node(node).function
    }

    fn start_points_of(&self, method: FunctionId) -> Vec<PointId> {
        self.function(method).start.into_iter().collect()
    }

    fn exit_points_of(&self, method: FunctionId) -> Vec<PointId> {
        self.function(method).exits.clone()
    }

    fn successors_of(&self, node: PointId) -> Vec<PointId> {
        self.successors[node.0 as usize].clone()
    }

    fn predecessors_of(&self, node: PointId) -> Vec<PointId> {
        self.predecessors[node.0 as usize].clone()
    }

    fn is_call(&self, node: PointId) -> bool {
        self.callees.contains_key(&node)
    }

    fn is_exit(&self, node: PointId) -> bool {
        self.successors[node.0 as usize].is_empty()
    }

    fn is_start_point(&self, node: PointId) -> bool {
        self.function(self.method_of(node)).start == Some(node)
    }

    fn callees_of_call_at(&self, node: PointId) -> Vec<FunctionId> {
        self.callees.get(&node).cloned().unwrap_or_default()
    }

    fn return_sites_of_call_at(&self, node: PointId) -> Vec<PointId> {
        if self.is_call(node) {
            self.successors_of(node)
        } else {
            Vec::new()
        }
    }

    fn callers_of(&self, method: FunctionId) -> Vec<PointId> {
        self.callers[method.0 as usize].clone()
    }

    fn call_sites_within(&self, method: FunctionId) -> Vec<PointId> {
        self.function(method).call_sites.clone()
    }

    fn nodes_of(&self, method: FunctionId) -> Vec<PointId> {
        self.function(method).nodes.clone()
    }

    fn all_nodes(&self) -> Vec<PointId> {
        (0..self.nodes.len() as u32).map(PointId).collect()
    }

    fn methods(&self) -> Vec<FunctionId> {
        (0..self.functions.len() as u32).map(FunctionId).collect()
    }

    fn node_id(&self, node: PointId) -> u32 {
        node.0
    }

    fn node_label(&self, node: PointId) -> String {
        let info = self.node(node);
        format!(
            "{}#{}: {}",
            self.function(info.function).name,
            info.index,
            info.instruction
        )
    }

    fn method_name(&self, method: FunctionId) -> String {
        self.function(method).name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::ir::{Callee, Function, Operand};
    use crate::features::supergraph::EdgeKind;

    fn sample() -> Program {
        Program::new("sample")
            .with_function(Function::new("main").body(vec![
                Instruction::source("x"),
                Instruction::call(Some("y"), "id", ["x"]),
                Instruction::Call {
                    dst: None,
                    callee: Callee::Indirect(vec!["id".to_string(), "ext".to_string()]),
                    args: vec![Operand::var("y")],
                },
                Instruction::call(None, "nowhere", ["y"]),
                Instruction::sink("y"),
            ]))
            .with_function(
                Function::new("id")
                    .params(["p"])
                    .body(vec![Instruction::ret(Some("p"))]),
            )
            .with_function(Function::new("ext"))
    }

    #[test]
    fn test_implicit_return_added() {
        let icfg = ProgramIcfg::build(&sample()).unwrap();
        let main = icfg.function_id("main").unwrap();

        assert_eq!(icfg.nodes_of(main).len(), 6);
        let exits = icfg.exit_points_of(main);
        assert_eq!(exits.len(), 1);
        assert!(matches!(
            icfg.instruction_at(exits[0]),
            Instruction::Return { value: None }
        ));
    }

    #[test]
    fn test_call_resolution() {
        let icfg = ProgramIcfg::build(&sample()).unwrap();
        let direct = icfg.point_at("main", 1).unwrap();
        let indirect = icfg.point_at("main", 2).unwrap();
        let unresolved = icfg.point_at("main", 3).unwrap();
        let id = icfg.function_id("id").unwrap();
        let ext = icfg.function_id("ext").unwrap();

        assert_eq!(icfg.callees_of_call_at(direct), vec![id]);
        assert_eq!(icfg.callees_of_call_at(indirect), vec![id, ext]);
        assert!(icfg.is_call(unresolved));
        assert!(icfg.callees_of_call_at(unresolved).is_empty());
        assert_eq!(icfg.return_sites_of_call_at(direct), vec![indirect]);
        assert_eq!(icfg.callers_of(id), vec![direct, indirect]);
        assert!(icfg.start_points_of(ext).is_empty());
    }

    #[test]
    fn test_branch_edges_and_predecessors() {
        let program = Program::new("diamond").with_function(Function::new("main").body(vec![
            Instruction::branch(vec![1, 2, 99]),
            Instruction::branch(vec![3]),
            Instruction::Nop,
            Instruction::ret(None),
        ]));
        let icfg = ProgramIcfg::build(&program).unwrap();
        let p = |i| icfg.point_at("main", i).unwrap();

        assert_eq!(icfg.successors_of(p(0)), vec![p(1), p(2)]);
        assert_eq!(icfg.predecessors_of(p(3)), vec![p(1), p(2)]);
        assert!(icfg.is_start_point(p(0)));
        assert!(icfg.is_exit(p(3)));
    }

    #[test]
    fn test_edges_cover_all_kinds() {
        let icfg = ProgramIcfg::build(&sample()).unwrap();
        let edges = icfg.edges();
        for kind in [
            EdgeKind::Normal,
            EdgeKind::Call,
            EdgeKind::CallToReturn,
            EdgeKind::Return,
        ] {
            assert!(edges.iter().any(|(_, _, k)| *k == kind), "missing {}", kind);
        }
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let program = Program::new("dup")
            .with_function(Function::new("f"))
            .with_function(Function::new("f"));
        assert!(ProgramIcfg::build(&program).is_err());
    }

    #[test]
    fn test_labels() {
        let icfg = ProgramIcfg::build(&sample()).unwrap();
        let point = icfg.point_at("main", 0).unwrap();
        assert_eq!(icfg.node_label(point), "main#0: x = source()");
        assert_eq!(point.to_string(), "n0");
    }
}
