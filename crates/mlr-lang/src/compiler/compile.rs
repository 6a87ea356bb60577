//! Top-level compilation: function collection and block placement.

use std::rc::Rc;

use rustc_hash::FxHashMap;
use tracing::debug;

use super::compiled::Program;
use super::error::CompileError;
use crate::TypeGate;
use crate::ast::{AstNode, NodeType};
use crate::eval::{BUILTIN_FUNCTIONS, Parameter, StatementBlock, Udf};

/// Arity and slot of a user-defined function, known before any body is
/// compiled so that callsites can refer to functions defined later.
#[derive(Debug, Clone, Copy)]
pub(super) struct FunctionSignature {
    pub(super) id: usize,
    pub(super) arity: usize,
}

/// Compiler from the generic syntax tree to evaluable statements.
///
/// Compilation happens once per program, before any record is read.
#[derive(Debug, Default)]
pub struct Compiler {
    pub(super) functions: FxHashMap<String, FunctionSignature>,
    /// Number of enclosing loops; `break`/`continue` need at least one.
    pub(super) loop_depth: usize,
    pub(super) in_function: bool,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles a whole program.
    ///
    /// # Arguments
    ///
    /// * `root` - The root statement block produced by the parser
    ///
    /// # Returns
    ///
    /// The compiled [`Program`], or the first [`CompileError`] found.
    ///
    /// Function signatures are collected in a first pass, so calls may
    /// precede definitions and functions may recurse.
    pub fn compile_program(&mut self, root: &AstNode) -> Result<Program, CompileError> {
        if root.node_type != NodeType::StatementBlock {
            return Err(CompileError::UnexpectedRoot(root.node_type));
        }

        for node in root.children() {
            if node.node_type == NodeType::NamedFunctionDefinition {
                self.collect_signature(node)?;
            }
        }

        let mut program = Program::default();
        let mut udfs = Vec::with_capacity(self.functions.len());
        for node in root.children() {
            match node.node_type {
                NodeType::BeginBlock => program.begin_blocks.push(self.compile_wrapped_block(node)?),
                NodeType::EndBlock => program.end_blocks.push(self.compile_wrapped_block(node)?),
                NodeType::NamedFunctionDefinition => udfs.push(self.compile_udf(node)?),
                _ => program
                    .main_block
                    .statements
                    .push(self.compile_statement(node)?),
            }
        }
        program.udfs = Rc::from(udfs);

        debug!(
            begin_blocks = program.begin_blocks.len(),
            main_statements = program.main_block.statements.len(),
            end_blocks = program.end_blocks.len(),
            functions = program.udfs.len(),
            "compiled program"
        );
        Ok(program)
    }

    fn collect_signature(&mut self, node: &AstNode) -> Result<(), CompileError> {
        let name = node.token_str();
        if BUILTIN_FUNCTIONS.contains_key(name) {
            return Err(CompileError::BuiltinRedefinition(name.to_string()));
        }
        if self.functions.contains_key(name) {
            return Err(CompileError::DuplicateFunction(name.to_string()));
        }

        let params = match node.children() {
            [params, _] | [params, _, _] => params,
            children => return Err(arity_error(node, "2 or 3", children.len())),
        };
        expect_type(node, params, NodeType::ParameterList)?;

        let signature = FunctionSignature {
            id: self.functions.len(),
            arity: params.children().len(),
        };
        debug!(function = name, arity = signature.arity, "function defined");
        self.functions.insert(name.to_string(), signature);
        Ok(())
    }

    /// `begin { ... }` and `end { ... }`: a single statement-block child.
    fn compile_wrapped_block(&mut self, node: &AstNode) -> Result<StatementBlock, CompileError> {
        let [block] = children::<1>(node)?;
        self.compile_block(block)
    }

    fn compile_udf(&mut self, node: &AstNode) -> Result<Udf, CompileError> {
        let (params, return_type, body) = match node.children() {
            [params, body] => (params, None, body),
            [params, return_type, body] => (params, Some(return_type), body),
            children => return Err(arity_error(node, "2 or 3", children.len())),
        };

        let params = params
            .children()
            .iter()
            .map(|param| {
                expect_type(node, param, NodeType::Parameter)?;
                let gate = match param.children() {
                    [] => TypeGate::Any,
                    [type_decl] => parse_type(type_name(type_decl))?,
                    children => return Err(arity_error(param, "0 or 1", children.len())),
                };
                Ok(Parameter {
                    name: param.token_str().into(),
                    gate,
                })
            })
            .collect::<Result<Vec<_>, CompileError>>()?;

        let return_gate = return_type
            .map(|node| parse_type(type_name(node)))
            .transpose()?
            .unwrap_or_default();

        let saved_loop_depth = std::mem::take(&mut self.loop_depth);
        self.in_function = true;
        let body = self.compile_block(body);
        self.in_function = false;
        self.loop_depth = saved_loop_depth;

        Ok(Udf {
            name: node.token_str().to_string(),
            params,
            return_gate,
            body: body?,
        })
    }
}

/// The node's children as a fixed-size array, or an internal-consistency
/// error naming the expected count.
pub(super) fn children<const N: usize>(node: &AstNode) -> Result<&[AstNode; N], CompileError> {
    node.children()
        .try_into()
        .map_err(|_| arity_error(node, &N.to_string(), node.children().len()))
}

pub(super) fn arity_error(node: &AstNode, expected: &str, got: usize) -> CompileError {
    CompileError::InternalConsistency {
        node_type: node.node_type,
        expected: expected.to_string(),
        got,
        token: node.token.clone(),
    }
}

pub(super) fn expect_type(
    parent: &AstNode,
    child: &AstNode,
    expected: NodeType,
) -> Result<(), CompileError> {
    if child.node_type == expected {
        Ok(())
    } else {
        Err(CompileError::UnexpectedChild {
            parent: parent.node_type,
            expected,
            got: child.node_type,
        })
    }
}

pub(super) fn parse_type(name: &str) -> Result<TypeGate, CompileError> {
    name.parse().map_err(CompileError::UnknownType)
}

/// Type name carried by a "type declaration" or "return type" node, either
/// as its token or as the token of its single child.
fn type_name(node: &AstNode) -> &str {
    match (node.token.as_deref(), node.children()) {
        (Some(token), _) if !token.is_empty() => token,
        (_, [child]) => child.token_str(),
        _ => "",
    }
}
