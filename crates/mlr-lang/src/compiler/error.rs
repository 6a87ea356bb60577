use thiserror::Error;

use crate::ast::NodeType;

/// Errors raised while turning a syntax tree into a runnable program.
///
/// `InternalConsistency` means the tree has a shape the parser never
/// produces; everything else is a mistake in the DSL program itself.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("unhandled syntax node type \"{0}\"")]
    UnhandledNodeType(NodeType),
    #[error("internal coding error: \"{node_type}\" node with token {token:?} expects {expected} children; got {got}")]
    InternalConsistency {
        node_type: NodeType,
        expected: String,
        got: usize,
        token: Option<String>,
    },
    #[error("internal coding error: \"{parent}\" node expects a \"{expected}\" child; got \"{got}\"")]
    UnexpectedChild {
        parent: NodeType,
        expected: NodeType,
        got: NodeType,
    },
    #[error("function name not found: {0}")]
    UnknownFunction(String),
    #[error("function {name} invoked with {got} argument(s); expected {expected}")]
    FunctionArity {
        name: String,
        expected: String,
        got: usize,
    },
    #[error("function named \"{0}\" has already been defined")]
    DuplicateFunction(String),
    #[error("function named \"{0}\" must not override a built-in function of the same name")]
    BuiltinRedefinition(String),
    #[error("unknown type name \"{0}\"")]
    UnknownType(String),
    #[error("cannot parse \"{token}\" as {node_type}")]
    BadLiteral { node_type: NodeType, token: String },
    #[error("{0} is only valid at top level")]
    NotTopLevel(NodeType),
    #[error("break statement outside of loop")]
    BreakOutsideLoop,
    #[error("continue statement outside of loop")]
    ContinueOutsideLoop,
    #[error("return statement outside of function")]
    ReturnOutsideFunction,
    #[error("unknown context variable \"{0}\"")]
    UnknownContextVariable(String),
    #[error("{0} is not assignable")]
    NotAssignable(NodeType),
    #[error("program root must be a statement block; got {0}")]
    UnexpectedRoot(NodeType),
}

impl CompileError {
    #[cold]
    pub fn code(&self) -> &'static str {
        match self {
            CompileError::UnhandledNodeType(_) => "CompileError::UnhandledNodeType",
            CompileError::InternalConsistency { .. } => "CompileError::InternalConsistency",
            CompileError::UnexpectedChild { .. } => "CompileError::UnexpectedChild",
            CompileError::UnknownFunction(_) => "CompileError::UnknownFunction",
            CompileError::FunctionArity { .. } => "CompileError::FunctionArity",
            CompileError::DuplicateFunction(_) => "CompileError::DuplicateFunction",
            CompileError::BuiltinRedefinition(_) => "CompileError::BuiltinRedefinition",
            CompileError::UnknownType(_) => "CompileError::UnknownType",
            CompileError::BadLiteral { .. } => "CompileError::BadLiteral",
            CompileError::NotTopLevel(_) => "CompileError::NotTopLevel",
            CompileError::BreakOutsideLoop => "CompileError::BreakOutsideLoop",
            CompileError::ContinueOutsideLoop => "CompileError::ContinueOutsideLoop",
            CompileError::ReturnOutsideFunction => "CompileError::ReturnOutsideFunction",
            CompileError::UnknownContextVariable(_) => "CompileError::UnknownContextVariable",
            CompileError::NotAssignable(_) => "CompileError::NotAssignable",
            CompileError::UnexpectedRoot(_) => "CompileError::UnexpectedRoot",
        }
    }
}
