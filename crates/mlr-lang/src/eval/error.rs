use thiserror::Error;

use crate::{IndexError, KeyError, ScopeError, TypeGate};

type FunctionName = String;

/// Errors raised while executing a compiled program against one record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error(transparent)]
    Scope(#[from] ScopeError),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error("computed field access: {0}")]
    KeyType(#[from] KeyError),
    #[error("{statement}: condition must evaluate to boolean; got {got}")]
    NonBooleanCondition {
        statement: &'static str,
        got: &'static str,
    },
    #[error("{0}: cannot loop over a value of type {1}")]
    NotIterable(&'static str, &'static str),
    #[error("{target}: expected a map; got {got}")]
    NotAMap {
        target: &'static str,
        got: &'static str,
    },
    #[error("maximum call depth {0} exceeded")]
    RecursionLimit(u32),
    #[error("function {name}: argument {parameter} of type {got} does not match declared type {gate}")]
    ArgumentType {
        name: FunctionName,
        parameter: String,
        gate: TypeGate,
        got: &'static str,
    },
    #[error("function {name}: return value of type {got} does not match declared type {gate}")]
    ReturnType {
        name: FunctionName,
        gate: TypeGate,
        got: &'static str,
    },
    #[error("field assignment outside of a record context")]
    NoCurrentRecord,
}

impl RuntimeError {
    #[cold]
    pub fn code(&self) -> &'static str {
        match self {
            RuntimeError::Scope(ScopeError::Redeclared(_)) => "ScopeError::Redeclared",
            RuntimeError::Scope(ScopeError::TypeGate { .. }) => "ScopeError::TypeGate",
            RuntimeError::Scope(ScopeError::LeadingIndexType { .. }) => {
                "ScopeError::LeadingIndexType"
            }
            RuntimeError::Scope(ScopeError::Index { .. }) => "ScopeError::Index",
            RuntimeError::Index(_) => "RuntimeError::Index",
            RuntimeError::KeyType(_) => "RuntimeError::KeyType",
            RuntimeError::NonBooleanCondition { .. } => "RuntimeError::NonBooleanCondition",
            RuntimeError::NotIterable(_, _) => "RuntimeError::NotIterable",
            RuntimeError::NotAMap { .. } => "RuntimeError::NotAMap",
            RuntimeError::RecursionLimit(_) => "RuntimeError::RecursionLimit",
            RuntimeError::ArgumentType { .. } => "RuntimeError::ArgumentType",
            RuntimeError::ReturnType { .. } => "RuntimeError::ReturnType",
            RuntimeError::NoCurrentRecord => "RuntimeError::NoCurrentRecord",
        }
    }
}
