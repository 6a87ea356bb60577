//! `mlr-lang` is the evaluation core of the Miller record-processing DSL.
//!
//! A parser (not part of this crate) turns DSL text into a generic syntax
//! tree of [`AstNode`]s. This crate compiles that tree once into evaluable
//! nodes and runs them against a stream of [`Record`]s, keeping locals in a
//! scoped [`Stack`] and out-of-stream variables across the whole stream.
//!
//! ## Examples
//!
//! ```rust
//! use mlr_lang::{AstNode, Context, Engine, NodeType, Options, Value};
//!
//! // $z = $x . "!"
//! let program = AstNode::new(
//!     NodeType::StatementBlock,
//!     None,
//!     vec![AstNode::new(
//!         NodeType::Assignment,
//!         Some("="),
//!         vec![
//!             AstNode::leaf(NodeType::DirectFieldValue, "z"),
//!             AstNode::new(
//!                 NodeType::DotOperator,
//!                 Some("."),
//!                 vec![
//!                     AstNode::leaf(NodeType::DirectFieldValue, "x"),
//!                     AstNode::leaf(NodeType::StringLiteral, "!"),
//!                 ],
//!             ),
//!         ],
//!     )],
//! );
//!
//! let mut engine = Engine::from_ast(&program, Options::default()).unwrap();
//! let mut context = Context::new();
//! context.update_for_input_record();
//!
//! let record = vec![("x", Value::from("hi"))].into_iter().collect();
//! let processed = engine.execute(record, &context).unwrap();
//! assert_eq!(
//!     processed.record.unwrap().get("z"),
//!     Some(&Value::from("hi!"))
//! );
//! ```
pub mod ast;
pub mod compiler;
mod engine;
mod error;
pub mod eval;
mod ident;
mod record;
pub mod runtime;
mod types;
mod value;

pub use ast::{AstNode, NodeType};
pub use compiler::{CompileError, Compiler, Program};
pub use engine::{DEFAULT_MAX_CALL_DEPTH, Engine, Options, Processed};
pub use error::{Error, InnerError};
pub use eval::RuntimeError;
pub use ident::Ident;
pub use record::{KeyError, Record};
pub use runtime::{Context, Output, ScopeError, Stack, State, TypedBinding};
pub use types::TypeGate;
pub use value::{IndexError, Mlrmap, Value};

pub type MlrResult<T> = Result<T, Error>;

/// Compiles a syntax tree into a runnable [`Program`].
#[allow(clippy::result_large_err)]
pub fn compile(root: &AstNode) -> MlrResult<Program> {
    Ok(Compiler::new().compile_program(root)?)
}
