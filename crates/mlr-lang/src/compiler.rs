//! Compiler from the parser's generic syntax tree to evaluable nodes.
//!
//! ## Design
//!
//! The parser hands over a tree of [`AstNode`](crate::AstNode)s, each tagged
//! with a node type, a token and an optional list of children. The compiler
//! walks it once, before any record is read, and produces a [`Program`]:
//!
//! - `begin` and `end` blocks, kept apart so the runner can schedule them
//! - the main block, run once per record
//! - user-defined functions, addressed by index from their callsites
//!
//! Dispatch on node type is total. A node type with no meaning in the
//! position it appears in is a [`CompileError`], never silently skipped.
//! Child counts are checked before recursing; a wrong count means the tree
//! did not come from the parser and is reported as an internal consistency
//! failure.

mod compile;
mod compiled;
mod error;
mod evaluable;
mod lvalue;
mod statement;
#[cfg(test)]
mod test_compiler;

pub use compile::Compiler;
pub use compiled::Program;
pub use error::CompileError;
