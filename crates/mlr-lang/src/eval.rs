// Runtime side of a compiled program: expressions, assignment targets,
// statements and user-defined function calls, all evaluated against a State.
pub mod builtin;
pub mod error;
pub mod evaluable;
pub mod lvalue;
pub mod statement;
pub mod udf;

pub use builtin::{BUILTIN_FUNCTIONS, BuiltinFunction, ParamNum};
pub use error::RuntimeError;
pub use evaluable::{Callsite, ContextVariable, Evaluable};
pub use lvalue::Lvalue;
pub use statement::{Flow, PrintTarget, Statement, StatementBlock};
pub use udf::{Parameter, Udf};
