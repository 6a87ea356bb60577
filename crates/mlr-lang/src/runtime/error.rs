use thiserror::Error;

use crate::{Ident, TypeGate, value::IndexError};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScopeError {
    #[error("variable \"{0}\" has already been defined in the same scope")]
    Redeclared(Ident),
    #[error("couldn't assign variable {gate} {name} from value of type {got}")]
    TypeGate {
        name: Ident,
        gate: TypeGate,
        got: &'static str,
    },
    #[error("indexed assignment to \"{name}\": leading index must be string or int; got {got}")]
    LeadingIndexType { name: Ident, got: &'static str },
    #[error("indexed assignment to \"{name}\": {source}")]
    Index {
        name: Ident,
        #[source]
        source: IndexError,
    },
}
