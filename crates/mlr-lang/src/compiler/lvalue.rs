use super::compile::{Compiler, children};
use super::error::CompileError;
use super::evaluable::strip_sigil;
use crate::Ident;
use crate::ast::{AstNode, NodeType};
use crate::eval::Lvalue;

impl Compiler {
    /// Compiles the target of an assignment or `unset`.
    ///
    /// Index accesses on an assignable base (`x[1]["a"]`, `$y[2]`, `@s[$a]`)
    /// collect their indices onto that base.
    pub(super) fn compile_lvalue(&self, node: &AstNode) -> Result<Lvalue, CompileError> {
        let token = node.token_str();
        match node.node_type {
            NodeType::LocalVariable => Ok(Lvalue::Local {
                name: Ident::new(token),
                indices: Vec::new(),
            }),
            NodeType::DirectFieldValue => Ok(Lvalue::DirectField {
                name: strip_sigil(token, '$'),
                indices: Vec::new(),
            }),
            NodeType::IndirectFieldValue => {
                let [name] = children::<1>(node)?;
                Ok(Lvalue::IndirectField {
                    name: self.compile_evaluable(name)?,
                    indices: Vec::new(),
                })
            }
            NodeType::PositionalFieldName => {
                let [position] = children::<1>(node)?;
                Ok(Lvalue::PositionalFieldName(self.compile_evaluable(position)?))
            }
            NodeType::PositionalFieldValue => {
                let [position] = children::<1>(node)?;
                Ok(Lvalue::PositionalFieldValue(self.compile_evaluable(position)?))
            }
            NodeType::FullRecord => Ok(Lvalue::FullRecord),
            NodeType::DirectOosvarValue => Ok(Lvalue::DirectOosvar {
                name: strip_sigil(token, '@'),
                indices: Vec::new(),
            }),
            NodeType::IndirectOosvarValue => {
                let [name] = children::<1>(node)?;
                Ok(Lvalue::IndirectOosvar {
                    name: self.compile_evaluable(name)?,
                    indices: Vec::new(),
                })
            }
            NodeType::FullOosvar => Ok(Lvalue::FullOosvar),
            NodeType::ArrayOrMapIndexAccess => {
                let [base, index] = children::<2>(node)?;
                let mut lvalue = self.compile_lvalue(base)?;
                match &mut lvalue {
                    Lvalue::Local { indices, .. }
                    | Lvalue::DirectField { indices, .. }
                    | Lvalue::IndirectField { indices, .. }
                    | Lvalue::DirectOosvar { indices, .. }
                    | Lvalue::IndirectOosvar { indices, .. } => {
                        indices.push(self.compile_evaluable(index)?)
                    }
                    _ => return Err(CompileError::NotAssignable(base.node_type)),
                }
                Ok(lvalue)
            }
            other => Err(CompileError::NotAssignable(other)),
        }
    }
}
