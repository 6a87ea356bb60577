//! Right-hand-side expressions.

use std::f64::consts::{E, PI};

use super::compile::{Compiler, children};
use super::error::CompileError;
use crate::ast::{AstNode, NodeType};
use crate::eval::{BUILTIN_FUNCTIONS, Callsite, ContextVariable, Evaluable};
use crate::{Ident, Value};

impl Compiler {
    /// Compiles one expression node.
    ///
    /// Leaves (nodes without children) are compiled directly into scalar
    /// producers. Every other node dispatches on its type; a type with no
    /// expression meaning is an error rather than being skipped.
    pub(crate) fn compile_evaluable(&self, node: &AstNode) -> Result<Evaluable, CompileError> {
        if node.is_leaf() {
            return self.compile_leaf(node);
        }

        match node.node_type {
            NodeType::ArrayLiteral => Ok(Evaluable::ArrayLiteral(
                self.compile_evaluables(node.children())?,
            )),
            NodeType::MapLiteral => node
                .children()
                .iter()
                .map(|pair| {
                    if pair.node_type != NodeType::MapLiteralKeyValuePair {
                        return Err(CompileError::UnexpectedChild {
                            parent: node.node_type,
                            expected: NodeType::MapLiteralKeyValuePair,
                            got: pair.node_type,
                        });
                    }
                    let [key, value] = children::<2>(pair)?;
                    Ok((self.compile_evaluable(key)?, self.compile_evaluable(value)?))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Evaluable::MapLiteral),
            NodeType::ArrayOrMapIndexAccess => {
                let [base, index] = children::<2>(node)?;
                Ok(Evaluable::IndexAccess {
                    base: Box::new(self.compile_evaluable(base)?),
                    index: Box::new(self.compile_evaluable(index)?),
                })
            }
            NodeType::ArraySliceAccess => {
                let [base, lower, upper] = children::<3>(node)?;
                Ok(Evaluable::SliceAccess {
                    base: Box::new(self.compile_evaluable(base)?),
                    lower: self.compile_slice_bound(lower, NodeType::ArraySliceEmptyLowerIndex)?,
                    upper: self.compile_slice_bound(upper, NodeType::ArraySliceEmptyUpperIndex)?,
                })
            }
            NodeType::IndirectFieldValue => {
                Ok(Evaluable::IndirectField(self.compile_only_child(node)?))
            }
            NodeType::PositionalFieldName => {
                Ok(Evaluable::PositionalFieldName(self.compile_only_child(node)?))
            }
            NodeType::PositionalFieldValue => {
                Ok(Evaluable::PositionalFieldValue(self.compile_only_child(node)?))
            }
            NodeType::IndirectOosvarValue => {
                Ok(Evaluable::IndirectOosvar(self.compile_only_child(node)?))
            }
            NodeType::EnvironmentVariable => {
                Ok(Evaluable::EnvironmentVariable(self.compile_only_child(node)?))
            }
            NodeType::Operator | NodeType::DotOperator | NodeType::FunctionCallsite => {
                let args = self.compile_evaluables(node.children())?;
                self.build_call(node.token_str(), args)
            }
            // A leaf kind that arrived with an empty child list.
            _ if node.children().is_empty() => self.compile_leaf(node),
            other => Err(CompileError::UnhandledNodeType(other)),
        }
    }

    pub(super) fn compile_evaluables(&self, nodes: &[AstNode]) -> Result<Vec<Evaluable>, CompileError> {
        nodes.iter().map(|n| self.compile_evaluable(n)).collect()
    }

    fn compile_only_child(&self, node: &AstNode) -> Result<Box<Evaluable>, CompileError> {
        let [child] = children::<1>(node)?;
        Ok(Box::new(self.compile_evaluable(child)?))
    }

    fn compile_slice_bound(
        &self,
        node: &AstNode,
        empty: NodeType,
    ) -> Result<Option<Box<Evaluable>>, CompileError> {
        if node.node_type == empty {
            Ok(None)
        } else {
            Ok(Some(Box::new(self.compile_evaluable(node)?)))
        }
    }

    fn compile_leaf(&self, node: &AstNode) -> Result<Evaluable, CompileError> {
        let token = node.token_str();
        match node.node_type {
            NodeType::StringLiteral => Ok(Evaluable::Literal(Value::from_string(unbackslash(token)))),
            NodeType::IntLiteral => match Value::infer(token) {
                value @ (Value::Int(_) | Value::Float(_)) => Ok(Evaluable::Literal(value)),
                _ => Err(bad_literal(node)),
            },
            NodeType::FloatLiteral => match Value::infer(token) {
                Value::Float(f) => Ok(Evaluable::Literal(Value::Float(f))),
                Value::Int(i) => Ok(Evaluable::Literal(Value::Float(i as f64))),
                _ => Err(bad_literal(node)),
            },
            NodeType::BooleanLiteral => match token {
                "true" => Ok(Evaluable::Literal(Value::TRUE)),
                "false" => Ok(Evaluable::Literal(Value::FALSE)),
                _ => Err(bad_literal(node)),
            },
            NodeType::ArrayLiteral => Ok(Evaluable::ArrayLiteral(Vec::new())),
            NodeType::MapLiteral => Ok(Evaluable::MapLiteral(Vec::new())),
            NodeType::LocalVariable => Ok(Evaluable::LocalVariable(Ident::new(token))),
            NodeType::DirectFieldValue => Ok(Evaluable::DirectField(strip_sigil(token, '$'))),
            NodeType::FullRecord => Ok(Evaluable::FullRecord),
            NodeType::DirectOosvarValue => Ok(Evaluable::DirectOosvar(strip_sigil(token, '@'))),
            NodeType::FullOosvar => Ok(Evaluable::FullOosvar),
            NodeType::ContextVariable | NodeType::Constant => context_variable(token),
            NodeType::Operator | NodeType::FunctionCallsite => self.build_call(token, Vec::new()),
            other => Err(CompileError::UnhandledNodeType(other)),
        }
    }

    /// Resolves a call by name: short-circuiting operators first, then
    /// user-defined functions, then builtins.
    pub(super) fn build_call(&self, name: &str, args: Vec<Evaluable>) -> Result<Evaluable, CompileError> {
        let callsite = match name {
            "&&" | "||" | "??" | "???" => {
                let [left, right] = fixed_args::<2>(name, args)?;
                let (left, right) = (Box::new(left), Box::new(right));
                match name {
                    "&&" => Callsite::And(left, right),
                    "||" => Callsite::Or(left, right),
                    "??" => Callsite::AbsentCoalesce(left, right),
                    _ => Callsite::AbsentEmptyCoalesce(left, right),
                }
            }
            "?:" => {
                let [condition, if_true, if_false] = fixed_args::<3>(name, args)?;
                Callsite::Ternary(Box::new(condition), Box::new(if_true), Box::new(if_false))
            }
            _ => {
                if let Some(signature) = self.functions.get(name) {
                    if signature.arity != args.len() {
                        return Err(CompileError::FunctionArity {
                            name: name.to_string(),
                            expected: signature.arity.to_string(),
                            got: args.len(),
                        });
                    }
                    Callsite::User {
                        id: signature.id,
                        name: name.to_string(),
                        args,
                    }
                } else if let Some((name, function)) = BUILTIN_FUNCTIONS.get_key_value(name) {
                    if !function.num_params.is_valid(args.len()) {
                        return Err(CompileError::FunctionArity {
                            name: name.to_string(),
                            expected: function.num_params.to_string(),
                            got: args.len(),
                        });
                    }
                    Callsite::Builtin {
                        name: *name,
                        function,
                        args,
                    }
                } else {
                    return Err(CompileError::UnknownFunction(name.to_string()));
                }
            }
        };
        Ok(Evaluable::Call(callsite))
    }
}

fn fixed_args<const N: usize>(name: &str, args: Vec<Evaluable>) -> Result<[Evaluable; N], CompileError> {
    args.try_into().map_err(|args: Vec<Evaluable>| CompileError::FunctionArity {
        name: name.to_string(),
        expected: N.to_string(),
        got: args.len(),
    })
}

fn bad_literal(node: &AstNode) -> CompileError {
    CompileError::BadLiteral {
        node_type: node.node_type,
        token: node.token_str().to_string(),
    }
}

fn context_variable(name: &str) -> Result<Evaluable, CompileError> {
    let variable = match name {
        "NR" => ContextVariable::Nr,
        "FNR" => ContextVariable::Fnr,
        "FILENAME" => ContextVariable::Filename,
        "FILENUM" => ContextVariable::Filenum,
        "NF" => ContextVariable::Nf,
        "M_PI" => return Ok(Evaluable::Literal(Value::Float(PI))),
        "M_E" => return Ok(Evaluable::Literal(Value::Float(E))),
        other => return Err(CompileError::UnknownContextVariable(other.to_string())),
    };
    Ok(Evaluable::Context(variable))
}

/// `$x`, `${x y}`, `@sum` → the bare name.
pub(super) fn strip_sigil(token: &str, sigil: char) -> String {
    let name = token.strip_prefix(sigil).unwrap_or(token);
    name.strip_prefix('{')
        .and_then(|n| n.strip_suffix('}'))
        .unwrap_or(name)
        .to_string()
}

/// Resolves the backslash escapes allowed in string literals.
fn unbackslash(token: &str) -> String {
    if !token.contains('\\') {
        return token.to_string();
    }

    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
