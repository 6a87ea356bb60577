//! Compiled right-hand-side expressions.
//!
//! An [`Evaluable`] is built once from the syntax tree and then evaluated
//! against the [`State`] for every record. Operators are ordinary calls
//! through the builtin table; only the operators that must not evaluate all
//! of their operands (`&&`, `||`, `??`, `???`, `?:`) have their own callsite
//! kinds.

use smallvec::SmallVec;

use crate::{Ident, KeyError, RuntimeError, State, Value, value::map_key};

use super::builtin::BuiltinFunction;
use super::udf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextVariable {
    Nr,
    Fnr,
    Filename,
    Filenum,
    Nf,
}

#[derive(Debug, Clone)]
pub enum Evaluable {
    Literal(Value),
    ArrayLiteral(Vec<Evaluable>),
    MapLiteral(Vec<(Evaluable, Evaluable)>),
    IndexAccess {
        base: Box<Evaluable>,
        index: Box<Evaluable>,
    },
    SliceAccess {
        base: Box<Evaluable>,
        lower: Option<Box<Evaluable>>,
        upper: Option<Box<Evaluable>>,
    },
    LocalVariable(Ident),
    DirectField(String),
    /// `$[expr]`, by name or by 1-up position.
    IndirectField(Box<Evaluable>),
    /// `$[[n]]`
    PositionalFieldName(Box<Evaluable>),
    /// `$[[[n]]]`
    PositionalFieldValue(Box<Evaluable>),
    FullRecord,
    DirectOosvar(String),
    IndirectOosvar(Box<Evaluable>),
    FullOosvar,
    Context(ContextVariable),
    /// `ENV[expr]`
    EnvironmentVariable(Box<Evaluable>),
    Call(Callsite),
}

#[derive(Debug, Clone)]
pub enum Callsite {
    Builtin {
        name: &'static str,
        function: &'static BuiltinFunction,
        args: Vec<Evaluable>,
    },
    And(Box<Evaluable>, Box<Evaluable>),
    Or(Box<Evaluable>, Box<Evaluable>),
    /// `??`: the right side when the left is absent.
    AbsentCoalesce(Box<Evaluable>, Box<Evaluable>),
    /// `???`: the right side when the left is absent, empty, or an error.
    AbsentEmptyCoalesce(Box<Evaluable>, Box<Evaluable>),
    Ternary(Box<Evaluable>, Box<Evaluable>, Box<Evaluable>),
    User {
        id: usize,
        name: String,
        args: Vec<Evaluable>,
    },
}

impl Evaluable {
    pub fn evaluate(&self, state: &mut State) -> Result<Value, RuntimeError> {
        match self {
            Evaluable::Literal(value) => Ok(value.clone()),
            Evaluable::ArrayLiteral(elements) => elements
                .iter()
                .map(|e| e.evaluate(state))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Evaluable::MapLiteral(pairs) => {
                let mut map = Value::empty_map();
                for (key, value) in pairs {
                    let key = key.evaluate(state)?;
                    let value = value.evaluate(state)?;
                    map.put_indexed(&[key], value)?;
                }
                Ok(map)
            }
            Evaluable::IndexAccess { base, index } => {
                let base = base.evaluate(state)?;
                let index = index.evaluate(state)?;
                Ok(base.index(&index)?)
            }
            Evaluable::SliceAccess { base, lower, upper } => {
                let base = base.evaluate(state)?;
                let lower = lower.as_ref().map(|e| e.evaluate(state)).transpose()?;
                let upper = upper.as_ref().map(|e| e.evaluate(state)).transpose()?;
                Ok(base.slice(lower.as_ref(), upper.as_ref())?)
            }
            Evaluable::LocalVariable(name) => {
                Ok(state.stack.get(*name).cloned().unwrap_or_default())
            }
            Evaluable::DirectField(name) => Ok(state
                .record
                .as_ref()
                .and_then(|r| r.get(name))
                .cloned()
                .unwrap_or_default()),
            Evaluable::IndirectField(name) => {
                let key = name.evaluate(state)?;
                if key.is_absent() {
                    return Ok(Value::Absent);
                }
                let Some(record) = state.record.as_ref() else {
                    return Ok(Value::Absent);
                };
                Ok(record
                    .get_with_value_index(&key)?
                    .cloned()
                    .unwrap_or_default())
            }
            Evaluable::PositionalFieldName(position) => {
                positional(state, position, |(name, _)| Value::from_string(name.as_str()))
            }
            Evaluable::PositionalFieldValue(position) => {
                positional(state, position, |(_, value)| value.clone())
            }
            Evaluable::FullRecord => Ok(state
                .record
                .as_ref()
                .map(|r| Value::from(r.clone()))
                .unwrap_or_default()),
            Evaluable::DirectOosvar(name) => {
                Ok(state.oosvars.get(name).cloned().unwrap_or_default())
            }
            Evaluable::IndirectOosvar(name) => {
                let key = name.evaluate(state)?;
                if key.is_absent() {
                    return Ok(Value::Absent);
                }
                Ok(state
                    .oosvars
                    .get(&map_key(&key)?)
                    .cloned()
                    .unwrap_or_default())
            }
            Evaluable::FullOosvar => Ok(Value::Map(state.oosvars.clone())),
            Evaluable::Context(variable) => Ok(match variable {
                ContextVariable::Nr => Value::Int(state.context.nr),
                ContextVariable::Fnr => Value::Int(state.context.fnr),
                ContextVariable::Filename => Value::from_string(state.context.filename.as_str()),
                ContextVariable::Filenum => Value::Int(state.context.filenum),
                ContextVariable::Nf => state
                    .record
                    .as_ref()
                    .map(|r| Value::from(r.len()))
                    .unwrap_or_default(),
            }),
            Evaluable::EnvironmentVariable(name) => {
                let name = name.evaluate(state)?;
                if name.is_absent() {
                    return Ok(Value::Absent);
                }
                Ok(std::env::var(&*name.to_text())
                    .map(|v| Value::infer(&v))
                    .unwrap_or_default())
            }
            Evaluable::Call(callsite) => callsite.evaluate(state),
        }
    }
}

fn positional(
    state: &mut State,
    position: &Evaluable,
    project: impl FnOnce((&String, &Value)) -> Value,
) -> Result<Value, RuntimeError> {
    let position = position.evaluate(state)?;
    let Some(record) = state.record.as_ref() else {
        return Ok(Value::Absent);
    };
    match position {
        Value::Int(i) => Ok(record.get_positional(i).map(project).unwrap_or_default()),
        Value::Absent => Ok(Value::Absent),
        other => Err(KeyError::KeyType(other.type_name()).into()),
    }
}

/// Boolean operand of `&&`/`||`. Absent passes through; anything else that
/// isn't boolean makes the whole expression an error.
enum Logical {
    Bool(bool),
    Absent,
    Invalid(Value),
}

fn logical(op: &str, value: Value) -> Logical {
    match value {
        Value::Boolean(b) => Logical::Bool(b),
        Value::Absent => Logical::Absent,
        Value::Error(_) => Logical::Invalid(value),
        other => Logical::Invalid(Value::error(format!(
            "{}: unacceptable type {}",
            op,
            other.type_name()
        ))),
    }
}

impl Callsite {
    pub fn evaluate(&self, state: &mut State) -> Result<Value, RuntimeError> {
        match self {
            Callsite::Builtin {
                name,
                function,
                args,
            } => {
                let args = args
                    .iter()
                    .map(|a| a.evaluate(state))
                    .collect::<Result<SmallVec<[Value; 4]>, _>>()?;
                Ok((function.func)(name, &args))
            }
            Callsite::And(left, right) => {
                let left = match logical("&&", left.evaluate(state)?) {
                    Logical::Bool(false) => return Ok(Value::FALSE),
                    Logical::Invalid(err) => return Ok(err),
                    other => other,
                };
                Ok(match (left, logical("&&", right.evaluate(state)?)) {
                    (_, Logical::Invalid(err)) => err,
                    (_, Logical::Bool(b)) => Value::Boolean(b),
                    (Logical::Bool(b), Logical::Absent) => Value::Boolean(b),
                    _ => Value::Absent,
                })
            }
            Callsite::Or(left, right) => {
                let left = match logical("||", left.evaluate(state)?) {
                    Logical::Bool(true) => return Ok(Value::TRUE),
                    Logical::Invalid(err) => return Ok(err),
                    other => other,
                };
                Ok(match (left, logical("||", right.evaluate(state)?)) {
                    (_, Logical::Invalid(err)) => err,
                    (_, Logical::Bool(b)) => Value::Boolean(b),
                    (Logical::Bool(b), Logical::Absent) => Value::Boolean(b),
                    _ => Value::Absent,
                })
            }
            Callsite::AbsentCoalesce(left, right) => {
                let value = left.evaluate(state)?;
                if value.is_absent() {
                    right.evaluate(state)
                } else {
                    Ok(value)
                }
            }
            Callsite::AbsentEmptyCoalesce(left, right) => {
                let value = left.evaluate(state)?;
                if value.is_absent() || value.is_void() || value.is_error() {
                    right.evaluate(state)
                } else {
                    Ok(value)
                }
            }
            Callsite::Ternary(condition, if_true, if_false) => {
                match condition.evaluate(state)? {
                    Value::Boolean(true) => if_true.evaluate(state),
                    Value::Boolean(false) => if_false.evaluate(state),
                    Value::Absent => Ok(Value::Absent),
                    other => Ok(Value::error(format!(
                        "?:: condition must be boolean; got {}",
                        other.type_name()
                    ))),
                }
            }
            Callsite::User { id, name, args } => {
                let args = args
                    .iter()
                    .map(|a| a.evaluate(state))
                    .collect::<Result<Vec<_>, _>>()?;
                udf::call(state, *id, name, args)
            }
        }
    }
}
