use smallvec::SmallVec;

use crate::{
    Ident, KeyError, Mlrmap, Record, RuntimeError, State, Value,
    value::{map_key, nest},
};

use super::evaluable::Evaluable;

type Indices = SmallVec<[Value; 4]>;

/// Left-hand side of an assignment or target of `unset`.
#[derive(Debug, Clone)]
pub enum Lvalue {
    Local {
        name: Ident,
        indices: Vec<Evaluable>,
    },
    DirectField {
        name: String,
        indices: Vec<Evaluable>,
    },
    IndirectField {
        name: Evaluable,
        indices: Vec<Evaluable>,
    },
    PositionalFieldName(Evaluable),
    PositionalFieldValue(Evaluable),
    FullRecord,
    DirectOosvar {
        name: String,
        indices: Vec<Evaluable>,
    },
    IndirectOosvar {
        name: Evaluable,
        indices: Vec<Evaluable>,
    },
    FullOosvar,
}

fn evaluate_indices(indices: &[Evaluable], state: &mut State) -> Result<Indices, RuntimeError> {
    indices.iter().map(|i| i.evaluate(state)).collect()
}

/// Writes `value` at `indices` under `name` in a field or oosvar map.
fn put_into(map: &mut Mlrmap, name: String, indices: &[Value], value: Value) -> Result<(), RuntimeError> {
    if indices.is_empty() {
        map.insert(name, value);
    } else if let Some(existing) = map.get_mut(&name) {
        existing.put_indexed(indices, value)?;
    } else {
        map.insert(name, nest(indices, value)?);
    }
    Ok(())
}

fn remove_from(map: &mut Mlrmap, name: &str, indices: &[Value]) -> Result<(), RuntimeError> {
    if indices.is_empty() {
        map.shift_remove(name);
    } else if let Some(value) = map.get_mut(name) {
        value.remove_indexed(indices)?;
    }
    Ok(())
}

/// Field name for a computed `$[...]` target: strings by name, ints by position.
fn resolve_field_name(record: &Record, key: &Value) -> Result<Option<String>, RuntimeError> {
    match key {
        Value::String(s) => Ok(Some(s.clone())),
        Value::Void => Ok(Some(String::new())),
        Value::Int(i) => Ok(record.get_positional(*i).map(|(name, _)| name.clone())),
        other => Err(KeyError::KeyType(other.type_name()).into()),
    }
}

fn position(key: &Value) -> Result<Option<i64>, RuntimeError> {
    match key {
        Value::Int(i) => Ok(Some(*i)),
        Value::Absent => Ok(None),
        other => Err(KeyError::KeyType(other.type_name()).into()),
    }
}

impl Lvalue {
    /// Stores `value`. Absent values are never stored.
    pub fn assign(&self, state: &mut State, value: Value) -> Result<(), RuntimeError> {
        if value.is_absent() {
            return Ok(());
        }

        match self {
            Lvalue::Local { name, indices } => {
                if indices.is_empty() {
                    state.stack.assign_or_reuse(*name, value)?;
                } else {
                    let indices = evaluate_indices(indices, state)?;
                    state.stack.assign_indexed(*name, &indices, value)?;
                }
            }
            Lvalue::DirectField { name, indices } => {
                let indices = evaluate_indices(indices, state)?;
                let record = state.record_mut()?;
                if indices.is_empty() {
                    record.put(name.as_str(), value);
                } else {
                    match record.get_mut(name) {
                        Some(existing) => existing.put_indexed(&indices, value)?,
                        None => {
                            let mut fresh = Value::Absent;
                            fresh.put_indexed(&indices, value)?;
                            record.put(name.as_str(), fresh);
                        }
                    }
                }
            }
            Lvalue::IndirectField { name, indices } => {
                let key = name.evaluate(state)?;
                let indices = evaluate_indices(indices, state)?;
                let record = state.record_mut()?;
                if indices.is_empty() {
                    record.put_with_value_index(&key, value)?;
                } else if let Some(name) = resolve_field_name(record, &key)? {
                    match record.get_mut(&name) {
                        Some(existing) => existing.put_indexed(&indices, value)?,
                        None => {
                            let mut fresh = Value::Absent;
                            fresh.put_indexed(&indices, value)?;
                            record.put(name, fresh);
                        }
                    }
                }
            }
            Lvalue::PositionalFieldName(n) => {
                let n = n.evaluate(state)?;
                if let Some(i) = position(&n)? {
                    state.record_mut()?.rename_positional(i, &value.to_text());
                }
            }
            Lvalue::PositionalFieldValue(n) => {
                let n = n.evaluate(state)?;
                if let Some(i) = position(&n)? {
                    state.record_mut()?.put_positional(i, value);
                }
            }
            Lvalue::FullRecord => match value {
                Value::Map(map) => *state.record_mut()? = Record::from(map),
                other => {
                    return Err(RuntimeError::NotAMap {
                        target: "$*",
                        got: other.type_name(),
                    });
                }
            },
            Lvalue::DirectOosvar { name, indices } => {
                let indices = evaluate_indices(indices, state)?;
                put_into(&mut state.oosvars, name.clone(), &indices, value)?;
            }
            Lvalue::IndirectOosvar { name, indices } => {
                let key = map_key(&name.evaluate(state)?)?;
                let indices = evaluate_indices(indices, state)?;
                put_into(&mut state.oosvars, key, &indices, value)?;
            }
            Lvalue::FullOosvar => match value {
                Value::Map(map) => state.oosvars = map,
                other => {
                    return Err(RuntimeError::NotAMap {
                        target: "@*",
                        got: other.type_name(),
                    });
                }
            },
        }
        Ok(())
    }

    /// Removes the target. Targets that don't exist are left alone.
    pub fn unset(&self, state: &mut State) -> Result<(), RuntimeError> {
        match self {
            Lvalue::Local { name, indices } => {
                if indices.is_empty() {
                    state.stack.unset(*name);
                } else {
                    let indices = evaluate_indices(indices, state)?;
                    state.stack.unset_indexed(*name, &indices)?;
                }
            }
            Lvalue::DirectField { name, indices } => {
                let indices = evaluate_indices(indices, state)?;
                let record = state.record_mut()?;
                if indices.is_empty() {
                    record.remove(name);
                } else if let Some(value) = record.get_mut(name) {
                    value.remove_indexed(&indices)?;
                }
            }
            Lvalue::IndirectField { name, indices } => {
                let key = name.evaluate(state)?;
                let indices = evaluate_indices(indices, state)?;
                let record = state.record_mut()?;
                if let Some(name) = resolve_field_name(record, &key)? {
                    if indices.is_empty() {
                        record.remove(&name);
                    } else if let Some(value) = record.get_mut(&name) {
                        value.remove_indexed(&indices)?;
                    }
                }
            }
            Lvalue::PositionalFieldName(n) | Lvalue::PositionalFieldValue(n) => {
                let n = n.evaluate(state)?;
                if let Some(i) = position(&n)? {
                    let record = state.record_mut()?;
                    if let Some(name) = record.get_positional(i).map(|(name, _)| name.clone()) {
                        record.remove(&name);
                    }
                }
            }
            Lvalue::FullRecord => state.record_mut()?.clear(),
            Lvalue::DirectOosvar { name, indices } => {
                let indices = evaluate_indices(indices, state)?;
                remove_from(&mut state.oosvars, name, &indices)?;
            }
            Lvalue::IndirectOosvar { name, indices } => {
                let key = map_key(&name.evaluate(state)?)?;
                let indices = evaluate_indices(indices, state)?;
                remove_from(&mut state.oosvars, &key, &indices)?;
            }
            Lvalue::FullOosvar => state.oosvars.clear(),
        }
        Ok(())
    }
}
