use thiserror::Error;

use super::{Mlrmap, Value};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    #[error("map keys must be string or int; got {0}")]
    KeyType(&'static str),
    #[error("array index must be int; got {0}")]
    ArrayIndexType(&'static str),
    #[error("zero indices are not supported; indices are 1-up")]
    ZeroIndex,
    #[error("array index {index} out of bounds 1..{len}")]
    OutOfBounds { index: i64, len: usize },
    #[error("cannot index a value of type {0}")]
    NotIndexable(&'static str),
    #[error("empty index list")]
    EmptyIndices,
}

/// String form of a map key. Int keys are stringified.
pub(crate) fn map_key(key: &Value) -> Result<String, IndexError> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Void => Ok(String::new()),
        Value::Int(i) => Ok(i.to_string()),
        other => Err(IndexError::KeyType(other.type_name())),
    }
}

/// Maps a 1-based (or negative, from the end) index to a 0-based position.
/// `None` when the index lies outside `1..=len` / `-len..=-1`.
pub(crate) fn unalias(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    if 1 <= index && index <= len {
        Some((index - 1) as usize)
    } else if -len <= index && index <= -1 {
        Some((index + len) as usize)
    } else {
        None
    }
}

impl Value {
    /// Single-level indexed read. Missing entries and out-of-bounds array
    /// reads are absent.
    pub fn index(&self, key: &Value) -> Result<Value, IndexError> {
        if key.is_absent() {
            return Ok(Value::Absent);
        }

        match self {
            Value::Absent => Ok(Value::Absent),
            Value::Map(m) => Ok(m.get(&map_key(key)?).cloned().unwrap_or_default()),
            Value::Array(a) => {
                let i = key
                    .as_int()
                    .ok_or(IndexError::ArrayIndexType(key.type_name()))?;
                if i == 0 {
                    return Err(IndexError::ZeroIndex);
                }
                Ok(unalias(i, a.len())
                    .map(|pos| a[pos].clone())
                    .unwrap_or_default())
            }
            Value::String(s) => {
                let i = key
                    .as_int()
                    .ok_or(IndexError::ArrayIndexType(key.type_name()))?;
                if i == 0 {
                    return Err(IndexError::ZeroIndex);
                }
                let chars: Vec<char> = s.chars().collect();
                Ok(unalias(i, chars.len())
                    .map(|pos| Value::String(chars[pos].to_string()))
                    .unwrap_or_default())
            }
            Value::Void => Ok(Value::Absent),
            other => Err(IndexError::NotIndexable(other.type_name())),
        }
    }

    /// Multi-level indexed read, e.g. `x[1]["a"]`.
    pub fn index_path(&self, indices: &[Value]) -> Result<Value, IndexError> {
        let mut current = self.clone();
        for key in indices {
            current = current.index(key)?;
            if current.is_absent() {
                break;
            }
        }
        Ok(current)
    }

    /// 1-based inclusive slice of an array or string. Bounds may be negative
    /// and are clamped; an inverted range yields an empty result.
    pub fn slice(&self, lower: Option<&Value>, upper: Option<&Value>) -> Result<Value, IndexError> {
        let len = match self {
            Value::Absent => return Ok(Value::Absent),
            Value::Array(a) => a.len(),
            Value::String(s) => s.chars().count(),
            Value::Void => return Ok(Value::Void),
            other => return Err(IndexError::NotIndexable(other.type_name())),
        };

        let bound = |v: Option<&Value>, default: i64| -> Result<i64, IndexError> {
            match v {
                None | Some(Value::Absent) | Some(Value::Void) => Ok(default),
                Some(Value::Int(i)) => Ok(*i),
                Some(other) => Err(IndexError::ArrayIndexType(other.type_name())),
            }
        };

        let n = len as i64;
        let normalize = |i: i64| if i < 0 { i + n + 1 } else { i };
        let lo = normalize(bound(lower, 1)?).max(1);
        let hi = normalize(bound(upper, n)?).min(n);

        let range = if lo > hi {
            0..0
        } else {
            (lo - 1) as usize..hi as usize
        };

        Ok(match self {
            Value::Array(a) => Value::Array(a[range].to_vec()),
            Value::String(s) => Value::from_string(
                s.chars()
                    .skip(range.start)
                    .take(range.len())
                    .collect::<String>(),
            ),
            _ => unreachable!(),
        })
    }

    /// Indexed write through a path of keys, creating intermediate maps as
    /// needed. An absent or scalar receiver becomes a map.
    ///
    /// New intermediate levels are built apart and attached only once the
    /// rest of the path has been written, so on error `self` is unchanged.
    pub fn put_indexed(&mut self, indices: &[Value], value: Value) -> Result<(), IndexError> {
        let Some((first, rest)) = indices.split_first() else {
            return Err(IndexError::EmptyIndices);
        };

        match self {
            Value::Map(m) => {
                let key = map_key(first)?;
                if rest.is_empty() {
                    m.insert(key, value);
                    Ok(())
                } else if let Some(child) = m.get_mut(&key) {
                    child.put_indexed(rest, value)
                } else {
                    m.insert(key, nest(rest, value)?);
                    Ok(())
                }
            }
            Value::Array(a) => {
                let i = first
                    .as_int()
                    .ok_or(IndexError::ArrayIndexType(first.type_name()))?;
                if i == 0 {
                    return Err(IndexError::ZeroIndex);
                }
                let len = a.len();
                match unalias(i, len) {
                    Some(pos) if rest.is_empty() => {
                        a[pos] = value;
                        Ok(())
                    }
                    Some(pos) => a[pos].put_indexed(rest, value),
                    None if i == len as i64 + 1 => {
                        let appended = if rest.is_empty() {
                            value
                        } else {
                            nest(rest, value)?
                        };
                        a.push(appended);
                        Ok(())
                    }
                    None => Err(IndexError::OutOfBounds { index: i, len }),
                }
            }
            _ => {
                *self = nest(indices, value)?;
                Ok(())
            }
        }
    }

    /// Removes the element at the end of an index path. Paths that do not
    /// exist are left alone.
    pub fn remove_indexed(&mut self, indices: &[Value]) -> Result<(), IndexError> {
        let Some((first, rest)) = indices.split_first() else {
            return Err(IndexError::EmptyIndices);
        };

        match self {
            Value::Map(m) => {
                let key = map_key(first)?;
                if rest.is_empty() {
                    m.shift_remove(&key);
                    Ok(())
                } else {
                    match m.get_mut(&key) {
                        Some(child) => child.remove_indexed(rest),
                        None => Ok(()),
                    }
                }
            }
            Value::Array(a) => {
                let i = first
                    .as_int()
                    .ok_or(IndexError::ArrayIndexType(first.type_name()))?;
                if i == 0 {
                    return Err(IndexError::ZeroIndex);
                }
                match unalias(i, a.len()) {
                    Some(pos) if rest.is_empty() => {
                        a.remove(pos);
                        Ok(())
                    }
                    Some(pos) => a[pos].remove_indexed(rest),
                    None => Ok(()),
                }
            }
            _ => Ok(()),
        }
    }
}

/// Builds `{k1: {k2: ... value}}` for a fresh binding; used where a nested
/// put lands on nothing.
pub(crate) fn nest(indices: &[Value], value: Value) -> Result<Value, IndexError> {
    let mut root = Value::Map(Mlrmap::new());
    root.put_indexed(indices, value)?;
    Ok(root)
}
