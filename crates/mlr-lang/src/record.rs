use indexmap::IndexMap;
use indexmap::map::{IntoIter, Iter};
use thiserror::Error;

use crate::value::{Mlrmap, Value};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum KeyError {
    #[error("record keys must be string or int; got {0}")]
    KeyType(&'static str),
}

/// One input or output record: field names in arrival order, each with a value.
///
/// Integer keys passed to the `*_with_value_index` methods address fields
/// positionally, counting from 1 in current field order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: IndexMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.fields.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Inserts or overwrites a field. New fields go at the end.
    pub fn put(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.shift_remove(key)
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn iter(&self) -> Iter<'_, String, Value> {
        self.fields.iter()
    }

    /// Name and value of the field at 1-based `position`.
    pub fn get_positional(&self, position: i64) -> Option<(&String, &Value)> {
        let index = usize::try_from(position).ok()?.checked_sub(1)?;
        self.fields.get_index(index)
    }

    /// Renames the field at 1-based `position`, keeping its place and value.
    /// Returns false when there is no such field.
    pub fn rename_positional(&mut self, position: i64, new_name: &str) -> bool {
        let Some(index) = usize::try_from(position)
            .ok()
            .and_then(|p| p.checked_sub(1))
            .filter(|&i| i < self.fields.len())
        else {
            return false;
        };

        if let Some(existing) = self.fields.get_index_of(new_name) {
            if existing == index {
                return true;
            }
            // Renaming onto another field's name replaces that field.
            self.fields.shift_remove_index(existing);
            let index = if existing < index { index - 1 } else { index };
            return self.rename_at(index, new_name);
        }
        self.rename_at(index, new_name)
    }

    fn rename_at(&mut self, index: usize, new_name: &str) -> bool {
        let Some((_, value)) = self.fields.shift_remove_index(index) else {
            return false;
        };
        let (new_index, _) = self.fields.insert_full(new_name.to_string(), value);
        self.fields.move_index(new_index, index);
        true
    }

    /// Overwrites the value at 1-based `position`. Returns false when there is
    /// no such field.
    pub fn put_positional(&mut self, position: i64, value: Value) -> bool {
        match usize::try_from(position)
            .ok()
            .and_then(|p| p.checked_sub(1))
            .and_then(|i| self.fields.get_index_mut(i))
        {
            Some((_, slot)) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Keyed-or-positional read: string keys look up by name, int keys by
    /// 1-based position. Missing fields are `None`.
    pub fn get_with_value_index(&self, key: &Value) -> Result<Option<&Value>, KeyError> {
        match key {
            Value::String(s) => Ok(self.fields.get(s.as_str())),
            Value::Void => Ok(self.fields.get("")),
            Value::Int(i) => Ok(self.get_positional(*i).map(|(_, v)| v)),
            other => Err(KeyError::KeyType(other.type_name())),
        }
    }

    /// Keyed-or-positional write, symmetric with [`Record::get_with_value_index`].
    /// Positional writes beyond the end of the record are ignored.
    pub fn put_with_value_index(&mut self, key: &Value, value: Value) -> Result<(), KeyError> {
        match key {
            Value::String(s) => {
                self.put(s.as_str(), value);
                Ok(())
            }
            Value::Void => {
                self.put("", value);
                Ok(())
            }
            Value::Int(i) => {
                self.put_positional(*i, value);
                Ok(())
            }
            other => Err(KeyError::KeyType(other.type_name())),
        }
    }

    pub fn into_map(self) -> Mlrmap {
        self.fields
    }
}

impl From<Mlrmap> for Record {
    fn from(fields: Mlrmap) -> Self {
        Self { fields }
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Map(record.fields)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a String, &'a Value);
    type IntoIter = Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
