use crate::{Ident, TypeGate, Value, value::nest};

use super::error::ScopeError;

/// A named slot holding one value, guarded by its declared type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedBinding {
    name: Ident,
    value: Value,
    gate: TypeGate,
}

impl TypedBinding {
    /// A binding whose initial value is checked against `gate`.
    pub fn new(name: Ident, value: Value, gate: TypeGate) -> Result<Self, ScopeError> {
        check(name, gate, &value)?;
        Ok(Self { name, value, gate })
    }

    pub fn untyped(name: Ident, value: Value) -> Self {
        Self {
            name,
            value,
            gate: TypeGate::Any,
        }
    }

    #[inline(always)]
    pub fn name(&self) -> Ident {
        self.name
    }

    #[inline(always)]
    pub fn value(&self) -> &Value {
        &self.value
    }

    #[inline(always)]
    pub fn gate(&self) -> TypeGate {
        self.gate
    }

    /// Replaces the value. On a gate violation the old value is kept.
    pub fn assign(&mut self, value: Value) -> Result<(), ScopeError> {
        check(self.name, self.gate, &value)?;
        self.value = value;
        Ok(())
    }

    /// Indexed write into the bound value, e.g. `x[1]["a"] = v`.
    ///
    /// A non-collection value is replaced by a fresh map holding the path,
    /// which must itself pass the gate. Maps and arrays are updated in place.
    pub fn assign_indexed(&mut self, indices: &[Value], value: Value) -> Result<(), ScopeError> {
        if !self.value.is_collection() {
            let fresh = nest(indices, value).map_err(|source| ScopeError::Index {
                name: self.name,
                source,
            })?;
            return self.assign(fresh);
        }

        self.value
            .put_indexed(indices, value)
            .map_err(|source| ScopeError::Index {
                name: self.name,
                source,
            })
    }

    /// Clears the value to absent. The binding itself stays in its frame.
    pub fn unassign(&mut self) {
        self.value = Value::Absent;
    }

    pub fn unassign_indexed(&mut self, indices: &[Value]) -> Result<(), ScopeError> {
        self.value
            .remove_indexed(indices)
            .map_err(|source| ScopeError::Index {
                name: self.name,
                source,
            })
    }
}

fn check(name: Ident, gate: TypeGate, value: &Value) -> Result<(), ScopeError> {
    if gate.accepts(value) {
        Ok(())
    } else {
        Err(ScopeError::TypeGate {
            name,
            gate,
            got: value.type_name(),
        })
    }
}
