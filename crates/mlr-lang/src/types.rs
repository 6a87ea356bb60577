use std::fmt;
use std::str::FromStr;

use crate::value::Value;

/// Declared type of a local variable, parameter, or function return.
///
/// Absent passes every gate, so a typed local may be declared without an
/// initializer or later unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TypeGate {
    #[default]
    Any,
    Str,
    Num,
    Int,
    Float,
    Bool,
    Map,
    Arr,
}

impl TypeGate {
    pub fn name(&self) -> &'static str {
        match self {
            TypeGate::Any => "any",
            TypeGate::Str => "str",
            TypeGate::Num => "num",
            TypeGate::Int => "int",
            TypeGate::Float => "float",
            TypeGate::Bool => "bool",
            TypeGate::Map => "map",
            TypeGate::Arr => "arr",
        }
    }

    pub fn accepts(&self, value: &Value) -> bool {
        if value.is_absent() {
            return true;
        }
        match self {
            TypeGate::Any => true,
            TypeGate::Str => value.is_string(),
            TypeGate::Num => value.is_numeric(),
            TypeGate::Int => value.is_int(),
            TypeGate::Float => value.is_float(),
            TypeGate::Bool => value.is_boolean(),
            TypeGate::Map => value.is_map(),
            TypeGate::Arr => value.is_array(),
        }
    }
}

impl FromStr for TypeGate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "var" | "any" => Ok(TypeGate::Any),
            "str" => Ok(TypeGate::Str),
            "num" => Ok(TypeGate::Num),
            "int" => Ok(TypeGate::Int),
            "float" => Ok(TypeGate::Float),
            "bool" => Ok(TypeGate::Bool),
            "map" => Ok(TypeGate::Map),
            "arr" => Ok(TypeGate::Arr),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for TypeGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
