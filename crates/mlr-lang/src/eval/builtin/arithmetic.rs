//! Operators on numbers, with the DSL's absent and empty rules:
//!
//! * absent is the identity, so `absent + 1` is `1` and `absent + absent` is absent;
//! * an empty operand makes the result empty;
//! * errors and non-numeric strings produce an error.
//!
//! Int results that would overflow are computed in float instead.

use std::cmp::Ordering;

use crate::Value;

/// Outcome of checking a pair of operands before a numeric operation.
enum Operands {
    Ints(i64, i64),
    Floats(f64, f64),
    Done(Value),
}

fn classify(name: &str, a: &Value, b: &Value) -> Operands {
    match (a, b) {
        (Value::Error(_), _) | (_, Value::Error(_)) => Operands::Done(propagate_error(name, a, b)),
        (Value::Absent, Value::Absent) => Operands::Done(Value::Absent),
        (Value::Absent, x) | (x, Value::Absent) if x.is_numeric() || x.is_void() => {
            Operands::Done(x.clone())
        }
        (Value::Void, x) | (x, Value::Void) if x.is_numeric() || x.is_void() => {
            Operands::Done(Value::Void)
        }
        (Value::Int(x), Value::Int(y)) => Operands::Ints(*x, *y),
        (x, y) if x.is_numeric() && y.is_numeric() => {
            Operands::Floats(x.as_f64().unwrap_or_default(), y.as_f64().unwrap_or_default())
        }
        _ => Operands::Done(type_error(name, a, b)),
    }
}

fn propagate_error(name: &str, a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::Error(_), _) => a.clone(),
        (_, Value::Error(_)) => b.clone(),
        _ => type_error(name, a, b),
    }
}

pub(crate) fn type_error(name: &str, a: &Value, b: &Value) -> Value {
    Value::error(format!(
        "{}: unacceptable types {}, {}",
        name,
        a.type_name(),
        b.type_name()
    ))
}

pub(crate) fn unary_type_error(name: &str, a: &Value) -> Value {
    Value::error(format!("{}: unacceptable type {}", name, a.type_name()))
}

pub(crate) fn plus(a: &Value, b: &Value) -> Value {
    match classify("+", a, b) {
        Operands::Ints(x, y) => x
            .checked_add(y)
            .map(Value::Int)
            .unwrap_or(Value::Float(x as f64 + y as f64)),
        Operands::Floats(x, y) => Value::Float(x + y),
        Operands::Done(v) => v,
    }
}

pub(crate) fn minus(a: &Value, b: &Value) -> Value {
    match classify("-", a, b) {
        Operands::Ints(x, y) => x
            .checked_sub(y)
            .map(Value::Int)
            .unwrap_or(Value::Float(x as f64 - y as f64)),
        Operands::Floats(x, y) => Value::Float(x - y),
        // absent - x is -x
        Operands::Done(v) if a.is_absent() && b.is_numeric() => negate(&v),
        Operands::Done(v) => v,
    }
}

pub(crate) fn times(a: &Value, b: &Value) -> Value {
    match classify("*", a, b) {
        Operands::Ints(x, y) => x
            .checked_mul(y)
            .map(Value::Int)
            .unwrap_or(Value::Float(x as f64 * y as f64)),
        Operands::Floats(x, y) => Value::Float(x * y),
        Operands::Done(v) => v,
    }
}

/// `/`: int when the division is exact, float otherwise.
pub(crate) fn divide(a: &Value, b: &Value) -> Value {
    match classify("/", a, b) {
        Operands::Ints(x, y) => {
            if y != 0 && x.checked_rem(y) == Some(0) {
                x.checked_div(y)
                    .map(Value::Int)
                    .unwrap_or(Value::Float(x as f64 / y as f64))
            } else {
                Value::Float(x as f64 / y as f64)
            }
        }
        Operands::Floats(x, y) => Value::Float(x / y),
        Operands::Done(v) => v,
    }
}

/// `//`: floor division.
pub(crate) fn int_divide(a: &Value, b: &Value) -> Value {
    match classify("//", a, b) {
        Operands::Ints(_, 0) => Value::error("//: division by zero"),
        Operands::Ints(x, y) => match x.checked_div(y) {
            Some(q) if x % y != 0 && ((x < 0) != (y < 0)) => Value::Int(q - 1),
            Some(q) => Value::Int(q),
            None => Value::Float((x as f64 / y as f64).floor()),
        },
        Operands::Floats(x, y) => Value::Float((x / y).floor()),
        Operands::Done(v) => v,
    }
}

/// `%`: the result takes the sign of the divisor.
pub(crate) fn modulus(a: &Value, b: &Value) -> Value {
    match classify("%", a, b) {
        Operands::Ints(_, 0) => Value::error("%: division by zero"),
        Operands::Ints(x, y) => {
            let m = x.checked_rem(y).unwrap_or(0);
            Value::Int(if m != 0 && ((m < 0) != (y < 0)) { m + y } else { m })
        }
        Operands::Floats(x, y) => {
            let m = x % y;
            Value::Float(if m != 0.0 && ((m < 0.0) != (y < 0.0)) {
                m + y
            } else {
                m
            })
        }
        Operands::Done(v) => v,
    }
}

pub(crate) fn power(a: &Value, b: &Value) -> Value {
    match classify("**", a, b) {
        Operands::Ints(x, y) if y >= 0 => u32::try_from(y)
            .ok()
            .and_then(|e| x.checked_pow(e))
            .map(Value::Int)
            .unwrap_or(Value::Float((x as f64).powf(y as f64))),
        Operands::Ints(x, y) => Value::Float((x as f64).powf(y as f64)),
        Operands::Floats(x, y) => Value::Float(x.powf(y)),
        Operands::Done(v) => v,
    }
}

pub(crate) fn negate(a: &Value) -> Value {
    match a {
        Value::Int(i) => i
            .checked_neg()
            .map(Value::Int)
            .unwrap_or(Value::Float(-(*i as f64))),
        Value::Float(f) => Value::Float(-f),
        Value::Absent | Value::Void | Value::Error(_) => a.clone(),
        other => unary_type_error("-", other),
    }
}

pub(crate) fn unary_plus(a: &Value) -> Value {
    match a {
        Value::Int(_) | Value::Float(_) | Value::Absent | Value::Void | Value::Error(_) => {
            a.clone()
        }
        other => unary_type_error("+", other),
    }
}

/// Bitwise operators take ints only.
pub(crate) fn bitwise(name: &str, a: &Value, b: &Value, op: fn(i64, i64) -> i64) -> Value {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Value::Int(op(*x, *y)),
        (Value::Absent, Value::Int(_)) => b.clone(),
        (Value::Int(_), Value::Absent) => a.clone(),
        (Value::Absent, Value::Absent) => Value::Absent,
        (Value::Error(_), _) | (_, Value::Error(_)) => propagate_error(name, a, b),
        _ => type_error(name, a, b),
    }
}

pub(crate) fn shift_left(x: i64, y: i64) -> i64 {
    u32::try_from(y)
        .ok()
        .and_then(|s| x.checked_shl(s))
        .unwrap_or(0)
}

pub(crate) fn shift_right(x: i64, y: i64) -> i64 {
    u32::try_from(y)
        .ok()
        .and_then(|s| x.checked_shr(s))
        .unwrap_or(if x < 0 { -1 } else { 0 })
}

pub(crate) fn bitwise_not(a: &Value) -> Value {
    match a {
        Value::Int(i) => Value::Int(!i),
        Value::Absent | Value::Error(_) => a.clone(),
        other => unary_type_error("~", other),
    }
}

/// `.`: string concatenation, with absent as the identity.
pub(crate) fn dot(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::Absent, Value::Absent) => Value::Absent,
        (Value::Absent, _) => b.clone(),
        (_, Value::Absent) => a.clone(),
        (Value::Error(_), _) | (_, Value::Error(_)) => propagate_error(".", a, b),
        _ => Value::from_string(format!("{}{}", a.to_text(), b.to_text())),
    }
}

/// Ordering used by the comparison operators: numbers numerically, booleans
/// with false first, anything else by its string form.
pub(crate) fn collate(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (x, y) if x.is_numeric() && y.is_numeric() => x
            .as_f64()
            .unwrap_or_default()
            .partial_cmp(&y.as_f64().unwrap_or_default())
            .unwrap_or(Ordering::Equal),
        (Value::Boolean(x), Value::Boolean(y)) => x.cmp(y),
        _ => a.to_text().cmp(&b.to_text()),
    }
}

pub(crate) fn compare(a: &Value, b: &Value, accept: fn(Ordering) -> bool) -> Value {
    match (a, b) {
        (Value::Absent, _) | (_, Value::Absent) => Value::Absent,
        (Value::Error(_), _) | (_, Value::Error(_)) => propagate_error("comparison", a, b),
        _ => Value::Boolean(accept(collate(a, b))),
    }
}
