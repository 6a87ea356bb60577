mod arithmetic;

use std::cmp::Ordering;
use std::sync::LazyLock;

use itertools::Itertools;
use rustc_hash::FxHashMap;

use crate::{
    Mlrmap, Value,
    value::{map_key, unalias},
};

use arithmetic::{collate, compare, type_error, unary_type_error};

type BuiltinFn = fn(&str, &[Value]) -> Value;

#[derive(Clone, Debug)]
pub struct BuiltinFunction {
    pub num_params: ParamNum,
    pub func: BuiltinFn,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ParamNum {
    None,
    Fixed(u8),
    Range(u8, u8),
}

impl ParamNum {
    #[inline(always)]
    pub fn is_valid(&self, num_args: usize) -> bool {
        match self {
            ParamNum::None => num_args == 0,
            ParamNum::Fixed(n) => num_args == *n as usize,
            ParamNum::Range(min, max) => num_args >= *min as usize && num_args <= *max as usize,
        }
    }
}

impl std::fmt::Display for ParamNum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamNum::None => write!(f, "0"),
            ParamNum::Fixed(n) => write!(f, "{}", n),
            ParamNum::Range(min, u8::MAX) => write!(f, "at least {}", min),
            ParamNum::Range(min, max) => write!(f, "{} to {}", min, max),
        }
    }
}

impl BuiltinFunction {
    pub fn new(num_params: ParamNum, func: BuiltinFn) -> Self {
        BuiltinFunction { num_params, func }
    }
}

pub static BUILTIN_FUNCTIONS: LazyLock<FxHashMap<&'static str, BuiltinFunction>> =
    LazyLock::new(|| {
        let mut map = FxHashMap::default();

        // Arithmetic
        map.insert(
            "+",
            BuiltinFunction::new(ParamNum::Range(1, 2), |_, args| match args {
                [a] => arithmetic::unary_plus(a),
                [a, b] => arithmetic::plus(a, b),
                _ => unreachable!(),
            }),
        );
        map.insert(
            "-",
            BuiltinFunction::new(ParamNum::Range(1, 2), |_, args| match args {
                [a] => arithmetic::negate(a),
                [a, b] => arithmetic::minus(a, b),
                _ => unreachable!(),
            }),
        );
        map.insert(
            "*",
            BuiltinFunction::new(ParamNum::Fixed(2), |_, args| match args {
                [a, b] => arithmetic::times(a, b),
                _ => unreachable!(),
            }),
        );
        map.insert(
            "/",
            BuiltinFunction::new(ParamNum::Fixed(2), |_, args| match args {
                [a, b] => arithmetic::divide(a, b),
                _ => unreachable!(),
            }),
        );
        map.insert(
            "//",
            BuiltinFunction::new(ParamNum::Fixed(2), |_, args| match args {
                [a, b] => arithmetic::int_divide(a, b),
                _ => unreachable!(),
            }),
        );
        map.insert(
            "%",
            BuiltinFunction::new(ParamNum::Fixed(2), |_, args| match args {
                [a, b] => arithmetic::modulus(a, b),
                _ => unreachable!(),
            }),
        );
        map.insert(
            "**",
            BuiltinFunction::new(ParamNum::Fixed(2), |_, args| match args {
                [a, b] => arithmetic::power(a, b),
                _ => unreachable!(),
            }),
        );
        map.insert(
            ".",
            BuiltinFunction::new(ParamNum::Fixed(2), |_, args| match args {
                [a, b] => arithmetic::dot(a, b),
                _ => unreachable!(),
            }),
        );

        // Bitwise
        map.insert(
            "&",
            BuiltinFunction::new(ParamNum::Fixed(2), |name, args| match args {
                [a, b] => arithmetic::bitwise(name, a, b, |x, y| x & y),
                _ => unreachable!(),
            }),
        );
        map.insert(
            "|",
            BuiltinFunction::new(ParamNum::Fixed(2), |name, args| match args {
                [a, b] => arithmetic::bitwise(name, a, b, |x, y| x | y),
                _ => unreachable!(),
            }),
        );
        map.insert(
            "^",
            BuiltinFunction::new(ParamNum::Fixed(2), |name, args| match args {
                [a, b] => arithmetic::bitwise(name, a, b, |x, y| x ^ y),
                _ => unreachable!(),
            }),
        );
        map.insert(
            "<<",
            BuiltinFunction::new(ParamNum::Fixed(2), |name, args| match args {
                [a, b] => arithmetic::bitwise(name, a, b, arithmetic::shift_left),
                _ => unreachable!(),
            }),
        );
        map.insert(
            ">>",
            BuiltinFunction::new(ParamNum::Fixed(2), |name, args| match args {
                [a, b] => arithmetic::bitwise(name, a, b, arithmetic::shift_right),
                _ => unreachable!(),
            }),
        );
        map.insert(
            "~",
            BuiltinFunction::new(ParamNum::Fixed(1), |_, args| match args {
                [a] => arithmetic::bitwise_not(a),
                _ => unreachable!(),
            }),
        );

        // Logical. `&&` and `||` short-circuit and are compiled separately.
        map.insert(
            "!",
            BuiltinFunction::new(ParamNum::Fixed(1), |name, args| match args {
                [Value::Boolean(b)] => Value::Boolean(!b),
                [a @ (Value::Absent | Value::Error(_))] => a.clone(),
                [a] => unary_type_error(name, a),
                _ => unreachable!(),
            }),
        );
        map.insert(
            "^^",
            BuiltinFunction::new(ParamNum::Fixed(2), |name, args| match args {
                [Value::Boolean(a), Value::Boolean(b)] => Value::Boolean(a != b),
                [Value::Absent, b @ Value::Boolean(_)] => b.clone(),
                [a @ Value::Boolean(_), Value::Absent] => a.clone(),
                [Value::Absent, Value::Absent] => Value::Absent,
                [a, b] => type_error(name, a, b),
                _ => unreachable!(),
            }),
        );

        // Comparison
        map.insert(
            "==",
            BuiltinFunction::new(ParamNum::Fixed(2), |_, args| match args {
                [a, b] => compare(a, b, Ordering::is_eq),
                _ => unreachable!(),
            }),
        );
        map.insert(
            "!=",
            BuiltinFunction::new(ParamNum::Fixed(2), |_, args| match args {
                [a, b] => compare(a, b, Ordering::is_ne),
                _ => unreachable!(),
            }),
        );
        map.insert(
            "<",
            BuiltinFunction::new(ParamNum::Fixed(2), |_, args| match args {
                [a, b] => compare(a, b, Ordering::is_lt),
                _ => unreachable!(),
            }),
        );
        map.insert(
            "<=",
            BuiltinFunction::new(ParamNum::Fixed(2), |_, args| match args {
                [a, b] => compare(a, b, Ordering::is_le),
                _ => unreachable!(),
            }),
        );
        map.insert(
            ">",
            BuiltinFunction::new(ParamNum::Fixed(2), |_, args| match args {
                [a, b] => compare(a, b, Ordering::is_gt),
                _ => unreachable!(),
            }),
        );
        map.insert(
            ">=",
            BuiltinFunction::new(ParamNum::Fixed(2), |_, args| match args {
                [a, b] => compare(a, b, Ordering::is_ge),
                _ => unreachable!(),
            }),
        );
        map.insert(
            "<=>",
            BuiltinFunction::new(ParamNum::Fixed(2), |_, args| match args {
                [a, b] => Value::Int(match collate(a, b) {
                    Ordering::Less => -1,
                    Ordering::Equal => 0,
                    Ordering::Greater => 1,
                }),
                _ => unreachable!(),
            }),
        );

        // Strings
        map.insert(
            "strlen",
            BuiltinFunction::new(ParamNum::Fixed(1), |_, args| match args {
                [Value::Absent] => Value::Absent,
                [a] => Value::from(a.to_text().chars().count()),
                _ => unreachable!(),
            }),
        );
        map.insert(
            "toupper",
            BuiltinFunction::new(ParamNum::Fixed(1), |_, args| match args {
                [Value::String(s)] => Value::String(s.to_uppercase()),
                [a] => a.clone(),
                _ => unreachable!(),
            }),
        );
        map.insert(
            "tolower",
            BuiltinFunction::new(ParamNum::Fixed(1), |_, args| match args {
                [Value::String(s)] => Value::String(s.to_lowercase()),
                [a] => a.clone(),
                _ => unreachable!(),
            }),
        );
        map.insert(
            "capitalize",
            BuiltinFunction::new(ParamNum::Fixed(1), |_, args| match args {
                [Value::String(s)] => {
                    let mut chars = s.chars();
                    match chars.next() {
                        Some(first) => {
                            Value::String(first.to_uppercase().chain(chars).collect())
                        }
                        None => Value::Void,
                    }
                }
                [a] => a.clone(),
                _ => unreachable!(),
            }),
        );
        map.insert(
            "lstrip",
            BuiltinFunction::new(ParamNum::Fixed(1), |_, args| match args {
                [Value::String(s)] => Value::from_string(s.trim_start()),
                [a] => a.clone(),
                _ => unreachable!(),
            }),
        );
        map.insert(
            "rstrip",
            BuiltinFunction::new(ParamNum::Fixed(1), |_, args| match args {
                [Value::String(s)] => Value::from_string(s.trim_end()),
                [a] => a.clone(),
                _ => unreachable!(),
            }),
        );
        map.insert(
            "strip",
            BuiltinFunction::new(ParamNum::Fixed(1), |_, args| match args {
                [Value::String(s)] => Value::from_string(s.trim()),
                [a] => a.clone(),
                _ => unreachable!(),
            }),
        );
        map.insert(
            "truncate",
            BuiltinFunction::new(ParamNum::Fixed(2), |name, args| match args {
                [Value::Absent, _] => Value::Absent,
                [Value::Error(_), _] => args[0].clone(),
                [s, Value::Int(n)] if *n >= 0 => {
                    Value::from_string(s.to_text().chars().take(*n as usize).collect::<String>())
                }
                [a, b] => type_error(name, a, b),
                _ => unreachable!(),
            }),
        );

        // Types
        map.insert(
            "typeof",
            BuiltinFunction::new(ParamNum::Fixed(1), |_, args| match args {
                [a] => Value::from(a.type_name()),
                _ => unreachable!(),
            }),
        );
        map.insert(
            "asserting_null",
            BuiltinFunction::new(ParamNum::Fixed(1), |name, args| match args {
                [a] if a.is_empty() => a.clone(),
                [a] => unary_type_error(name, a),
                _ => unreachable!(),
            }),
        );
        for name in [
            "is_absent",
            "is_present",
            "is_empty",
            "is_not_empty",
            "is_string",
            "is_int",
            "is_float",
            "is_numeric",
            "is_boolean",
            "is_map",
            "is_array",
            "is_error",
        ] {
            map.insert(name, BuiltinFunction::new(ParamNum::Fixed(1), type_predicate));
        }

        // Collections
        map.insert(
            "length",
            BuiltinFunction::new(ParamNum::Fixed(1), |_, args| match args {
                [Value::Absent] => Value::Int(0),
                [Value::Map(m)] => Value::from(m.len()),
                [Value::Array(a)] => Value::from(a.len()),
                [_] => Value::Int(1),
                _ => unreachable!(),
            }),
        );
        map.insert(
            "depth",
            BuiltinFunction::new(ParamNum::Fixed(1), |_, args| match args {
                [Value::Absent] => Value::Absent,
                [a] => Value::from(depth(a)),
                _ => unreachable!(),
            }),
        );
        map.insert(
            "haskey",
            BuiltinFunction::new(ParamNum::Fixed(2), |_, args| match args {
                [Value::Map(m), key] => {
                    Value::Boolean(map_key(key).map(|k| m.contains_key(&k)).unwrap_or(false))
                }
                [Value::Array(a), Value::Int(i)] => Value::Boolean(
                    *i != 0 && unalias(*i, a.len()).is_some(),
                ),
                [_, _] => Value::FALSE,
                _ => unreachable!(),
            }),
        );
        map.insert(
            "mapsum",
            BuiltinFunction::new(ParamNum::Range(0, u8::MAX), |name, args| {
                let mut sum = Mlrmap::new();
                for arg in args {
                    match arg {
                        Value::Map(m) => {
                            sum.extend(m.iter().map(|(k, v)| (k.clone(), v.clone())))
                        }
                        Value::Absent => {}
                        other => return unary_type_error(name, other),
                    }
                }
                Value::Map(sum)
            }),
        );
        map.insert(
            "mapdiff",
            BuiltinFunction::new(ParamNum::Range(0, u8::MAX), |name, args| {
                let Some((first, rest)) = args.split_first() else {
                    return Value::empty_map();
                };
                let Value::Map(first) = first else {
                    return unary_type_error(name, first);
                };
                let mut diff = first.clone();
                for arg in rest {
                    match arg {
                        Value::Map(m) => m.keys().for_each(|k| {
                            diff.shift_remove(k);
                        }),
                        Value::Absent => {}
                        other => return unary_type_error(name, other),
                    }
                }
                Value::Map(diff)
            }),
        );
        map.insert(
            "joink",
            BuiltinFunction::new(ParamNum::Fixed(2), |name, args| match args {
                [Value::Map(m), sep] => Value::from_string(m.keys().join(&sep.to_text())),
                [a, b] => type_error(name, a, b),
                _ => unreachable!(),
            }),
        );
        map.insert(
            "joinv",
            BuiltinFunction::new(ParamNum::Fixed(2), |name, args| match args {
                [Value::Map(m), sep] => {
                    Value::from_string(m.values().map(|v| v.to_text()).join(&sep.to_text()))
                }
                [Value::Array(a), sep] => {
                    Value::from_string(a.iter().map(|v| v.to_text()).join(&sep.to_text()))
                }
                [a, b] => type_error(name, a, b),
                _ => unreachable!(),
            }),
        );
        map.insert(
            "splitax",
            BuiltinFunction::new(ParamNum::Fixed(2), |name, args| match args {
                [Value::Absent, _] => Value::Absent,
                [Value::Void, _] => Value::empty_array(),
                [s, sep] if !s.is_collection() && !sep.is_collection() => {
                    let text = s.to_text();
                    let sep = sep.to_text();
                    if sep.is_empty() {
                        Value::Array(text.chars().map(|c| Value::String(c.to_string())).collect())
                    } else {
                        Value::Array(text.split(&*sep).map(Value::from_string).collect())
                    }
                }
                [a, b] => type_error(name, a, b),
                _ => unreachable!(),
            }),
        );
        map.insert(
            "append",
            BuiltinFunction::new(ParamNum::Fixed(2), |name, args| match args {
                [Value::Array(a), v] => {
                    let mut appended = a.clone();
                    appended.push(v.clone());
                    Value::Array(appended)
                }
                [a, b] => type_error(name, a, b),
                _ => unreachable!(),
            }),
        );

        // Math
        map.insert(
            "abs",
            BuiltinFunction::new(ParamNum::Fixed(1), |name, args| match args {
                [Value::Int(i)] => i
                    .checked_abs()
                    .map(Value::Int)
                    .unwrap_or(Value::Float((*i as f64).abs())),
                [Value::Float(f)] => Value::Float(f.abs()),
                [a] => math_passthrough(name, a),
                _ => unreachable!(),
            }),
        );
        map.insert(
            "ceiling",
            BuiltinFunction::new(ParamNum::Fixed(1), |name, args| match args {
                [Value::Float(f)] => Value::Float(f.ceil()),
                [a] => math_passthrough(name, a),
                _ => unreachable!(),
            }),
        );
        map.insert(
            "floor",
            BuiltinFunction::new(ParamNum::Fixed(1), |name, args| match args {
                [Value::Float(f)] => Value::Float(f.floor()),
                [a] => math_passthrough(name, a),
                _ => unreachable!(),
            }),
        );
        map.insert(
            "round",
            BuiltinFunction::new(ParamNum::Fixed(1), |name, args| match args {
                [Value::Float(f)] => Value::Float(f.round()),
                [a] => math_passthrough(name, a),
                _ => unreachable!(),
            }),
        );
        map.insert(
            "min",
            BuiltinFunction::new(ParamNum::Range(0, u8::MAX), |_, args| {
                extremum(args, Ordering::Less)
            }),
        );
        map.insert(
            "max",
            BuiltinFunction::new(ParamNum::Range(0, u8::MAX), |_, args| {
                extremum(args, Ordering::Greater)
            }),
        );

        // Conversion
        map.insert(
            "int",
            BuiltinFunction::new(ParamNum::Fixed(1), |name, args| match args {
                [Value::Int(i)] => Value::Int(*i),
                [Value::Float(f)] => Value::Int(f.trunc() as i64),
                [Value::Boolean(b)] => Value::Int(*b as i64),
                [Value::String(s)] => match Value::infer(s) {
                    Value::Int(i) => Value::Int(i),
                    Value::Float(f) => Value::Int(f.trunc() as i64),
                    _ => unary_type_error(name, &args[0]),
                },
                [a @ (Value::Absent | Value::Void | Value::Error(_))] => a.clone(),
                [a] => unary_type_error(name, a),
                _ => unreachable!(),
            }),
        );
        map.insert(
            "float",
            BuiltinFunction::new(ParamNum::Fixed(1), |name, args| match args {
                [Value::Int(i)] => Value::Float(*i as f64),
                [Value::Float(f)] => Value::Float(*f),
                [Value::Boolean(b)] => Value::Float(if *b { 1.0 } else { 0.0 }),
                [Value::String(s)] => match Value::infer(s).as_f64() {
                    Some(f) => Value::Float(f),
                    None => unary_type_error(name, &args[0]),
                },
                [a @ (Value::Absent | Value::Void | Value::Error(_))] => a.clone(),
                [a] => unary_type_error(name, a),
                _ => unreachable!(),
            }),
        );
        map.insert(
            "string",
            BuiltinFunction::new(ParamNum::Fixed(1), |_, args| match args {
                [a @ (Value::Absent | Value::Error(_))] => a.clone(),
                [a] => Value::from_string(a.to_text().into_owned()),
                _ => unreachable!(),
            }),
        );
        map.insert(
            "boolean",
            BuiltinFunction::new(ParamNum::Fixed(1), |name, args| match args {
                [Value::Boolean(b)] => Value::Boolean(*b),
                [Value::Int(i)] => Value::Boolean(*i != 0),
                [Value::Float(f)] => Value::Boolean(*f != 0.0),
                [Value::String(s)] if s == "true" => Value::TRUE,
                [Value::String(s)] if s == "false" => Value::FALSE,
                [a @ (Value::Absent | Value::Void | Value::Error(_))] => a.clone(),
                [a] => unary_type_error(name, a),
                _ => unreachable!(),
            }),
        );
        map.insert(
            "hexfmt",
            BuiltinFunction::new(ParamNum::Fixed(1), |_, args| match args {
                [Value::Int(i)] => Value::String(format!("0x{:x}", i)),
                [a] => a.clone(),
                _ => unreachable!(),
            }),
        );

        map
    });

fn type_predicate(name: &str, args: &[Value]) -> Value {
    let [a] = args else { unreachable!() };
    Value::Boolean(match name {
        "is_absent" => a.is_absent(),
        "is_present" => a.is_present(),
        "is_empty" => a.is_void(),
        "is_not_empty" => !a.is_void() && !a.is_absent(),
        "is_string" => matches!(a, Value::String(_)),
        "is_int" => a.is_int(),
        "is_float" => a.is_float(),
        "is_numeric" => a.is_numeric(),
        "is_boolean" => a.is_boolean(),
        "is_map" => a.is_map(),
        "is_array" => a.is_array(),
        "is_error" => a.is_error(),
        _ => unreachable!(),
    })
}

/// Rounding functions leave ints alone and reject non-numbers.
fn math_passthrough(name: &str, a: &Value) -> Value {
    match a {
        Value::Int(_) | Value::Absent | Value::Void | Value::Error(_) => a.clone(),
        other => unary_type_error(name, other),
    }
}

fn depth(value: &Value) -> usize {
    match value {
        Value::Map(m) => 1 + m.values().map(depth).max().unwrap_or(0),
        Value::Array(a) => 1 + a.iter().map(depth).max().unwrap_or(0),
        _ => 0,
    }
}

/// `min`/`max` over mixed types: numbers sort before booleans, which sort
/// before strings. Absent and empty arguments are skipped.
fn extremum(args: &[Value], want: Ordering) -> Value {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Int(_) | Value::Float(_) => 0,
            Value::Boolean(_) => 1,
            _ => 2,
        }
    }

    if let Some(err) = args.iter().find(|v| v.is_error() || v.is_collection()) {
        return if err.is_error() {
            err.clone()
        } else {
            unary_type_error(if want == Ordering::Less { "min" } else { "max" }, err)
        };
    }

    args.iter()
        .filter(|v| !v.is_absent() && !v.is_void())
        .fold(None, |best: Option<&Value>, v| match best {
            None => Some(v),
            Some(b) => {
                let ord = rank(v).cmp(&rank(b)).then_with(|| collate(v, b));
                if ord == want { Some(v) } else { Some(b) }
            }
        })
        .cloned()
        .unwrap_or_else(|| {
            if args.iter().any(Value::is_void) {
                Value::Void
            } else {
                Value::Absent
            }
        })
}
