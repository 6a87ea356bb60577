use tracing::trace;

use crate::{Ident, RuntimeError, ScopeError, State, TypeGate, Value};

use super::statement::{Flow, StatementBlock};

#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: Ident,
    pub gate: TypeGate,
}

/// A user-defined function (`func name(params): type { ... }`).
#[derive(Debug)]
pub struct Udf {
    pub name: String,
    pub params: Vec<Parameter>,
    pub return_gate: TypeGate,
    pub body: StatementBlock,
}

/// Invokes the function at `id` with already-evaluated arguments.
///
/// The body runs in a fresh frame set, so the caller's locals are invisible
/// to it. Arguments are bound as typed locals in the base frame.
pub(crate) fn call(
    state: &mut State,
    id: usize,
    name: &str,
    args: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let udfs = state.udfs.clone();
    let udf = &udfs[id];

    if state.stack.call_depth() >= state.max_call_depth as usize {
        return Err(RuntimeError::RecursionLimit(state.max_call_depth));
    }

    trace!(function = name, depth = state.stack.call_depth() + 1, "call");
    state.stack.push_frame_set();
    let result = bind_and_run(state, udf, args);
    state.stack.pop_frame_set();
    let value = result?;

    if udf.return_gate.accepts(&value) {
        Ok(value)
    } else {
        Err(RuntimeError::ReturnType {
            name: udf.name.clone(),
            gate: udf.return_gate,
            got: value.type_name(),
        })
    }
}

fn bind_and_run(state: &mut State, udf: &Udf, args: Vec<Value>) -> Result<Value, RuntimeError> {
    for (param, arg) in udf.params.iter().zip(args) {
        state
            .stack
            .declare_local(param.name, param.gate, arg)
            .map_err(|e| match e {
                ScopeError::TypeGate { name, gate, got } => RuntimeError::ArgumentType {
                    name: udf.name.clone(),
                    parameter: name.as_str(),
                    gate,
                    got,
                },
                other => other.into(),
            })?;
    }

    match udf.body.execute(state)? {
        Flow::Return(value) => Ok(value),
        _ => Ok(Value::Absent),
    }
}
