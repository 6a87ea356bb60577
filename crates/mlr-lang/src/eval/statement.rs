//! Compiled statements and their executor.
//!
//! Blocks that introduce a scope (`if` bodies, loop bodies, pattern-action
//! blocks) push a frame on entry and pop it on every exit path, including
//! errors and `break`/`continue`/`return`.

use itertools::Itertools;

use crate::{Ident, Output, RuntimeError, State, TypeGate, Value};

use super::evaluable::Evaluable;
use super::lvalue::Lvalue;

/// How control leaves a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintTarget {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, Default)]
pub struct StatementBlock {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone)]
pub enum Statement {
    /// `lvalue = rvalue`. Absent right-hand sides leave the target untouched.
    Assignment { lvalue: Lvalue, rvalue: Evaluable },
    /// `var x = 1`, `str s`, ...
    Declaration {
        name: Ident,
        gate: TypeGate,
        rvalue: Option<Evaluable>,
    },
    Unset(Vec<Lvalue>),
    Block(StatementBlock),
    If {
        branches: Vec<(Evaluable, StatementBlock)>,
        otherwise: Option<StatementBlock>,
    },
    While {
        condition: Evaluable,
        body: StatementBlock,
    },
    DoWhile {
        body: StatementBlock,
        condition: Evaluable,
    },
    /// `for (e in coll)`: keys of a map, elements of an array.
    ForSingle {
        variable: Ident,
        iterable: Evaluable,
        body: StatementBlock,
    },
    /// `for (k, v in coll)`: array keys are 1-up positions.
    ForKeyValue {
        key: Ident,
        value: Ident,
        iterable: Evaluable,
        body: StatementBlock,
    },
    /// `for (init; condition; update)`. An empty condition loops until `break`.
    ForTriple {
        init: StatementBlock,
        condition: Option<Evaluable>,
        update: StatementBlock,
        body: StatementBlock,
    },
    Break,
    Continue,
    Return(Option<Evaluable>),
    Filter(Evaluable),
    BareBoolean(Evaluable),
    PatternAction {
        condition: Evaluable,
        body: StatementBlock,
    },
    Print {
        expressions: Vec<Evaluable>,
        target: PrintTarget,
        newline: bool,
    },
    Emit(Evaluable),
}

impl StatementBlock {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    /// Runs the statements in the current frame, stopping at the first
    /// non-normal flow.
    pub fn execute(&self, state: &mut State) -> Result<Flow, RuntimeError> {
        for statement in &self.statements {
            match statement.execute(state)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    /// Runs the statements in a new frame.
    pub fn execute_scoped(&self, state: &mut State) -> Result<Flow, RuntimeError> {
        state.stack.push_frame();
        let flow = self.execute(state);
        state.stack.pop_frame();
        flow
    }
}

/// Boolean value of a condition; absent counts as false.
fn condition(
    statement: &'static str,
    expr: &Evaluable,
    state: &mut State,
) -> Result<bool, RuntimeError> {
    match expr.evaluate(state)? {
        Value::Boolean(b) => Ok(b),
        Value::Absent => Ok(false),
        other => Err(RuntimeError::NonBooleanCondition {
            statement,
            got: other.type_name(),
        }),
    }
}

/// Loop bodies, where `break` and `continue` are consumed.
enum LoopControl {
    Next,
    Exit(Flow),
}

fn run_body(body: &StatementBlock, state: &mut State) -> Result<LoopControl, RuntimeError> {
    Ok(match body.execute_scoped(state)? {
        Flow::Normal | Flow::Continue => LoopControl::Next,
        Flow::Break => LoopControl::Exit(Flow::Normal),
        flow @ Flow::Return(_) => LoopControl::Exit(flow),
    })
}

/// Runs `f` inside a frame holding the loop variables.
fn in_loop_frame(
    state: &mut State,
    f: impl FnOnce(&mut State) -> Result<Flow, RuntimeError>,
) -> Result<Flow, RuntimeError> {
    state.stack.push_frame();
    let flow = f(state);
    state.stack.pop_frame();
    flow
}

/// Iteration items: map keys are re-typed the way field values are.
fn pairs(statement: &'static str, iterable: Value) -> Result<Vec<(Value, Value)>, RuntimeError> {
    match iterable {
        Value::Map(map) => Ok(map
            .into_iter()
            .map(|(k, v)| (Value::infer(&k), v))
            .collect()),
        Value::Array(values) => Ok(values
            .into_iter()
            .enumerate()
            .map(|(i, v)| (Value::from(i + 1), v))
            .collect()),
        Value::Absent => Ok(Vec::new()),
        other => Err(RuntimeError::NotIterable(statement, other.type_name())),
    }
}

impl Statement {
    pub fn execute(&self, state: &mut State) -> Result<Flow, RuntimeError> {
        match self {
            Statement::Assignment { lvalue, rvalue } => {
                let value = rvalue.evaluate(state)?;
                lvalue.assign(state, value)?;
            }
            Statement::Declaration { name, gate, rvalue } => {
                let value = match rvalue {
                    Some(rvalue) => rvalue.evaluate(state)?,
                    None => Value::Absent,
                };
                state.stack.declare_local(*name, *gate, value)?;
            }
            Statement::Unset(lvalues) => {
                for lvalue in lvalues {
                    lvalue.unset(state)?;
                }
            }
            Statement::Block(block) => return block.execute_scoped(state),
            Statement::If {
                branches,
                otherwise,
            } => {
                for (cond, block) in branches {
                    if condition("if", cond, state)? {
                        return block.execute_scoped(state);
                    }
                }
                if let Some(block) = otherwise {
                    return block.execute_scoped(state);
                }
            }
            Statement::While {
                condition: cond,
                body,
            } => {
                while condition("while", cond, state)? {
                    if let LoopControl::Exit(flow) = run_body(body, state)? {
                        return Ok(flow);
                    }
                }
            }
            Statement::DoWhile {
                body,
                condition: cond,
            } => loop {
                if let LoopControl::Exit(flow) = run_body(body, state)? {
                    return Ok(flow);
                }
                if !condition("do-while", cond, state)? {
                    break;
                }
            },
            Statement::ForSingle {
                variable,
                iterable,
                body,
            } => {
                let items = match iterable.evaluate(state)? {
                    Value::Map(map) => map.into_keys().map(|k| Value::infer(&k)).collect_vec(),
                    Value::Array(values) => values,
                    Value::Absent => Vec::new(),
                    other => {
                        return Err(RuntimeError::NotIterable("for", other.type_name()));
                    }
                };
                return in_loop_frame(state, |state| {
                    for item in items {
                        state.stack.bind_at_scope(*variable, item)?;
                        if let LoopControl::Exit(flow) = run_body(body, state)? {
                            return Ok(flow);
                        }
                    }
                    Ok(Flow::Normal)
                });
            }
            Statement::ForKeyValue {
                key,
                value,
                iterable,
                body,
            } => {
                let items = pairs("for", iterable.evaluate(state)?)?;
                return in_loop_frame(state, |state| {
                    for (k, v) in items {
                        state.stack.bind_at_scope(*key, k)?;
                        state.stack.bind_at_scope(*value, v)?;
                        if let LoopControl::Exit(flow) = run_body(body, state)? {
                            return Ok(flow);
                        }
                    }
                    Ok(Flow::Normal)
                });
            }
            Statement::ForTriple {
                init,
                condition: cond,
                update,
                body,
            } => {
                return in_loop_frame(state, |state| {
                    init.execute(state)?;
                    loop {
                        if let Some(cond) = cond
                            && !condition("for", cond, state)?
                        {
                            break;
                        }
                        if let LoopControl::Exit(flow) = run_body(body, state)? {
                            return Ok(flow);
                        }
                        update.execute(state)?;
                    }
                    Ok(Flow::Normal)
                });
            }
            Statement::Break => return Ok(Flow::Break),
            Statement::Continue => return Ok(Flow::Continue),
            Statement::Return(value) => {
                let value = match value {
                    Some(value) => value.evaluate(state)?,
                    None => Value::Absent,
                };
                return Ok(Flow::Return(value));
            }
            Statement::Filter(expr) => match expr.evaluate(state)? {
                Value::Boolean(b) => state.filter_result = b,
                Value::Absent => {}
                other => {
                    return Err(RuntimeError::NonBooleanCondition {
                        statement: "filter",
                        got: other.type_name(),
                    });
                }
            },
            Statement::BareBoolean(expr) => {
                expr.evaluate(state)?;
            }
            Statement::PatternAction {
                condition: cond,
                body,
            } => {
                if condition("pattern-action block", cond, state)? {
                    return body.execute_scoped(state);
                }
            }
            Statement::Print {
                expressions,
                target,
                newline,
            } => {
                let mut text = expressions
                    .iter()
                    .map(|e| e.evaluate(state).map(|v| v.to_text().into_owned()))
                    .collect::<Result<Vec<_>, _>>()?
                    .join(" ");
                if *newline {
                    text.push('\n');
                }
                state.outputs.push(match target {
                    PrintTarget::Stdout => Output::Stdout(text),
                    PrintTarget::Stderr => Output::Stderr(text),
                });
            }
            Statement::Emit(expr) => match expr.evaluate(state)? {
                Value::Map(map) => state.outputs.push(Output::Record(map.into())),
                Value::Absent => {}
                other => {
                    return Err(RuntimeError::NotAMap {
                        target: "emit",
                        got: other.type_name(),
                    });
                }
            },
        }
        Ok(Flow::Normal)
    }
}
