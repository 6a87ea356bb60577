use std::rc::Rc;

use crate::{Mlrmap, Record, RuntimeError, eval::udf::Udf};

use super::{Context, Stack};

/// Something produced by a statement other than the record itself, kept in
/// program order so the runner can interleave it with record output.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// A record from `emit`.
    Record(Record),
    /// Text from `print`/`printn`, bound for standard output.
    Stdout(String),
    /// Text from `eprint`.
    Stderr(String),
}

/// Everything a compiled node can read or mutate while it runs.
#[derive(Debug)]
pub struct State {
    /// The record being processed; `None` in `begin` and `end` blocks.
    pub record: Option<Record>,
    pub context: Context,
    pub stack: Stack,
    pub oosvars: Mlrmap,
    /// Cleared by `filter false` to drop the current record.
    pub filter_result: bool,
    pub outputs: Vec<Output>,
    pub(crate) udfs: Rc<[Udf]>,
    pub(crate) max_call_depth: u32,
}

impl State {
    pub(crate) fn new(udfs: Rc<[Udf]>, max_call_depth: u32) -> Self {
        Self {
            record: None,
            context: Context::default(),
            stack: Stack::new(),
            oosvars: Mlrmap::new(),
            filter_result: true,
            outputs: Vec::new(),
            udfs,
            max_call_depth,
        }
    }

    pub fn record_mut(&mut self) -> Result<&mut Record, RuntimeError> {
        self.record.as_mut().ok_or(RuntimeError::NoCurrentRecord)
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new(Rc::from(Vec::new()), crate::engine::DEFAULT_MAX_CALL_DEPTH)
    }
}
