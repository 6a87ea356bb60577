use std::rc::Rc;

use tracing::debug;

use crate::{
    Context, Error, Mlrmap, Output, Program, Record, RuntimeError, State, Value,
    ast::AstNode,
    compiler::Compiler,
    eval::StatementBlock,
};

pub const DEFAULT_MAX_CALL_DEPTH: u32 = 1024;

#[derive(Debug, Clone)]
pub struct Options {
    /// Maximum nesting of user-defined function calls.
    ///
    /// Calls recurse on the native stack. An unoptimized build needs far more
    /// than the 8 MiB main-thread stack to reach the default depth, so deep
    /// programs should run on a thread with a larger stack.
    pub max_call_depth: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

/// What one record turned into: the record itself unless it was filtered
/// out, plus anything printed or emitted along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Processed {
    pub record: Option<Record>,
    pub outputs: Vec<Output>,
}

/// Runs a compiled program over a record stream.
///
/// Out-of-stream variables and the global frame set live in the engine and
/// persist from `begin` through every record to `end`.
#[derive(Debug)]
pub struct Engine {
    program: Program,
    state: State,
}

impl Engine {
    pub fn new(program: Program) -> Self {
        Self::with_options(program, Options::default())
    }

    pub fn with_options(program: Program, options: Options) -> Self {
        let state = State::new(Rc::clone(&program.udfs), options.max_call_depth);
        Self { program, state }
    }

    /// Compiles `root` and wraps the result in an engine.
    #[allow(clippy::result_large_err)]
    pub fn from_ast(root: &AstNode, options: Options) -> Result<Self, Error> {
        let program = Compiler::new().compile_program(root)?;
        Ok(Self::with_options(program, options))
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Presets `@name`, as `mlr put -s name=value` does.
    pub fn define_oosvar(&mut self, name: impl Into<String>, value: Value) {
        self.state.oosvars.insert(name.into(), value);
    }

    pub fn oosvars(&self) -> &Mlrmap {
        &self.state.oosvars
    }

    #[allow(clippy::result_large_err)]
    pub fn execute_begin(&mut self) -> Result<Vec<Output>, Error> {
        self.state.record = None;
        for block in &self.program.begin_blocks {
            run_block(block, &mut self.state).map_err(|e| Error::runtime(e, None))?;
        }
        Ok(std::mem::take(&mut self.state.outputs))
    }

    /// Runs the main block against one record.
    #[allow(clippy::result_large_err)]
    pub fn execute(&mut self, record: Record, context: &Context) -> Result<Processed, Error> {
        self.state.record = Some(record);
        self.state.context = context.clone();
        self.state.filter_result = true;

        let result = run_block(&self.program.main_block, &mut self.state);
        let record = self.state.record.take();
        let outputs = std::mem::take(&mut self.state.outputs);
        result.map_err(|e| Error::runtime(e, Some(context.nr)))?;

        Ok(Processed {
            record: record.filter(|_| self.state.filter_result),
            outputs,
        })
    }

    #[allow(clippy::result_large_err)]
    pub fn execute_end(&mut self, context: &Context) -> Result<Vec<Output>, Error> {
        self.state.record = None;
        self.state.context = context.clone();
        for block in &self.program.end_blocks {
            run_block(block, &mut self.state).map_err(|e| Error::runtime(e, None))?;
        }
        debug!(oosvars = self.state.oosvars.len(), "end of stream");
        Ok(std::mem::take(&mut self.state.outputs))
    }
}

/// Top-level blocks get their own frame, so locals never outlive one
/// execution of the block.
fn run_block(block: &StatementBlock, state: &mut State) -> Result<(), RuntimeError> {
    block.execute_scoped(state).map(|_| ())
}
