use std::rc::Rc;

use crate::eval::{StatementBlock, Udf};

/// A compiled DSL program, ready to run against a record stream.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub begin_blocks: Vec<StatementBlock>,
    /// Top-level statements other than `begin`, `end` and `func`, run once
    /// per record.
    pub main_block: StatementBlock,
    pub end_blocks: Vec<StatementBlock>,
    /// User-defined functions, indexed by the ids baked into callsites.
    pub udfs: Rc<[Udf]>,
}

impl Program {
    pub fn has_main_block(&self) -> bool {
        !self.main_block.statements.is_empty()
    }
}
