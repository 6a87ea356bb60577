use super::compile::{Compiler, arity_error, children, expect_type, parse_type};
use super::error::CompileError;
use crate::Ident;
use crate::ast::{AstNode, NodeType};
use crate::eval::{Evaluable, PrintTarget, Statement, StatementBlock};

impl Compiler {
    pub(super) fn compile_block(&mut self, node: &AstNode) -> Result<StatementBlock, CompileError> {
        if node.node_type != NodeType::StatementBlock {
            return Err(CompileError::UnhandledNodeType(node.node_type));
        }
        node.children()
            .iter()
            .map(|child| self.compile_statement(child))
            .collect::<Result<Vec<_>, _>>()
            .map(StatementBlock::new)
    }

    /// A block compiled as a loop body, where `break` and `continue` are legal.
    fn compile_loop_body(&mut self, node: &AstNode) -> Result<StatementBlock, CompileError> {
        self.loop_depth += 1;
        let body = self.compile_block(node);
        self.loop_depth -= 1;
        body
    }

    /// Compiles one statement inside a block. `begin`, `end` and `func`
    /// are rejected here; they are only valid at the top level.
    pub(super) fn compile_statement(&mut self, node: &AstNode) -> Result<Statement, CompileError> {
        match node.node_type {
            NodeType::Assignment => {
                let [lvalue, rvalue] = children::<2>(node)?;
                Ok(Statement::Assignment {
                    lvalue: self.compile_lvalue(lvalue)?,
                    rvalue: self.compile_evaluable(rvalue)?,
                })
            }
            NodeType::OperatorAssignment => {
                let [lvalue, rvalue] = children::<2>(node)?;
                let token = node.token_str();
                let operator = token.strip_suffix('=').unwrap_or(token);
                let current = self.compile_evaluable(lvalue)?;
                let rvalue = self.compile_evaluable(rvalue)?;
                Ok(Statement::Assignment {
                    lvalue: self.compile_lvalue(lvalue)?,
                    rvalue: self.build_call(operator, vec![current, rvalue])?,
                })
            }
            NodeType::LocalVariableDefinition => {
                let gate = parse_type(node.token_str())?;
                let (name, rvalue) = match node.children() {
                    [name] => (name, None),
                    [name, rvalue] => (name, Some(self.compile_evaluable(rvalue)?)),
                    children => return Err(arity_error(node, "1 or 2", children.len())),
                };
                expect_type(node, name, NodeType::LocalVariable)?;
                Ok(Statement::Declaration {
                    name: Ident::new(name.token_str()),
                    gate,
                    rvalue,
                })
            }
            NodeType::Unset => node
                .children()
                .iter()
                .map(|lvalue| self.compile_lvalue(lvalue))
                .collect::<Result<Vec<_>, _>>()
                .map(Statement::Unset),
            NodeType::StatementBlock => Ok(Statement::Block(self.compile_block(node)?)),
            NodeType::IfChain => self.compile_if_chain(node),
            NodeType::WhileLoop => {
                let [condition, body] = children::<2>(node)?;
                Ok(Statement::While {
                    condition: self.compile_evaluable(condition)?,
                    body: self.compile_loop_body(body)?,
                })
            }
            NodeType::DoWhileLoop => {
                let [body, condition] = children::<2>(node)?;
                Ok(Statement::DoWhile {
                    body: self.compile_loop_body(body)?,
                    condition: self.compile_evaluable(condition)?,
                })
            }
            NodeType::SingleVariableForLoop => {
                let [variable, iterable, body] = children::<3>(node)?;
                Ok(Statement::ForSingle {
                    variable: loop_variable(node, variable)?,
                    iterable: self.compile_evaluable(iterable)?,
                    body: self.compile_loop_body(body)?,
                })
            }
            NodeType::KeyValueForLoop => {
                let [key, value, iterable, body] = children::<4>(node)?;
                Ok(Statement::ForKeyValue {
                    key: loop_variable(node, key)?,
                    value: loop_variable(node, value)?,
                    iterable: self.compile_evaluable(iterable)?,
                    body: self.compile_loop_body(body)?,
                })
            }
            NodeType::TripleForLoop => {
                let [init, continuation, update, body] = children::<4>(node)?;
                Ok(Statement::ForTriple {
                    init: self.compile_block(init)?,
                    condition: self.compile_continuation(continuation)?,
                    update: self.compile_block(update)?,
                    body: self.compile_loop_body(body)?,
                })
            }
            NodeType::Break if self.loop_depth == 0 => Err(CompileError::BreakOutsideLoop),
            NodeType::Break => Ok(Statement::Break),
            NodeType::Continue if self.loop_depth == 0 => Err(CompileError::ContinueOutsideLoop),
            NodeType::Continue => Ok(Statement::Continue),
            NodeType::Return if !self.in_function => Err(CompileError::ReturnOutsideFunction),
            NodeType::Return => match node.children() {
                [] => Ok(Statement::Return(None)),
                [value] => Ok(Statement::Return(Some(self.compile_evaluable(value)?))),
                children => Err(arity_error(node, "0 or 1", children.len())),
            },
            NodeType::FilterStatement => {
                let [condition] = children::<1>(node)?;
                Ok(Statement::Filter(self.compile_evaluable(condition)?))
            }
            NodeType::BareBoolean => {
                let [condition] = children::<1>(node)?;
                Ok(Statement::BareBoolean(self.compile_evaluable(condition)?))
            }
            NodeType::PatternActionBlock => {
                let [condition, body] = children::<2>(node)?;
                Ok(Statement::PatternAction {
                    condition: self.compile_evaluable(condition)?,
                    body: self.compile_block(body)?,
                })
            }
            NodeType::Print => self.compile_print(node, PrintTarget::Stdout, true),
            NodeType::Printn => self.compile_print(node, PrintTarget::Stdout, false),
            NodeType::Eprint => self.compile_print(node, PrintTarget::Stderr, true),
            NodeType::Emit => {
                let [emittable] = children::<1>(node)?;
                Ok(Statement::Emit(self.compile_evaluable(emittable)?))
            }
            NodeType::BeginBlock | NodeType::EndBlock | NodeType::NamedFunctionDefinition => {
                Err(CompileError::NotTopLevel(node.node_type))
            }
            other => Err(CompileError::UnhandledNodeType(other)),
        }
    }

    /// `if (c1) {...} elif (c2) {...} else {...}`: "if item" children with
    /// [condition, block], the last one optionally just [block].
    fn compile_if_chain(&mut self, node: &AstNode) -> Result<Statement, CompileError> {
        let mut branches = Vec::new();
        let mut otherwise = None;

        for (i, item) in node.children().iter().enumerate() {
            expect_type(node, item, NodeType::IfItem)?;
            match item.children() {
                [condition, block] => {
                    branches.push((self.compile_evaluable(condition)?, self.compile_block(block)?))
                }
                [block] if i + 1 == node.children().len() && i > 0 => {
                    otherwise = Some(self.compile_block(block)?)
                }
                children => return Err(arity_error(item, "2", children.len())),
            }
        }

        Ok(Statement::If {
            branches,
            otherwise,
        })
    }

    /// The middle part of a triple-for: a statement block holding at most
    /// one bare boolean.
    fn compile_continuation(&self, node: &AstNode) -> Result<Option<Evaluable>, CompileError> {
        match node.children() {
            [] => Ok(None),
            [statement] if statement.node_type == NodeType::BareBoolean => {
                let [condition] = children::<1>(statement)?;
                Ok(Some(self.compile_evaluable(condition)?))
            }
            [expression] => Ok(Some(self.compile_evaluable(expression)?)),
            children => Err(arity_error(node, "0 or 1", children.len())),
        }
    }

    fn compile_print(
        &self,
        node: &AstNode,
        target: PrintTarget,
        newline: bool,
    ) -> Result<Statement, CompileError> {
        Ok(Statement::Print {
            expressions: self.compile_evaluables(node.children())?,
            target,
            newline,
        })
    }
}

fn loop_variable(parent: &AstNode, node: &AstNode) -> Result<Ident, CompileError> {
    expect_type(parent, node, NodeType::LocalVariable)?;
    Ok(Ident::new(node.token_str()))
}
