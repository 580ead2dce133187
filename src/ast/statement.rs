//! Typed statement AST, as a tagged enum (see `expression.rs` for the
//! rationale).

use std::collections::HashMap;

use crate::ast::expression::ExprId;
use crate::scope::{ObjectId, ScopeId};
use crate::token::Token;

pub type StmtId = usize;

#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub scope: ScopeId,
    pub body: Vec<StmtId>,
}

#[derive(Debug, Clone)]
pub struct Function {
    pub object: ObjectId,
    pub body: Option<StmtId>,
}

#[derive(Debug, Clone)]
pub struct Struct {
    pub record: ObjectId,
    pub members: HashMap<String, ObjectId>,
}

/// One variable definition, possibly chained via `next` into a
/// comma-separated declaration group sharing the base type.
#[derive(Debug, Clone)]
pub struct Define {
    pub variable: ObjectId,
    pub initializer: Option<ExprId>,
    pub next: Option<Box<Define>>,
}

#[derive(Debug, Clone)]
pub struct ExpressionStatement {
    pub expression: ExprId,
}

#[derive(Debug, Clone)]
pub struct Condition {
    pub boolean: ExprId,
    pub then_scope: StmtId,
    pub else_scope: Option<StmtId>,
}

#[derive(Debug, Clone)]
pub struct While {
    pub boolean: ExprId,
    pub body: StmtId,
}

#[derive(Debug, Clone)]
pub struct For {
    pub init: Option<StmtId>,
    pub boolean: Option<ExprId>,
    pub step: Option<ExprId>,
    pub body: StmtId,
}

#[derive(Debug, Clone)]
pub struct Return {
    pub function: ObjectId,
    pub expression: Option<ExprId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpKind {
    Break,
    Continue,
}

#[derive(Debug, Clone)]
pub struct Jump {
    pub kind: JumpKind,
    pub token: Token,
}

#[derive(Debug, Clone)]
pub struct Record {
    pub record: ObjectId,
}

#[derive(Debug, Clone)]
pub enum Statement {
    Scope(Scope),
    Function(Function),
    Struct(Struct),
    Define(Define),
    Expression(ExpressionStatement),
    Condition(Condition),
    While(While),
    For(For),
    Return(Return),
    Jump(Jump),
    Record(Record),
}
