//! Typed expression AST. A single tagged `Expression` enum replaces the
//! virtual-dispatch hierarchy of the original implementation: every
//! variant carries its own payload struct and the type pinned on it by the
//! parser's on-the-fly type-checking, and callers match exhaustively
//! instead of downcasting.

use crate::scope::ObjectId;
use crate::token::Token;
use crate::types::Type;

pub type ExprId = usize;

/// Evaluation order tag used by `Unary` to distinguish prefix (`Rhs`) from
/// postfix (`Lhs`) `++`/`--`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Lhs,
    Rhs,
}

#[derive(Debug, Clone)]
pub struct Unary {
    pub op: Token,
    pub order: Order,
    pub operand: ExprId,
    pub ty: Type,
}

#[derive(Debug, Clone)]
pub struct Binary {
    pub op: Token,
    pub lhs: ExprId,
    pub rhs: ExprId,
    pub ty: Type,
}

#[derive(Debug, Clone)]
pub struct Ternary {
    pub condition: ExprId,
    pub if_true: ExprId,
    pub if_false: ExprId,
    pub ty: Type,
}

/// One argument binding: a synthetic assignment of `value` into the
/// corresponding parameter's storage, linked to the next argument.
#[derive(Debug, Clone)]
pub struct Argument {
    pub value: ExprId,
    pub param: ObjectId,
    pub next: Option<Box<Argument>>,
}

#[derive(Debug, Clone)]
pub struct Invoke {
    pub function: ObjectId,
    pub callee_token: Token,
    pub arguments: Option<Argument>,
    pub arg_count: usize,
    /// Use-time index assigned by the allocator; tells the emitter which
    /// live registers must be saved across this call.
    pub use_time: usize,
    pub ty: Type,
}

#[derive(Debug, Clone)]
pub struct Comma {
    pub lhs: ExprId,
    pub rhs: ExprId,
}

#[derive(Debug, Clone)]
pub struct Nested {
    pub operand: ExprId,
}

#[derive(Debug, Clone)]
pub struct Id {
    pub object: ObjectId,
    pub token: Token,
    pub ty: Type,
}

/// A synthetic reference node produced internally (e.g. by array-decay or
/// address-of rewriting) rather than parsed from source text.
#[derive(Debug, Clone)]
pub struct Ref {
    pub object: ObjectId,
    pub ty: Type,
}

#[derive(Debug, Clone)]
pub struct Assign {
    pub lhs: ExprId,
    pub rhs: ExprId,
    pub ty: Type,
}

#[derive(Debug, Clone)]
pub struct Cast {
    pub operand: ExprId,
    pub from: Type,
    pub into: Type,
}

#[derive(Debug, Clone)]
pub struct Dot {
    pub operand: ExprId,
    pub member: ObjectId,
    pub ty: Type,
}

#[derive(Debug, Clone)]
pub struct Deref {
    pub operand: ExprId,
    pub ty: Type,
}

#[derive(Debug, Clone)]
pub struct Address {
    pub operand: ExprId,
    pub ty: Type,
}

#[derive(Debug, Clone)]
pub struct Str {
    pub value: Vec<u8>,
    pub label: Option<String>,
    pub ty: Type,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntFlags {
    pub unsigned: bool,
    pub long: bool,
    pub long_long: bool,
}

#[derive(Debug, Clone)]
pub struct Int {
    pub value: i64,
    pub flags: IntFlags,
    pub ty: Type,
}

#[derive(Debug, Clone)]
pub struct Float {
    pub value: f64,
    pub ty: Type,
}

#[derive(Debug, Clone)]
pub enum Expression {
    Unary(Unary),
    Binary(Binary),
    Ternary(Ternary),
    Invoke(Invoke),
    Comma(Comma),
    Nested(Nested),
    Id(Id),
    Ref(Ref),
    Assign(Assign),
    Cast(Cast),
    Dot(Dot),
    Deref(Deref),
    Address(Address),
    String(Str),
    Int(Int),
    Float(Float),
}

impl Expression {
    /// `expression_type(e)`: the type pinned on whichever field type-check
    /// assigned for this variant.
    pub fn ty(&self) -> &Type {
        match self {
            Expression::Unary(e) => &e.ty,
            Expression::Binary(e) => &e.ty,
            Expression::Ternary(e) => &e.ty,
            Expression::Invoke(e) => &e.ty,
            Expression::Comma(_) => unreachable!("Comma's type is its rhs's type; resolve via Arena::expr_type"),
            Expression::Nested(_) => unreachable!("Nested's type is its operand's type; resolve via Arena::expr_type"),
            Expression::Id(e) => &e.ty,
            Expression::Ref(e) => &e.ty,
            Expression::Assign(e) => &e.ty,
            Expression::Cast(e) => &e.into,
            Expression::Dot(e) => &e.ty,
            Expression::Deref(e) => &e.ty,
            Expression::Address(e) => &e.ty,
            Expression::String(e) => &e.ty,
            Expression::Int(e) => &e.ty,
            Expression::Float(e) => &e.ty,
        }
    }

    /// Lvalue classification per spec §4.4: recurses for `Nested`/`Comma`,
    /// which is why `ty()` can't answer those variants directly.
    pub fn is_designated(&self) -> bool {
        matches!(
            self,
            Expression::Id(_)
                | Expression::Ref(_)
                | Expression::Address(_)
                | Expression::Dot(_)
                | Expression::Deref(_)
                | Expression::Nested(_)
        )
    }
}
