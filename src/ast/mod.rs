//! AST ownership: arenas for statements, expressions, objects and scopes.
//! Everything else (the parser, the allocator, the emitter) refers to AST
//! nodes through the `StmtId`/`ExprId`/`ObjectId`/`ScopeId` indices defined
//! alongside each arena, never through owning references, so there is no
//! possibility of a cycle through an owning edge.

pub mod expression;
pub mod statement;

pub use expression::{Expression, ExprId};
pub use statement::{Statement, StmtId};

use crate::scope::{Object, ObjectArena, ObjectId, Scope as SymbolScope, ScopeArena, ScopeId};
use crate::types::Type;

#[derive(Debug, Clone, Default)]
pub struct StatementArena {
    statements: Vec<Statement>,
}

impl StatementArena {
    pub fn alloc(&mut self, statement: Statement) -> StmtId {
        self.statements.push(statement);
        self.statements.len() - 1
    }

    pub fn get(&self, id: StmtId) -> &Statement {
        &self.statements[id]
    }

    pub fn get_mut(&mut self, id: StmtId) -> &mut Statement {
        &mut self.statements[id]
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExpressionArena {
    expressions: Vec<Expression>,
}

impl ExpressionArena {
    pub fn alloc(&mut self, expression: Expression) -> ExprId {
        self.expressions.push(expression);
        self.expressions.len() - 1
    }

    pub fn get(&self, id: ExprId) -> &Expression {
        &self.expressions[id]
    }

    pub fn get_mut(&mut self, id: ExprId) -> &mut Expression {
        &mut self.expressions[id]
    }

    /// `expression_type(e)`, resolved through `Comma`/`Nested` by
    /// following their payload rather than panicking, unlike
    /// `Expression::ty`.
    pub fn expr_type(&self, id: ExprId) -> &Type {
        match self.get(id) {
            Expression::Comma(c) => self.expr_type(c.rhs),
            Expression::Nested(n) => self.expr_type(n.operand),
            other => other.ty(),
        }
    }

    /// Full lvalue classification (spec §4.4), recursing through `Nested`
    /// and pointer/array-typed `Binary` results, which `Expression`'s own
    /// helper can't do without arena access.
    pub fn is_lvalue(&self, id: ExprId) -> bool {
        use crate::types::TypeKind;
        match self.get(id) {
            Expression::Id(_) | Expression::Ref(_) | Expression::Address(_) | Expression::Dot(_) | Expression::Deref(_) => true,
            Expression::Nested(n) => self.is_lvalue(n.operand),
            Expression::Unary(u) => {
                matches!(u.op.kind, k if k.intersects(crate::token::TokenKind::INCREMENT | crate::token::TokenKind::DECREMENT))
            }
            Expression::Binary(b) => matches!(b.ty.kind, TypeKind::Pointer | TypeKind::Array),
            Expression::Assign(a) => self.is_lvalue(a.lhs),
            _ => false,
        }
    }
}

/// Arena of "orphan" types constructed at parse time (pointer-of,
/// array-of) that are not inline inside a declaration. Kept alive for the
/// lifetime of the AST; indices are not currently needed by other nodes
/// because `Type` already owns its pointee inline (`Box<Type>`), but the
/// arena exists so a future owner-sharing scheme has a home, matching the
/// "dedicated arena of the type system" called out in spec §3.
#[derive(Debug, Clone, Default)]
pub struct TypeArena {
    orphans: Vec<Type>,
}

impl TypeArena {
    pub fn adopt(&mut self, ty: Type) -> usize {
        self.orphans.push(ty);
        self.orphans.len() - 1
    }
}

/// The complete compilation unit: every arena, plus the root scope and the
/// top-level statement sequence (functions and file-scope defines).
#[derive(Debug, Clone, Default)]
pub struct Ast {
    pub statements: StatementArena,
    pub expressions: ExpressionArena,
    pub objects: ObjectArena,
    pub scopes: ScopeArena,
    pub types: TypeArena,
    pub root_scope: Option<ScopeId>,
    pub top_level: Vec<StmtId>,
}

impl Ast {
    pub fn new() -> Self {
        let mut ast = Ast::default();
        let root = ast.scopes.alloc(None);
        ast.root_scope = Some(root);
        ast
    }

    pub fn root(&self) -> ScopeId {
        self.root_scope.expect("Ast::new always allocates a root scope")
    }

    pub fn object(&self, id: ObjectId) -> &Object {
        self.objects.get(id)
    }

    pub fn symbol_scope(&self, id: ScopeId) -> &SymbolScope {
        self.scopes.get(id)
    }
}
