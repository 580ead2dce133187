//! Recursive-descent parser with type-checking folded into each production:
//! every expression and statement is checked against its surrounding scope
//! as it is built, so a second type-checking pass over the AST is never
//! needed. Grammar and precedence follow the declarative table documented
//! alongside `parse_assignment`.

use crate::ast::expression::{
    Address, Argument, Assign, Binary, Cast, Comma, Deref, Dot, Expression, Float, Id, IntFlags,
    Int, Invoke, Nested, Order, Str, Ternary, Unary,
};
use crate::ast::statement::{
    Condition, Define, ExpressionStatement, For, Function as FnStmt, Jump, JumpKind, Record as RecordStmt,
    Return, Scope as ScopeStmt, Statement, While,
};
use crate::ast::{Ast, ExprId, StmtId};
use crate::error::CompileError;
use crate::lexer::{unescape_literal, Lexer};
use crate::scope::{Environment, Function, Object, ObjectId, Record, RecordKind, ScopeId, Source, Typedef, Variable};
use crate::token::{Span, Token, TokenKind};
use crate::types::{align_up, cast, scalar_size, Modifiers, StorageClass, Type, TypeKind, TypePayload};

type PResult<T> = Result<T, CompileError>;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    pub ast: Ast,
    scopes: Vec<ScopeId>,
    function_stack: Vec<ObjectId>,
    loop_depth: usize,
}

/// Parses a full translation unit, returning the built AST or the first
/// diagnostic encountered.
pub fn parse(source: &str) -> PResult<Ast> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer
            .next(TokenKind::SKIP_TRIVIA)
            .map_err(|e| CompileError::lex(e.message, e.span))?;
        let is_eof = token.kind == TokenKind::EOF;
        tokens.push(token);
        if is_eof {
            break;
        }
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        ast: Ast::new(),
        scopes: vec![],
        function_stack: vec![],
        loop_depth: 0,
    };
    let root = parser.ast.root();
    parser.scopes.push(root);
    parser.parse_program()?;
    Ok(parser.ast)
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_at(&self, offset: usize) -> &Token {
        self.tokens.get(self.pos + offset).unwrap_or_else(|| self.tokens.last().unwrap())
    }

    fn at(&self, mask: TokenKind) -> bool {
        self.peek().is(mask)
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, mask: TokenKind, what: &str) -> PResult<Token> {
        if self.at(mask) {
            Ok(self.advance())
        } else {
            let tok = self.peek().clone();
            Err(CompileError::parse(format!("expected {what}, found '{}'", tok.text), tok.span))
        }
    }

    fn synth(&self, kind: TokenKind, text: &str, span: Span) -> Token {
        Token::new(text, kind, span)
    }

    fn scope(&self) -> ScopeId {
        *self.scopes.last().expect("scope stack never empty")
    }

    fn push_scope(&mut self) -> ScopeId {
        let owner = self.scope();
        let id = self.ast.scopes.alloc(Some(owner));
        self.scopes.push(id);
        id
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn current_function(&self) -> Option<ObjectId> {
        self.function_stack.last().copied()
    }

    // ---- type specifiers -------------------------------------------------

    fn at_type_start(&self) -> bool {
        if self.at(TokenKind::FUNDAMENTAL
            | TokenKind::RECORD_KEYWORD
            | TokenKind::CVR
            | TokenKind::STORAGE
            | TokenKind::SIGNEDNESS
            | TokenKind::SIZE_MODIFIER
            | TokenKind::KW_TYPEDEF)
        {
            return true;
        }
        if self.at(TokenKind::ID) {
            return self.lookup_typedef(&self.peek().text).is_some();
        }
        false
    }

    fn lookup_typedef(&self, name: &str) -> Option<Type> {
        let id = self.ast.scopes.object(self.scope(), name)?;
        match self.ast.object(id) {
            Object::Typedef(t) => Some(t.aliased.clone()),
            _ => None,
        }
    }

    /// Parses storage/cvr/signedness/size modifiers followed by the base
    /// kind (fundamental keyword, record, or typedef name), applying
    /// implicit-`int` when only modifiers were written.
    fn parse_type_specifier(&mut self) -> PResult<(Type, bool)> {
        let mut mods = Modifiers::empty();
        let mut storage = StorageClass::Local;
        let mut is_typedef_decl = false;
        let mut saw_size = false;
        let mut saw_signedness = false;
        let start_span = self.peek().span;

        loop {
            let tok = self.peek().clone();
            if tok.kind == TokenKind::KW_TYPEDEF {
                is_typedef_decl = true;
                self.advance();
            } else if tok.is(TokenKind::STORAGE) {
                storage = match tok.kind {
                    TokenKind::KW_EXTERN => StorageClass::Extern,
                    TokenKind::KW_REGISTER => StorageClass::Register,
                    TokenKind::KW_STATIC => StorageClass::Static,
                    TokenKind::KW_AUTO => StorageClass::Auto,
                    _ => unreachable!(),
                };
                self.advance();
            } else if tok.kind == TokenKind::KW_CONST {
                mods |= Modifiers::CONST;
                self.advance();
            } else if tok.kind == TokenKind::KW_VOLATILE {
                mods |= Modifiers::VOLATILE;
                self.advance();
            } else if tok.kind == TokenKind::KW_RESTRICT {
                mods |= Modifiers::RESTRICT;
                self.advance();
            } else if tok.kind == TokenKind::KW_SIGNED {
                if saw_signedness {
                    return Err(CompileError::ty("duplicate signedness specifier", tok.span));
                }
                saw_signedness = true;
                mods |= Modifiers::SIGNED;
                self.advance();
            } else if tok.kind == TokenKind::KW_UNSIGNED {
                if saw_signedness {
                    return Err(CompileError::ty("duplicate signedness specifier", tok.span));
                }
                saw_signedness = true;
                mods |= Modifiers::UNSIGNED;
                self.advance();
            } else if tok.kind == TokenKind::KW_SHORT || tok.kind == TokenKind::KW_LONG {
                if saw_size {
                    return Err(CompileError::ty("duplicate size modifier", tok.span));
                }
                saw_size = true;
                mods |= if tok.kind == TokenKind::KW_SHORT { Modifiers::SHORT } else { Modifiers::LONG };
                self.advance();
            } else {
                break;
            }
        }

        let base = if self.at(TokenKind::RECORD_KEYWORD) {
            self.parse_record()?
        } else if self.at(TokenKind::FUNDAMENTAL) {
            let tok = self.advance();
            let kind = match tok.kind {
                TokenKind::KW_VOID => TypeKind::Void,
                TokenKind::KW_CHAR => TypeKind::Char,
                TokenKind::KW_INT => TypeKind::Int,
                TokenKind::KW_FLOAT => TypeKind::Float,
                TokenKind::KW_DOUBLE => TypeKind::Double,
                _ => unreachable!(),
            };
            Type::scalar(kind, mods)
        } else if self.at(TokenKind::ID) {
            if let Some(aliased) = self.lookup_typedef(&self.peek().text) {
                self.advance();
                let mut ty = aliased;
                ty.mods |= mods;
                ty
            } else if saw_size || saw_signedness || storage != StorageClass::Local || mods.intersects(Modifiers::CONST | Modifiers::VOLATILE | Modifiers::RESTRICT) {
                Type::scalar(TypeKind::Int, mods)
            } else {
                return Err(CompileError::parse("expected a type", start_span));
            }
        } else if saw_size || saw_signedness {
            Type::scalar(TypeKind::Int, mods)
        } else {
            return Err(CompileError::parse("expected a type specifier", start_span));
        };

        let mut ty = base;
        ty.storage = storage;
        ty.mods |= mods;
        if ty.kind == TypeKind::Int || ty.kind == TypeKind::Char {
            ty.size = scalar_size(ty.kind, ty.mods);
        }
        Ok((ty, is_typedef_decl))
    }

    fn record_kind_of(&self) -> RecordKind {
        match self.peek().kind {
            TokenKind::KW_STRUCT => RecordKind::Struct,
            TokenKind::KW_UNION => RecordKind::Union,
            TokenKind::KW_ENUM => RecordKind::Enum,
            _ => unreachable!(),
        }
    }

    fn parse_record(&mut self) -> PResult<Type> {
        let kind = self.record_kind_of();
        let keyword = self.advance();

        let name_tok = if self.at(TokenKind::ID) { Some(self.advance()) } else { None };

        if !self.at(TokenKind::SCOPE_BEGIN) {
            // Reference to a previously declared record.
            let name = name_tok.as_ref().map(|t| t.text.clone()).ok_or_else(|| {
                CompileError::parse("expected record name or body", keyword.span)
            })?;
            let object_id = self
                .ast
                .scopes
                .record(self.scope(), kind, &name)
                .ok_or_else(|| CompileError::ty(format!("unknown {name}"), keyword.span))?;
            let Object::Record(record) = self.ast.object(object_id) else { unreachable!() };
            return Ok(record.introduced.clone());
        }

        self.advance(); // '{'

        let members_scope = self.ast.scopes.alloc(None);
        let name = name_tok.as_ref().map(|t| t.text.clone());

        let placeholder_name = name_tok.clone().unwrap_or_else(|| self.synth(TokenKind::ID, "<anonymous>", keyword.span));
        let record_object = self.ast.objects.alloc(Object::Record(Record {
            name: placeholder_name,
            kind,
            introduced: Type::void(),
            members_scope,
            complete: false,
        }));
        if let Some(n) = &name {
            self.ast.scopes.get_mut(self.scope()).insert_record(kind, n.clone(), record_object);
        }

        let introduced = match kind {
            RecordKind::Enum => self.parse_enum_body(record_object, members_scope, name.clone())?,
            RecordKind::Struct | RecordKind::Union => self.parse_struct_body(record_object, members_scope, kind, name.clone())?,
        };

        self.expect(TokenKind::SCOPE_END, "'}'")?;

        if let Object::Record(record) = self.ast.objects.get_mut(record_object) {
            record.introduced = introduced.clone();
            record.complete = true;
        }
        Ok(introduced)
    }

    fn parse_struct_body(
        &mut self,
        record_object: ObjectId,
        members_scope: ScopeId,
        kind: RecordKind,
        name: Option<String>,
    ) -> PResult<Type> {
        let env = if kind == RecordKind::Struct { Environment::Struct } else { Environment::Union };
        let mut offset: usize = 0;
        let mut max_size: usize = 0;
        let mut max_align: usize = 1;

        while !self.at(TokenKind::SCOPE_END) {
            let (base, _) = self.parse_type_specifier()?;
            loop {
                let (name_tok, ty) = self.parse_declarator(base.clone())?;
                let align = ty.size.max(1).min(8);
                max_align = max_align.max(align);
                let member_offset = if kind == RecordKind::Union {
                    0
                } else {
                    let o = align_up(offset, align);
                    offset = o + ty.size;
                    o
                };
                max_size = max_size.max(ty.size);

                let id = self.ast.objects.alloc(Object::Variable(Variable {
                    name: name_tok.clone(),
                    ty,
                    const_value: None,
                    source: Source::Member(member_offset),
                    member_offset,
                    env,
                }));
                self.ast.scopes.get_mut(members_scope).insert_object(name_tok.text.clone(), id);

                if self.at(TokenKind::COMMA) {
                    self.advance();
                    continue;
                }
                break;
            }
            self.expect(TokenKind::SEMICOLON, "';'")?;
        }

        let size = if kind == RecordKind::Struct { align_up(offset, max_align) } else { max_size };
        Ok(Type {
            kind: if kind == RecordKind::Struct { TypeKind::Struct } else { TypeKind::Union },
            size,
            mods: Modifiers::empty(),
            storage: StorageClass::Local,
            payload: TypePayload::Record(members_scope),
            array_len: 0,
            record_name: name,
            record_object: Some(record_object),
        })
    }

    fn parse_enum_body(&mut self, record_object: ObjectId, members_scope: ScopeId, name: Option<String>) -> PResult<Type> {
        let base = Type::scalar(TypeKind::Int, Modifiers::empty());
        let mut next_value: i64 = 0;

        while !self.at(TokenKind::SCOPE_END) {
            let name_tok = self.expect(TokenKind::ID, "enumerator name")?;
            let value = if self.at(TokenKind::ASSIGN) {
                self.advance();
                let expr = self.parse_assignment()?;
                fold_const(&self.ast, expr).ok_or_else(|| {
                    CompileError::constant_eval("enumerator initializer must be a constant expression", name_tok.span)
                })?
            } else {
                next_value
            };
            next_value = value + 1;

            let id = self.ast.objects.alloc(Object::Variable(Variable {
                name: name_tok.clone(),
                ty: base.clone(),
                const_value: Some(value),
                source: Source::None,
                member_offset: 0,
                env: Environment::Enum,
            }));
            // Enumerators are visible in the enclosing scope, not just the
            // record's member namespace.
            self.ast.scopes.get_mut(self.scope()).insert_object(name_tok.text.clone(), id);
            self.ast.scopes.get_mut(members_scope).insert_object(name_tok.text.clone(), id);

            if self.at(TokenKind::COMMA) {
                self.advance();
                continue;
            }
            break;
        }

        Ok(Type {
            kind: TypeKind::Enum,
            size: 4,
            mods: Modifiers::empty(),
            storage: StorageClass::Local,
            payload: TypePayload::EnumBase(Box::new(base)),
            array_len: 0,
            record_name: name,
            record_object: Some(record_object),
        })
    }

    // ---- declarators -------------------------------------------------

    fn parse_declarator(&mut self, mut base: Type) -> PResult<(Token, Type)> {
        while self.at(TokenKind::STAR) {
            self.advance();
            while self.at(TokenKind::CVR) {
                self.advance();
            }
            base = Type::pointer_to(base);
        }

        let name = self.expect(TokenKind::ID, "an identifier")?;

        let mut dims = Vec::new();
        while self.at(TokenKind::CROCHET_BEGIN) {
            self.advance();
            let len = if self.at(TokenKind::CROCHET_END) {
                0
            } else {
                let expr = self.parse_assignment()?;
                fold_const(&self.ast, expr).ok_or_else(|| {
                    CompileError::constant_eval("array size must be a constant expression", name.span)
                })? as usize
            };
            self.expect(TokenKind::CROCHET_END, "']'")?;
            dims.push(len);
        }

        let mut ty = base;
        for &d in dims.iter().rev() {
            ty = Type::array_of(ty, d);
        }

        Ok((name, ty))
    }

    // ---- top level -------------------------------------------------

    fn parse_program(&mut self) -> PResult<()> {
        while !self.at(TokenKind::EOF) {
            let stmt = self.parse_external_declaration()?;
            self.ast.top_level.push(stmt);
        }
        Ok(())
    }

    fn parse_external_declaration(&mut self) -> PResult<StmtId> {
        let (base, is_typedef) = self.parse_type_specifier()?;

        if self.at(TokenKind::SEMICOLON) {
            // Bare `struct Foo { ... };`
            self.advance();
            let record_object = base.record_object.ok_or_else(|| {
                CompileError::parse("expected a declarator", self.peek().span)
            })?;
            return Ok(self.ast.statements.alloc(Statement::Record(RecordStmt { record: record_object })));
        }

        let (name, ty) = self.parse_declarator(base)?;

        if is_typedef {
            let id = self.ast.objects.alloc(Object::Typedef(Typedef { name: name.clone(), aliased: ty }));
            self.ast.scopes.get_mut(self.scope()).insert_object(name.text.clone(), id);
            self.expect(TokenKind::SEMICOLON, "';'")?;
            return Ok(self.ast.statements.alloc(Statement::Expression(ExpressionStatement {
                expression: self.ast.expressions.alloc(Expression::Int(Int {
                    value: 0,
                    flags: IntFlags { unsigned: false, long: false, long_long: false },
                    ty: Type::void(),
                })),
            })));
        }

        if self.at(TokenKind::PAREN_BEGIN) {
            return self.parse_function(name, ty);
        }

        let stmt = self.parse_define_tail(name, ty, Environment::Var, StorageClass::Local)?;
        self.expect(TokenKind::SEMICOLON, "';'")?;
        Ok(stmt)
    }

    fn parse_function(&mut self, name: Token, return_type: Type) -> PResult<StmtId> {
        self.advance(); // '('
        let mut params = Vec::new();
        if self.at(TokenKind::KW_VOID) && self.peek_at(1).kind == TokenKind::PAREN_END {
            self.advance();
        } else {
            while !self.at(TokenKind::PAREN_END) {
                let (pbase, _) = self.parse_type_specifier()?;
                let (pname, pty) = self.parse_declarator(pbase)?;
                params.push((pname, pty.decayed()));
                if self.at(TokenKind::COMMA) {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        self.expect(TokenKind::PAREN_END, "')'")?;

        let is_main = name.text == "main";

        let existing = self.ast.scopes.object(self.scope(), &name.text);
        let function_object = if let Some(id) = existing {
            id
        } else {
            let id = self.ast.objects.alloc(Object::Function(Function {
                name: name.clone(),
                return_type: return_type.clone(),
                params: vec![],
                locals: vec![],
                stack_size: 0,
                invoke_size: 0,
                is_main,
                is_defined: false,
            }));
            self.ast.scopes.get_mut(self.scope()).insert_object(name.text.clone(), id);
            id
        };

        if self.at(TokenKind::SEMICOLON) {
            self.advance();
            return Ok(self.ast.statements.alloc(Statement::Function(FnStmt { object: function_object, body: None })));
        }

        self.expect(TokenKind::SCOPE_BEGIN, "'{'")?;
        let body_scope = self.push_scope();
        self.function_stack.push(function_object);

        let mut param_ids = Vec::new();
        for (pname, pty) in &params {
            let id = self.ast.objects.alloc(Object::Variable(Variable {
                name: pname.clone(),
                ty: pty.clone(),
                const_value: None,
                source: Source::None,
                member_offset: 0,
                env: Environment::Parameter,
            }));
            self.ast.scopes.get_mut(body_scope).insert_object(pname.text.clone(), id);
            param_ids.push(id);
        }

        let mut body = Vec::new();
        while !self.at(TokenKind::SCOPE_END) {
            body.push(self.parse_statement()?);
        }
        self.expect(TokenKind::SCOPE_END, "'}'")?;

        self.function_stack.pop();
        self.pop_scope();

        if let Object::Function(f) = self.ast.objects.get_mut(function_object) {
            f.params = param_ids;
            f.is_defined = true;
        }

        let body_stmt = self.ast.statements.alloc(Statement::Scope(ScopeStmt { scope: body_scope, body }));
        Ok(self.ast.statements.alloc(Statement::Function(FnStmt { object: function_object, body: Some(body_stmt) })))
    }

    // ---- statements -------------------------------------------------

    fn parse_statement(&mut self) -> PResult<StmtId> {
        if self.at(TokenKind::SCOPE_BEGIN) {
            return self.parse_scope_statement();
        }
        if self.at(TokenKind::KW_IF) {
            return self.parse_if();
        }
        if self.at(TokenKind::KW_WHILE) {
            return self.parse_while();
        }
        if self.at(TokenKind::KW_FOR) {
            return self.parse_for();
        }
        if self.at(TokenKind::KW_RETURN) {
            return self.parse_return();
        }
        if self.at(TokenKind::KW_BREAK) || self.at(TokenKind::KW_CONTINUE) {
            return self.parse_jump();
        }
        if self.at_type_start() {
            let (base, _) = self.parse_type_specifier()?;
            if self.at(TokenKind::SEMICOLON) {
                self.advance();
                let record_object = base.record_object.expect("bare record declaration");
                return Ok(self.ast.statements.alloc(Statement::Record(RecordStmt { record: record_object })));
            }
            let (name, ty) = self.parse_declarator(base)?;
            let stmt = self.parse_define_tail(name, ty, Environment::Var, StorageClass::Local)?;
            self.expect(TokenKind::SEMICOLON, "';'")?;
            return Ok(stmt);
        }

        let expr = self.parse_expression()?;
        self.expect(TokenKind::SEMICOLON, "';'")?;
        Ok(self.ast.statements.alloc(Statement::Expression(ExpressionStatement { expression: expr })))
    }

    fn parse_define_tail(&mut self, first_name: Token, first_ty: Type, env: Environment, storage: StorageClass) -> PResult<StmtId> {
        let mut ty = first_ty;
        ty.storage = storage;
        let head = self.parse_one_define(first_name, ty.clone(), env)?;
        let mut define = head;
        let mut chain_end = &mut define;
        while self.at(TokenKind::COMMA) {
            self.advance();
            let (name, declared) = self.parse_declarator(ty.clone())?;
            let next = self.parse_one_define(name, declared, env)?;
            chain_end.next = Some(Box::new(next));
            chain_end = chain_end.next.as_mut().unwrap();
        }
        Ok(self.ast.statements.alloc(Statement::Define(define)))
    }

    fn parse_one_define(&mut self, name: Token, ty: Type, env: Environment) -> PResult<Define> {
        let id = self.ast.objects.alloc(Object::Variable(Variable {
            name: name.clone(),
            ty: ty.clone(),
            const_value: None,
            source: Source::None,
            member_offset: 0,
            env,
        }));
        if !self.ast.scopes.get_mut(self.scope()).insert_object(name.text.clone(), id) {
            return Err(CompileError::ty(format!("redefinition of '{}'", name.text), name.span));
        }

        let initializer = if self.at(TokenKind::ASSIGN) {
            self.advance();
            let value = self.parse_assignment()?;
            let vty = self.ast.expressions.expr_type(value).clone();
            let c = cast(&vty, &ty);
            if c.is_error() {
                return Err(CompileError::ty(format!("cannot initialize '{ty}' from '{vty}'"), name.span));
            }
            Some(value)
        } else {
            None
        };

        Ok(Define { variable: id, initializer, next: None })
    }

    fn parse_scope_statement(&mut self) -> PResult<StmtId> {
        self.advance(); // '{'
        let scope = self.push_scope();
        let mut body = Vec::new();
        while !self.at(TokenKind::SCOPE_END) {
            body.push(self.parse_statement()?);
        }
        self.expect(TokenKind::SCOPE_END, "'}'")?;
        self.pop_scope();
        Ok(self.ast.statements.alloc(Statement::Scope(ScopeStmt { scope, body })))
    }

    fn parse_if(&mut self) -> PResult<StmtId> {
        self.advance();
        self.expect(TokenKind::PAREN_BEGIN, "'('")?;
        let boolean = self.parse_expression()?;
        self.expect(TokenKind::PAREN_END, "')'")?;
        let then_scope = self.parse_statement()?;
        let else_scope = if self.at(TokenKind::KW_ELSE) {
            self.advance();
            Some(self.parse_statement()?)
        } else {
            None
        };
        Ok(self.ast.statements.alloc(Statement::Condition(Condition { boolean, then_scope, else_scope })))
    }

    fn parse_while(&mut self) -> PResult<StmtId> {
        self.advance();
        self.expect(TokenKind::PAREN_BEGIN, "'('")?;
        let boolean = self.parse_expression()?;
        self.expect(TokenKind::PAREN_END, "')'")?;
        self.loop_depth += 1;
        let body = self.parse_statement()?;
        self.loop_depth -= 1;
        Ok(self.ast.statements.alloc(Statement::While(While { boolean, body })))
    }

    fn parse_for(&mut self) -> PResult<StmtId> {
        self.advance();
        self.expect(TokenKind::PAREN_BEGIN, "'('")?;
        let scope = self.push_scope();

        let init = if self.at(TokenKind::SEMICOLON) {
            None
        } else if self.at_type_start() {
            let (base, _) = self.parse_type_specifier()?;
            let (name, ty) = self.parse_declarator(base)?;
            Some(self.parse_define_tail(name, ty, Environment::Var, StorageClass::Local)?)
        } else {
            let expr = self.parse_expression()?;
            Some(self.ast.statements.alloc(Statement::Expression(ExpressionStatement { expression: expr })))
        };
        self.expect(TokenKind::SEMICOLON, "';'")?;

        let boolean = if self.at(TokenKind::SEMICOLON) { None } else { Some(self.parse_expression()?) };
        self.expect(TokenKind::SEMICOLON, "';'")?;

        let step = if self.at(TokenKind::PAREN_END) { None } else { Some(self.parse_expression()?) };
        self.expect(TokenKind::PAREN_END, "')'")?;

        self.loop_depth += 1;
        let body = self.parse_statement()?;
        self.loop_depth -= 1;
        self.pop_scope();

        let for_stmt = self.ast.statements.alloc(Statement::For(For { init, boolean, step, body }));
        Ok(self.ast.statements.alloc(Statement::Scope(ScopeStmt { scope, body: vec![for_stmt] })))
    }

    fn parse_return(&mut self) -> PResult<StmtId> {
        let tok = self.advance();
        let function = self.current_function().ok_or_else(|| {
            CompileError::parse("'return' outside of a function", tok.span)
        })?;
        let expression = if self.at(TokenKind::SEMICOLON) {
            None
        } else {
            let expr = self.parse_expression()?;
            let expr_ty = self.ast.expressions.expr_type(expr).clone();
            let Object::Function(f) = self.ast.object(function) else { unreachable!() };
            let ret_ty = f.return_type.clone();
            if cast(&expr_ty, &ret_ty).is_error() {
                return Err(CompileError::ty(format!("cannot return '{expr_ty}' from function returning '{ret_ty}'"), tok.span));
            }
            Some(expr)
        };
        self.expect(TokenKind::SEMICOLON, "';'")?;
        Ok(self.ast.statements.alloc(Statement::Return(Return { function, expression })))
    }

    fn parse_jump(&mut self) -> PResult<StmtId> {
        let tok = self.advance();
        if self.loop_depth == 0 {
            return Err(CompileError::parse(format!("'{}' outside of a loop", tok.text), tok.span));
        }
        let kind = if tok.kind == TokenKind::KW_BREAK { JumpKind::Break } else { JumpKind::Continue };
        self.expect(TokenKind::SEMICOLON, "';'")?;
        Ok(self.ast.statements.alloc(Statement::Jump(Jump { kind, token: tok })))
    }

    // ---- expressions -------------------------------------------------
    //
    // Precedence, lowest to highest:
    //   comma , -> assignment (right-assoc, incl. compound ops) -> ternary ?:
    //   -> || -> && -> | -> ^ -> & -> == != -> < <= > >= -> << >> -> + -
    //   -> * / % -> unary -> postfix -> primary

    fn parse_expression(&mut self) -> PResult<ExprId> {
        let mut lhs = self.parse_assignment()?;
        while self.at(TokenKind::COMMA) {
            self.advance();
            let rhs = self.parse_assignment()?;
            lhs = self.ast.expressions.alloc(Expression::Comma(Comma { lhs, rhs }));
        }
        Ok(lhs)
    }

    fn parse_assignment(&mut self) -> PResult<ExprId> {
        let lhs = self.parse_ternary()?;

        if self.at(TokenKind::ASSIGN_OPS) {
            let op = self.advance();
            if !self.ast.expressions.is_lvalue(lhs) {
                return Err(CompileError::ty("left-hand side of assignment is not assignable", op.span));
            }
            let rhs = self.parse_assignment()?;
            let lty = self.ast.expressions.expr_type(lhs).clone();
            let rty = self.ast.expressions.expr_type(rhs).clone();

            let effective_rhs = if op.kind == TokenKind::ASSIGN {
                rhs
            } else {
                let bin_op_kind = match op.kind {
                    TokenKind::ADD_ASSIGN => TokenKind::PLUS,
                    TokenKind::SUB_ASSIGN => TokenKind::MINUS,
                    TokenKind::MUL_ASSIGN => TokenKind::STAR,
                    TokenKind::DIV_ASSIGN => TokenKind::SLASH,
                    TokenKind::MOD_ASSIGN => TokenKind::PERCENT,
                    TokenKind::SHL_ASSIGN => TokenKind::SHL,
                    TokenKind::SHR_ASSIGN => TokenKind::SHR,
                    TokenKind::AND_ASSIGN => TokenKind::AMPERSAND,
                    TokenKind::XOR_ASSIGN => TokenKind::CARET,
                    TokenKind::OR_ASSIGN => TokenKind::PIPE,
                    _ => unreachable!(),
                };
                let bin_tok = self.synth(bin_op_kind, &op.text, op.span);
                self.make_binary(bin_tok, lhs, rhs)?
            };

            let _ = rty;
            let final_rty = self.ast.expressions.expr_type(effective_rhs).clone();
            if cast(&final_rty, &lty).is_error() {
                return Err(CompileError::ty(format!("cannot assign '{final_rty}' to '{lty}'"), op.span));
            }

            return Ok(self.ast.expressions.alloc(Expression::Assign(Assign { lhs, rhs: effective_rhs, ty: lty })));
        }

        Ok(lhs)
    }

    fn parse_ternary(&mut self) -> PResult<ExprId> {
        let condition = self.parse_binary(0)?;
        if self.at(TokenKind::QUERY) {
            self.advance();
            let if_true = self.parse_assignment()?;
            self.expect(TokenKind::COLON, "':'")?;
            let if_false = self.parse_assignment()?;
            let tty = self.ast.expressions.expr_type(if_true).clone();
            let fty = self.ast.expressions.expr_type(if_false).clone();
            let ty = if cast(&fty, &tty).is_error() { tty.clone() } else { usual_arith_type(&tty, &fty) };
            return Ok(self.ast.expressions.alloc(Expression::Ternary(Ternary { condition, if_true, if_false, ty })));
        }
        Ok(condition)
    }

    fn binding_power(kind: TokenKind) -> Option<(u8, u8)> {
        let p = match kind {
            TokenKind::OR_OR => 1,
            TokenKind::AND_AND => 2,
            TokenKind::PIPE => 3,
            TokenKind::CARET => 4,
            TokenKind::AMPERSAND => 5,
            TokenKind::EQ_EQ | TokenKind::NOT_EQ => 6,
            TokenKind::LESS | TokenKind::LESS_EQ | TokenKind::GREATER | TokenKind::GREATER_EQ => 7,
            TokenKind::SHL | TokenKind::SHR => 8,
            TokenKind::PLUS | TokenKind::MINUS => 9,
            TokenKind::STAR | TokenKind::SLASH | TokenKind::PERCENT => 10,
            _ => return None,
        };
        Some((p, p + 1))
    }

    fn parse_binary(&mut self, min_bp: u8) -> PResult<ExprId> {
        let mut lhs = self.parse_unary()?;
        loop {
            let tok = self.peek().clone();
            let Some((lbp, rbp)) = Self::binding_power(tok.kind) else { break };
            if lbp < min_bp {
                break;
            }
            self.advance();
            let rhs = self.parse_binary(rbp)?;
            lhs = self.make_binary(tok, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn make_binary(&mut self, op: Token, lhs: ExprId, rhs: ExprId) -> PResult<ExprId> {
        let lty = self.ast.expressions.expr_type(lhs).clone();
        let rty = self.ast.expressions.expr_type(rhs).clone();

        let is_additive = matches!(op.kind, TokenKind::PLUS | TokenKind::MINUS);
        let is_comparison = op.is(
            TokenKind::EQ_EQ | TokenKind::NOT_EQ | TokenKind::LESS | TokenKind::LESS_EQ | TokenKind::GREATER | TokenKind::GREATER_EQ,
        );
        let is_logical = op.is(TokenKind::AND_AND | TokenKind::OR_OR);

        let lptr = matches!(lty.kind, TypeKind::Pointer | TypeKind::Array);
        let rptr = matches!(rty.kind, TypeKind::Pointer | TypeKind::Array);

        let ty = if is_additive && (lptr || rptr) {
            if lptr && rptr && op.kind == TokenKind::MINUS {
                Type::scalar(TypeKind::Int, Modifiers::LONG)
            } else if lptr {
                lty.decayed()
            } else {
                rty.decayed()
            }
        } else if is_comparison || is_logical {
            Type::scalar(TypeKind::Int, Modifiers::empty())
        } else {
            if !lty.kind.is_scalar() || !rty.kind.is_scalar() {
                return Err(CompileError::ty(format!("invalid operands to '{}': '{lty}' and '{rty}'", op.text), op.span));
            }
            usual_arith_type(&lty, &rty)
        };

        Ok(self.ast.expressions.alloc(Expression::Binary(Binary { op, lhs, rhs, ty })))
    }

    fn parse_unary(&mut self) -> PResult<ExprId> {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::PLUS => {
                self.advance();
                self.parse_unary()
            }
            TokenKind::MINUS | TokenKind::BANG | TokenKind::TILDE => {
                self.advance();
                let operand = self.parse_unary()?;
                let ty = self.ast.expressions.expr_type(operand).clone();
                let ty = if tok.kind == TokenKind::BANG { Type::scalar(TypeKind::Int, Modifiers::empty()) } else { ty };
                Ok(self.ast.expressions.alloc(Expression::Unary(Unary { op: tok, order: Order::Rhs, operand, ty })))
            }
            TokenKind::INCREMENT | TokenKind::DECREMENT => {
                self.advance();
                let operand = self.parse_unary()?;
                if !self.ast.expressions.is_lvalue(operand) {
                    return Err(CompileError::ty("operand of prefix increment/decrement must be assignable", tok.span));
                }
                let ty = self.ast.expressions.expr_type(operand).clone();
                Ok(self.ast.expressions.alloc(Expression::Unary(Unary { op: tok, order: Order::Rhs, operand, ty })))
            }
            TokenKind::STAR => {
                self.advance();
                let operand = self.parse_unary()?;
                let operand_ty = self.ast.expressions.expr_type(operand).clone();
                let ty = operand_ty
                    .pointee()
                    .cloned()
                    .ok_or_else(|| CompileError::ty(format!("cannot dereference '{operand_ty}'"), tok.span))?;
                Ok(self.ast.expressions.alloc(Expression::Deref(Deref { operand, ty })))
            }
            TokenKind::AMPERSAND => {
                self.advance();
                let operand = self.parse_unary()?;
                if !self.ast.expressions.is_lvalue(operand) {
                    return Err(CompileError::ty("cannot take the address of this expression", tok.span));
                }
                let operand_ty = self.ast.expressions.expr_type(operand).clone();
                let ty = Type::pointer_to(operand_ty);
                Ok(self.ast.expressions.alloc(Expression::Address(Address { operand, ty })))
            }
            TokenKind::KW_SIZEOF => {
                self.advance();
                let size = if self.at(TokenKind::PAREN_BEGIN) && self.at_type_start_after_paren() {
                    self.advance();
                    let (base, _) = self.parse_type_specifier()?;
                    let mut ty = base;
                    while self.at(TokenKind::STAR) {
                        self.advance();
                        ty = Type::pointer_to(ty);
                    }
                    self.expect(TokenKind::PAREN_END, "')'")?;
                    ty.size
                } else {
                    let operand = self.parse_unary()?;
                    self.ast.expressions.expr_type(operand).size
                };
                Ok(self.ast.expressions.alloc(Expression::Int(Int {
                    value: size as i64,
                    flags: IntFlags { unsigned: true, long: true, long_long: false },
                    ty: Type::scalar(TypeKind::Int, Modifiers::UNSIGNED | Modifiers::LONG),
                })))
            }
            TokenKind::PAREN_BEGIN if self.at_cast_ahead() => {
                self.advance();
                let (base, _) = self.parse_type_specifier()?;
                let mut into = base;
                while self.at(TokenKind::STAR) {
                    self.advance();
                    into = Type::pointer_to(into);
                }
                self.expect(TokenKind::PAREN_END, "')'")?;
                let operand = self.parse_unary()?;
                let from = self.ast.expressions.expr_type(operand).clone();
                Ok(self.ast.expressions.alloc(Expression::Cast(Cast { operand, from, into })))
            }
            _ => self.parse_postfix(),
        }
    }

    fn at_type_start_after_paren(&self) -> bool {
        let tok = self.peek_at(1);
        if tok.is(TokenKind::FUNDAMENTAL | TokenKind::RECORD_KEYWORD | TokenKind::CVR | TokenKind::SIGNEDNESS | TokenKind::SIZE_MODIFIER) {
            return true;
        }
        if tok.kind == TokenKind::ID {
            return self.lookup_typedef(&tok.text).is_some();
        }
        false
    }

    fn at_cast_ahead(&self) -> bool {
        self.at_type_start_after_paren()
    }

    fn parse_postfix(&mut self) -> PResult<ExprId> {
        let mut expr = self.parse_primary()?;
        loop {
            let tok = self.peek().clone();
            match tok.kind {
                TokenKind::CROCHET_BEGIN => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(TokenKind::CROCHET_END, "']'")?;
                    let plus_tok = self.synth(TokenKind::PLUS, "+", tok.span);
                    let sum = self.make_binary(plus_tok, expr, index)?;
                    let sum_ty = self.ast.expressions.expr_type(sum).clone();
                    let ty = sum_ty
                        .pointee()
                        .cloned()
                        .ok_or_else(|| CompileError::ty("subscripted value is not an array or pointer", tok.span))?;
                    expr = self.ast.expressions.alloc(Expression::Deref(Deref { operand: sum, ty }));
                }
                TokenKind::PAREN_BEGIN => {
                    expr = self.parse_call(expr, tok)?;
                }
                TokenKind::DOT => {
                    self.advance();
                    let member_tok = self.expect(TokenKind::ID, "a member name")?;
                    expr = self.make_dot(expr, member_tok, tok.span)?;
                }
                TokenKind::ARROW => {
                    self.advance();
                    let member_tok = self.expect(TokenKind::ID, "a member name")?;
                    let operand_ty = self.ast.expressions.expr_type(expr).clone();
                    let pointee = operand_ty
                        .pointee()
                        .cloned()
                        .ok_or_else(|| CompileError::ty(format!("cannot use '->' on '{operand_ty}'"), tok.span))?;
                    let deref = self.ast.expressions.alloc(Expression::Deref(Deref { operand: expr, ty: pointee }));
                    expr = self.make_dot(deref, member_tok, tok.span)?;
                }
                TokenKind::INCREMENT | TokenKind::DECREMENT => {
                    self.advance();
                    if !self.ast.expressions.is_lvalue(expr) {
                        return Err(CompileError::ty("operand of postfix increment/decrement must be assignable", tok.span));
                    }
                    let ty = self.ast.expressions.expr_type(expr).clone();
                    expr = self.ast.expressions.alloc(Expression::Unary(Unary { op: tok, order: Order::Lhs, operand: expr, ty }));
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn make_dot(&mut self, operand: ExprId, member_tok: Token, span: Span) -> PResult<ExprId> {
        let operand_ty = self.ast.expressions.expr_type(operand).clone();
        let scope_id = match &operand_ty.payload {
            TypePayload::Record(s) => *s,
            _ => return Err(CompileError::ty(format!("'{operand_ty}' is not a struct or union"), span)),
        };
        let member_id = self
            .ast
            .scopes
            .get(scope_id)
            .local_object(&member_tok.text)
            .ok_or_else(|| CompileError::ty(format!("no member named '{}'", member_tok.text), member_tok.span))?;
        let Object::Variable(member) = self.ast.object(member_id) else { unreachable!() };
        let ty = member.ty.clone();
        Ok(self.ast.expressions.alloc(Expression::Dot(Dot { operand, member: member_id, ty })))
    }

    fn parse_call(&mut self, callee: ExprId, paren: Token) -> PResult<ExprId> {
        let Expression::Id(Id { object, token, .. }) = self.ast.expressions.get(callee).clone() else {
            return Err(CompileError::parse("expression is not callable", paren.span));
        };
        self.advance(); // '('

        let Object::Function(f) = self.ast.object(object) else {
            return Err(CompileError::ty(format!("'{}' is not a function", token.text), token.span));
        };
        let param_types = f.params.clone();
        let return_type = f.return_type.clone();

        let mut args = Vec::new();
        if !self.at(TokenKind::PAREN_END) {
            loop {
                args.push(self.parse_assignment()?);
                if self.at(TokenKind::COMMA) {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        let close = self.expect(TokenKind::PAREN_END, "')'")?;

        if args.len() != param_types.len() {
            return Err(CompileError::ty(
                format!("'{}' expects {} argument(s), found {}", token.text, param_types.len(), args.len()),
                close.span,
            ));
        }

        let mut argument_chain: Option<Argument> = None;
        for (value, param) in args.iter().rev().zip(param_types.iter().rev()) {
            let vty = self.ast.expressions.expr_type(*value).clone();
            let Object::Variable(pvar) = self.ast.object(*param) else { unreachable!() };
            let pty = pvar.ty.clone();
            if cast(&vty, &pty).is_error() {
                return Err(CompileError::ty(format!("cannot pass '{vty}' as '{pty}'"), close.span));
            }
            argument_chain = Some(Argument { value: *value, param: *param, next: argument_chain.map(Box::new) });
        }

        Ok(self.ast.expressions.alloc(Expression::Invoke(Invoke {
            function: object,
            callee_token: token,
            arguments: argument_chain,
            arg_count: args.len(),
            use_time: 0,
            ty: return_type,
        })))
    }

    fn parse_primary(&mut self) -> PResult<ExprId> {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::PAREN_BEGIN => {
                self.advance();
                let operand = self.parse_expression()?;
                self.expect(TokenKind::PAREN_END, "')'")?;
                Ok(self.ast.expressions.alloc(Expression::Nested(Nested { operand })))
            }
            TokenKind::ID => {
                self.advance();
                let object = self
                    .ast
                    .scopes
                    .object(self.scope(), &tok.text)
                    .ok_or_else(|| CompileError::ty(format!("unknown identifier '{}'", tok.text), tok.span))?;
                let ty = match self.ast.object(object) {
                    Object::Variable(v) if v.env == Environment::Enum => {
                        Type::scalar(TypeKind::Int, Modifiers::empty())
                    }
                    Object::Variable(v) => v.ty.decayed(),
                    Object::Function(f) => f.return_type.clone(),
                    _ => return Err(CompileError::ty(format!("'{}' does not name a value", tok.text), tok.span)),
                };
                Ok(self.ast.expressions.alloc(Expression::Id(Id { object, token: tok, ty })))
            }
            TokenKind::LIT_INT => {
                self.advance();
                let (value, flags) = parse_int_literal(&tok.text);
                let mods = if flags.unsigned { Modifiers::UNSIGNED } else { Modifiers::empty() }
                    | if flags.long { Modifiers::LONG } else { Modifiers::empty() };
                let ty = Type::scalar(TypeKind::Int, mods);
                Ok(self.ast.expressions.alloc(Expression::Int(Int { value, flags, ty })))
            }
            TokenKind::LIT_FLOAT => {
                self.advance();
                let is_f32 = tok.text.ends_with('f') || tok.text.ends_with('F');
                let trimmed = tok.text.trim_end_matches(['f', 'F', 'l', 'L']);
                let value: f64 = trimmed.parse().map_err(|_| CompileError::lex("invalid float literal", tok.span))?;
                let ty = Type::scalar(if is_f32 { TypeKind::Float } else { TypeKind::Double }, Modifiers::empty());
                Ok(self.ast.expressions.alloc(Expression::Float(Float { value, ty })))
            }
            TokenKind::LIT_STRING => {
                self.advance();
                let unescaped = unescape_literal(&tok.text).map_err(|e| CompileError::lex(e, tok.span))?;
                let mut bytes = unescaped.into_bytes();
                bytes.push(0);
                let len = bytes.len();
                let ty = Type::array_of(Type::scalar(TypeKind::Char, Modifiers::empty()), len).decayed();
                Ok(self.ast.expressions.alloc(Expression::String(Str { value: bytes, label: None, ty })))
            }
            TokenKind::LIT_CHAR => {
                self.advance();
                let unescaped = unescape_literal(&tok.text).map_err(|e| CompileError::lex(e, tok.span))?;
                let value = unescaped.bytes().next().unwrap_or(0) as i64;
                let ty = Type::scalar(TypeKind::Char, Modifiers::empty());
                Ok(self.ast.expressions.alloc(Expression::Int(Int {
                    value,
                    flags: IntFlags { unsigned: false, long: false, long_long: false },
                    ty,
                })))
            }
            _ => Err(CompileError::parse(format!("unexpected token '{}'", tok.text), tok.span)),
        }
    }
}

/// `object()`/`record()` both recurse through [`crate::scope::ScopeArena`];
/// this only selects the usual-arithmetic-conversion result type of a
/// scalar binary operation, per the promotion rules in spec §4.3.
fn usual_arith_type(a: &Type, b: &Type) -> Type {
    use TypeKind::*;
    if a.kind == Double || b.kind == Double {
        return Type::scalar(Double, Modifiers::empty());
    }
    if a.kind == Float || b.kind == Float {
        return Type::scalar(Float, Modifiers::empty());
    }
    let size = a.size.max(b.size).max(4);
    let mut mods = Modifiers::empty();
    if a.mods.contains(Modifiers::UNSIGNED) || b.mods.contains(Modifiers::UNSIGNED) {
        mods |= Modifiers::UNSIGNED;
    }
    if size == 8 {
        mods |= Modifiers::LONG;
    } else if size == 2 {
        mods |= Modifiers::SHORT;
    }
    Type::scalar(Int, mods)
}

fn parse_int_literal(text: &str) -> (i64, IntFlags) {
    let mut body = text;
    let mut unsigned = false;
    let mut long_count = 0;
    while let Some(last) = body.chars().last() {
        match last {
            'u' | 'U' => {
                unsigned = true;
                body = &body[..body.len() - 1];
            }
            'l' | 'L' => {
                long_count += 1;
                body = &body[..body.len() - 1];
            }
            _ => break,
        }
    }
    let value = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).unwrap_or(0)
    } else if let Some(bin) = body.strip_prefix("0b").or_else(|| body.strip_prefix("0B")) {
        i64::from_str_radix(bin, 2).unwrap_or(0)
    } else {
        body.parse().unwrap_or(0)
    };
    (value, IntFlags { unsigned, long: long_count >= 1, long_long: long_count >= 2 })
}

/// Pure constant folder used for array bounds, enumerator values, and
/// initializer validation. Returns `None` when the subtree is not a
/// compile-time constant.
pub fn fold_const(ast: &Ast, id: ExprId) -> Option<i64> {
    match ast.expressions.get(id) {
        Expression::Int(i) => Some(i.value),
        Expression::Nested(n) => fold_const(ast, n.operand),
        Expression::Unary(u) => {
            let v = fold_const(ast, u.operand)?;
            Some(match u.op.kind {
                TokenKind::MINUS => -v,
                TokenKind::BANG => (v == 0) as i64,
                TokenKind::TILDE => !v,
                _ => return None,
            })
        }
        Expression::Binary(b) => {
            let l = fold_const(ast, b.lhs)?;
            let r = fold_const(ast, b.rhs)?;
            Some(match b.op.kind {
                TokenKind::PLUS => l + r,
                TokenKind::MINUS => l - r,
                TokenKind::STAR => l * r,
                TokenKind::SLASH if r != 0 => l / r,
                TokenKind::PERCENT if r != 0 => l % r,
                TokenKind::PIPE => l | r,
                TokenKind::CARET => l ^ r,
                TokenKind::AMPERSAND => l & r,
                TokenKind::SHL => l << r,
                TokenKind::SHR => l >> r,
                TokenKind::EQ_EQ => (l == r) as i64,
                TokenKind::NOT_EQ => (l != r) as i64,
                TokenKind::LESS => (l < r) as i64,
                TokenKind::LESS_EQ => (l <= r) as i64,
                TokenKind::GREATER => (l > r) as i64,
                TokenKind::GREATER_EQ => (l >= r) as i64,
                TokenKind::AND_AND => ((l != 0) && (r != 0)) as i64,
                TokenKind::OR_OR => ((l != 0) || (r != 0)) as i64,
                _ => return None,
            })
        }
        Expression::Ternary(t) => {
            let c = fold_const(ast, t.condition)?;
            if c != 0 { fold_const(ast, t.if_true) } else { fold_const(ast, t.if_false) }
        }
        Expression::Cast(c) if c.into.kind.is_gpr_class() => fold_const(ast, c.operand),
        Expression::Id(id_expr) => match ast.object(id_expr.object) {
            Object::Variable(v) => v.const_value,
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_main() {
        let ast = parse("int main() { return 0; }").expect("parse");
        assert_eq!(ast.top_level.len(), 1);
    }

    #[test]
    fn rejects_unbalanced_braces() {
        let err = parse("int main() { return 0; ").unwrap_err();
        assert_eq!(err.category, crate::error::ErrorCategory::Parse);
    }

    #[test]
    fn pointer_arithmetic_type_is_pointer() {
        let ast = parse("int f(int *p) { return *(p + 1); }").expect("parse");
        assert_eq!(ast.top_level.len(), 1);
    }

    #[test]
    fn detects_duplicate_signedness() {
        let err = parse("int main() { signed unsigned int x; return 0; }").unwrap_err();
        assert_eq!(err.category, crate::error::ErrorCategory::Type);
    }

    #[test]
    fn constant_folds_enum_values() {
        let ast = parse("enum Color { RED, GREEN, BLUE = 5, YELLOW };\nint main() { return 0; }").expect("parse");
        assert_eq!(ast.top_level.len(), 2);
    }
}
