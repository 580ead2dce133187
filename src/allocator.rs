//! Lifetime-based storage allocation for local variables.
//!
//! Three phases, run once per function right before code generation:
//!
//! 1. **Use-range collection** — walk the function body assigning each
//!    expression a use-time tick and recording, per local, the tick range
//!    over which it is live. Calls are stamped with their own use-time so
//!    the emitter knows which registers are live (and must be spilled)
//!    across them.
//! 2. **Storage assignment** — sweep locals by first use, handing out GPR
//!    or FPR slots from a fixed pool while a variable's range is active,
//!    falling back to a stack slot once the pool is exhausted or the
//!    variable's address is taken (address-taken locals can never live in
//!    a register).
//! 3. **Frame layout** — lay out every stack-resident object (parameters,
//!    which are always copied out of their argument register at entry, and
//!    spilled locals) at an aligned, negative offset from `rbp`.

use std::collections::HashMap;

use crate::ast::{Ast, ExprId, StmtId};
use crate::ast::expression::{Argument, Expression};
use crate::ast::statement::Statement;
use crate::scope::{Environment, Object, ObjectId, Source};
use crate::types::align_up;

pub const GPR_POOL_SIZE: usize = 7;
pub const FPR_POOL_SIZE: usize = 7;

#[derive(Debug, Clone, Copy, Default)]
struct UseRange {
    first: usize,
    last: usize,
}

struct Collector<'a> {
    ast: &'a Ast,
    locals: &'a [ObjectId],
    tick: usize,
    ranges: HashMap<ObjectId, UseRange>,
    address_taken: std::collections::HashSet<ObjectId>,
    invoke_times: HashMap<ExprId, usize>,
}

impl<'a> Collector<'a> {
    fn touch(&mut self, object: ObjectId) {
        if !self.locals.contains(&object) {
            return;
        }
        let entry = self.ranges.entry(object).or_insert(UseRange { first: self.tick, last: self.tick });
        entry.last = self.tick;
    }

    fn walk_stmt(&mut self, id: StmtId) {
        match self.ast.statements.get(id).clone() {
            Statement::Scope(s) => {
                for child in s.body {
                    self.walk_stmt(child);
                }
            }
            Statement::Function(_) | Statement::Struct(_) | Statement::Record(_) => {}
            Statement::Define(mut define) => loop {
                if let Some(init) = define.initializer {
                    self.walk_expr(init);
                }
                self.touch(define.variable);
                match define.next {
                    Some(next) => define = *next,
                    None => break,
                }
            },
            Statement::Expression(e) => self.walk_expr(e.expression),
            Statement::Condition(c) => {
                self.walk_expr(c.boolean);
                self.walk_stmt(c.then_scope);
                if let Some(e) = c.else_scope {
                    self.walk_stmt(e);
                }
            }
            Statement::While(w) => {
                self.walk_expr(w.boolean);
                self.walk_stmt(w.body);
            }
            Statement::For(f) => {
                if let Some(init) = f.init {
                    self.walk_stmt(init);
                }
                if let Some(b) = f.boolean {
                    self.walk_expr(b);
                }
                self.walk_stmt(f.body);
                if let Some(s) = f.step {
                    self.walk_expr(s);
                }
            }
            Statement::Return(r) => {
                if let Some(e) = r.expression {
                    self.walk_expr(e);
                }
            }
            Statement::Jump(_) => {}
        }
    }

    fn walk_expr(&mut self, id: ExprId) {
        self.tick += 1;
        match self.ast.expressions.get(id).clone() {
            Expression::Unary(u) => self.walk_expr(u.operand),
            Expression::Binary(b) => {
                self.walk_expr(b.lhs);
                self.walk_expr(b.rhs);
            }
            Expression::Ternary(t) => {
                self.walk_expr(t.condition);
                self.walk_expr(t.if_true);
                self.walk_expr(t.if_false);
            }
            Expression::Invoke(inv) => {
                let mut arg = inv.arguments;
                while let Some(Argument { value, next, .. }) = arg {
                    self.walk_expr(value);
                    arg = next.map(|b| *b);
                }
                self.invoke_times.insert(id, self.tick);
            }
            Expression::Comma(c) => {
                self.walk_expr(c.lhs);
                self.walk_expr(c.rhs);
            }
            Expression::Nested(n) => self.walk_expr(n.operand),
            Expression::Id(i) => self.touch(i.object),
            Expression::Ref(r) => self.touch(r.object),
            Expression::Assign(a) => {
                self.walk_expr(a.rhs);
                self.walk_expr(a.lhs);
            }
            Expression::Cast(c) => self.walk_expr(c.operand),
            Expression::Dot(d) => self.walk_expr(d.operand),
            Expression::Deref(d) => self.walk_expr(d.operand),
            Expression::Address(a) => {
                if let Expression::Id(inner) = self.ast.expressions.get(a.operand) {
                    self.address_taken.insert(inner.object);
                }
                self.walk_expr(a.operand);
            }
            Expression::String(_) | Expression::Int(_) | Expression::Float(_) => {}
        }
    }
}

#[derive(Debug, Default)]
pub struct FrameLayout {
    pub stack_size: usize,
}

/// Allocates storage for every parameter and local of `function`, mutating
/// their `Variable::source` in place, and records the stack/call metadata
/// needed by the emitter.
pub fn allocate_function(ast: &mut Ast, function: ObjectId, body: StmtId) -> FrameLayout {
    let (params, locals) = {
        let Object::Function(f) = ast.object(function) else { panic!("allocate_function on non-function") };
        (f.params.clone(), f.locals.clone())
    };

    let gpr_locals: Vec<ObjectId> = locals
        .iter()
        .copied()
        .filter(|id| {
            let Object::Variable(v) = ast.object(*id) else { return false };
            v.ty.kind.is_gpr_class()
        })
        .collect();
    let fpr_locals: Vec<ObjectId> = locals
        .iter()
        .copied()
        .filter(|id| {
            let Object::Variable(v) = ast.object(*id) else { return false };
            v.ty.kind.is_fpr_class()
        })
        .collect();

    let mut collector = Collector {
        ast,
        locals: &locals,
        tick: 0,
        ranges: HashMap::new(),
        address_taken: Default::default(),
        invoke_times: HashMap::new(),
    };
    collector.walk_stmt(body);
    let ranges = collector.ranges;
    let address_taken = collector.address_taken;
    let invoke_times = collector.invoke_times;

    for (expr_id, time) in invoke_times {
        if let Expression::Invoke(inv) = ast.expressions.get_mut(expr_id) {
            inv.use_time = time;
        }
    }

    assign_register_class(ast, &gpr_locals, &ranges, &address_taken, GPR_POOL_SIZE, Source::Gpr);
    assign_register_class(ast, &fpr_locals, &ranges, &address_taken, FPR_POOL_SIZE, Source::Fpr);

    // Parameters live above the saved return address and saved frame
    // pointer, at positive offsets starting at +16, in declaration order.
    // Every slot is rounded up to 8 bytes since `push` always moves a full
    // 8-byte word regardless of the argument's logical width; `invoke_size`
    // is the total size of the slots the caller must reserve, consumed by
    // the emitter's `add rsp, invoke_size` cleanup after a call.
    let mut param_offset: usize = 0;
    for id in &params {
        let size = { let Object::Variable(v) = ast.object(*id) else { continue }; align_up(v.ty.size.max(1), 8) };
        if let Object::Variable(v) = ast.objects.get_mut(*id) {
            v.source = Source::Stack((param_offset + 16) as i64);
        }
        param_offset += size;
    }
    if let Object::Function(f) = ast.objects.get_mut(function) {
        f.invoke_size = param_offset;
    }

    let mut offset: usize = 0;
    for id in &locals {
        let needs_stack = matches!(ast.object(*id), Object::Variable(v) if matches!(v.source, Source::None));
        if !needs_stack {
            continue;
        }
        let size = { let Object::Variable(v) = ast.object(*id) else { continue }; v.ty.size.max(1) };
        offset = align_up(offset, size.min(8)) + size;
        if let Object::Variable(v) = ast.objects.get_mut(*id) {
            v.source = Source::Stack(-(offset as i64));
        }
    }

    let stack_size = align_up(offset, 16);
    if let Object::Function(f) = ast.objects.get_mut(function) {
        f.stack_size = stack_size;
    }

    FrameLayout { stack_size }
}

fn assign_register_class(
    ast: &mut Ast,
    candidates: &[ObjectId],
    ranges: &HashMap<ObjectId, UseRange>,
    address_taken: &std::collections::HashSet<ObjectId>,
    pool_size: usize,
    make_source: fn(usize) -> Source,
) {
    let mut ordered: Vec<ObjectId> = candidates
        .iter()
        .copied()
        .filter(|id| ranges.contains_key(id))
        .collect();
    ordered.sort_by_key(|id| ranges[id].first);

    let mut pool_free_at: Vec<usize> = vec![0; pool_size];

    for id in ordered {
        if address_taken.contains(&id) {
            continue;
        }
        let range = ranges[&id];
        let slot = pool_free_at.iter().position(|&free_tick| free_tick <= range.first);
        match slot {
            Some(slot) => {
                pool_free_at[slot] = range.last + 1;
                if let Object::Variable(v) = ast.objects.get_mut(id) {
                    v.source = make_source(slot);
                }
            }
            None => {
                // Pool exhausted; left as `Source::None` so the frame-layout
                // pass below spills it to the stack.
            }
        }
    }
}

/// Enumerates every `(use_time, ObjectId)` pair at which a GPR-resident
/// local is alive across the given call, so the emitter knows what to save
/// and restore around it. Grounded directly in the allocator's own ranges
/// rather than re-walking the AST.
pub fn live_gprs_across_call(ast: &Ast, locals: &[ObjectId]) -> Vec<(ObjectId, usize)> {
    locals
        .iter()
        .filter_map(|id| match ast.object(*id) {
            Object::Variable(v) => match v.source {
                Source::Gpr(slot) => Some((*id, slot)),
                _ => None,
            },
            _ => None,
        })
        .collect()
}

/// True when `object` (a parameter or local of the enclosing function)
/// lives in a register rather than on the stack.
pub fn in_register(ast: &Ast, object: ObjectId) -> bool {
    match ast.object(object) {
        Object::Variable(v) => matches!(v.source, Source::Gpr(_) | Source::Fpr(_)),
        _ => false,
    }
}

/// Collects the `ObjectId`s of every local (non-parameter, non-member)
/// variable declared within a function body, in declaration order, for the
/// `Function::locals` field the parser leaves empty.
pub fn collect_locals(ast: &Ast, body: StmtId) -> Vec<ObjectId> {
    let mut out = Vec::new();
    collect_locals_stmt(ast, body, &mut out);
    out
}

fn collect_locals_stmt(ast: &Ast, id: StmtId, out: &mut Vec<ObjectId>) {
    match ast.statements.get(id) {
        Statement::Scope(s) => {
            for &child in &s.body {
                collect_locals_stmt(ast, child, out);
            }
        }
        Statement::Define(define) => {
            let mut current = Some(define);
            while let Some(d) = current {
                if matches!(ast.object(d.variable), Object::Variable(v) if v.env == Environment::Var) {
                    out.push(d.variable);
                }
                current = d.next.as_deref();
            }
        }
        Statement::Condition(c) => {
            collect_locals_stmt(ast, c.then_scope, out);
            if let Some(e) = c.else_scope {
                collect_locals_stmt(ast, e, out);
            }
        }
        Statement::While(w) => collect_locals_stmt(ast, w.body, out),
        Statement::For(f) => {
            if let Some(init) = f.init {
                collect_locals_stmt(ast, init, out);
            }
            collect_locals_stmt(ast, f.body, out);
        }
        _ => {}
    }
}
