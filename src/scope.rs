//! Symbol table: nested `Scope`s holding name -> object and name -> record
//! maps, plus the arena-backed `Object` model (`Function`, `Variable`,
//! `Typedef`, `Record`).

use std::collections::HashMap;

use crate::token::Token;
use crate::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ScopeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Struct,
    Union,
    Enum,
}

/// Where a variable's value lives once the lifetime allocator runs.
/// `None` before allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Source {
    #[default]
    None,
    /// Signed offset from the frame base (`rbp`); negative for locals,
    /// positive for parameters.
    Stack(i64),
    Gpr(usize),
    Fpr(usize),
    Data(usize),
    /// Offset of a member within its enclosing aggregate.
    Member(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Parameter,
    Var,
    Enum,
    Struct,
    Union,
}

#[derive(Debug, Clone)]
pub struct Variable {
    pub name: Token,
    pub ty: Type,
    /// Present for enumerators: the constant value assigned during
    /// constant folding of the enum body.
    pub const_value: Option<i64>,
    pub source: Source,
    /// Offset within the enclosing struct/union, when `env` is
    /// `Struct`/`Union`.
    pub member_offset: usize,
    pub env: Environment,
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: Token,
    pub return_type: Type,
    pub params: Vec<ObjectId>,
    pub locals: Vec<ObjectId>,
    pub stack_size: usize,
    pub invoke_size: usize,
    pub is_main: bool,
    pub is_defined: bool,
}

#[derive(Debug, Clone)]
pub struct Typedef {
    pub name: Token,
    pub aliased: Type,
}

#[derive(Debug, Clone)]
pub struct Record {
    pub name: Token,
    pub kind: RecordKind,
    pub introduced: Type,
    pub members_scope: ScopeId,
    pub complete: bool,
}

#[derive(Debug, Clone)]
pub enum Object {
    Function(Function),
    Variable(Variable),
    Typedef(Typedef),
    Record(Record),
}

impl Object {
    pub fn name_token(&self) -> &Token {
        match self {
            Object::Function(f) => &f.name,
            Object::Variable(v) => &v.name,
            Object::Typedef(t) => &t.name,
            Object::Record(r) => &r.name,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Object::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_function_mut(&mut self) -> Option<&mut Function> {
        match self {
            Object::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            Object::Variable(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_variable_mut(&mut self) -> Option<&mut Variable> {
        match self {
            Object::Variable(v) => Some(v),
            _ => None,
        }
    }
}

/// Arena owning every `Object` allocated during parsing. Indices (`ObjectId`)
/// are the only way other AST nodes refer to objects, which keeps the
/// ownership graph acyclic: everything points "up" or "across" via an
/// index, never via an owning reference.
#[derive(Debug, Clone, Default)]
pub struct ObjectArena {
    objects: Vec<Object>,
}

impl ObjectArena {
    pub fn alloc(&mut self, object: Object) -> ObjectId {
        self.objects.push(object);
        ObjectId(self.objects.len() - 1)
    }

    pub fn get(&self, id: ObjectId) -> &Object {
        &self.objects[id.0]
    }

    pub fn get_mut(&mut self, id: ObjectId) -> &mut Object {
        &mut self.objects[id.0]
    }
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub owner: Option<ScopeId>,
    objects: HashMap<String, ObjectId>,
    records: HashMap<(RecordKind, String), ObjectId>,
}

impl Scope {
    pub fn new(owner: Option<ScopeId>) -> Self {
        Scope {
            owner,
            objects: HashMap::new(),
            records: HashMap::new(),
        }
    }

    pub fn insert_object(&mut self, name: impl Into<String>, id: ObjectId) -> bool {
        let name = name.into();
        if self.objects.contains_key(&name) {
            return false;
        }
        self.objects.insert(name, id);
        true
    }

    pub fn insert_record(&mut self, kind: RecordKind, name: impl Into<String>, id: ObjectId) -> bool {
        let key = (kind, name.into());
        if self.records.contains_key(&key) {
            return false;
        }
        self.records.insert(key, id);
        true
    }

    pub fn local_object(&self, name: &str) -> Option<ObjectId> {
        self.objects.get(name).copied()
    }

    pub fn local_record(&self, kind: RecordKind, name: &str) -> Option<ObjectId> {
        self.records.get(&(kind, name.to_string())).copied()
    }
}

/// Arena of `Scope`s. Lookups walk from a scope to its owner until the
/// chain is exhausted.
#[derive(Debug, Clone, Default)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
}

impl ScopeArena {
    pub fn alloc(&mut self, owner: Option<ScopeId>) -> ScopeId {
        self.scopes.push(Scope::new(owner));
        ScopeId(self.scopes.len() - 1)
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    pub fn get_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.0]
    }

    /// `object(name)`: search `scope`, then delegate to its owner.
    pub fn object(&self, scope: ScopeId, name: &str) -> Option<ObjectId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = self.get(id);
            if let Some(obj) = s.local_object(name) {
                return Some(obj);
            }
            current = s.owner;
        }
        None
    }

    /// `record(kind, name)`: as `object`, but also requires the existing
    /// record's kind to match.
    pub fn record(&self, scope: ScopeId, kind: RecordKind, name: &str) -> Option<ObjectId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = self.get(id);
            if let Some(obj) = s.local_record(kind, name) {
                return Some(obj);
            }
            current = s.owner;
        }
        None
    }
}
