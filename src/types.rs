//! Type descriptors: kinds, modifiers, cvr flags, storage classes, and the
//! cast-compatibility rules the parser consults while type-checking.

use std::fmt::{self, Display};

use crate::scope::{ObjectId, ScopeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Char,
    Int,
    Float,
    Double,
    Pointer,
    Array,
    Struct,
    Union,
    Enum,
    FunctionPointer,
    Void,
}

impl TypeKind {
    /// General-purpose-register class: integral and pointer-sized kinds.
    pub fn is_gpr_class(self) -> bool {
        matches!(
            self,
            TypeKind::Char | TypeKind::Int | TypeKind::Pointer | TypeKind::Enum | TypeKind::FunctionPointer
        )
    }

    /// Floating-point-register class.
    pub fn is_fpr_class(self) -> bool {
        matches!(self, TypeKind::Float | TypeKind::Double)
    }

    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            TypeKind::Char | TypeKind::Int | TypeKind::Float | TypeKind::Double | TypeKind::Pointer
        )
    }

    pub fn is_record(self) -> bool {
        matches!(self, TypeKind::Struct | TypeKind::Union | TypeKind::Enum)
    }
}

impl Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeKind::Char => "char",
            TypeKind::Int => "int",
            TypeKind::Float => "float",
            TypeKind::Double => "double",
            TypeKind::Pointer => "pointer",
            TypeKind::Array => "array",
            TypeKind::Struct => "struct",
            TypeKind::Union => "union",
            TypeKind::Enum => "enum",
            TypeKind::FunctionPointer => "function pointer",
            TypeKind::Void => "void",
        };
        f.write_str(name)
    }
}

bitflags::bitflags! {
    /// Modifier and cvr flags. Signed/unsigned and short/long are mutually
    /// exclusive pairs enforced by the parser, not by this type.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u32 {
        const SIGNED    = 1 << 0;
        const UNSIGNED  = 1 << 1;
        const SHORT     = 1 << 2;
        const LONG      = 1 << 3;
        const CONST     = 1 << 4;
        const VOLATILE  = 1 << 5;
        const RESTRICT  = 1 << 6;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StorageClass {
    #[default]
    Local,
    Extern,
    Register,
    Static,
    Auto,
}

/// Payload carried by a type descriptor, selected by `kind`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypePayload {
    None,
    /// Pointer/array pointee, owned by the orphan-type arena.
    Pointee(Box<Type>),
    /// Struct/union: the scope id carrying member layouts.
    Record(ScopeId),
    /// Function pointer: the referenced function's signature.
    Signature(Box<FunctionSignature>),
    /// Enum: the underlying integer type.
    EnumBase(Box<Type>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    pub return_type: Box<Type>,
    pub params: Vec<Type>,
}

/// An immutable-by-convention type descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type {
    pub kind: TypeKind,
    pub size: usize,
    pub mods: Modifiers,
    pub storage: StorageClass,
    pub payload: TypePayload,
    /// Only meaningful for `TypeKind::Array`: element count.
    pub array_len: usize,
    /// Only meaningful for record kinds: the declared name, for diagnostics.
    pub record_name: Option<String>,
    /// Only meaningful for record kinds: which object declared it (for
    /// identity comparisons in `cast`).
    pub record_object: Option<ObjectId>,
}

impl Type {
    pub fn scalar(kind: TypeKind, mods: Modifiers) -> Type {
        Type {
            size: scalar_size(kind, mods),
            kind,
            mods,
            storage: StorageClass::Local,
            payload: TypePayload::None,
            array_len: 0,
            record_name: None,
            record_object: None,
        }
    }

    pub fn void() -> Type {
        Type::scalar(TypeKind::Void, Modifiers::empty())
    }

    pub fn pointer_to(pointee: Type) -> Type {
        Type {
            kind: TypeKind::Pointer,
            size: 8,
            mods: Modifiers::empty(),
            storage: StorageClass::Local,
            payload: TypePayload::Pointee(Box::new(pointee)),
            array_len: 0,
            record_name: None,
            record_object: None,
        }
    }

    pub fn array_of(element: Type, len: usize) -> Type {
        let size = element.size * len;
        Type {
            kind: TypeKind::Array,
            size,
            mods: Modifiers::empty(),
            storage: StorageClass::Local,
            payload: TypePayload::Pointee(Box::new(element)),
            array_len: len,
            record_name: None,
            record_object: None,
        }
    }

    pub fn pointee(&self) -> Option<&Type> {
        match &self.payload {
            TypePayload::Pointee(inner) => Some(inner),
            _ => None,
        }
    }

    /// Decay an array type to a pointer to its element type; identity for
    /// everything else.
    pub fn decayed(&self) -> Type {
        if self.kind == TypeKind::Array {
            Type::pointer_to((*self.pointee().expect("array has element type")).clone())
        } else {
            self.clone()
        }
    }

    pub fn is_void(&self) -> bool {
        self.kind == TypeKind::Void
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mods.contains(Modifiers::UNSIGNED) {
            write!(f, "unsigned ")?;
        }
        if self.mods.contains(Modifiers::SHORT) {
            write!(f, "short ")?;
        }
        if self.mods.contains(Modifiers::LONG) {
            write!(f, "long ")?;
        }
        match &self.payload {
            TypePayload::Pointee(inner) if self.kind == TypeKind::Pointer => {
                write!(f, "{inner} *")
            }
            TypePayload::Pointee(inner) if self.kind == TypeKind::Array => {
                write!(f, "{inner} [{}]", self.array_len)
            }
            _ => write!(f, "{}", self.kind),
        }
    }
}

/// Table-driven size for scalar types. Pointers are always 8 bytes;
/// `int` is 4 unless widened by `long` (8) or narrowed by `short` (2).
pub fn scalar_size(kind: TypeKind, mods: Modifiers) -> usize {
    match kind {
        TypeKind::Char => 1,
        TypeKind::Int => {
            if mods.contains(Modifiers::LONG) {
                8
            } else if mods.contains(Modifiers::SHORT) {
                2
            } else {
                4
            }
        }
        TypeKind::Float => 4,
        TypeKind::Double => 8,
        TypeKind::Pointer | TypeKind::FunctionPointer => 8,
        TypeKind::Void => 0,
        TypeKind::Struct | TypeKind::Union | TypeKind::Enum | TypeKind::Array => 0,
    }
}

bitflags::bitflags! {
    /// Cost/validity classification returned by [`cast`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TypeCast: u32 {
        const SAME        = 1 << 0;
        const INFERRED    = 1 << 1;
        const NARROWED    = 1 << 2;
        const TRANSMUTED  = 1 << 3;
        const ERROR       = 1 << 4;
    }
}

impl TypeCast {
    pub fn is_error(self) -> bool {
        self.contains(TypeCast::ERROR)
    }

    pub fn is_same(self) -> bool {
        self.contains(TypeCast::SAME)
    }
}

/// Classifies converting `from` into `into`. See spec §4.3 for the full
/// rule table; this function mirrors it exactly.
pub fn cast(from: &Type, into: &Type) -> TypeCast {
    use TypeKind::*;

    if from.kind == Void && into.kind == Void {
        return TypeCast::SAME;
    }

    if from.kind == Pointer && into.kind == Pointer {
        let (Some(fp), Some(ip)) = (from.pointee(), into.pointee()) else {
            return TypeCast::SAME;
        };
        // void* is compatible with any pointee.
        if fp.is_void() || ip.is_void() {
            return TypeCast::SAME;
        }
        return cast(fp, ip);
    }

    if from.kind == FunctionPointer && into.kind == FunctionPointer {
        let (TypePayload::Signature(fsig), TypePayload::Signature(isig)) = (&from.payload, &into.payload)
        else {
            return TypeCast::ERROR;
        };
        if fsig.params.len() != isig.params.len() {
            return TypeCast::ERROR;
        }
        let mut worst = cast(&fsig.return_type, &isig.return_type);
        if worst.is_error() {
            return worst;
        }
        for (fp, ip) in fsig.params.iter().zip(isig.params.iter()) {
            let c = cast(fp, ip);
            if c.is_error() {
                return c;
            }
            worst = worst.union(c);
        }
        return worst;
    }

    if from.kind.is_record() && into.kind.is_record() {
        return if from.kind == into.kind && from.record_object == into.record_object && from.record_object.is_some()
        {
            TypeCast::SAME
        } else {
            TypeCast::ERROR
        };
    }

    if from.kind.is_scalar() && into.kind.is_scalar() {
        let from_is_float = matches!(from.kind, Float | Double);
        let into_is_float = matches!(into.kind, Float | Double);
        let from_is_ptr = from.kind == Pointer;
        let into_is_ptr = into.kind == Pointer;

        if (from_is_float && into_is_ptr) || (from_is_ptr && into_is_float) {
            return TypeCast::ERROR;
        }
        if from_is_float != into_is_float {
            return TypeCast::INFERRED;
        }
        if into.size < from.size {
            return TypeCast::NARROWED;
        }
        if from.kind != into.kind && from.size == into.size {
            return TypeCast::TRANSMUTED;
        }
        return TypeCast::SAME;
    }

    TypeCast::ERROR
}

/// Rounds `offset` up to the next multiple of `align`. `align` must be a
/// power of two; callers pass a member/slot's own size (clamped to the
/// machine word), never zero.
pub fn align_up(offset: usize, align: usize) -> usize {
    if align == 0 {
        return offset;
    }
    (offset + align - 1) & !(align - 1)
}

/// Overlays kind/size/payload of `src` into `dest`, union-ing modifier
/// flags. Used when a typedef or struct reference is pulled into a
/// partially-built type declaration.
pub fn merge(dest: &mut Type, src: &Type) {
    dest.kind = src.kind;
    dest.size = src.size;
    dest.payload = src.payload.clone();
    dest.array_len = src.array_len;
    dest.record_name = src.record_name.clone();
    dest.record_object = src.record_object;
    dest.mods |= src.mods;
}
