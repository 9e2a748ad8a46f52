use std::fmt::Write as _;

/// Handle into a [`TypeTable`]. Interning guarantees that two handles are
/// equal exactly when the types they denote are identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Prim {
    U8,
    Int,
    Uint,
    I64,
    U64,
    F64,
    Bool,
    String,
}

impl Prim {
    pub fn parse_named(name: &str) -> Option<Self> {
        match name {
            "u8" => Some(Prim::U8),
            "int" => Some(Prim::Int),
            "uint" => Some(Prim::Uint),
            "i64" => Some(Prim::I64),
            "u64" => Some(Prim::U64),
            "f64" => Some(Prim::F64),
            "bool" => Some(Prim::Bool),
            "string" => Some(Prim::String),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Prim::U8 => "u8",
            Prim::Int => "int",
            Prim::Uint => "uint",
            Prim::I64 => "i64",
            Prim::U64 => "u64",
            Prim::F64 => "f64",
            Prim::Bool => "bool",
            Prim::String => "string",
        }
    }

    /// Rust spelling used in emitted helper signatures.
    pub fn rust_syntax(self) -> &'static str {
        match self {
            Prim::U8 => "u8",
            Prim::Int => "isize",
            Prim::Uint => "usize",
            Prim::I64 => "i64",
            Prim::U64 => "u64",
            Prim::F64 => "f64",
            Prim::Bool => "bool",
            Prim::String => "String",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: TypeId,
    pub public: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSig {
    pub name: String,
    pub public: bool,
    pub params: Vec<Param>,
    pub results: Vec<ResultSlot>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub ty: TypeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSlot {
    pub name: Option<String>,
    pub ty: TypeId,
}

/// A resolved parameter/result tuple, as consumed by the synthesizer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Signature {
    pub params: Vec<Param>,
    pub results: Vec<ResultSlot>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedType {
    pub package: String,
    pub name: String,
    pub underlying: TypeId,
    pub methods: Vec<MethodSig>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    Prim(Prim),
    /// The host error sentinel.
    Error,
    Slice(TypeId),
    Array(u64, TypeId),
    Ptr(TypeId),
    Struct(Vec<Field>),
    Interface(Vec<MethodSig>),
    Named(Box<NamedType>),
}

/// Append-only interning arena. Type identity is not hashable, so lookups
/// that encode a preference order (handler tables) scan ordered lists and
/// compare with [`TypeTable::identical`]; the arena itself dedupes on insert
/// so identity comparison is cheap.
#[derive(Debug, Default)]
pub struct TypeTable {
    kinds: Vec<TypeKind>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, kind: TypeKind) -> TypeId {
        if let Some(pos) = self.kinds.iter().position(|k| *k == kind) {
            return TypeId(pos as u32);
        }
        self.kinds.push(kind);
        TypeId((self.kinds.len() - 1) as u32)
    }

    pub fn intern_prim(&mut self, prim: Prim) -> TypeId {
        self.intern(TypeKind::Prim(prim))
    }

    pub fn kind(&self, id: TypeId) -> &TypeKind {
        &self.kinds[id.0 as usize]
    }

    /// The sole equality used by handler tables and the return renderer.
    pub fn identical(&self, a: TypeId, b: TypeId) -> bool {
        a == b
    }

    /// Named types resolve to their underlying shape; everything else is its
    /// own underlying type.
    pub fn underlying(&self, id: TypeId) -> TypeId {
        match self.kind(id) {
            TypeKind::Named(named) => named.underlying,
            _ => id,
        }
    }

    pub fn method_set(&self, id: TypeId) -> &[MethodSig] {
        match self.kind(id) {
            TypeKind::Named(named) => &named.methods,
            TypeKind::Interface(methods) => methods,
            TypeKind::Ptr(elem) => self.method_set(*elem),
            _ => &[],
        }
    }

    /// Structural interface satisfaction: every method of `iface` must occur
    /// in `t`'s method set with an identical signature. Parameter and
    /// result names play no part in signature identity.
    pub fn implements(&self, t: TypeId, iface: TypeId) -> bool {
        let TypeKind::Interface(want) = self.kind(self.underlying(iface)) else {
            return false;
        };
        let have = self.method_set(t);
        want.iter()
            .all(|m| have.iter().any(|h| h.name == m.name && signatures_identical(h, m)))
    }

    /// Manifest-flavored spelling, for diagnostics.
    pub fn display(&self, id: TypeId) -> String {
        match self.kind(id) {
            TypeKind::Prim(p) => p.name().to_string(),
            TypeKind::Error => "error".to_string(),
            TypeKind::Slice(elem) => format!("[]{}", self.display(*elem)),
            TypeKind::Array(n, elem) => format!("[{n}]{}", self.display(*elem)),
            TypeKind::Ptr(elem) => format!("*{}", self.display(*elem)),
            TypeKind::Struct(fields) => {
                let mut out = String::from("struct{");
                for (i, f) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str("; ");
                    }
                    let _ = write!(out, "{} {}", f.name, self.display(f.ty));
                }
                out.push('}');
                out
            }
            TypeKind::Interface(methods) => {
                let mut out = String::from("interface{");
                for (i, m) in methods.iter().enumerate() {
                    if i > 0 {
                        out.push_str("; ");
                    }
                    out.push_str(&m.name);
                }
                out.push('}');
                out
            }
            TypeKind::Named(named) => {
                if named.package.is_empty() {
                    named.name.clone()
                } else {
                    format!("{}.{}", named.package, named.name)
                }
            }
        }
    }

    /// Rust spelling for an owned value of this type, used in emitted helper
    /// signatures. `pkg_name` maps a package import path to the short name
    /// the emitted program imports it under.
    pub fn rust_syntax(&self, id: TypeId, pkg_name: &dyn Fn(&str) -> String) -> String {
        match self.kind(id) {
            TypeKind::Prim(p) => p.rust_syntax().to_string(),
            TypeKind::Error => "Box<dyn std::error::Error>".to_string(),
            TypeKind::Slice(elem) => format!("Vec<{}>", self.rust_syntax(*elem, pkg_name)),
            TypeKind::Array(n, elem) => format!("[{}; {n}]", self.rust_syntax(*elem, pkg_name)),
            TypeKind::Ptr(elem) => format!("Box<{}>", self.rust_syntax(*elem, pkg_name)),
            TypeKind::Named(named) => {
                let qualified = if named.package.is_empty() {
                    named.name.clone()
                } else {
                    format!("{}::{}", pkg_name(&named.package), named.name)
                };
                match self.kind(named.underlying) {
                    TypeKind::Interface(_) => format!("Box<dyn {qualified}>"),
                    _ => qualified,
                }
            }
            TypeKind::Interface(_) => "Box<dyn std::any::Any>".to_string(),
            TypeKind::Struct(_) => "_".to_string(),
        }
    }
}

fn signatures_identical(a: &MethodSig, b: &MethodSig) -> bool {
    a.params.len() == b.params.len()
        && a.results.len() == b.results.len()
        && a.params.iter().zip(&b.params).all(|(x, y)| x.ty == y.ty)
        && a.results.iter().zip(&b.results).all(|(x, y)| x.ty == y.ty)
}
