//! Sentinel types and capability interfaces used by the classifiers and
//! handler tables. Resolved once per synthesis from the ambient packages
//! and threaded explicitly through the planner.

use crate::error::GenError;
use crate::loader::{Symbol, Universe};
use crate::types::{Prim, TypeId, TypeKind};

#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    pub byte: TypeId,
    /// Ordered sequence of bytes.
    pub bytes: TypeId,
    pub string: TypeId,
    pub error: TypeId,
    /// The named reader-capability interface (`io.Reader`).
    pub reader: TypeId,
    /// The named writer-capability interface (`io.Writer`).
    pub writer: TypeId,
    /// Owning pointer to the growable byte buffer (`*bytes.Buffer`).
    pub p_buffer: TypeId,
    pub int: TypeId,
    pub uint: TypeId,
    pub i64: TypeId,
    pub u64: TypeId,
    pub f64: TypeId,
    pub bool: TypeId,
}

impl Catalog {
    pub fn resolve(u: &mut Universe) -> Result<Self, GenError> {
        let byte = u.table.intern_prim(Prim::U8);
        let bytes = u.table.intern(TypeKind::Slice(byte));
        let reader = ambient_type(u, "io", "Reader")?;
        let writer = ambient_type(u, "io", "Writer")?;
        let buffer = ambient_type(u, "bytes", "Buffer")?;
        let p_buffer = u.table.intern(TypeKind::Ptr(buffer));
        Ok(Catalog {
            byte,
            bytes,
            string: u.table.intern_prim(Prim::String),
            error: u.table.intern(TypeKind::Error),
            reader,
            writer,
            p_buffer,
            int: u.table.intern_prim(Prim::Int),
            uint: u.table.intern_prim(Prim::Uint),
            i64: u.table.intern_prim(Prim::I64),
            u64: u.table.intern_prim(Prim::U64),
            f64: u.table.intern_prim(Prim::F64),
            bool: u.table.intern_prim(Prim::Bool),
        })
    }
}

fn ambient_type(u: &Universe, package: &str, name: &str) -> Result<TypeId, GenError> {
    let pkg = u.package(package).ok_or_else(|| {
        GenError::invariant(format!("ambient package {package:?} is not loaded"))
    })?;
    match pkg.symbol(name) {
        Some(Symbol::Type { id, .. }) => Ok(*id),
        _ => Err(GenError::invariant(format!(
            "ambient type {package}.{name} is not declared"
        ))),
    }
}
