//! Pure predicates over resolved types, parameterized by the catalog and
//! the handler tables.

use crate::catalog::Catalog;
use crate::handlers::HandlerSet;
use crate::types::{TypeId, TypeKind, TypeTable};

pub struct Classifier<'a> {
    pub table: &'a TypeTable,
    pub catalog: &'a Catalog,
    pub handlers: &'a HandlerSet,
}

impl<'a> Classifier<'a> {
    pub fn new(table: &'a TypeTable, catalog: &'a Catalog, handlers: &'a HandlerSet) -> Self {
        Self {
            table,
            catalog,
            handlers,
        }
    }

    pub fn is_reader(&self, t: TypeId) -> bool {
        self.table.implements(t, self.catalog.reader)
    }

    pub fn is_byte_array(&self, t: TypeId) -> bool {
        match self.table.kind(t) {
            TypeKind::Array(_, elem) => self.table.identical(*elem, self.catalog.byte),
            _ => false,
        }
    }

    /// True when `t`, after unwrapping at most one pointer and taking the
    /// underlying shape, is a struct with an exported reader-capable field.
    pub fn has_reader_field(&self, t: TypeId) -> bool {
        self.reader_field_name(t).is_some()
    }

    /// Name of the first exported reader-capable field in declaration order.
    pub fn reader_field_name(&self, t: TypeId) -> Option<String> {
        let mut t = t;
        if let TypeKind::Ptr(elem) = self.table.kind(t) {
            t = *elem;
        }
        let TypeKind::Struct(fields) = self.table.kind(self.table.underlying(t)) else {
            return None;
        };
        fields
            .iter()
            .find(|f| f.public && self.is_reader(f.ty))
            .map(|f| f.name.clone())
    }

    pub fn is_src_candidate(&self, t: TypeId) -> bool {
        self.handlers.src_handler(self.table, t).is_some()
    }

    pub fn is_dst_candidate(&self, t: TypeId) -> bool {
        self.handlers.dst_handler(self.table, t).is_some()
    }
}
