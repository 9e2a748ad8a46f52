//! Return renderer: maps the result tuple onto one of the supported
//! binding patterns and picks how a produced value is printed.

use crate::classify::Classifier;
use crate::error::GenError;
use crate::types::{ResultSlot, Signature, TypeId};

/// The six supported result-binding spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultsBinding {
    /// No results; a bare call.
    Empty,
    /// Single `error` result.
    ErrOnly,
    /// Single length-idiom result, discarded.
    Discard,
    /// Length-idiom result plus `error`.
    DiscardErr,
    /// Single value result.
    Val,
    /// Value result plus `error`.
    ValErr,
}

/// The four-way classification of a produced value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetClass {
    ByteArray,
    Reader,
    /// Struct (or pointer to one) carrying an exported reader field.
    ReaderField(String),
    Default,
}

#[derive(Debug, Clone)]
pub struct RetPlan {
    pub binding: ResultsBinding,
    pub err_check: bool,
    pub has_ret_val: bool,
    pub class: Option<RetClass>,
    pub ret_ty: Option<TypeId>,
    /// Pre-indented statement block printing `val`; empty when no value.
    pub print_val: String,
    pub imports: Vec<&'static str>,
}

impl RetPlan {
    fn bare(binding: ResultsBinding, err_check: bool) -> Self {
        Self {
            binding,
            err_check,
            has_ret_val: false,
            class: None,
            ret_ty: None,
            print_val: String::new(),
            imports: Vec::new(),
        }
    }
}

/// The common length idiom: a first result named `n` of type `int`, whose
/// value is not worth printing.
fn has_len(cls: &Classifier<'_>, results: &[ResultSlot]) -> bool {
    let Some(first) = results.first() else {
        return false;
    };
    first.name.as_deref() == Some("n")
        && cls
            .table
            .identical(cls.table.underlying(first.ty), cls.catalog.int)
}

pub fn plan_results(cls: &Classifier<'_>, sig: &Signature) -> Result<RetPlan, GenError> {
    let results = &sig.results;
    match results.len() {
        0 => Ok(RetPlan::bare(ResultsBinding::Empty, false)),
        1 => {
            if cls.table.identical(results[0].ty, cls.catalog.error) {
                return Ok(RetPlan::bare(ResultsBinding::ErrOnly, true));
            }
            if has_len(cls, results) {
                return Ok(RetPlan::bare(ResultsBinding::Discard, false));
            }
            Ok(value_plan(cls, ResultsBinding::Val, false, results[0].ty))
        }
        2 => {
            if !cls.table.identical(results[1].ty, cls.catalog.error) {
                return Err(GenError::unsupported(
                    "can't understand function with multiple non-error return values",
                ));
            }
            if has_len(cls, results) {
                return Ok(RetPlan::bare(ResultsBinding::DiscardErr, true));
            }
            Ok(value_plan(cls, ResultsBinding::ValErr, true, results[0].ty))
        }
        _ => Err(GenError::unsupported(
            "can't understand functions with more than two return values",
        )),
    }
}

fn value_plan(
    cls: &Classifier<'_>,
    binding: ResultsBinding,
    err_check: bool,
    ty: TypeId,
) -> RetPlan {
    let (class, print_val, imports) = dispatch(cls, ty);
    RetPlan {
        binding,
        err_check,
        has_ret_val: true,
        class: Some(class),
        ret_ty: Some(ty),
        print_val,
        imports,
    }
}

/// First-match dispatch: byte array, then reader, then reader-field struct,
/// then the default formatter.
fn dispatch(cls: &Classifier<'_>, ty: TypeId) -> (RetClass, String, Vec<&'static str>) {
    if cls.is_byte_array(ty) {
        let snippet = "    let hex: String = val.iter().map(|b| format!(\"{b:02x}\")).collect();\n    println!(\"{hex}\");\n";
        return (RetClass::ByteArray, snippet.to_string(), Vec::new());
    }
    if cls.is_reader(ty) {
        let snippet = "    let mut rd = val;\n    if let Err(err) = io::copy(&mut rd, &mut io::stdout()) {\n        fatal(&err);\n    }\n";
        return (RetClass::Reader, snippet.to_string(), vec!["std::io"]);
    }
    if let Some(field) = cls.reader_field_name(ty) {
        let snippet = format!(
            "    let mut val = val;\n    let n = match io::copy(&mut val.{field}, &mut io::stdout()) {{\n        Ok(n) => n,\n        Err(err) => fatal(&err),\n    }};\n    if n == 0 {{\n        println!(\"{{val:?}}\");\n    }}\n    println!();\n"
        );
        return (
            RetClass::ReaderField(field),
            snippet,
            vec!["std::io"],
        );
    }
    (RetClass::Default, default_print(cls, ty), Vec::new())
}

/// Strings and scalars print bare; everything else debug-formats. Picked at
/// synthesis time since the result type is known.
fn default_print(cls: &Classifier<'_>, ty: TypeId) -> String {
    use crate::types::{Prim, TypeKind};
    let bare = matches!(
        cls.table.kind(ty),
        TypeKind::Prim(
            Prim::String
                | Prim::Int
                | Prim::Uint
                | Prim::I64
                | Prim::U64
                | Prim::F64
                | Prim::Bool
                | Prim::U8
        )
    );
    if bare {
        "    println!(\"{val}\");\n".to_string()
    } else {
        "    println!(\"{val:?}\");\n".to_string()
    }
}
