//! Ordered handler tables: streaming sources, streaming destinations, and
//! CLI argument converters. Entries are literal text shards stitched into
//! the emitted program; each declares the imports its text relies on.
//!
//! Table order is load-bearing. Lookups scan the list and return the first
//! entry whose type is identical to the query, so earlier entries shadow
//! later ones (the pointer-to-buffer entry must precede the writer entry).

use crate::catalog::Catalog;
use crate::types::{TypeId, TypeTable};

/// Marker replaced with the source argument's CLI index.
pub const SRC_IDX_SLOT: &str = "{SRC_IDX}";
/// Marker replaced with the 1-based function-argument ordinal.
pub const ARG_SLOT: &str = "{ARG}";
/// Marker replaced with the 0-based CLI-argument index.
pub const IDX_SLOT: &str = "{IDX}";

#[derive(Debug, Clone, Copy)]
pub struct SrcHandler {
    pub ty: TypeId,
    pub imports: &'static [&'static str],
    /// Declaration of the `src` variable; a pre-indented statement block.
    pub init: &'static str,
    /// Helper converting the named CLI argument into `src`; carries the
    /// `{SRC_IDX}` slot.
    pub arg_to_src: &'static str,
    /// Helper producing `src` from standard input.
    pub stdin_to_src: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct DstHandler {
    pub ty: TypeId,
    pub imports: &'static [&'static str],
    /// Initialization of the `dst` variable; a pre-indented statement block.
    pub init: &'static str,
    /// Post-call block draining `dst` to standard output.
    pub to_stdout: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct ArgConverter {
    pub ty: TypeId,
    /// Single binding statement with `{ARG}` and `{IDX}` slots.
    pub assign: &'static str,
    pub imports: &'static [&'static str],
    /// Helper function definition; empty for the identity conversion.
    pub func: &'static str,
}

#[derive(Debug)]
pub struct HandlerSet {
    pub src: Vec<SrcHandler>,
    pub dst: Vec<DstHandler>,
    pub converters: Vec<ArgConverter>,
}

impl HandlerSet {
    pub fn new(catalog: &Catalog) -> Self {
        Self {
            src: src_handlers(catalog),
            dst: dst_handlers(catalog),
            converters: arg_converters(catalog),
        }
    }

    pub fn src_handler(&self, table: &TypeTable, t: TypeId) -> Option<&SrcHandler> {
        self.src.iter().find(|h| table.identical(t, h.ty))
    }

    pub fn dst_handler(&self, table: &TypeTable, t: TypeId) -> Option<&DstHandler> {
        self.dst.iter().find(|h| table.identical(t, h.ty))
    }

    pub fn converter(&self, table: &TypeTable, t: TypeId) -> Option<&ArgConverter> {
        self.converters.iter().find(|c| table.identical(t, c.ty))
    }
}

fn src_handlers(catalog: &Catalog) -> Vec<SrcHandler> {
    vec![
        SrcHandler {
            ty: catalog.bytes,
            imports: &["std::fs", "std::io", "std::io::Read"],
            init: "    let src: Vec<u8>;\n",
            arg_to_src: r#"fn args_to_src(mut args: Vec<String>) -> (Vec<u8>, Vec<String>) {
    let src_idx = {SRC_IDX};
    let src = match fs::read(&args[src_idx]) {
        Ok(b) => b,
        Err(err) => fatal(&err),
    };
    args.remove(src_idx);
    (src, args)
}"#,
            stdin_to_src: r#"fn stdin_to_src() -> Vec<u8> {
    let mut src = Vec::new();
    if let Err(err) = io::stdin().read_to_end(&mut src) {
        fatal(&err);
    }
    src
}"#,
        },
        SrcHandler {
            ty: catalog.reader,
            imports: &["std::fs", "std::io", "std::io::Read"],
            init: "    let src: Box<dyn Read>;\n",
            arg_to_src: r#"fn args_to_src(mut args: Vec<String>) -> (Box<dyn Read>, Vec<String>) {
    let src_idx = {SRC_IDX};
    // Never closed; process exit reclaims it.
    let file = match fs::File::open(&args[src_idx]) {
        Ok(f) => f,
        Err(err) => fatal(&err),
    };
    args.remove(src_idx);
    (Box::new(file), args)
}"#,
            stdin_to_src: r#"fn stdin_to_src() -> Box<dyn Read> {
    Box::new(io::stdin())
}"#,
        },
        SrcHandler {
            ty: catalog.string,
            imports: &["std::fs", "std::io", "std::io::Read"],
            init: "    let src: String;\n",
            arg_to_src: r#"fn args_to_src(mut args: Vec<String>) -> (String, Vec<String>) {
    let src_idx = {SRC_IDX};
    let src = match fs::read_to_string(&args[src_idx]) {
        Ok(s) => s,
        Err(err) => fatal(&err),
    };
    args.remove(src_idx);
    (src, args)
}"#,
            stdin_to_src: r#"fn stdin_to_src() -> String {
    let mut src = String::new();
    if let Err(err) = io::stdin().read_to_string(&mut src) {
        fatal(&err);
    }
    src
}"#,
        },
    ]
}

fn dst_handlers(catalog: &Catalog) -> Vec<DstHandler> {
    vec![
        DstHandler {
            ty: catalog.p_buffer,
            imports: &["std::io", "std::io::Write"],
            init: "    let mut dst_buf: Vec<u8> = Vec::new();\n    let dst = &mut dst_buf;\n",
            to_stdout: r#"    if let Err(err) = io::stdout().write_all(&dst_buf) {
        fatal(&err);
    }
    // Always end with at least one line break.
    println!();
"#,
        },
        DstHandler {
            ty: catalog.writer,
            imports: &["std::io"],
            init: "    let dst = io::stdout();\n",
            to_stdout: "    // Always end with at least one line break.\n    println!();\n",
        },
    ]
}

fn arg_converters(catalog: &Catalog) -> Vec<ArgConverter> {
    vec![
        // The identity conversion keeps an entry so string parameters need
        // no special casing downstream.
        ArgConverter {
            ty: catalog.string,
            assign: "let arg{ARG} = args[{IDX}].clone();",
            imports: &[],
            func: "",
        },
        ArgConverter {
            ty: catalog.int,
            assign: "let arg{ARG} = arg_to_int(&args[{IDX}]);",
            imports: &[],
            func: r#"fn arg_to_int(s: &str) -> isize {
    let (neg, mag) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let (radix, digits) = split_radix_prefix(mag);
    let value = match isize::from_str_radix(digits, radix) {
        Ok(v) => v,
        Err(err) => fatal(&err),
    };
    if neg {
        -value
    } else {
        value
    }
}"#,
        },
        ArgConverter {
            ty: catalog.uint,
            assign: "let arg{ARG} = arg_to_uint(&args[{IDX}]);",
            imports: &[],
            func: r#"fn arg_to_uint(s: &str) -> usize {
    let mag = s.strip_prefix('+').unwrap_or(s);
    let (radix, digits) = split_radix_prefix(mag);
    match usize::from_str_radix(digits, radix) {
        Ok(v) => v,
        Err(err) => fatal(&err),
    }
}"#,
        },
        ArgConverter {
            ty: catalog.f64,
            assign: "let arg{ARG} = arg_to_f64(&args[{IDX}]);",
            imports: &[],
            func: r#"fn arg_to_f64(s: &str) -> f64 {
    match s.parse::<f64>() {
        Ok(v) => v,
        Err(err) => fatal(&err),
    }
}"#,
        },
        ArgConverter {
            ty: catalog.bool,
            assign: "let arg{ARG} = arg_to_bool(&args[{IDX}]);",
            imports: &[],
            func: r#"fn arg_to_bool(s: &str) -> bool {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => true,
        "0" | "f" | "F" | "FALSE" | "false" | "False" => false,
        _ => fatal(&format!("invalid bool value {s:?}")),
    }
}"#,
        },
        ArgConverter {
            ty: catalog.i64,
            assign: "let arg{ARG} = arg_to_i64(&args[{IDX}]);",
            imports: &[],
            func: r#"fn arg_to_i64(s: &str) -> i64 {
    let (neg, mag) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let (radix, digits) = split_radix_prefix(mag);
    let value = match i64::from_str_radix(digits, radix) {
        Ok(v) => v,
        Err(err) => fatal(&err),
    };
    if neg {
        -value
    } else {
        value
    }
}"#,
        },
        ArgConverter {
            ty: catalog.u64,
            assign: "let arg{ARG} = arg_to_u64(&args[{IDX}]);",
            imports: &[],
            func: r#"fn arg_to_u64(s: &str) -> u64 {
    let mag = s.strip_prefix('+').unwrap_or(s);
    let (radix, digits) = split_radix_prefix(mag);
    match u64::from_str_radix(digits, radix) {
        Ok(v) => v,
        Err(err) => fatal(&err),
    }
}"#,
        },
    ]
}

/// Shared by every integer converter; emitted once whenever any of them is.
pub const SPLIT_RADIX_HELPER: &str = r#"fn split_radix_prefix(mag: &str) -> (u32, &str) {
    if let Some(d) = mag.strip_prefix("0x").or_else(|| mag.strip_prefix("0X")) {
        (16, d)
    } else if let Some(d) = mag.strip_prefix("0o").or_else(|| mag.strip_prefix("0O")) {
        (8, d)
    } else if let Some(d) = mag.strip_prefix("0b").or_else(|| mag.strip_prefix("0B")) {
        (2, d)
    } else if mag.len() > 1 && mag.starts_with('0') {
        (8, &mag[1..])
    } else {
        (10, mag)
    }
}"#;

/// True when the converter's helper parses an integer and therefore needs
/// [`SPLIT_RADIX_HELPER`] alongside it.
pub fn needs_radix_helper(func: &str) -> bool {
    func.contains("split_radix_prefix(")
}
