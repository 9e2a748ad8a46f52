//! Deterministic assembly of the emit plan consumed by the template engine.

use std::collections::BTreeSet;

use crate::catalog::Catalog;
use crate::classify::Classifier;
use crate::error::GenError;
use crate::handlers::{self, HandlerSet, ARG_SLOT, IDX_SLOT, SRC_IDX_SLOT};
use crate::loader::{ResolvedTarget, Universe};
use crate::ret::{self, ResultsBinding, RetClass};
use crate::roles::{self, RoleAssignment};
use crate::types::TypeKind;

/// A field of the returned value that the emitted template renderer can
/// substitute into a user template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateField {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct EmitPlan {
    pub version: String,
    pub package_path: String,
    pub package_name: String,
    pub global_var: Option<String>,
    pub function: String,
    pub num_cli_args: usize,
    pub roles: RoleAssignment,
    pub src_init: String,
    pub args_to_src: String,
    pub stdin_to_src: String,
    pub dst_init: String,
    pub dst_to_stdout: String,
    /// Binding statements, in CLI-argument order (bare, unindented).
    pub arg_bindings: Vec<String>,
    /// Helper function texts, lexicographically sorted and deduplicated.
    pub arg_converter_helpers: Vec<String>,
    /// `arg{k}` identifiers interleaved with the `src`/`dst` tokens at
    /// their original parameter positions.
    pub call_args: Vec<String>,
    pub results_binding: ResultsBinding,
    pub err_check: bool,
    pub print_val: String,
    pub has_ret_val: bool,
    pub ret_class: Option<RetClass>,
    /// Rust spelling of the returned value's type, for the emitted
    /// template-renderer helpers.
    pub template_val_syntax: Option<String>,
    /// Whether the whole value prints bare (`{}`) rather than debug.
    pub template_whole_bare: bool,
    pub template_fields: Vec<TemplateField>,
    /// Closed union of every snippet's declared imports plus the seeds.
    pub imports: BTreeSet<String>,
}

/// `use` item importing the target package under its short name.
pub fn package_use_item(path: &str, name: &str) -> String {
    let crate_ident: String = path
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if crate_ident == name {
        crate_ident
    } else {
        format!("{crate_ident} as {name}")
    }
}

pub fn build_plan(
    universe: &Universe,
    catalog: &Catalog,
    handlers: &HandlerSet,
    target: &ResolvedTarget,
    version: &str,
) -> Result<EmitPlan, GenError> {
    let cls = Classifier::new(&universe.table, catalog, handlers);
    let sig = &target.sig;

    let mut imports: BTreeSet<String> = BTreeSet::new();
    imports.insert(package_use_item(&target.package_path, &target.package_name));
    imports.insert("std::env".to_string());
    imports.insert("std::process".to_string());

    let ret_plan = ret::plan_results(&cls, sig)?;
    for imp in &ret_plan.imports {
        imports.insert((*imp).to_string());
    }

    let roles = roles::resolve_roles(&cls, sig);

    let mut src_init = String::new();
    let mut args_to_src = String::new();
    let mut stdin_to_src = String::new();
    let mut dst_init = String::new();
    let mut dst_to_stdout = String::new();

    if let Some(src) = roles.src {
        let src_ty = sig.params[src].ty;
        let handler = handlers.src_handler(&universe.table, src_ty).ok_or_else(|| {
            GenError::invariant(format!(
                "should be impossible: src type {:?} has no handler",
                universe.table.display(src_ty)
            ))
        })?;
        // When dst precedes src the CLI never carries the dst argument, so
        // the source argument sits one slot earlier than its parameter
        // position suggests.
        let mut src_arg = src;
        if let Some(dst) = roles.dst {
            if src > dst {
                src_arg -= 1;
            }
        }
        src_init = handler.init.to_string();
        args_to_src = handler
            .arg_to_src
            .replace(SRC_IDX_SLOT, &src_arg.to_string());
        stdin_to_src = handler.stdin_to_src.to_string();
        for imp in handler.imports {
            imports.insert((*imp).to_string());
        }

        if let Some(dst) = roles.dst {
            let dst_ty = sig.params[dst].ty;
            let handler = handlers.dst_handler(&universe.table, dst_ty).ok_or_else(|| {
                GenError::invariant(format!(
                    "should be impossible: dst type {:?} has no handler",
                    universe.table.display(dst_ty)
                ))
            })?;
            dst_init = handler.init.to_string();
            dst_to_stdout = handler.to_stdout.to_string();
            for imp in handler.imports {
                imports.insert((*imp).to_string());
            }
        }
    }

    // Non-role parameters bind CLI arguments by their ordinal: the runtime
    // argument vector never carries dst and has the src argument spliced
    // out before any binding runs.
    let mut call_args = Vec::new();
    let mut arg_bindings = Vec::new();
    let mut param_types = BTreeSet::new();
    let mut pos = 0usize;
    for (x, param) in sig.params.iter().enumerate() {
        if roles.src == Some(x) {
            call_args.push("src".to_string());
            continue;
        }
        if roles.dst == Some(x) {
            call_args.push("dst".to_string());
            continue;
        }
        let conv = handlers.converter(&universe.table, param.ty).ok_or_else(|| {
            GenError::unsupported(format!(
                "don't understand how to convert arg {:?} from CLI",
                param.name
            ))
        })?;
        call_args.push(format!("arg{}", pos + 1));
        param_types.insert(param.ty);
        arg_bindings.push(
            conv.assign
                .replace(ARG_SLOT, &(pos + 1).to_string())
                .replace(IDX_SLOT, &pos.to_string()),
        );
        pos += 1;
    }

    let mut helper_set = BTreeSet::new();
    for ty in &param_types {
        let conv = handlers.converter(&universe.table, *ty).ok_or_else(|| {
            GenError::invariant(format!(
                "should be impossible: converter for {:?} vanished",
                universe.table.display(*ty)
            ))
        })?;
        if !conv.func.is_empty() {
            helper_set.insert(conv.func.to_string());
            if handlers::needs_radix_helper(conv.func) {
                helper_set.insert(handlers::SPLIT_RADIX_HELPER.to_string());
            }
        }
        for imp in conv.imports {
            imports.insert((*imp).to_string());
        }
    }
    // BTreeSet iteration gives the lexicographic, deduplicated order.
    let arg_converter_helpers: Vec<String> = helper_set.into_iter().collect();

    let num_cli_args = sig.params.len() - usize::from(roles.dst.is_some());

    let (template_val_syntax, template_whole_bare, template_fields) = match ret_plan.ret_ty {
        Some(ty) if ret_plan.has_ret_val => {
            let short = |p: &str| universe.short_name(p);
            let syntax = universe.table.rust_syntax(ty, &short);
            let bare = matches!(universe.table.kind(ty), TypeKind::Prim(_));
            (Some(syntax), bare, template_fields_of(universe, ty))
        }
        _ => (None, false, Vec::new()),
    };

    Ok(EmitPlan {
        version: version.to_string(),
        package_path: target.package_path.clone(),
        package_name: target.package_name.clone(),
        global_var: target.global_var.clone(),
        function: target.function.clone(),
        num_cli_args,
        roles,
        src_init,
        args_to_src,
        stdin_to_src,
        dst_init,
        dst_to_stdout,
        arg_bindings,
        arg_converter_helpers,
        call_args,
        results_binding: ret_plan.binding,
        err_check: ret_plan.err_check,
        print_val: ret_plan.print_val,
        has_ret_val: ret_plan.has_ret_val,
        ret_class: ret_plan.class,
        template_val_syntax,
        template_whole_bare,
        template_fields,
        imports,
    })
}

/// Exported scalar fields of the returned value (through at most one
/// pointer), which the emitted template renderer can stringify.
fn template_fields_of(universe: &Universe, ty: crate::types::TypeId) -> Vec<TemplateField> {
    let table = &universe.table;
    let mut t = ty;
    if let TypeKind::Ptr(elem) = table.kind(t) {
        t = *elem;
    }
    let TypeKind::Struct(fields) = table.kind(table.underlying(t)) else {
        return Vec::new();
    };
    fields
        .iter()
        .filter(|f| f.public && matches!(table.kind(f.ty), TypeKind::Prim(_)))
        .map(|f| TemplateField {
            name: f.name.clone(),
        })
        .collect()
}
