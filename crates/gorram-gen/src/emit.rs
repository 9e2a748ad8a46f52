//! Renders an [`EmitPlan`] to wrapper source text through a fixed template,
//! writes it under the cache tree, and runs the external formatter on it.

use std::path::Path;
use std::process::Command;

use crate::error::GenError;
use crate::plan::EmitPlan;
use crate::ret::ResultsBinding;

/// Formatter override; the emitted file must satisfy whatever this names.
pub const RUSTFMT_ENV: &str = "GORRAM_RUSTFMT";

const FATAL_HELPER: &str = r#"fn fatal(err: &dyn std::fmt::Display) -> ! {
    eprintln!("{err}");
    process::exit(1);
}"#;

const SRC_SWITCH: &str = r#"    if args.len() == expected_cli_args - 1 {
        src = stdin_to_src();
    } else if args.len() == expected_cli_args {
        let (s, rest) = args_to_src(args);
        src = s;
        args = rest;
    } else {
        fatal(&format!(
            "expected {} or {} arguments, but got {} args",
            expected_cli_args - 1,
            expected_cli_args,
            args.len()
        ));
    }
"#;

const TEMPLATE_BRANCH: &str = r#"    match env::var("GORRAM_TEMPLATE") {
        Ok(tmpl) if !tmpl.is_empty() => {
            println!("{}", render_template(&tmpl, &val));
            return;
        }
        _ => {}
    }
"#;

const RENDER_TEMPLATE_HELPER: &str = r#"fn render_template(tmpl: &str, val: &{VAL_TYPE}) -> String {
    let mut out = String::new();
    let mut rest = tmpl;
    while let Some(start) = rest.find("{{.") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 3..];
        let end = match after.find("}}") {
            Some(end) => end,
            None => fatal(&format!("unterminated field in template {tmpl:?}")),
        };
        out.push_str(&template_field(val, &after[..end]));
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}"#;

/// Human spelling of the target, for emitted diagnostics.
fn display_target(plan: &EmitPlan) -> String {
    match &plan.global_var {
        Some(var) => format!("{}.{}.{}", plan.package_name, var, plan.function),
        None => format!("{}.{}", plan.package_name, plan.function),
    }
}

/// Call-expression path of the target. Identifiers are spliced verbatim
/// from the package manifest, so emitted calls carry the manifest's
/// exported casing (`base64::StdEncoding.EncodeToString(..)`); the
/// emitter never renames what a package declares.
fn call_path(plan: &EmitPlan) -> String {
    match &plan.global_var {
        Some(var) => format!("{}::{}.{}", plan.package_name, var, plan.function),
        None => format!("{}::{}", plan.package_name, plan.function),
    }
}

/// Pure rendering of the fixed template. The written file is exactly this
/// text, reshaped by the external formatter.
pub fn render(plan: &EmitPlan) -> String {
    let mut out = String::new();
    out.push_str("// Code generated by gorram; do not edit.\n\n");

    for imp in &plan.imports {
        out.push_str("use ");
        out.push_str(imp);
        out.push_str(";\n");
    }
    out.push('\n');

    out.push_str("const VERSION: &str = \"");
    out.push_str(&plan.version);
    out.push_str("\";\n\n");

    out.push_str("fn main() {\n");

    if !plan.has_ret_val {
        out.push_str("    if env::var(\"GORRAM_TEMPLATE\").map_or(false, |v| !v.is_empty()) {\n");
        out.push_str(&format!(
            "        fatal(&\"GORRAM_TEMPLATE is set but {} produces no value to render\");\n",
            display_target(plan)
        ));
        out.push_str("    }\n\n");
    }

    if !plan.src_init.is_empty() {
        out.push_str(&plan.src_init);
        out.push('\n');
    }

    let src_bound = plan.roles.src.is_some();
    if plan.num_cli_args > 0 || src_bound {
        // Skip the wrapper's own name and the runner's `--` sentinel.
        if src_bound {
            out.push_str("    let mut args: Vec<String> = env::args().skip(2).collect();\n\n");
        } else {
            out.push_str("    let args: Vec<String> = env::args().skip(2).collect();\n\n");
        }
    }

    if src_bound {
        out.push_str(&format!(
            "    let expected_cli_args: usize = {};\n",
            plan.num_cli_args
        ));
        out.push_str(SRC_SWITCH);
        out.push('\n');
    }

    for binding in &plan.arg_bindings {
        out.push_str("    ");
        out.push_str(binding);
        out.push('\n');
    }
    if !plan.arg_bindings.is_empty() {
        out.push('\n');
    }

    if !plan.dst_init.is_empty() {
        out.push_str(&plan.dst_init);
        out.push('\n');
    }

    let call = format!("{}({})", call_path(plan), plan.call_args.join(", "));
    match plan.results_binding {
        ResultsBinding::Empty => {
            out.push_str(&format!("    {call};\n"));
        }
        ResultsBinding::ErrOnly | ResultsBinding::DiscardErr => {
            out.push_str(&format!(
                "    if let Err(err) = {call} {{\n        fatal(&err);\n    }}\n"
            ));
        }
        ResultsBinding::Discard => {
            out.push_str(&format!("    let _ = {call};\n"));
        }
        ResultsBinding::Val => {
            out.push_str(&format!("    let val = {call};\n"));
        }
        ResultsBinding::ValErr => {
            out.push_str(&format!(
                "    let val = match {call} {{\n        Ok(v) => v,\n        Err(err) => fatal(&err),\n    }};\n"
            ));
        }
    }
    out.push('\n');

    if !plan.dst_to_stdout.is_empty() {
        out.push_str(&plan.dst_to_stdout);
    } else if plan.has_ret_val {
        out.push_str(TEMPLATE_BRANCH);
        out.push('\n');
        out.push_str(&plan.print_val);
    }
    out.push_str("}\n");

    push_helper(&mut out, FATAL_HELPER);
    if !plan.args_to_src.is_empty() {
        push_helper(&mut out, &plan.args_to_src);
    }
    if !plan.stdin_to_src.is_empty() {
        push_helper(&mut out, &plan.stdin_to_src);
    }
    if plan.has_ret_val && plan.dst_to_stdout.is_empty() {
        push_template_helpers(&mut out, plan);
    }
    for helper in &plan.arg_converter_helpers {
        push_helper(&mut out, helper);
    }
    out
}

fn push_helper(out: &mut String, text: &str) {
    out.push('\n');
    out.push_str(text);
    out.push('\n');
}

fn push_template_helpers(out: &mut String, plan: &EmitPlan) {
    let val_type = plan
        .template_val_syntax
        .clone()
        .unwrap_or_else(|| "()".to_string());
    push_helper(out, &RENDER_TEMPLATE_HELPER.replace("{VAL_TYPE}", &val_type));

    let mut helper = String::new();
    helper.push_str(&format!(
        "fn template_field(val: &{val_type}, name: &str) -> String {{\n"
    ));
    helper.push_str("    match name {\n");
    if plan.template_whole_bare {
        helper.push_str("        \"\" => format!(\"{val}\"),\n");
    } else {
        helper.push_str("        \"\" => format!(\"{val:?}\"),\n");
    }
    for field in &plan.template_fields {
        helper.push_str(&format!(
            "        \"{0}\" => format!(\"{{}}\", val.{0}),\n",
            field.name
        ));
    }
    helper.push_str("        _ => fatal(&format!(\"unknown field {name:?} in template\")),\n");
    helper.push_str("    }\n}");
    push_helper(out, &helper);
}

/// Writes the rendered script (restrictive permissions) and runs the
/// external formatter on it. Formatter failure is a hard synthesis error.
pub fn write_script(path: &Path, plan: &EmitPlan) -> Result<(), GenError> {
    let source = render(plan);
    if let Some(dir) = path.parent() {
        create_dirs_restricted(dir)?;
    }
    write_file_restricted(path, source.as_bytes())?;
    run_formatter(path)
}

#[cfg(unix)]
fn create_dirs_restricted(dir: &Path) -> Result<(), GenError> {
    use std::os::unix::fs::DirBuilderExt;
    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(dir)
        .map_err(|e| GenError::io(format!("create {}: {e}", dir.display())))
}

#[cfg(not(unix))]
fn create_dirs_restricted(dir: &Path) -> Result<(), GenError> {
    std::fs::create_dir_all(dir).map_err(|e| GenError::io(format!("create {}: {e}", dir.display())))
}

#[cfg(unix)]
fn write_file_restricted(path: &Path, bytes: &[u8]) -> Result<(), GenError> {
    use std::io::Write as _;
    use std::os::unix::fs::OpenOptionsExt;
    let mut f = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .map_err(|e| GenError::io(format!("create {}: {e}", path.display())))?;
    f.write_all(bytes)
        .map_err(|e| GenError::io(format!("write {}: {e}", path.display())))
}

#[cfg(not(unix))]
fn write_file_restricted(path: &Path, bytes: &[u8]) -> Result<(), GenError> {
    std::fs::write(path, bytes).map_err(|e| GenError::io(format!("write {}: {e}", path.display())))
}

fn run_formatter(path: &Path) -> Result<(), GenError> {
    let program =
        std::env::var(RUSTFMT_ENV).unwrap_or_else(|_| "rustfmt".to_string());
    let out = Command::new(&program)
        .arg("--edition")
        .arg("2021")
        .arg(path)
        .output()
        .map_err(|e| GenError::io(format!("run {program}: {e}")))?;
    if !out.status.success() {
        return Err(GenError::io(format!(
            "{program} failed on {}: {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr)
        )));
    }
    Ok(())
}
