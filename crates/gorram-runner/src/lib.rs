//! Downstream toolchain driver: compiles a synthesized wrapper script and
//! executes it with the caller's stdio.
//!
//! The wrapper is invoked as `<exe> -- <args...>`. The sentinel keeps the
//! wrapper's argument scan aligned with what the emitter generated (it
//! skips its own name and the sentinel) and mirrors how a source-running
//! toolchain is kept from treating positional args as further inputs.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};

/// Compiler override; defaults to `rustc` on PATH.
pub const RUSTC_ENV: &str = "GORRAM_RUSTC";

/// Environment variable carrying the result template into the wrapper.
pub const TEMPLATE_ENV: &str = "GORRAM_TEMPLATE";

/// Binary artifact sited next to the script, so recompiles follow the
/// cache tree and a stale binary is detected by timestamp.
pub fn artifact_path(script: &Path) -> PathBuf {
    script.with_extension("bin")
}

fn artifact_stale(script: &Path, exe: &Path) -> bool {
    let (Ok(script_meta), Ok(exe_meta)) = (script.metadata(), exe.metadata()) else {
        return true;
    };
    match (script_meta.modified(), exe_meta.modified()) {
        (Ok(s), Ok(e)) => e < s,
        _ => true,
    }
}

/// Compiles the script if its artifact is missing or stale. Compiler
/// diagnostics stream straight to the caller's stderr; a failed compile
/// reports the compiler's exit code rather than an error.
pub fn compile_script(script: &Path) -> Result<Option<i32>> {
    let exe = artifact_path(script);
    if !artifact_stale(script, &exe) {
        return Ok(None);
    }
    let rustc = std::env::var(RUSTC_ENV).unwrap_or_else(|_| "rustc".to_string());
    let status = Command::new(&rustc)
        .arg("--edition")
        .arg("2021")
        .arg("-O")
        .arg(script)
        .arg("-o")
        .arg(&exe)
        .status()
        .with_context(|| format!("run {rustc}"))?;
    if !status.success() {
        return Ok(Some(status.code().unwrap_or(1)));
    }
    Ok(None)
}

/// Compiles (if needed) and runs the wrapper with stdio inherited, the
/// positional args behind the `--` sentinel, and the template exported to
/// the child when present. Returns the exit code to propagate; `Err` is
/// reserved for spawn-level failures (a missing toolchain, say).
pub fn run_script(script: &Path, args: &[String], template: Option<&str>) -> Result<i32> {
    if let Some(code) = compile_script(script)? {
        return Ok(code);
    }
    let exe = artifact_path(script);
    let mut cmd = Command::new(&exe);
    cmd.arg("--").args(args);
    if let Some(template) = template {
        cmd.env(TEMPLATE_ENV, template);
    }
    let status = cmd
        .status()
        .with_context(|| format!("run {}", exe.display()))?;
    Ok(status.code().unwrap_or(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_sits_next_to_the_script() {
        let p = artifact_path(Path::new("/cache/math/Sqrt.rs"));
        assert_eq!(p, Path::new("/cache/math/Sqrt.bin"));
    }

    #[test]
    fn missing_artifact_is_stale() {
        assert!(artifact_stale(
            Path::new("/no/such/script.rs"),
            Path::new("/no/such/script.bin")
        ));
    }
}
