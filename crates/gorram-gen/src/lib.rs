//! Signature-to-program synthesizer.
//!
//! Given an invocation of the form `<importpath> <Function|Var.Method>`,
//! resolves the target's signature from package interface manifests and
//! emits a stand-alone wrapper program that parses string arguments into
//! the right parameter types, wires streaming sources and sinks to stdio,
//! calls the target, and renders its results. Scripts are cached under the
//! invocation's cache root and reused while their version stamp matches.

use std::path::PathBuf;

pub mod cache;
pub mod catalog;
pub mod classify;
pub mod emit;
pub mod error;
pub mod handlers;
pub mod loader;
pub mod manifest;
pub mod plan;
pub mod ret;
pub mod roles;
pub mod types;

pub use error::{GenError, GenErrorKind};

/// Stamped into every generated file. Any change to emit logic must change
/// this string; it is the sole cache-invalidation signal. Format is
/// semver-plus-timestamp by convention, but only equality matters.
pub const VERSION: &str = "1.0.0  2026-08-02 10:41:17";

/// The callable named by an invocation: a top-level function, or a method
/// on an exported global variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub global_var: Option<String>,
    pub function: String,
}

impl Target {
    pub fn function(name: impl Into<String>) -> Self {
        Self {
            global_var: None,
            function: name.into(),
        }
    }

    pub fn method(var: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            global_var: Some(var.into()),
            function: function.into(),
        }
    }
}

/// One synthesis request. `args` ride along untouched; the synthesized
/// program parses them at its own runtime.
#[derive(Debug, Clone)]
pub struct Command {
    /// Import path of the target package.
    pub package: String,
    pub target: Target,
    /// Positional arguments, passed through to the synthesized program.
    pub args: Vec<String>,
    /// Force re-emission even when the cached script is current.
    pub regen: bool,
    /// Root of the script cache tree.
    pub cache_root: PathBuf,
    /// Directories searched for non-embedded package manifests.
    pub manifest_roots: Vec<PathBuf>,
}

/// Synthesizes (or reuses) the wrapper script for the command and returns
/// its path. A cached script is reused only when `regen` is unset and its
/// version stamp matches [`VERSION`].
///
/// Synthesis is blocking and single-threaded. Two concurrent calls
/// targeting the same script path race on the file; callers must
/// serialize those or pin distinct cache roots. Distinct paths are safe.
pub fn generate(cmd: &Command) -> Result<PathBuf, GenError> {
    let path = cache::script_path(&cmd.cache_root, &cmd.package, &cmd.target);
    if !cmd.regen && cache::file_version_ok(&path, VERSION) {
        return Ok(path);
    }

    let mut universe = loader::Universe::load(&cmd.package, &cmd.manifest_roots)?;
    let catalog = catalog::Catalog::resolve(&mut universe)?;
    let handler_set = handlers::HandlerSet::new(&catalog);
    let target = universe.lookup_target(&cmd.package, &cmd.target)?;
    let plan = plan::build_plan(&universe, &catalog, &handler_set, &target, VERSION)?;
    emit::write_script(&path, &plan)?;
    Ok(path)
}

/// Builds the emit plan for a command without touching the filesystem.
/// The cache gate is skipped; this is the pure core of [`generate`].
pub fn plan_command(cmd: &Command) -> Result<plan::EmitPlan, GenError> {
    let mut universe = loader::Universe::load(&cmd.package, &cmd.manifest_roots)?;
    let catalog = catalog::Catalog::resolve(&mut universe)?;
    let handler_set = handlers::HandlerSet::new(&catalog);
    let target = universe.lookup_target(&cmd.package, &cmd.target)?;
    plan::build_plan(&universe, &catalog, &handler_set, &target, VERSION)
}
