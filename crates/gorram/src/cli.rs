//! Flag parsing and the synthesize-then-run pipeline behind the binary.
//!
//! Exit codes: 0 on success or help; 1 when the downstream compile or run
//! failed after synthesis (its output already streamed, so no extra
//! message); 2 on synthesis or argument failure.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};

use gorram_gen::Target;

use crate::paths;

const LONG_ABOUT: &str = "\
Executes an exported function, or a method on an exported global variable, \
from a package described by an interface manifest. The package must be named \
by its full import path, e.g. encoding/json.

Most scalar parameter types are supported, and stream parameters (a byte \
sequence, string, or reader) read from stdin, or from a file when its name \
is given as an argument. Return values are printed to stdout; functions with \
an output argument such as a writer or *bytes.Buffer have it wired up and \
drained to stdout automatically.

A template given with -t may be a template definition (e.g. {{.Status}}) or \
a filename, in which case the file's contents are used as the template.

Scripts live under $GORRAM_CACHE (default: a gorram directory under your \
home). Run with -r to regenerate a script; otherwise it is reused.";

#[derive(Parser, Debug)]
#[command(name = "gorram")]
#[command(about = "Run an exported package function as a command-line tool.")]
#[command(long_about = LONG_ABOUT)]
pub struct Cli {
    /// Regenerate the cached script even if it is current.
    #[arg(short = 'r')]
    pub regen: bool,

    /// Format the output with a template (inline text or a file path).
    #[arg(short = 't', value_name = "TEMPLATE")]
    pub template: Option<String>,

    /// Extra directory searched for package manifests (repeatable).
    #[arg(long = "manifest-root", value_name = "DIR")]
    pub manifest_roots: Vec<PathBuf>,

    /// Package import path, e.g. encoding/json.
    #[arg(value_name = "PKG")]
    pub package: Option<String>,

    /// Function or Var.Method to call.
    #[arg(value_name = "FUNC")]
    pub target: Option<String>,

    /// Arguments passed through to the function.
    #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Maps a flag-parsing outcome to the process result. Help requests print
/// the usage to stderr and exit 0; any other parse failure is an argument
/// error (stderr, exit 2). Stdout stays reserved for the wrapper's output.
pub fn report_parse_error(err: clap::Error) -> ExitCode {
    eprint!("{err}");
    match err.kind() {
        ErrorKind::DisplayHelp => ExitCode::SUCCESS,
        _ => ExitCode::from(2),
    }
}

/// `Function` or `Var.Method`.
pub fn parse_target(spec: &str) -> Result<Target> {
    let parts: Vec<&str> = spec.split('.').collect();
    match parts.as_slice() {
        [f] if !f.is_empty() => Ok(Target::function(*f)),
        [v, f] if !v.is_empty() && !f.is_empty() => Ok(Target::method(*v, *f)),
        _ => bail!(
            "command {spec:?} invalid; expected \"importpath Function\" or \"importpath Variable.Method\""
        ),
    }
}

/// A template value naming a readable file means the file's contents;
/// anything else is the template text itself.
pub fn resolve_template(value: &str) -> String {
    match std::fs::read_to_string(value) {
        Ok(contents) => contents,
        Err(_) => value.to_string(),
    }
}

pub fn run(cli: Cli) -> ExitCode {
    let Some(package) = &cli.package else {
        // Bare invocation: usage goes to stderr, exit cleanly.
        let mut cmd = Cli::command();
        let _ = cmd.write_help(&mut std::io::stderr());
        return ExitCode::SUCCESS;
    };
    let Some(target_spec) = &cli.target else {
        eprintln!(
            "missing <FUNC>: expected \"importpath Function\" or \"importpath Variable.Method\""
        );
        return ExitCode::from(2);
    };

    let target = match parse_target(target_spec) {
        Ok(t) => t,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(2);
        }
    };

    let env = |key: &str| std::env::var(key).ok();
    let mut manifest_roots = paths::manifest_roots(&env);
    manifest_roots.extend(cli.manifest_roots.iter().cloned());

    let cmd = gorram_gen::Command {
        package: package.clone(),
        target,
        args: cli.args.clone(),
        regen: cli.regen,
        cache_root: paths::cache_root(&env),
        manifest_roots,
    };

    let script = match gorram_gen::generate(&cmd) {
        Ok(path) => path,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(2);
        }
    };

    let template = cli.template.as_deref().map(resolve_template);
    match gorram_runner::run_script(&script, &cmd.args, template.as_deref()) {
        Ok(0) => ExitCode::SUCCESS,
        // The child owned stderr; stay silent and report failure.
        Ok(_) => ExitCode::from(1),
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_function_target() {
        let t = parse_target("Sqrt").expect("target");
        assert_eq!(t, Target::function("Sqrt"));
    }

    #[test]
    fn parses_a_var_method_target() {
        let t = parse_target("StdEncoding.EncodeToString").expect("target");
        assert_eq!(t, Target::method("StdEncoding", "EncodeToString"));
    }

    #[test]
    fn rejects_deeper_selectors() {
        let err = parse_target("A.B.C").expect_err("must fail");
        assert!(err.to_string().contains("invalid"), "err={err}");
    }

    #[test]
    fn rejects_empty_segments() {
        assert!(parse_target("").is_err());
        assert!(parse_target(".Method").is_err());
        assert!(parse_target("Var.").is_err());
    }

    #[test]
    fn help_flags_surface_as_display_help() {
        let err = Cli::try_parse_from(["gorram", "-h"]).expect_err("help is an Err");
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        let err = Cli::try_parse_from(["gorram", "--help"]).expect_err("help is an Err");
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        // Anything else stays an ordinary argument error.
        let err = Cli::try_parse_from(["gorram", "--no-such-flag"]).expect_err("unknown flag");
        assert_ne!(err.kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn flag_surface() {
        let cli = Cli::try_parse_from([
            "gorram",
            "-r",
            "-t",
            "{{.Status}}",
            "net/http",
            "Get",
            "http://example.com/",
        ])
        .expect("parse");
        assert!(cli.regen);
        assert_eq!(cli.template.as_deref(), Some("{{.Status}}"));
        assert_eq!(cli.package.as_deref(), Some("net/http"));
        assert_eq!(cli.target.as_deref(), Some("Get"));
        assert_eq!(cli.args, vec!["http://example.com/".to_string()]);
    }

    #[test]
    fn trailing_args_may_look_like_flags() {
        let cli = Cli::try_parse_from(["gorram", "strings", "Repeat", "-", "3"]).expect("parse");
        assert_eq!(cli.args, vec!["-".to_string(), "3".to_string()]);
    }

    #[test]
    fn missing_template_file_is_literal() {
        let v = resolve_template("{{.Status}}");
        assert_eq!(v, "{{.Status}}");
    }

    #[test]
    fn template_file_contents_win() {
        let dir = std::env::temp_dir().join(format!("gorram-cli-tmpl-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("mkdir");
        let path = dir.join("t.tmpl");
        std::fs::write(&path, "{{.StatusCode}}").expect("write");
        let v = resolve_template(path.to_str().expect("utf8 path"));
        assert_eq!(v, "{{.StatusCode}}");
        let _ = std::fs::remove_dir_all(&dir);
    }
}
