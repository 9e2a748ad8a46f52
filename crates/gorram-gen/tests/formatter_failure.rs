//! Formatter invocation is a hard synthesis error when it cannot run or
//! exits nonzero. Kept in its own binary: it mutates the formatter
//! override that other suites pin to a no-op.

use std::path::PathBuf;

use gorram_gen::{generate, Command, GenErrorKind, Target};

fn make_temp_cache(prefix: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    for n in 0..10_000u32 {
        let p = base.join(format!("gorram-fmt-{prefix}-{pid}-{n}"));
        if std::fs::create_dir(&p).is_ok() {
            return p;
        }
    }
    panic!("failed to create temp dir under {}", base.display());
}

#[test]
fn formatter_problems_are_io_errors() {
    let root = make_temp_cache("hard-error");
    let cmd = Command {
        package: "math".to_string(),
        target: Target::function("Sqrt"),
        args: Vec::new(),
        // Forced: the first failed attempt leaves a stamped script behind,
        // and a cache hit would skip the formatter entirely.
        regen: true,
        cache_root: root.clone(),
        manifest_roots: Vec::new(),
    };

    // A formatter that cannot be spawned.
    std::env::set_var(
        gorram_gen::emit::RUSTFMT_ENV,
        "gorram-no-such-formatter-binary",
    );
    let err = generate(&cmd).expect_err("spawn failure is fatal");
    assert_eq!(err.kind, GenErrorKind::Io);

    // A formatter that runs and fails.
    std::env::set_var(gorram_gen::emit::RUSTFMT_ENV, "false");
    let err = generate(&cmd).expect_err("nonzero formatter is fatal");
    assert_eq!(err.kind, GenErrorKind::Io);
    assert!(err.message.contains("failed"), "message={}", err.message);

    let _ = std::fs::remove_dir_all(&root);
}
