//! Cache-gate behavior of `generate`: stamped scripts are reused, anything
//! else is overwritten, and emission is byte-deterministic.
//!
//! The external formatter is replaced with `true` so the written text stays
//! exactly what the template produced.

use std::path::PathBuf;

use gorram_gen::{generate, Command, Target, VERSION};

fn use_noop_formatter() {
    std::env::set_var(gorram_gen::emit::RUSTFMT_ENV, "true");
}

fn make_temp_cache(prefix: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    for n in 0..10_000u32 {
        let p = base.join(format!("gorram-cache-{prefix}-{pid}-{n}"));
        if std::fs::create_dir(&p).is_ok() {
            return p;
        }
    }
    panic!("failed to create temp dir under {}", base.display());
}

fn command(package: &str, target: Target, cache_root: PathBuf) -> Command {
    Command {
        package: package.to_string(),
        target,
        args: Vec::new(),
        regen: false,
        cache_root,
        manifest_roots: Vec::new(),
    }
}

#[test]
fn generates_under_the_package_path() {
    use_noop_formatter();
    let root = make_temp_cache("layout");
    let cmd = command("encoding/json", Target::function("Indent"), root.clone());
    let path = generate(&cmd).expect("generate");
    assert_eq!(path, root.join("encoding").join("json").join("Indent.rs"));
    let src = std::fs::read_to_string(&path).expect("read script");
    assert_eq!(
        gorram_gen::cache::scan_version(&src).as_deref(),
        Some(VERSION)
    );
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn stamped_script_is_reused_without_a_write() {
    use_noop_formatter();
    let root = make_temp_cache("reuse");
    let path = root.join("math").join("Sqrt.rs");
    std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    let marker = format!("// handcrafted marker\nconst VERSION: &str = \"{VERSION}\";\n");
    std::fs::write(&path, &marker).expect("write");

    let cmd = command("math", Target::function("Sqrt"), root.clone());
    let got = generate(&cmd).expect("generate");
    assert_eq!(got, path);
    let after = std::fs::read_to_string(&path).expect("read");
    assert_eq!(after, marker, "a cache hit must not rewrite the script");
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn version_mismatch_overwrites() {
    use_noop_formatter();
    let root = make_temp_cache("stale");
    let path = root.join("math").join("Sqrt.rs");
    std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    std::fs::write(
        &path,
        "// stale marker\nconst VERSION: &str = \"0.0.0  long ago\";\n",
    )
    .expect("write");

    let cmd = command("math", Target::function("Sqrt"), root.clone());
    generate(&cmd).expect("generate");
    let after = std::fs::read_to_string(&path).expect("read");
    assert!(!after.contains("stale marker"));
    assert!(after.contains("fn main()"));
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn regen_flag_overwrites_a_current_script() {
    use_noop_formatter();
    let root = make_temp_cache("regen");
    let path = root.join("math").join("Sqrt.rs");
    std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    let marker = format!("// current but handcrafted\nconst VERSION: &str = \"{VERSION}\";\n");
    std::fs::write(&path, &marker).expect("write");

    let mut cmd = command("math", Target::function("Sqrt"), root.clone());
    cmd.regen = true;
    generate(&cmd).expect("generate");
    let after = std::fs::read_to_string(&path).expect("read");
    assert!(!after.contains("handcrafted"));
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn emission_is_byte_deterministic() {
    use_noop_formatter();
    let root = make_temp_cache("determinism");
    let mut cmd = command(
        "encoding/base64",
        Target::method("StdEncoding", "EncodeToString"),
        root.clone(),
    );
    let path = generate(&cmd).expect("generate");
    let first = std::fs::read(&path).expect("read");
    cmd.regen = true;
    generate(&cmd).expect("generate again");
    let second = std::fs::read(&path).expect("read");
    assert_eq!(first, second);
    let _ = std::fs::remove_dir_all(&root);
}

#[cfg(unix)]
#[test]
fn cache_tree_has_restrictive_permissions() {
    use std::os::unix::fs::PermissionsExt;
    use_noop_formatter();
    let root = make_temp_cache("perms");
    let cmd = command("math", Target::function("Abs"), root.clone());
    let path = generate(&cmd).expect("generate");

    let dir_mode = path
        .parent()
        .expect("parent")
        .metadata()
        .expect("dir metadata")
        .permissions()
        .mode();
    assert_eq!(dir_mode & 0o777, 0o700, "dir mode {dir_mode:o}");

    let file_mode = path.metadata().expect("metadata").permissions().mode();
    assert_eq!(file_mode & 0o777, 0o600, "file mode {file_mode:o}");
    let _ = std::fs::remove_dir_all(&root);
}
