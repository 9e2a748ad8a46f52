//! Lookup errors across manifest roots: wrong kinds, unexported symbols,
//! method forms, and root ambiguity.

use std::path::PathBuf;

use gorram_gen::loader::Universe;
use gorram_gen::{GenErrorKind, Target};

fn make_temp_root(prefix: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    for n in 0..10_000u32 {
        let p = base.join(format!("gorram-lookup-{prefix}-{pid}-{n}"));
        if std::fs::create_dir(&p).is_ok() {
            return p;
        }
    }
    panic!("failed to create temp dir under {}", base.display());
}

fn write_manifest(root: &PathBuf, package: &str, body: &str) {
    let mut path = root.clone();
    for seg in package.split('/') {
        path.push(seg);
    }
    path.set_extension("gorram.json");
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).expect("mkdir");
    }
    std::fs::write(&path, body).expect("write manifest");
}

const FIXTURE: &str = r#"{
    "schema_version": "1",
    "package": "fixture",
    "types": [
        { "name": "Gauge",
          "kind": "struct",
          "fields": [ { "name": "Level", "type": "int" } ],
          "methods": [
            { "name": "Read",
              "params": [ { "name": "p", "type": "bytes" } ],
              "results": [ { "name": "n", "type": "int" }, { "type": "error" } ] },
            { "name": "reset", "pub": false, "params": [], "results": [] }
          ] }
    ],
    "vars": [
        { "name": "Default", "type": "Gauge" },
        { "name": "hidden", "pub": false, "type": "Gauge" }
    ],
    "funcs": [
        { "name": "Open", "params": [], "results": [ { "type": "error" } ] },
        { "name": "internal", "pub": false, "params": [], "results": [] }
    ]
}"#;

fn fixture_universe(root: &PathBuf) -> Universe {
    write_manifest(root, "fixture", FIXTURE);
    Universe::load("fixture", std::slice::from_ref(root)).expect("load")
}

fn lookup_err(u: &Universe, target: Target) -> String {
    let err = u.lookup_target("fixture", &target).expect_err("must fail");
    assert_eq!(err.kind, GenErrorKind::Lookup);
    err.message
}

#[test]
fn function_error_forms() {
    let root = make_temp_root("funcs");
    let u = fixture_universe(&root);
    assert_eq!(
        lookup_err(&u, Target::function("Missing")),
        "fixture.Missing not found"
    );
    assert_eq!(
        lookup_err(&u, Target::function("Default")),
        "fixture.Default is not a function"
    );
    assert_eq!(
        lookup_err(&u, Target::function("internal")),
        "fixture.internal is not exported"
    );
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn method_error_forms() {
    let root = make_temp_root("methods");
    let u = fixture_universe(&root);
    assert_eq!(
        lookup_err(&u, Target::method("Missing", "Read")),
        "fixture.Missing not found"
    );
    assert_eq!(
        lookup_err(&u, Target::method("Open", "Read")),
        "fixture.Open is not a global variable"
    );
    assert_eq!(
        lookup_err(&u, Target::method("hidden", "Read")),
        "fixture.hidden is not exported"
    );
    assert_eq!(
        lookup_err(&u, Target::method("Default", "Missing")),
        "fixture.Default.Missing not found"
    );
    // Selecting a struct field is not a method call.
    assert_eq!(
        lookup_err(&u, Target::method("Default", "Level")),
        "fixture.Default.Level is not a method"
    );
    assert_eq!(
        lookup_err(&u, Target::method("Default", "reset")),
        "fixture.Default.reset is not exported"
    );
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn method_lookup_succeeds_for_the_exported_method() {
    let root = make_temp_root("ok");
    let u = fixture_universe(&root);
    let t = u
        .lookup_target("fixture", &Target::method("Default", "Read"))
        .expect("lookup");
    assert_eq!(t.global_var.as_deref(), Some("Default"));
    assert_eq!(t.sig.params.len(), 1);
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn ambiguous_roots_are_rejected() {
    let a = make_temp_root("amb-a");
    let b = make_temp_root("amb-b");
    write_manifest(&a, "dup", r#"{ "schema_version": "1", "package": "dup" }"#);
    write_manifest(&b, "dup", r#"{ "schema_version": "1", "package": "dup" }"#);
    let err = Universe::load("dup", &[a.clone(), b.clone()]).expect_err("ambiguous");
    assert_eq!(err.kind, GenErrorKind::Lookup);
    assert!(err.message.contains("ambiguous"), "message={}", err.message);
    let _ = std::fs::remove_dir_all(&a);
    let _ = std::fs::remove_dir_all(&b);
}

#[test]
fn manifest_package_must_match_its_path() {
    let root = make_temp_root("mismatch");
    write_manifest(
        &root,
        "claims",
        r#"{ "schema_version": "1", "package": "something/else" }"#,
    );
    let err = Universe::load("claims", std::slice::from_ref(&root)).expect_err("mismatch");
    assert!(
        err.message.contains("declares package"),
        "message={}",
        err.message
    );
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn invalid_package_paths_are_rejected() {
    for bad in ["", "a//b", "../escape", "a/./b"] {
        let err = Universe::load(bad, &[]).expect_err("invalid path");
        assert_eq!(err.kind, GenErrorKind::Lookup, "path {bad:?}");
    }
}
