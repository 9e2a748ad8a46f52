//! Cache layout and the version-stamp gate.
//!
//! The gate never raises: any file that does not carry the expected
//! top-level `VERSION` constant with a byte-identical literal is simply a
//! miss and gets regenerated.

use std::path::{Path, PathBuf};

use crate::Target;

/// Directory for a package's scripts: the import path with its separators
/// normalized to the platform's.
pub fn package_dir(cache_root: &Path, package: &str) -> PathBuf {
    let mut dir = cache_root.to_path_buf();
    for seg in package.split('/') {
        dir.push(seg);
    }
    dir
}

/// `<cacheRoot>/<package>/<Function or Var.Function>.rs`
pub fn script_path(cache_root: &Path, package: &str, target: &Target) -> PathBuf {
    let name = match &target.global_var {
        Some(var) => format!("{var}.{}", target.function),
        None => target.function.clone(),
    };
    package_dir(cache_root, package).join(format!("{name}.rs"))
}

/// True when the file at `path` exists and stamps the given version.
pub fn file_version_ok(path: &Path, version: &str) -> bool {
    match std::fs::read_to_string(path) {
        Ok(src) => scan_version(&src).as_deref() == Some(version),
        Err(_) => false,
    }
}

/// Extracts the string literal from a top-level `const VERSION: &str = "…";`
/// declaration. Anything else (nested declaration, other initializer
/// shape, escapes in the literal) yields `None`.
pub fn scan_version(src: &str) -> Option<String> {
    const PREFIX: &str = "const VERSION: &str = \"";
    let mut depth: i32 = 0;
    for line in src.lines() {
        let line = line.trim();
        if line.starts_with("//") {
            continue;
        }
        if depth == 0 {
            if let Some(rest) = line.strip_prefix(PREFIX) {
                let lit = rest.strip_suffix("\";")?;
                if lit.contains('"') || lit.contains('\\') {
                    return None;
                }
                return Some(lit.to_string());
            }
        }
        for c in line.chars() {
            match c {
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(function: &str) -> Target {
        Target {
            global_var: None,
            function: function.to_string(),
        }
    }

    #[test]
    fn script_paths() {
        let root = Path::new("/cache");
        assert_eq!(
            script_path(root, "math", &target("Sqrt")),
            Path::new("/cache/math/Sqrt.rs")
        );
        assert_eq!(
            script_path(root, "encoding/json", &target("Indent")),
            Path::new("/cache/encoding/json/Indent.rs")
        );
        let t = Target {
            global_var: Some("StdEncoding".to_string()),
            function: "EncodeToString".to_string(),
        };
        assert_eq!(
            script_path(root, "encoding/base64", &t),
            Path::new("/cache/encoding/base64/StdEncoding.EncodeToString.rs")
        );
    }

    #[test]
    fn scans_the_version_constant() {
        let src = "// Code generated by gorram; do not edit.\n\nuse std::env;\n\nconst VERSION: &str = \"1.2.3  stamp\";\n\nfn main() {}\n";
        assert_eq!(scan_version(src).as_deref(), Some("1.2.3  stamp"));
    }

    #[test]
    fn nested_constant_is_a_miss() {
        let src = "fn main() {\n    const VERSION: &str = \"1.2.3\";\n}\n";
        assert_eq!(scan_version(src), None);
    }

    #[test]
    fn other_shapes_are_misses() {
        assert_eq!(scan_version(""), None);
        assert_eq!(scan_version("static VERSION: &str = \"x\";\n"), None);
        assert_eq!(scan_version("const VERSION: &str = concat!(\"a\", \"b\");\n"), None);
        assert_eq!(scan_version("const VERSION: &str = \"unterminated;\n"), None);
        // Escapes disqualify the literal rather than being interpreted.
        assert_eq!(scan_version("const VERSION: &str = \"a\\\"b\";\n"), None);
    }

    #[test]
    fn comment_lines_are_skipped() {
        let src = "// const VERSION: &str = \"phantom\";\nconst VERSION: &str = \"real\";\n";
        assert_eq!(scan_version(src).as_deref(), Some("real"));
    }

    #[test]
    fn missing_file_is_a_miss() {
        assert!(!file_version_ok(
            Path::new("/no/such/gorram/script.rs"),
            "1.0"
        ));
    }
}
