//! Cache-root and manifest-root resolution from the process environment.
//! The lookups take the environment as a function so the rules stay
//! testable without mutating process state.

use std::path::PathBuf;

pub const CACHE_ENV: &str = "GORRAM_CACHE";
pub const MANIFEST_PATH_ENV: &str = "GORRAM_PATH";

/// `GORRAM_CACHE` wins; otherwise a per-user directory under the home
/// directory (`%HOMEDRIVE%%HOMEPATH%\gorram` on Windows, `$HOME/.gorram`
/// elsewhere).
pub fn cache_root(env: &dyn Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(v) = env(CACHE_ENV) {
        if !v.is_empty() {
            return PathBuf::from(v);
        }
    }
    if cfg!(windows) {
        let mut p = PathBuf::from(env("HOMEDRIVE").unwrap_or_default());
        p.push(env("HOMEPATH").unwrap_or_default());
        p.push("gorram");
        p
    } else {
        let mut p = PathBuf::from(env("HOME").unwrap_or_default());
        p.push(".gorram");
        p
    }
}

/// Manifest roots from `GORRAM_PATH`, split on the platform's path-list
/// separator.
pub fn manifest_roots(env: &dyn Fn(&str) -> Option<String>) -> Vec<PathBuf> {
    let Some(v) = env(MANIFEST_PATH_ENV) else {
        return Vec::new();
    };
    let sep = if cfg!(windows) { ';' } else { ':' };
    v.split(sep)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn env_of(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn cache_env_wins() {
        let env = env_of(&[(CACHE_ENV, "/tmp/gorram-cache"), ("HOME", "/home/me")]);
        let root = cache_root(&|k| env.get(k).cloned());
        assert_eq!(root, PathBuf::from("/tmp/gorram-cache"));
    }

    #[cfg(not(windows))]
    #[test]
    fn default_is_dot_gorram_under_home() {
        let env = env_of(&[("HOME", "/home/me")]);
        let root = cache_root(&|k| env.get(k).cloned());
        assert_eq!(root, PathBuf::from("/home/me/.gorram"));
    }

    #[test]
    fn empty_cache_env_falls_through() {
        let env = env_of(&[(CACHE_ENV, ""), ("HOME", "/home/me")]);
        let root = cache_root(&|k| env.get(k).cloned());
        assert_ne!(root, PathBuf::from(""));
    }

    #[cfg(not(windows))]
    #[test]
    fn manifest_roots_split_on_colon() {
        let env = env_of(&[(MANIFEST_PATH_ENV, "/a:/b::/c")]);
        let roots = manifest_roots(&|k| env.get(k).cloned());
        assert_eq!(
            roots,
            vec![
                PathBuf::from("/a"),
                PathBuf::from("/b"),
                PathBuf::from("/c")
            ]
        );
    }

    #[test]
    fn missing_manifest_path_is_empty() {
        let env = env_of(&[]);
        assert!(manifest_roots(&|k| env.get(k).cloned()).is_empty());
    }
}
