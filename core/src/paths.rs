//! Path translator: logical search scope to engine arguments

use crate::config::EngineKind;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

/// Path arguments for one engine invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathArgs {
    /// Anchored path regex passed with `-f` to the indexed engine
    Filter(String),
    /// Positional paths for line-grep engines
    Literal(Vec<String>),
}

/// Resolve scope specifiers against the project roots
///
/// Absolute specifiers are kept. A relative specifier whose first segment is
/// a string suffix of a root path resolves under every such root, so `app`
/// also selects `/work/webapp`.
/// Anything else narrows each root through a wildcard join. An empty scope
/// yields exactly the roots.
pub fn resolve_scope(scope: &[String], roots: &[PathBuf]) -> Vec<String> {
    let specs: Vec<&str> = scope
        .iter()
        .map(String::as_str)
        .filter(|spec| !spec.is_empty())
        .collect();

    if specs.is_empty() {
        return roots.iter().map(|root| path_string(root)).collect();
    }

    let mut resolved = Vec::new();
    for spec in specs {
        if is_absolute(spec) {
            resolved.push(spec.to_string());
            continue;
        }

        let (first, rest) = split_first_segment(spec);
        let named: Vec<&PathBuf> = roots
            .iter()
            .filter(|root| !first.is_empty() && path_string(root).ends_with(first))
            .collect();

        if named.is_empty() {
            for root in roots {
                resolved.push(format!("{}*{}", path_string(root), spec));
            }
        } else {
            for root in named {
                resolved.push(if rest.is_empty() {
                    path_string(root)
                } else {
                    path_string(&root.join(rest))
                });
            }
        }
    }
    resolved
}

/// Escape regex metacharacters, then turn each run of `*` into `.*`
pub fn path_to_regex(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 8);
    let mut in_wildcard = false;
    for c in path.chars() {
        if c == '*' {
            if !in_wildcard {
                out.push_str(".*");
                in_wildcard = true;
            }
            continue;
        }
        in_wildcard = false;
        if is_regex_meta(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Anchored alternation over the given paths: `^((p1)|(p2))`
pub fn path_filter_regex<S: AsRef<str>>(paths: &[S]) -> String {
    let alternatives: Vec<String> = paths
        .iter()
        .map(|path| format!("({})", path_to_regex(path.as_ref())))
        .collect();
    format!("^({})", alternatives.join("|"))
}

/// Path arguments for `kind`; whole-project roots end with a separator for
/// line-grep engines
pub fn engine_path_args(kind: EngineKind, scope: &[String], roots: &[PathBuf]) -> PathArgs {
    let resolved = resolve_scope(scope, roots);
    if kind.is_indexed() {
        return PathArgs::Filter(path_filter_regex(&resolved));
    }

    let whole_project = scope.iter().all(|spec| spec.is_empty());
    if whole_project {
        PathArgs::Literal(
            resolved
                .into_iter()
                .map(|mut root| {
                    if !root.ends_with(['/', '\\']) {
                        root.push(MAIN_SEPARATOR);
                    }
                    root
                })
                .collect(),
        )
    } else {
        PathArgs::Literal(resolved)
    }
}

fn is_regex_meta(c: char) -> bool {
    matches!(
        c,
        '\\' | '.' | '+' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$' | '#' | '&'
            | '-' | '~'
    )
}

fn is_absolute(spec: &str) -> bool {
    if Path::new(spec).is_absolute() || spec.starts_with('/') || spec.starts_with('\\') {
        return true;
    }
    // Drive-letter paths count as absolute on every platform
    let bytes = spec.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'/' || bytes[2] == b'\\')
}

fn split_first_segment(spec: &str) -> (&str, &str) {
    match spec.find(['/', '\\']) {
        Some(idx) => (&spec[..idx], spec[idx + 1..].trim_start_matches(['/', '\\'])),
        None => (spec, ""),
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    fn roots() -> Vec<PathBuf> {
        vec![PathBuf::from("/work/app"), PathBuf::from("/work/lib")]
    }

    fn scope(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_absolute_specifiers_unchanged() {
        let specs = scope(&["/etc/hosts", "/work/app/src"]);
        assert_eq!(resolve_scope(&specs, &roots()), specs);
    }

    #[test]
    fn test_empty_scope_is_roots() {
        let expected = vec!["/work/app".to_string(), "/work/lib".to_string()];
        assert_eq!(resolve_scope(&[], &roots()), expected);
        assert_eq!(resolve_scope(&scope(&["", ""]), &roots()), expected);
    }

    #[test]
    fn test_root_name_prefix() {
        assert_eq!(
            resolve_scope(&scope(&["app/src/main.rs"]), &roots()),
            vec!["/work/app/src/main.rs"]
        );
        assert_eq!(resolve_scope(&scope(&["lib"]), &roots()), vec!["/work/lib"]);
    }

    #[test]
    fn test_root_name_matches_string_suffix() {
        let roots = vec![PathBuf::from("/work/webapp"), PathBuf::from("/work/lib")];
        assert_eq!(
            resolve_scope(&scope(&["app/src"]), &roots),
            vec!["/work/webapp/src"]
        );
    }

    #[test]
    fn test_unmatched_relative_falls_back_to_wildcard_join() {
        assert_eq!(
            resolve_scope(&scope(&["src"]), &roots()),
            vec!["/work/app*src", "/work/lib*src"]
        );
    }

    #[test]
    fn test_path_to_regex_escapes_before_wildcards() {
        assert_eq!(path_to_regex("a.b"), r"a\.b");
        assert_eq!(path_to_regex("*.min.js"), r".*\.min\.js");
        assert_eq!(path_to_regex("a**b"), "a.*b");
        assert_eq!(path_to_regex("x(1)+[2]"), r"x\(1\)\+\[2\]");
    }

    #[test]
    fn test_path_filter_regex_shape() {
        let inputs = ["/work/app", "/tmp/a+b (copy)", "/work/lib*src"];
        let regex = path_filter_regex(&inputs);
        assert!(regex.starts_with("^("));
        assert!(regex.ends_with(')'));

        let compiled = Regex::new(&regex).unwrap();
        assert!(compiled.is_match("/tmp/a+b (copy)/file.txt"));
        assert!(compiled.is_match("/work/lib/nested/src/x.rs"));
        assert!(!compiled.is_match("/tmp/aab (copy)"));
        assert!(!compiled.is_match("x/work/app"));
    }

    #[test]
    fn test_engine_path_args() {
        match engine_path_args(EngineKind::Indexed, &[], &roots()) {
            PathArgs::Filter(regex) => assert_eq!(regex, "^((/work/app)|(/work/lib))"),
            other => panic!("unexpected {:?}", other),
        }

        let sep = MAIN_SEPARATOR;
        assert_eq!(
            engine_path_args(EngineKind::Ripgrep, &[], &roots()),
            PathArgs::Literal(vec![format!("/work/app{}", sep), format!("/work/lib{}", sep)])
        );
        assert_eq!(
            engine_path_args(EngineKind::SilverSearcher, &scope(&["/tmp/x"]), &roots()),
            PathArgs::Literal(vec!["/tmp/x".to_string()])
        );
    }

    #[test]
    fn test_no_roots_never_panics() {
        assert!(resolve_scope(&scope(&["src"]), &[]).is_empty());
        assert_eq!(path_filter_regex::<String>(&[]), "^()");
    }
}
