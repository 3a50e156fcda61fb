//! File path → module path mapping.

use std::path::{Component, Path};

/// Root segment of every module path.
pub const CRATE: &str = "crate";

/// Derives the module path of `file` relative to the source directory.
///
/// `lib.rs`, `main.rs` and `mod.rs` name their directory's module:
///
/// | file | module |
/// |---|---|
/// | `lib.rs` | `crate` |
/// | `domain/mod.rs` | `crate::domain` |
/// | `domain/user.rs` | `crate::domain::user` |
#[must_use]
pub fn module_path(src_dir: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(src_dir).unwrap_or(file);
    let mut segments: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if let Some(last) = segments.pop() {
        let stem = last.strip_suffix(".rs").unwrap_or(&last);
        let is_root = segments.is_empty() && matches!(stem, "lib" | "main");
        if !is_root && stem != "mod" {
            segments.push(stem.to_string());
        }
    }

    std::iter::once(CRATE.to_string())
        .chain(segments)
        .collect::<Vec<_>>()
        .join("::")
}

/// Parent of a module path, `None` for the crate root.
#[must_use]
pub fn parent(module: &str) -> Option<&str> {
    module.rsplit_once("::").map(|(parent, _)| parent)
}

/// Joins a child segment onto a module path.
#[must_use]
pub fn child(module: &str, name: &str) -> String {
    format!("{module}::{name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_files_map_to_crate() {
        let src = Path::new("/p/src");
        assert_eq!(module_path(src, Path::new("/p/src/lib.rs")), "crate");
        assert_eq!(module_path(src, Path::new("/p/src/main.rs")), "crate");
    }

    #[test]
    fn nested_files_map_to_modules() {
        let src = Path::new("/p/src");
        assert_eq!(
            module_path(src, Path::new("/p/src/domain/mod.rs")),
            "crate::domain"
        );
        assert_eq!(
            module_path(src, Path::new("/p/src/domain/user.rs")),
            "crate::domain::user"
        );
        // Only the crate root collapses `lib.rs`.
        assert_eq!(
            module_path(src, Path::new("/p/src/domain/lib.rs")),
            "crate::domain::lib"
        );
    }

    #[test]
    fn parent_and_child() {
        assert_eq!(parent("crate::domain::user"), Some("crate::domain"));
        assert_eq!(parent("crate"), None);
        assert_eq!(child("crate", "app"), "crate::app");
    }
}
