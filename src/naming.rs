//! Module identifiers
//!
//! A module identifier is the dotted path of a source file relative to the
//! project root (`pkg/sub/file.py` -> `pkg.sub.file`), optionally truncated to
//! a grouping level.

use std::path::{Component, Path};

/// Source file extension of the analyzed language
pub const SOURCE_EXTENSION: &str = "py";

/// Truncate `module` to its first `level` dot-separated segments.
///
/// `level < 1` leaves the identifier untouched. Truncation is idempotent.
pub fn adjust_module_name_to_level(module: &str, level: i32) -> String {
    if level < 1 {
        return module.to_string();
    }
    module
        .split('.')
        .take(level as usize)
        .collect::<Vec<_>>()
        .join(".")
}

/// Derive the dotted identifier of `file` relative to `project_root`.
///
/// Returns `None` when the file is outside the root, has a non-UTF-8
/// component, or lacks the source extension.
pub fn module_name_from_path(project_root: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(project_root).ok()?;
    if relative.extension()?.to_str()? != SOURCE_EXTENSION {
        return None;
    }
    let relative = relative.with_extension("");

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => segments.push(part.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }

    if segments.is_empty() {
        None
    } else {
        Some(segments.join("."))
    }
}

/// Check whether a dotted import path lies inside the `package` namespace
pub fn is_in_namespace(module: &str, package: &str) -> bool {
    module == package
        || module
            .strip_prefix(package)
            .is_some_and(|rest| rest.starts_with('.'))
}

/// Drop the leading namespace segment (`pkg.sub.file` -> `sub.file`)
pub fn strip_root_segment(module: &str) -> String {
    match module.split_once('.') {
        Some((_, rest)) => rest.to_string(),
        None => String::new(),
    }
}
