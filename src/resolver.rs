//! Import resolution
//!
//! `from a.b import c` is ambiguous: `c` may be a module (`a/b/c.py`), a
//! package (`a/b/c/__init__.py`) or a symbol defined in `a/b.py`. The resolver
//! tries the longest candidate first and drops trailing segments until a file
//! matches or a single segment has been tried.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::naming::{SOURCE_EXTENSION, module_name_from_path};

const PACKAGE_INIT: &str = "__init__.py";

/// A raw `from <module> import <name>` reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImportRef {
    /// Dotted module path after `from`
    pub module: String,
    /// Imported name (the original name when aliased)
    pub name: String,
    /// 1-based line of the import statement
    pub line: usize,
}

impl ImportRef {
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
            line: 0,
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }
}

/// Errors that can occur while resolving an import
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("{module}.{name} cannot be traced back to a module file")]
    Unresolvable { module: String, name: String },
}

/// Resolves import references against files under a project root
#[derive(Debug, Clone)]
pub struct ImportResolver {
    project_root: PathBuf,
}

impl ImportResolver {
    /// `project_root` should be absolute; identifiers are derived relative to it.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
        }
    }

    /// Resolve to the dotted identifier of the defining file
    pub fn resolve(&self, import: &ImportRef) -> Result<String, ResolveError> {
        let file = self.resolve_file(import)?;
        module_name_from_path(&self.project_root, &file).ok_or_else(|| unresolvable(import))
    }

    /// Resolve to the path of the defining file
    pub fn resolve_file(&self, import: &ImportRef) -> Result<PathBuf, ResolveError> {
        let mut segments: Vec<&str> = import
            .module
            .split('.')
            .chain(import.name.split('.'))
            .collect();

        if segments.iter().any(|s| s.is_empty()) {
            return Err(unresolvable(import));
        }

        loop {
            if let Some(found) = self.candidate_file(&segments) {
                return Ok(found);
            }
            if segments.len() < 2 {
                return Err(unresolvable(import));
            }
            segments.pop();
        }
    }

    /// `<segments>.py`, then `<segments>/__init__.py`
    fn candidate_file(&self, segments: &[&str]) -> Option<PathBuf> {
        let mut base = self.project_root.clone();
        base.extend(segments);

        let module_file = base.with_extension(SOURCE_EXTENSION);
        if module_file.is_file() {
            return Some(module_file);
        }

        let package_init = base.join(PACKAGE_INIT);
        if package_init.is_file() {
            return Some(package_init);
        }

        None
    }
}

fn unresolvable(import: &ImportRef) -> ResolveError {
    ResolveError::Unresolvable {
        module: import.module.clone(),
        name: import.name.clone(),
    }
}

/// Resolve a single import without keeping a resolver around
pub fn resolve_import(project_root: &Path, module: &str, name: &str) -> Result<String, ResolveError> {
    ImportResolver::new(project_root).resolve(&ImportRef::new(module, name))
}
