//! Module dependency graph builder
//!
//! Walks every source file beneath the package directory, parses its
//! top-level declarations, resolves each in-namespace import to the module
//! that defines it, and aggregates the resulting edges into
//! [`CouplingMetrics`].
//!
//! The per-file phase runs in parallel via Rayon and only reads shared state.
//! Results are collected in walk order and reduced serially, so the output is
//! identical whatever the thread count.

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use thiserror::Error;
use walkdir::WalkDir;

use crate::config::{AnalysisOptions, ConfigError, ParseFailurePolicy, ValidatedOptions};
use crate::diagnostics::{Diagnostics, Level, TracingDiagnostics};
use crate::metrics::{CouplingMetrics, ModuleContribution, SkippedFile};
use crate::naming::{
    SOURCE_EXTENSION, adjust_module_name_to_level, is_in_namespace, module_name_from_path,
};
use crate::parser::{ModuleDeclarations, ParseError, PythonParser};
use crate::resolver::ImportResolver;

/// Errors that can occur during analysis
#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse {path}: {source}")]
    Parse { path: PathBuf, source: ParseError },

    #[error("Failed to walk source tree: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// Result of analyzing a single source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAnalysis {
    /// Identifier after grouping
    pub module_name: String,
    pub abstract_count: usize,
    pub concrete_count: usize,
    /// Grouped identifiers of resolved in-namespace imports, self excluded
    pub dependencies: BTreeSet<String>,
}

impl FileAnalysis {
    fn into_contribution(self) -> (String, ModuleContribution) {
        (
            self.module_name,
            ModuleContribution {
                abstract_count: self.abstract_count,
                concrete_count: self.concrete_count,
                dependencies: self.dependencies,
            },
        )
    }
}

/// Analyze a project, logging through `tracing`
pub fn generate_metrics(
    project_root: &Path,
    package_name: &str,
    level: i32,
) -> Result<CouplingMetrics, AnalyzerError> {
    let options = AnalysisOptions::new(project_root, package_name).with_level(level);
    analyze_project(&options, &TracingDiagnostics)
}

/// Analyze a project, reporting through the given diagnostics sink
pub fn analyze_project(
    options: &AnalysisOptions,
    diagnostics: &dyn Diagnostics,
) -> Result<CouplingMetrics, AnalyzerError> {
    let options = options.validate()?;
    // fail on a broken grammar before touching any file
    PythonParser::new().map_err(|source| AnalyzerError::Parse {
        path: options.package_dir.clone(),
        source,
    })?;

    let (file_paths, mut skipped_files) = source_files(&options, diagnostics)?;
    let resolver = ImportResolver::new(&options.project_root);

    let outcomes: Vec<(PathBuf, Result<FileAnalysis, AnalyzerError>)> = file_paths
        .into_par_iter()
        .map_init(PythonParser::new, |parser, file_path| {
            let result = match parser {
                Ok(parser) => analyze_file(&file_path, &options, &resolver, parser, diagnostics),
                Err(e) => Err(AnalyzerError::Parse {
                    path: file_path.clone(),
                    source: e.clone(),
                }),
            };
            (file_path, result)
        })
        .collect();

    let mut modules: BTreeMap<String, ModuleContribution> = BTreeMap::new();
    let mut total_files = 0;

    for (file_path, outcome) in outcomes {
        match outcome {
            Ok(analysis) => {
                total_files += 1;
                let (module, contribution) = analysis.into_contribution();
                modules.entry(module).or_default().merge(contribution);
            }
            Err(e) => {
                if options.parse_failure == ParseFailurePolicy::Abort {
                    return Err(e);
                }
                diagnostics.record(
                    Level::Warn,
                    &format!("Skipping {}: {}", file_path.display(), e),
                );
                skipped_files.push(SkippedFile {
                    path: file_path,
                    reason: e.to_string(),
                });
            }
        }
    }

    let mut metrics = CouplingMetrics::aggregate(&options.package_name, options.level, modules);
    metrics.total_files = total_files;
    metrics.skipped_files = skipped_files;
    Ok(metrics)
}

/// All non-hidden, non-excluded source files beneath the package directory,
/// in a stable order, plus the entries the walk could not read
///
/// Unreadable entries abort under [`ParseFailurePolicy::Abort`]; otherwise
/// they are reported and returned as skipped.
fn source_files(
    options: &ValidatedOptions,
    diagnostics: &dyn Diagnostics,
) -> Result<(Vec<PathBuf>, Vec<SkippedFile>), AnalyzerError> {
    let mut files = Vec::new();
    let mut skipped = Vec::new();

    let walker = WalkDir::new(&options.package_dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        // hidden directories are pruned before they are read
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                if options.parse_failure == ParseFailurePolicy::Abort {
                    return Err(e.into());
                }
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| options.package_dir.clone());
                diagnostics.record(
                    Level::Warn,
                    &format!("Skipping {}: {}", path.display(), e),
                );
                skipped.push(SkippedFile {
                    path,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let path = entry.path();
        if !entry.file_type().is_file() || path.extension() != Some(OsStr::new(SOURCE_EXTENSION)) {
            continue;
        }
        let relative = path.strip_prefix(&options.project_root).unwrap_or(path);
        if options.should_exclude(&relative.to_string_lossy()) {
            continue;
        }
        files.push(path.to_path_buf());
    }

    Ok((files, skipped))
}

fn is_hidden(name: &OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// Read, parse and resolve one file
pub fn analyze_file(
    file_path: &Path,
    options: &ValidatedOptions,
    resolver: &ImportResolver,
    parser: &mut PythonParser,
    diagnostics: &dyn Diagnostics,
) -> Result<FileAnalysis, AnalyzerError> {
    let full_name = module_name_from_path(&options.project_root, file_path)
        .ok_or_else(|| AnalyzerError::InvalidPath(file_path.display().to_string()))?;
    let module_name = adjust_module_name_to_level(&full_name, options.level);
    diagnostics.record(Level::Info, &format!("Parsing {}", module_name));

    let content = fs::read_to_string(file_path)?;
    let declarations = parser
        .parse(&content)
        .map_err(|source| AnalyzerError::Parse {
            path: file_path.to_path_buf(),
            source,
        })?;

    for class in declarations.classes.iter().filter(|c| c.is_abstract) {
        diagnostics.record(
            Level::Debug,
            &format!(" - abstract class {} (line {})", class.name, class.line),
        );
    }

    let dependencies =
        resolve_dependencies(&declarations, &module_name, options, resolver, diagnostics);

    Ok(FileAnalysis {
        module_name,
        abstract_count: declarations.abstract_count(),
        concrete_count: declarations.concrete_count(),
        dependencies,
    })
}

/// Resolve every in-namespace import of a file to a grouped module identifier
fn resolve_dependencies(
    declarations: &ModuleDeclarations,
    module_name: &str,
    options: &ValidatedOptions,
    resolver: &ImportResolver,
    diagnostics: &dyn Diagnostics,
) -> BTreeSet<String> {
    let mut dependencies = BTreeSet::new();

    for import in &declarations.imports {
        if !is_in_namespace(&import.module, &options.package_name) {
            continue;
        }

        let resolved = match resolver.resolve(import) {
            Ok(resolved) => resolved,
            Err(e) => {
                diagnostics.record(
                    Level::Error,
                    &format!("{} (line {}): {}", module_name, import.line, e),
                );
                continue;
            }
        };
        diagnostics.record(Level::Debug, &format!(" - imports {}", resolved));

        let dependency = adjust_module_name_to_level(&resolved, options.level);
        if dependency != module_name {
            dependencies.insert(dependency);
        }
    }

    dependencies
}
