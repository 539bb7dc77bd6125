//! # py-coupling - Package Coupling Metrics for Python
//!
//! Measures how the modules of a Python package depend on each other, using
//! Robert C. Martin's package metrics.
//!
//! ## Overview
//!
//! For every module beneath the analyzed package, py-coupling computes:
//!
//! 1. **Afferent coupling (Ca)** - how many modules depend on it
//! 2. **Efferent coupling (Ce)** - how many modules it depends on
//! 3. **Instability** - `Ce / (Ce + Ca)`
//! 4. **Abstractness** - share of its top-level declarations that are abstract
//! 5. **Distance from the main sequence** - `|A + I - 1|`
//!
//! and a PlantUML diagram of the module dependencies.
//!
//! ## Usage
//!
//! ```bash
//! # Analyze /home/user/project/my_package
//! py-coupling --project-root /home/user/project --package-name my_package
//!
//! # Group everything two levels deep ("my_package.foo.bar" -> "my_package.foo")
//! py-coupling --project-root . --package-name my_package --level 2
//!
//! # Machine-readable output
//! py-coupling --project-root . --package-name my_package --json
//! ```
//!
//! ## Import Resolution
//!
//! Only `from <module> import <name>` statements whose module lies inside the
//! analyzed package are followed. `<name>` may be a submodule, a package or a
//! symbol; the resolver drops trailing segments until an existing file
//! matches.

pub mod analyzer;
pub mod config;
pub mod diagnostics;
pub mod diagram;
pub mod metrics;
pub mod naming;
pub mod parser;
pub mod report;
pub mod resolver;
pub mod stability;

pub use analyzer::{AnalyzerError, FileAnalysis, analyze_file, analyze_project, generate_metrics};
pub use config::{
    AnalysisOptions, ConfigError, CouplingConfig, ParseFailurePolicy, ValidatedOptions,
    load_config, load_config_file,
};
pub use diagnostics::{
    CollectingDiagnostics, Diagnostics, Level, NullDiagnostics, TracingDiagnostics,
};
pub use diagram::{ArrowStyle, DiagramOptions, render_plantuml, write_plantuml};
pub use metrics::{CouplingMetrics, DiagramEdge, ModuleContribution, SkippedFile};
pub use naming::{adjust_module_name_to_level, module_name_from_path, strip_root_segment};
pub use parser::{ClassDeclaration, ModuleDeclarations, ParseError, PythonParser, parse_source};
pub use report::{ReportOptions, generate_json_output, generate_report, generate_summary};
pub use resolver::{ImportRef, ImportResolver, ResolveError, resolve_import};
pub use stability::{StableDependencyViolation, stable_dependency_violations};
