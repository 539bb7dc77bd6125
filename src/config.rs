//! Analysis options and configuration file support
//!
//! Options come from the command line and, optionally, a `.coupling.toml`
//! file found in the project root or one of its parents. Command-line values
//! win over file values.
//!
//! ## Configuration File Format
//!
//! ```toml
//! # .coupling.toml
//!
//! [analysis]
//! # Grouping depth: "my_pkg.foo.bar" collapses into "my_pkg.foo" with level = 2.
//! # level < 1 disables grouping.
//! level = 2
//!
//! # Files to leave out of the walk (globs relative to the project root)
//! exclude = ["my_pkg/migrations/*", "my_pkg/tests/*"]
//!
//! # Skip files with syntax errors instead of aborting the run
//! skip_unparseable = true
//!
//! [diagram]
//! # Randomly vary arrow directions in the PlantUML output
//! vary_arrows = false
//! seed = 1
//! ```

use glob::Pattern;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur when loading configuration or validating options
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid glob pattern: {0}")]
    PatternError(String),

    #[error("Project root does not exist or is not a directory: {0}")]
    MissingProjectRoot(PathBuf),

    #[error("Package directory '{package}' not found under {root}")]
    MissingPackage { package: String, root: PathBuf },

    #[error("Package directory '{package}' under {root} cannot be read: {source}")]
    UnreadablePackage {
        package: String,
        root: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid package name: '{0}'")]
    InvalidPackageName(String),
}

/// What to do with a file that does not parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseFailurePolicy {
    /// Record a warning and leave the file out
    #[default]
    Skip,
    /// Stop the whole run
    Abort,
}

/// `[analysis]` section
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AnalysisSection {
    #[serde(default)]
    pub level: Option<i32>,

    #[serde(default)]
    pub exclude: Vec<String>,

    #[serde(default)]
    pub skip_unparseable: Option<bool>,
}

/// `[diagram]` section
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DiagramSection {
    #[serde(default)]
    pub vary_arrows: bool,

    #[serde(default)]
    pub seed: Option<u64>,
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CouplingConfig {
    #[serde(default)]
    pub analysis: AnalysisSection,

    #[serde(default)]
    pub diagram: DiagramSection,
}

/// Options for one analysis run
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Path of the project; the package directory lives directly beneath it
    pub project_root: PathBuf,
    /// Root namespace to scan. Only imports inside it are considered.
    pub package_name: String,
    /// Grouping depth, `< 1` means no grouping
    pub level: i32,
    /// Glob patterns over paths relative to the project root
    pub exclude: Vec<String>,
    pub parse_failure: ParseFailurePolicy,
}

impl AnalysisOptions {
    pub fn new(project_root: impl Into<PathBuf>, package_name: impl Into<String>) -> Self {
        Self {
            project_root: project_root.into(),
            package_name: package_name.into(),
            level: 0,
            exclude: Vec::new(),
            parse_failure: ParseFailurePolicy::default(),
        }
    }

    pub fn with_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    pub fn with_exclude(mut self, patterns: Vec<String>) -> Self {
        self.exclude = patterns;
        self
    }

    pub fn with_parse_failure(mut self, policy: ParseFailurePolicy) -> Self {
        self.parse_failure = policy;
        self
    }

    /// Fill in values from a config file. Values already set explicitly are
    /// kept, exclusion patterns are appended.
    pub fn apply_file_config(&mut self, config: &CouplingConfig, level_from_cli: bool) {
        if !level_from_cli && let Some(level) = config.analysis.level {
            self.level = level;
        }
        self.exclude.extend(config.analysis.exclude.iter().cloned());
        if config.analysis.skip_unparseable == Some(false) {
            self.parse_failure = ParseFailurePolicy::Abort;
        }
    }

    /// Check the options against the filesystem and compile the patterns
    pub fn validate(&self) -> Result<ValidatedOptions, ConfigError> {
        let segments: Vec<&str> = self.package_name.split('.').collect();
        let valid_name = segments
            .iter()
            .all(|s| !s.is_empty() && !s.contains(['/', '\\']));
        if !valid_name {
            return Err(ConfigError::InvalidPackageName(self.package_name.clone()));
        }

        let project_root = self
            .project_root
            .canonicalize()
            .map_err(|_| ConfigError::MissingProjectRoot(self.project_root.clone()))?;
        if !project_root.is_dir() {
            return Err(ConfigError::MissingProjectRoot(self.project_root.clone()));
        }

        let mut package_dir = project_root.clone();
        package_dir.extend(&segments);
        if !package_dir.is_dir() {
            return Err(ConfigError::MissingPackage {
                package: self.package_name.clone(),
                root: project_root,
            });
        }
        if let Err(source) = fs::read_dir(&package_dir) {
            return Err(ConfigError::UnreadablePackage {
                package: self.package_name.clone(),
                root: project_root,
                source,
            });
        }

        let exclude = self
            .exclude
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|e| ConfigError::PatternError(format!("{}: {}", p, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ValidatedOptions {
            project_root,
            package_dir,
            package_name: self.package_name.clone(),
            level: self.level,
            exclude,
            parse_failure: self.parse_failure,
        })
    }
}

/// Options that passed validation: canonical root, existing package directory,
/// compiled exclusion patterns
#[derive(Debug, Clone)]
pub struct ValidatedOptions {
    pub project_root: PathBuf,
    pub package_dir: PathBuf,
    pub package_name: String,
    pub level: i32,
    exclude: Vec<Pattern>,
    pub parse_failure: ParseFailurePolicy,
}

impl ValidatedOptions {
    /// Check if a path (relative to the project root) is excluded from the walk
    pub fn should_exclude(&self, relative_path: &str) -> bool {
        self.exclude.iter().any(|p| p.matches(relative_path))
    }
}

/// File names recognized as configuration, in lookup order
const CONFIG_FILE_NAMES: [&str; 2] = [".coupling.toml", "coupling.toml"];

/// Load configuration for a project
///
/// The nearest `.coupling.toml` (or `coupling.toml`) in the project directory
/// or one of its ancestors wins. No file at all yields the defaults.
pub fn load_config(project_path: &Path) -> Result<CouplingConfig, ConfigError> {
    let start = project_path
        .canonicalize()
        .unwrap_or_else(|_| project_path.to_path_buf());
    let start = if start.is_file() {
        start.parent().map(Path::to_path_buf).unwrap_or(start)
    } else {
        start
    };

    let nearest = start
        .ancestors()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|candidate| candidate.is_file());

    match nearest {
        Some(path) => load_config_file(&path),
        None => Ok(CouplingConfig::default()),
    }
}

/// Load a specific configuration file
pub fn load_config_file(path: &Path) -> Result<CouplingConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: CouplingConfig = toml::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = CouplingConfig::default();
        assert_eq!(config.analysis.level, None);
        assert!(config.analysis.exclude.is_empty());
        assert!(!config.diagram.vary_arrows);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [analysis]
            level = 2
            exclude = ["my_pkg/migrations/*"]
            skip_unparseable = false

            [diagram]
            vary_arrows = true
            seed = 7
        "#;

        let config: CouplingConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.analysis.level, Some(2));
        assert_eq!(config.analysis.exclude.len(), 1);
        assert_eq!(config.analysis.skip_unparseable, Some(false));
        assert!(config.diagram.vary_arrows);
        assert_eq!(config.diagram.seed, Some(7));
    }

    #[test]
    fn test_cli_level_wins_over_file() {
        let config: CouplingConfig = toml::from_str("[analysis]\nlevel = 3").unwrap();

        let mut from_cli = AnalysisOptions::new("/tmp", "pkg").with_level(1);
        from_cli.apply_file_config(&config, true);
        assert_eq!(from_cli.level, 1);

        let mut from_file = AnalysisOptions::new("/tmp", "pkg");
        from_file.apply_file_config(&config, false);
        assert_eq!(from_file.level, 3);
    }

    #[test]
    fn test_file_can_request_abort() {
        let config: CouplingConfig =
            toml::from_str("[analysis]\nskip_unparseable = false").unwrap();
        let mut options = AnalysisOptions::new("/tmp", "pkg");
        options.apply_file_config(&config, false);
        assert_eq!(options.parse_failure, ParseFailurePolicy::Abort);
    }

    #[test]
    fn test_validate_missing_root() {
        let options = AnalysisOptions::new("/definitely/not/here", "pkg");
        assert!(matches!(
            options.validate(),
            Err(ConfigError::MissingProjectRoot(_))
        ));
    }

    #[test]
    fn test_validate_missing_package() {
        let dir = TempDir::new().unwrap();
        let options = AnalysisOptions::new(dir.path(), "pkg");
        assert!(matches!(
            options.validate(),
            Err(ConfigError::MissingPackage { .. })
        ));
    }

    #[test]
    fn test_validate_bad_package_name() {
        let dir = TempDir::new().unwrap();
        for name in ["", "a/b", "..", "a..b"] {
            let options = AnalysisOptions::new(dir.path(), name);
            assert!(
                matches!(options.validate(), Err(ConfigError::InvalidPackageName(_))),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_ok_and_exclusions() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("pkg")).unwrap();
        let options = AnalysisOptions::new(dir.path(), "pkg")
            .with_exclude(vec!["pkg/generated/*".to_string()]);

        let validated = options.validate().unwrap();
        assert!(validated.package_dir.ends_with("pkg"));
        assert!(validated.should_exclude("pkg/generated/schema.py"));
        assert!(!validated.should_exclude("pkg/core.py"));
    }

    #[test]
    fn test_validate_bad_pattern() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("pkg")).unwrap();
        let options =
            AnalysisOptions::new(dir.path(), "pkg").with_exclude(vec!["[unclosed".to_string()]);
        assert!(matches!(
            options.validate(),
            Err(ConfigError::PatternError(_))
        ));
    }

    #[test]
    fn test_find_config_in_parent() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".coupling.toml"), "[analysis]\nlevel = 2\n").unwrap();
        let nested = dir.path().join("project");
        fs::create_dir_all(&nested).unwrap();

        let config = load_config(&nested).unwrap();
        assert_eq!(config.analysis.level, Some(2));
    }

    #[test]
    fn test_nearest_config_wins() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".coupling.toml"), "[analysis]\nlevel = 2\n").unwrap();
        let nested = dir.path().join("project");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("coupling.toml"), "[analysis]\nlevel = 3\n").unwrap();

        let config = load_config(&nested).unwrap();
        assert_eq!(config.analysis.level, Some(3));
    }

    #[test]
    fn test_config_lookup_from_a_file_path() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".coupling.toml"), "[diagram]\nseed = 7\n").unwrap();
        let file = dir.path().join("setup.py");
        fs::write(&file, "").unwrap();

        let config = load_config(&file).unwrap();
        assert_eq!(config.diagram.seed, Some(7));
    }

    #[cfg(unix)]
    #[test]
    fn test_validate_unreadable_package() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let package = dir.path().join("pkg");
        fs::create_dir_all(&package).unwrap();
        fs::write(package.join("a.py"), "x = 1\n").unwrap();
        fs::set_permissions(&package, fs::Permissions::from_mode(0o311)).unwrap();
        // privileged users read the directory regardless of its mode
        let readable = fs::read_dir(&package).is_ok();

        let result = AnalysisOptions::new(dir.path(), "pkg").validate();
        fs::set_permissions(&package, fs::Permissions::from_mode(0o755)).unwrap();

        if readable {
            return;
        }
        assert!(matches!(
            result,
            Err(ConfigError::UnreadablePackage { .. })
        ));
    }
}
