//! Configuration management for the manual build.
//!
//! Parses `mdoc.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `plantuml.command` (every entry)
//! - `intersphinx.*`

mod expand;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use glob::Pattern;
use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override documentation source directory.
    pub source_dir: Option<PathBuf>,
    /// Override build output directory.
    pub build_dir: Option<PathBuf>,
    /// Override the `PlantUML` renderer command.
    pub plantuml_command: Option<Vec<String>>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "mdoc.toml";

/// Font sizes accepted by the LaTeX document classes.
const LATEX_FONT_SIZES: [&str; 3] = ["10pt", "11pt", "12pt"];

/// Manual build configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Project metadata.
    pub project: ProjectConfig,
    /// Build paths (relative strings from TOML).
    build: BuildConfigRaw,
    /// HTML output options.
    pub html: HtmlConfig,
    /// LaTeX output options.
    pub latex: LatexConfig,
    /// EPUB output options.
    pub epub: EpubConfig,
    /// Cross-reference targets keyed by inventory name.
    pub intersphinx: BTreeMap<String, String>,
    /// `PlantUML` renderer configuration.
    pub plantuml: PlantumlConfig,

    /// Resolved build configuration (set after loading).
    #[serde(skip)]
    pub build_resolved: BuildConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Project metadata.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Project name shown in titles.
    pub name: String,
    /// Copyright notice.
    pub copyright: String,
    /// Short X.Y version.
    pub version: String,
    /// Full version, including alpha/beta/rc tags.
    pub release: String,
    /// Document holding the root table of contents (without suffix).
    pub master_doc: String,
    /// Glob patterns, relative to the source directory, skipped when
    /// collecting sources.
    pub exclude_patterns: Vec<String>,
}

impl ProjectConfig {
    /// Compile `exclude_patterns`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` naming the first invalid pattern.
    pub fn exclude_matchers(&self) -> Result<Vec<Pattern>, ConfigError> {
        self.exclude_patterns
            .iter()
            .enumerate()
            .map(|(i, p)| {
                Pattern::new(p).map_err(|e| {
                    ConfigError::Validation(format!(
                        "project.exclude_patterns[{i}] is not a valid glob pattern: {e}"
                    ))
                })
            })
            .collect()
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "DocBlox".to_owned(),
            copyright: String::new(),
            version: String::new(),
            release: String::new(),
            master_doc: "index".to_owned(),
            exclude_patterns: vec!["_build".to_owned()],
        }
    }
}

/// Raw build configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct BuildConfigRaw {
    source_dir: Option<String>,
    build_dir: Option<String>,
}

/// Resolved build configuration with absolute paths.
#[derive(Debug, Default)]
pub struct BuildConfig {
    /// Directory holding the manual sources.
    pub source_dir: PathBuf,
    /// Root directory for build output.
    pub build_dir: PathBuf,
}

impl BuildConfig {
    /// Output directory for one builder (e.g. `build/html`).
    #[must_use]
    pub fn output_dir(&self, builder: &str) -> PathBuf {
        self.build_dir.join(builder)
    }
}

/// HTML output options.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HtmlConfig {
    /// Theme name.
    pub theme: String,
    /// Directories with static files copied into the output.
    pub static_path: Vec<String>,
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self {
            theme: "default".to_owned(),
            static_path: vec!["_static".to_owned()],
        }
    }
}

/// LaTeX paper size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperSize {
    #[default]
    Letter,
    A4,
}

impl PaperSize {
    /// Value as written in the config file.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Letter => "letter",
            Self::A4 => "a4",
        }
    }
}

/// LaTeX document class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentClass {
    #[default]
    Manual,
    Howto,
}

/// One LaTeX output document.
#[derive(Debug, Deserialize)]
pub struct LatexDocument {
    /// Start file (without suffix).
    pub source: String,
    /// Target `.tex` file name.
    pub target: String,
    /// Document title.
    pub title: String,
    /// Document author.
    pub author: String,
    /// Document class.
    #[serde(default)]
    pub class: DocumentClass,
}

/// LaTeX output options.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LatexConfig {
    /// Paper size.
    pub paper_size: PaperSize,
    /// Base font size.
    pub font_size: String,
    /// Documents to produce.
    pub documents: Vec<LatexDocument>,
}

impl Default for LatexConfig {
    fn default() -> Self {
        Self {
            paper_size: PaperSize::default(),
            font_size: "10pt".to_owned(),
            documents: Vec::new(),
        }
    }
}

/// EPUB metadata. Empty fields fall back to project metadata.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EpubConfig {
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub copyright: String,
}

/// `PlantUML` renderer configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PlantumlConfig {
    /// Program and leading arguments (e.g. `["java", "-jar", "plantuml.jar"]`).
    pub command: Vec<String>,
}

impl Default for PlantumlConfig {
    fn default() -> Self {
        Self {
            command: vec!["plantuml".to_owned()],
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`plantuml.command[2]`").
        field: String,
        /// Error message (e.g., "${`PLANTUML_JAR`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `mdoc.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the overridden configuration does not validate.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(source_dir) = &settings.source_dir {
            self.build_resolved.source_dir.clone_from(source_dir);
        }
        if let Some(build_dir) = &settings.build_dir {
            self.build_resolved.build_dir.clone_from(build_dir);
        }
        if let Some(command) = &settings.plantuml_command {
            self.plantuml.command.clone_from(command);
        }
    }

    /// EPUB title, falling back to the project name.
    #[must_use]
    pub fn epub_title(&self) -> &str {
        non_empty_or(&self.epub.title, &self.project.name)
    }

    /// EPUB copyright, falling back to the project copyright.
    #[must_use]
    pub fn epub_copyright(&self) -> &str {
        non_empty_or(&self.epub.copyright, &self.project.copyright)
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        Self::discover_from(&std::env::current_dir().ok()?)
    }

    /// Search for config file in `start` and its parents.
    fn discover_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            project: ProjectConfig::default(),
            build: BuildConfigRaw::default(),
            html: HtmlConfig::default(),
            latex: LatexConfig::default(),
            epub: EpubConfig::default(),
            intersphinx: BTreeMap::new(),
            plantuml: PlantumlConfig::default(),
            build_resolved: BuildConfig {
                source_dir: base.join("docs"),
                build_dir: base.join("build"),
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file and after CLI overrides.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.project.name, "project.name")?;
        self.project.exclude_matchers()?;
        self.validate_plantuml()?;
        self.validate_latex()?;
        for (name, url) in &self.intersphinx {
            require_http_url(url, &format!("intersphinx.{name}"))?;
        }
        Ok(())
    }

    /// Validate the renderer command.
    fn validate_plantuml(&self) -> Result<(), ConfigError> {
        let Some(program) = self.plantuml.command.first() else {
            return Err(ConfigError::Validation(
                "plantuml.command cannot be empty".to_owned(),
            ));
        };
        require_non_empty(program, "plantuml.command[0]")
    }

    /// Validate LaTeX options.
    fn validate_latex(&self) -> Result<(), ConfigError> {
        if !LATEX_FONT_SIZES.contains(&self.latex.font_size.as_str()) {
            return Err(ConfigError::Validation(format!(
                "latex.font_size must be one of {}",
                LATEX_FONT_SIZES.join(", ")
            )));
        }
        for (i, doc) in self.latex.documents.iter().enumerate() {
            require_non_empty(&doc.source, &format!("latex.documents[{i}].source"))?;
            if !doc.target.ends_with(".tex") {
                return Err(ConfigError::Validation(format!(
                    "latex.documents[{i}].target must end with .tex"
                )));
            }
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        expand::expand_env_all(&mut self.plantuml.command, "plantuml.command")?;

        for (name, url) in &mut self.intersphinx {
            *url = expand::expand_env(url, &format!("intersphinx.{name}"))?;
        }

        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));

        self.build_resolved = BuildConfig {
            source_dir: resolve(self.build.source_dir.as_deref(), "docs"),
            build_dir: resolve(self.build.build_dir.as_deref(), "build"),
        };
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() { fallback } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));
        assert_eq!(config.project.name, "DocBlox");
        assert_eq!(config.project.master_doc, "index");
        assert_eq!(config.html.theme, "default");
        assert_eq!(config.plantuml.command, vec!["plantuml".to_owned()]);
        assert_eq!(config.latex.paper_size, PaperSize::Letter);
        assert_eq!(
            config.build_resolved.source_dir,
            PathBuf::from("/test/docs")
        );
        assert_eq!(
            config.build_resolved.output_dir("html"),
            PathBuf::from("/test/build/html")
        );
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.project.name, "DocBlox");
        assert!(config.intersphinx.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[project]
name = "DocBlox"
copyright = "2010-2011, Mike van Riel"
version = "0.9"
release = "0.9.0"

[html]
theme = "agogo"

[latex]
paper_size = "a4"
font_size = "11pt"

[[latex.documents]]
source = "index"
target = "DocBlox.tex"
title = "DocBlox Documentation"
author = "Mike van Riel"
class = "howto"

[epub]
publisher = "Mike van Riel"

[intersphinx]
python = "http://docs.python.org/"

[plantuml]
command = ["java", "-jar", "plantuml.jar"]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.project.release, "0.9.0");
        assert_eq!(config.html.theme, "agogo");
        assert_eq!(config.latex.paper_size, PaperSize::A4);
        assert_eq!(config.latex.documents.len(), 1);
        assert_eq!(config.latex.documents[0].class, DocumentClass::Howto);
        assert_eq!(
            config.intersphinx.get("python").map(String::as_str),
            Some("http://docs.python.org/")
        );
        assert_eq!(config.plantuml.command, vec!["java", "-jar", "plantuml.jar"]);
        assert_eq!(config.epub_title(), "DocBlox");
        assert_eq!(config.epub_copyright(), "2010-2011, Mike van Riel");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_unknown_paper_size_fails() {
        let toml = r#"
[latex]
paper_size = "legal"
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_paths() {
        let toml = r#"
[build]
source_dir = "manual"
build_dir = "out"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(
            config.build_resolved.source_dir,
            PathBuf::from("/project/manual")
        );
        assert_eq!(
            config.build_resolved.output_dir("latex"),
            PathBuf::from("/project/out/latex")
        );
    }

    #[test]
    fn test_apply_cli_settings_plantuml_command() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            plantuml_command: Some(vec!["java".to_owned(), "-jar".to_owned()]),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.plantuml.command, vec!["java", "-jar"]);
        assert_eq!(
            config.build_resolved.source_dir,
            PathBuf::from("/test/docs")
        );
    }

    #[test]
    fn test_apply_cli_settings_dirs() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            source_dir: Some(PathBuf::from("/custom/docs")),
            build_dir: Some(PathBuf::from("/tmp/out")),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(
            config.build_resolved.source_dir,
            PathBuf::from("/custom/docs")
        );
        assert_eq!(config.build_resolved.build_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.plantuml.command, vec!["plantuml"]);
    }

    #[test]
    fn test_expand_env_vars_plantuml_command() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("MDOC_CONFIG_TEST_JAR", "/opt/plantuml.jar");
        }

        let toml = r#"
[plantuml]
command = ["java", "-jar", "${MDOC_CONFIG_TEST_JAR}"]
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.expand_env_vars().unwrap();

        assert_eq!(
            config.plantuml.command,
            vec!["java", "-jar", "/opt/plantuml.jar"]
        );

        unsafe {
            std::env::remove_var("MDOC_CONFIG_TEST_JAR");
        }
    }

    #[test]
    fn test_load_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        std::fs::write(
            &path,
            "[build]\nsource_dir = \"manual\"\n\n[plantuml]\ncommand = [\"plantuml-wrapper\"]\n",
        )
        .unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.build_resolved.source_dir, tmp.path().join("manual"));
        assert_eq!(config.build_resolved.build_dir, tmp.path().join("build"));
        assert_eq!(config.plantuml.command, vec!["plantuml-wrapper"]);
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let err = Config::load(Some(Path::new("/nonexistent/mdoc.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_rejects_empty_command_override() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "").unwrap();

        let settings = CliSettings {
            plantuml_command: Some(Vec::new()),
            ..Default::default()
        };
        let err = Config::load(Some(&path), Some(&settings)).unwrap_err();
        assert!(err.to_string().contains("plantuml.command"));
    }

    // Validation tests

    /// Assert that validation fails with expected substrings in the error message.
    fn assert_validation_error(config: &Config, expected_substrings: &[&str]) {
        let result = config.validate();
        assert!(result.is_err(), "Expected validation to fail");
        let err = result.unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation(_)),
            "Expected ConfigError::Validation, got {err:?}"
        );
        let msg = err.to_string();
        for s in expected_substrings {
            assert!(
                msg.contains(s),
                "Expected error to contain '{s}', got: {msg}"
            );
        }
    }

    #[test]
    fn test_validate_default_config_passes() {
        let config = Config::default_with_base(Path::new("/test"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_program() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.plantuml.command = vec![String::new()];
        assert_validation_error(&config, &["plantuml.command[0]", "empty"]);
    }

    #[test]
    fn test_validate_font_size() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.latex.font_size = "9pt".to_owned();
        assert_validation_error(&config, &["latex.font_size", "10pt"]);
    }

    #[test]
    fn test_validate_latex_target_suffix() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.latex.documents.push(LatexDocument {
            source: "index".to_owned(),
            target: "DocBlox.pdf".to_owned(),
            title: "DocBlox Documentation".to_owned(),
            author: "Mike van Riel".to_owned(),
            class: DocumentClass::Manual,
        });
        assert_validation_error(&config, &["latex.documents[0].target", ".tex"]);
    }

    #[test]
    fn test_validate_intersphinx_url_scheme() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config
            .intersphinx
            .insert("python".to_owned(), "docs.python.org".to_owned());
        assert_validation_error(&config, &["intersphinx.python", "http"]);
    }

    #[test]
    fn test_validate_exclude_pattern() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.project.exclude_patterns = vec!["_build".to_owned(), "[unclosed".to_owned()];
        assert_validation_error(&config, &["project.exclude_patterns[1]", "glob"]);
    }

    #[test]
    fn test_exclude_matchers_compile_wildcards() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.project.exclude_patterns = vec!["*-draft.rst".to_owned()];

        let matchers = config.project.exclude_matchers().unwrap();

        assert!(matchers[0].matches("usage-draft.rst"));
        assert!(!matchers[0].matches("usage.rst"));
    }

    #[test]
    fn test_discover_from_nested_directory() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join(CONFIG_FILENAME);
        std::fs::write(&config_path, "").unwrap();
        let nested = tmp.path().join("docs/guides/advanced");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(Config::discover_from(&nested), Some(config_path.clone()));
        assert_eq!(Config::discover_from(tmp.path()), Some(config_path));
    }

    #[test]
    fn test_discover_from_without_config() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("docs");
        std::fs::create_dir_all(&nested).unwrap();

        // Nothing in the temp tree; a stray mdoc.toml above it would be
        // found, so only accept results outside the temp dir.
        let found = Config::discover_from(&nested);
        assert!(found.is_none_or(|p| !p.starts_with(tmp.path())));
    }

    #[test]
    fn test_validate_project_name() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.project.name = String::new();
        assert_validation_error(&config, &["project.name", "empty"]);
    }
}
