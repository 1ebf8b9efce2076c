//! `mdoc build` command implementation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use glob::Pattern;
use mdoc_config::{CliSettings, Config};
use mdoc_uml::{DocumentBuilder, OutputFormat, RendererConfig};

use crate::error::CliError;
use crate::output::Output;

/// Suffix of manual source files.
const SOURCE_EXTENSION: &str = "rst";

/// Output format selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum FormatArg {
    Html,
    Latex,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Html => Self::Html,
            FormatArg::Latex => Self::Latex,
        }
    }
}

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Source files to build (default: all .rst files in the source directory).
    files: Vec<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = FormatArg::Html)]
    format: FormatArg,

    /// Path to configuration file (default: auto-discover mdoc.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Documentation source directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Build output directory (overrides config).
    #[arg(short, long)]
    build_dir: Option<PathBuf>,

    /// `PlantUML` command and leading arguments (overrides config).
    #[arg(long, num_args = 1.., allow_hyphen_values = true, value_terminator = ";")]
    plantuml: Option<Vec<String>>,

    /// Enable verbose output (show render and cache logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl BuildArgs {
    /// Execute the build command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, no sources are found, or a
    /// document hits an unrecoverable I/O error.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            source_dir: self.source_dir,
            build_dir: self.build_dir,
            plantuml_command: self.plantuml,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let sources = if self.files.is_empty() {
            collect_sources(
                &config.build_resolved.source_dir,
                &config.project.exclude_matchers()?,
            )?
        } else {
            self.files
        };
        if sources.is_empty() {
            return Err(CliError::Validation(format!(
                "No .{SOURCE_EXTENSION} sources found in {}",
                config.build_resolved.source_dir.display()
            )));
        }

        let format = OutputFormat::from(self.format);
        let out_dir = config.build_resolved.output_dir(format.as_str());
        let targets = output_paths(&out_dir, &sources, format)?;
        std::fs::create_dir_all(&out_dir)?;

        let builder = DocumentBuilder::new(&out_dir, format)
            .renderer(RendererConfig::new(config.plantuml.command.clone()));

        output.info(&format!(
            "Building {} document(s) as {} into {}",
            sources.len(),
            format.as_str(),
            out_dir.display()
        ));

        let mut totals = Totals::default();
        for (path, target) in sources.iter().zip(&targets) {
            tracing::debug!(path = %path.display(), "Building document");
            let source = std::fs::read_to_string(path).map_err(|e| CliError::Read {
                path: path.clone(),
                source: e,
            })?;
            let result = builder.build(&source).map_err(|e| CliError::Build {
                path: path.display().to_string(),
                source: e,
            })?;

            for warning in &result.warnings {
                output.warning(&format!("{}: {warning}", path.display()));
            }
            std::fs::write(target, &result.body)?;

            totals.documents += 1;
            totals.rendered += result.rendered;
            totals.cached += result.cached;
            totals.skipped += result.skipped;
        }

        output.success(&format!(
            "Built {} document(s): {} diagram(s) rendered, {} cached, {} skipped",
            totals.documents, totals.rendered, totals.cached, totals.skipped
        ));

        Ok(())
    }
}

/// Counters summed over all documents.
#[derive(Default)]
struct Totals {
    documents: usize,
    rendered: usize,
    cached: usize,
    skipped: usize,
}

/// Source files directly inside `source_dir`, sorted, minus those whose
/// path relative to `source_dir` matches an exclude pattern.
fn collect_sources(source_dir: &Path, exclude: &[Pattern]) -> Result<Vec<PathBuf>, CliError> {
    let read_error = |source: std::io::Error| CliError::Read {
        path: source_dir.to_path_buf(),
        source,
    };

    let mut sources = Vec::new();
    for entry in std::fs::read_dir(source_dir).map_err(read_error)? {
        let path = entry.map_err(read_error)?.path();
        if !path.is_file() || path.extension().is_none_or(|ext| ext != SOURCE_EXTENSION) {
            continue;
        }
        let relative = path.strip_prefix(source_dir).unwrap_or(&path);
        let excluded = exclude.iter().any(|pattern| pattern.matches_path(relative));
        if !excluded {
            sources.push(path);
        }
    }
    sources.sort();
    Ok(sources)
}

/// Output paths for `sources`, in order.
///
/// Two sources sharing a stem would overwrite each other's output, so that is
/// rejected before anything is built.
fn output_paths(
    out_dir: &Path,
    sources: &[PathBuf],
    format: OutputFormat,
) -> Result<Vec<PathBuf>, CliError> {
    let mut seen: HashMap<PathBuf, &Path> = HashMap::new();
    let mut targets = Vec::with_capacity(sources.len());
    for source in sources {
        let target = output_path(out_dir, source, format);
        if let Some(previous) = seen.insert(target.clone(), source) {
            return Err(CliError::Validation(format!(
                "{} and {} would both be written to {}",
                previous.display(),
                source.display(),
                target.display()
            )));
        }
        targets.push(target);
    }
    Ok(targets)
}

/// Output document path: `{out_dir}/{stem}.{ext}`.
fn output_path(out_dir: &Path, source: &Path, format: OutputFormat) -> PathBuf {
    let stem = source.file_stem().unwrap_or(source.as_os_str());
    out_dir.join(format!("{}.{}", stem.to_string_lossy(), format.extension()))
}
