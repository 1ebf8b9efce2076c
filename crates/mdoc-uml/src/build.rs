//! Document build: parse, render each diagram, emit markup.
//!
//! This module provides [`DocumentBuilder`], which runs one document through
//! the directive parser, the render cache and an output emitter.

use std::path::{Path, PathBuf};

use crate::directive::{Block, UmlNode, parse_document};
use crate::emit::OutputFormat;
use crate::error::BuildError;
use crate::key::{DiagramKey, ImageLocation};
use crate::render::{PlantumlRenderer, RenderOutcome, RendererConfig};

/// Result of building one document.
#[derive(Debug, Default)]
pub struct BuildOutput {
    /// Source text with every diagram replaced by its markup.
    pub body: String,
    /// Warnings for ignored options and skipped diagrams.
    pub warnings: Vec<String>,
    /// Diagrams rendered during this build.
    pub rendered: usize,
    /// Diagrams served from existing images.
    pub cached: usize,
    /// Diagrams omitted after a recoverable render error.
    pub skipped: usize,
}

/// Builds documents for one output format into one output directory.
///
/// # Example
///
/// ```no_run
/// use mdoc_uml::{DocumentBuilder, OutputFormat, RendererConfig};
///
/// let builder = DocumentBuilder::new("build/html", OutputFormat::Html)
///     .renderer(RendererConfig::new(vec!["java".into(), "-jar".into(), "plantuml.jar".into()]));
///
/// let output = builder.build(".. uml::\n\n   Alice -> Bob: Hello\n")?;
/// assert!(output.body.contains("<img"));
/// # Ok::<(), mdoc_uml::BuildError>(())
/// ```
#[derive(Debug, Clone)]
pub struct DocumentBuilder {
    renderer: PlantumlRenderer,
    out_dir: PathBuf,
    format: OutputFormat,
}

impl DocumentBuilder {
    /// Create a builder with the default `plantuml` command.
    #[must_use]
    pub fn new(out_dir: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            renderer: PlantumlRenderer::new(RendererConfig::default()),
            out_dir: out_dir.into(),
            format,
        }
    }

    /// Set the renderer configuration.
    #[must_use]
    pub fn renderer(mut self, config: RendererConfig) -> Self {
        self.renderer = PlantumlRenderer::new(config);
        self
    }

    #[must_use]
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    #[must_use]
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Image location a diagram with this source resolves to.
    #[must_use]
    pub fn locate(&self, source: &str) -> ImageLocation {
        ImageLocation::resolve(
            &DiagramKey::new(source),
            &self.out_dir,
            self.format.image_dir(),
        )
    }

    /// Build one document.
    ///
    /// Diagrams whose renderer is missing or fails are left out and reported
    /// in [`BuildOutput::warnings`]; I/O errors abort the build.
    pub fn build(&self, source: &str) -> Result<BuildOutput, BuildError> {
        let parsed = parse_document(source);
        let mut output = BuildOutput {
            body: String::with_capacity(source.len()),
            warnings: parsed.warnings,
            ..BuildOutput::default()
        };

        for block in parsed.blocks {
            match block {
                Block::Text(text) => output.body.push_str(&text),
                Block::Uml(node) => self.build_node(&node, &mut output)?,
            }
        }

        Ok(output)
    }

    fn build_node(&self, node: &UmlNode, output: &mut BuildOutput) -> Result<(), BuildError> {
        let location = self.locate(&node.source);

        match self.renderer.render(&node.source, &location) {
            Ok(outcome) => {
                match outcome {
                    RenderOutcome::Cached => output.cached += 1,
                    RenderOutcome::Rendered => output.rendered += 1,
                }
                output
                    .body
                    .push_str(&self.format.emit(&location.refname, node.alt_text()));
                Ok(())
            }
            Err(e) if e.is_recoverable() => {
                tracing::warn!(line = node.line, error = %e, "Skipping uml diagram");
                output.warnings.push(format!("line {}: {e}", node.line));
                output.skipped += 1;
                Ok(())
            }
            Err(source) => Err(BuildError::Diagram {
                line: node.line,
                source,
            }),
        }
    }
}
