//! `mdoc config` command implementation.

use std::path::PathBuf;

use clap::Args;
use mdoc_config::Config;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the config command.
#[derive(Args)]
pub(crate) struct ConfigArgs {
    /// Path to configuration file (default: auto-discover mdoc.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl ConfigArgs {
    /// Execute the config command.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let config = Config::load(self.config.as_deref(), None)?;
        let output = Output::new();
        for line in summary_lines(&config) {
            match line {
                Line::Heading(text) => output.heading(&text),
                Line::Entry(text) => output.info(&text),
            }
        }
        Ok(())
    }
}

enum Line {
    Heading(String),
    Entry(String),
}

fn entry(key: &str, value: impl std::fmt::Display) -> Line {
    Line::Entry(format!("  {key:<14} {value}"))
}

/// Human-readable summary of the resolved configuration.
fn summary_lines(config: &Config) -> Vec<Line> {
    let mut lines = Vec::new();

    let source = config
        .config_path
        .as_ref()
        .map_or_else(|| "(defaults)".to_owned(), |p| p.display().to_string());
    lines.push(Line::Heading(format!("Configuration: {source}")));

    lines.push(Line::Heading("[project]".to_owned()));
    lines.push(entry("name", &config.project.name));
    lines.push(entry("version", &config.project.version));
    lines.push(entry("release", &config.project.release));
    lines.push(entry("copyright", &config.project.copyright));
    lines.push(entry("master_doc", &config.project.master_doc));

    lines.push(Line::Heading("[build]".to_owned()));
    lines.push(entry(
        "source_dir",
        config.build_resolved.source_dir.display(),
    ));
    lines.push(entry("build_dir", config.build_resolved.build_dir.display()));

    lines.push(Line::Heading("[html]".to_owned()));
    lines.push(entry("theme", &config.html.theme));

    lines.push(Line::Heading("[latex]".to_owned()));
    lines.push(entry("paper_size", config.latex.paper_size.as_str()));
    lines.push(entry("font_size", &config.latex.font_size));
    for doc in &config.latex.documents {
        lines.push(entry(
            "document",
            format!("{} -> {} ({})", doc.source, doc.target, doc.title),
        ));
    }

    lines.push(Line::Heading("[epub]".to_owned()));
    lines.push(entry("title", config.epub_title()));
    lines.push(entry("copyright", config.epub_copyright()));

    if !config.intersphinx.is_empty() {
        lines.push(Line::Heading("[intersphinx]".to_owned()));
        for (name, url) in &config.intersphinx {
            lines.push(entry(name, url));
        }
    }

    lines.push(Line::Heading("[plantuml]".to_owned()));
    lines.push(entry("command", config.plantuml.command.join(" ")));

    lines
}
