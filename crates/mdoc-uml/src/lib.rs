//! `PlantUML` diagrams for the manual build.
//!
//! This crate turns `uml` directives in manual sources into image references:
//! - [`parse_document`] splits a source into text and [`UmlNode`]s
//! - [`DiagramKey`] hashes diagram text into a stable image filename
//! - [`PlantumlRenderer`] runs the external renderer once per distinct text
//! - [`OutputFormat`] emits the HTML or LaTeX markup for a rendered image
//! - [`DocumentBuilder`] runs a whole document through these steps
//!
//! # Architecture
//!
//! - [`directive`]: `uml` directive parsing
//! - [`key`]: content hash and image location
//! - [`render`]: subprocess rendering with the on-disk cache
//! - [`emit`]: per-format markup
//! - [`build`]: document build
//!
//! # Example
//!
//! ```no_run
//! use mdoc_uml::{DocumentBuilder, OutputFormat};
//!
//! let builder = DocumentBuilder::new("build/latex", OutputFormat::Latex);
//! let output = builder.build(".. uml::\n\n   A -> B\n")?;
//! for warning in &output.warnings {
//!     eprintln!("{warning}");
//! }
//! # Ok::<(), mdoc_uml::BuildError>(())
//! ```

pub mod build;
pub mod directive;
pub mod emit;
mod error;
pub mod key;
pub mod render;

pub use build::{BuildOutput, DocumentBuilder};
pub use directive::{Block, ParsedDocument, UmlNode, parse_document};
pub use emit::OutputFormat;
pub use error::{BuildError, RenderError};
pub use key::{DiagramKey, IMAGE_DIR, ImageLocation};
pub use render::{PlantumlRenderer, RenderOutcome, RendererConfig};
