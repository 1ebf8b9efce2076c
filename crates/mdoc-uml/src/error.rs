//! Render and build errors.

use std::path::PathBuf;

/// Failure to produce one diagram image.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The configured renderer program could not be found.
    #[error("plantuml command '{command}' cannot be run")]
    NotFound {
        /// Configured command, space-joined.
        command: String,
    },
    /// The renderer ran but exited unsuccessfully.
    #[error("error while running plantuml ({status})\n\n{stderr}")]
    Failed {
        /// Exit status description.
        status: String,
        /// Captured standard error.
        stderr: String,
    },
    /// Filesystem or process I/O error.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RenderError {
    /// Whether the build may skip this diagram and continue.
    ///
    /// A missing renderer or a renderer failure only affects one diagram;
    /// I/O errors abort the build.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Failed { .. })
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failure that aborts a document build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// A diagram hit an unrecoverable render error.
    #[error("uml directive at line {line}: {source}")]
    Diagram {
        line: usize,
        #[source]
        source: RenderError,
    },
}
