//! CLI error types.

use std::path::PathBuf;

use mdoc_config::ConfigError;
use mdoc_uml::BuildError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    Build {
        path: String,
        #[source]
        source: BuildError,
    },

    #[error("{0}")]
    Validation(String),
}
