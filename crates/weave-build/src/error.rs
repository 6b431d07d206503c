//! Build errors.

use std::path::PathBuf;

use rhizome_weave_codegen_js::UnitError;
use thiserror::Error;

use crate::InstallStatus;

/// Errors that abort a build.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize package manifest: {0}")]
    Manifest(#[source] serde_json::Error),

    #[error("invalid build config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid build plan: {0}")]
    Plan(#[source] serde_json::Error),

    #[error(transparent)]
    Unit(#[from] UnitError),

    #[error("{filename} does not name a module")]
    EmptyModuleName { filename: String },

    #[error("{filename} compiles to module {module}, already produced by {first}")]
    DuplicateModule {
        module: String,
        filename: String,
        first: String,
    },

    #[error("package installer failed in {dir}: {status}")]
    Install { dir: PathBuf, status: InstallStatus },
}

impl BuildError {
    pub(crate) fn io(
        action: &'static str,
        path: impl Into<PathBuf>,
    ) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| BuildError::Io {
            action,
            path,
            source,
        }
    }
}
