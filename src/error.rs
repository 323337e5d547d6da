use std::{io, path::PathBuf};
use thiserror::Error;

/// Errors raised while resolving a CRS or transforming a coordinate.
#[derive(Error, Debug)]
pub enum Error {
    #[error("No catalog record found for {0}")]
    UnknownAuthorityCode(String),
    #[error("Unsupported parameter: {0}")]
    UnsupportedParameter(String),
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    #[error("Iteration did not converge: {0}")]
    ConvergenceFailure(String),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl Error {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidValue(message.into())
    }

    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        Error::UnsupportedParameter(message.into())
    }

    pub(crate) fn convergence(message: impl Into<String>) -> Self {
        Error::ConvergenceFailure(message.into())
    }
}

/// Failures reading a text catalog of CRS definitions.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Unable to read CRS catalog {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Unable to access CRS catalog for authority {0}")]
    ResourceNotFound(String),
    #[error("{line}: {message}")]
    Parse { line: usize, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
