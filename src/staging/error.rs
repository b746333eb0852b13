//! Staging Errors
//!
//! One closed error enumeration per component. Every variant carries the
//! context needed to report it (target path, output name, underlying cause).

use std::error::Error as StdError;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Boxed failure raised by an external collaborator.
pub type CollaboratorError = Box<dyn StdError + Send + Sync>;

/// Failures while building or writing the input-binding document.
#[derive(Debug, Error)]
pub enum BindingError {
    #[error("dictionary of execution inputs is empty; nothing to write to {}", target.display())]
    Empty { target: PathBuf },

    #[error("cannot serialize binding document for {}: {source}", target.display())]
    Serialization {
        target: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("cannot write binding document {}: {source}", target.display())]
    Write {
        target: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failures while resolving declared outputs against execution results.
#[derive(Debug, Error)]
pub enum OutputResolutionError {
    #[error("output '{output}' resolves through '{key}', which has no artifact records")]
    MissingArtifact { output: String, key: String },

    #[error("malformed artifact records for output '{output}': {source}")]
    Malformed {
        output: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("execution results are not a mapping of output records: {0}")]
    InvalidRecord(#[source] serde_json::Error),
}

/// Failures while packaging the provenance directory.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("provenance I/O failed on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write provenance archive {}: {source}", path.display())]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// The archive is absent after a successful write.
    #[error("{} not created; provenance data would be lost", path.display())]
    Missing { path: PathBuf },
}

impl ArchiveError {
    /// Fatal errors must terminate the run; they are never recovered from.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Missing { .. })
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failures raised by the crate builder collaborator.
#[derive(Debug, Error)]
pub enum CrateExportError {
    #[error("unable to build crate for workflow {workflow}: {source}")]
    Build {
        workflow: String,
        #[source]
        source: CollaboratorError,
    },

    #[error("unable to write crate to {}: {source}", target.display())]
    Write {
        target: PathBuf,
        #[source]
        source: CollaboratorError,
    },
}
