use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DatasetError>;

/// Errors raised while building or reading a paired dataset.
///
/// A file whose counterpart is missing is not an error: it is dropped from
/// the index and recorded as a [`MissingCounterpart`](crate::index::MissingCounterpart).
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The scan finished without a single complete image/metadata pair.
    #[error(
        "Found 0 files in subfolders of: {}\nSupported extensions are: {}",
        .root.display(),
        .extensions.join(",")
    )]
    NoSamples {
        root: PathBuf,
        extensions: Vec<String>,
    },

    #[error("Index {index} is out of range for dataset of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Failed to decode image {}: {source:#}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Transform failed for sample {index}: {source:#}")]
    Transform {
        index: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to read metadata {}: {source:#}", .path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DatasetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
