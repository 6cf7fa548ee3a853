//! src/config.rs
//!
//! Configuration for building a [`PairedImageFolder`](crate::PairedImageFolder).
//!
//! Example:
//! ```ignore
//! let config = PairedFolderConfig::builder("/data/train")
//!     .image_extension("jpg")
//!     .metadata_extension("json")
//!     .backend(ImageBackend::Image)
//!     .build()?;
//! ```
//!
//! The same settings can be loaded from JSON; omitted fields take their defaults:
//! ```json
//! { "root": "/data/train", "metadata_extension": "xml" }
//! ```

use crate::error::{DatasetError, Result};
use crate::transforms::vision::ImageBackend;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_IMAGE_EXTENSION: &str = "jpg";
pub const DEFAULT_METADATA_EXTENSION: &str = "json";

/// Settings resolved once when a dataset is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairedFolderConfig {
    /// Dataset root; each immediate subdirectory is one class.
    pub root: PathBuf,
    /// Extension of the image half of each pair.
    #[serde(default = "default_image_extension")]
    pub image_extension: String,
    /// Extension of the metadata sidecar.
    #[serde(default = "default_metadata_extension")]
    pub metadata_extension: String,
    /// Decoder used by `get`.
    #[serde(default)]
    pub backend: ImageBackend,
}

fn default_image_extension() -> String {
    DEFAULT_IMAGE_EXTENSION.to_string()
}

fn default_metadata_extension() -> String {
    DEFAULT_METADATA_EXTENSION.to_string()
}

impl PairedFolderConfig {
    /// Default extensions and backend for `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            image_extension: default_image_extension(),
            metadata_extension: default_metadata_extension(),
            backend: ImageBackend::default(),
        }
    }

    pub fn builder(root: impl Into<PathBuf>) -> PairedFolderConfigBuilder {
        PairedFolderConfigBuilder {
            config: Self::new(root),
        }
    }

    /// Reads a JSON config file and validates it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| DatasetError::io(path, e))?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| {
            DatasetError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects empty or identical extensions and backends missing from this build.
    pub fn validate(&self) -> Result<()> {
        let image = self.image_extension.trim_start_matches('.');
        let metadata = self.metadata_extension.trim_start_matches('.');
        if image.is_empty() || metadata.is_empty() {
            return Err(DatasetError::Config(
                "image_extension and metadata_extension must not be empty".to_string(),
            ));
        }
        if image == metadata {
            return Err(DatasetError::Config(format!(
                "image_extension and metadata_extension must differ (both are '{}')",
                image
            )));
        }
        if !self.backend.is_available() {
            return Err(DatasetError::Config(format!(
                "Image backend '{}' is not compiled into this build",
                self.backend
            )));
        }
        Ok(())
    }
}

/// Builder for PairedFolderConfig with method chaining
pub struct PairedFolderConfigBuilder {
    config: PairedFolderConfig,
}

impl PairedFolderConfigBuilder {
    /// Set the image extension (with or without the leading dot)
    pub fn image_extension(mut self, ext: impl Into<String>) -> Self {
        self.config.image_extension = ext.into();
        self
    }

    /// Set the metadata sidecar extension
    pub fn metadata_extension(mut self, ext: impl Into<String>) -> Self {
        self.config.metadata_extension = ext.into();
        self
    }

    /// Set the image decoder backend
    pub fn backend(mut self, backend: ImageBackend) -> Self {
        self.config.backend = backend;
        self
    }

    /// Validate and build the final configuration.
    pub fn build(self) -> Result<PairedFolderConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
