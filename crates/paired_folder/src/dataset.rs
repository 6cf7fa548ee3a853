use crate::config::PairedFolderConfig;
use crate::error::{DatasetError, Result};
use crate::index::{PairedIndex, PairedSample};
use crate::transforms::core::short_type_name;
use crate::transforms::vision::LoadImage;
use crate::transforms::Transform;
use anyhow::Context;
use image::DynamicImage;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

type ImageTransform = Box<dyn Transform<DynamicImage, DynamicImage>>;
type TargetTransform = Box<dyn Transform<usize, usize>>;

/// Random-access dataset over a folder-per-class tree where every sample is an
/// image plus a metadata sidecar with the same base name.
///
/// `get` decodes the image to RGB and applies the optional image and target
/// transforms. The sidecar path is kept in the index but `get` never opens it;
/// use [`PairedImageFolder::read_metadata`] when the metadata is needed.
///
/// The dataset is immutable after construction and `Send + Sync`, so one
/// instance can serve `get` calls from many threads.
///
/// # Example
/// ```ignore
/// let dataset = PairedImageFolder::new(&PairedFolderConfig::new("/data/train"))?
///     .with_transform(Resize::new(224, 224, FilterType::Triangle)?);
/// let (image, class_index) = dataset.get(0)?;
/// ```
pub struct PairedImageFolder {
    index: PairedIndex,
    loader: LoadImage,
    transform: Option<ImageTransform>,
    target_transform: Option<TargetTransform>,
}

impl PairedImageFolder {
    /// Scans `config.root` and prepares the configured image backend.
    pub fn new(config: &PairedFolderConfig) -> Result<Self> {
        config.validate()?;
        let loader = LoadImage::new(config.backend)?;
        let index = PairedIndex::build(
            &config.root,
            &config.image_extension,
            &config.metadata_extension,
        )?;
        Ok(Self::from_index(index, loader))
    }

    /// Wraps an index that was built elsewhere (e.g. through a custom listing).
    pub fn from_index(index: PairedIndex, loader: LoadImage) -> Self {
        Self {
            index,
            loader,
            transform: None,
            target_transform: None,
        }
    }

    /// Sets the transform applied to every decoded image.
    pub fn with_transform<T>(mut self, transform: T) -> Self
    where
        T: Transform<DynamicImage, DynamicImage> + 'static,
    {
        self.transform = Some(Box::new(transform));
        self
    }

    /// Sets the transform applied to every class index.
    pub fn with_target_transform<T>(mut self, target_transform: T) -> Self
    where
        T: Transform<usize, usize> + 'static,
    {
        self.target_transform = Some(Box::new(target_transform));
        self
    }

    /// Loads sample `index`: the decoded (and transformed) image and its
    /// (transformed) class index.
    pub fn get(&self, index: usize) -> Result<(DynamicImage, usize)> {
        let sample = self.sample(index)?;

        let mut image = self
            .loader
            .load(&sample.image_path)
            .map_err(|source| DatasetError::Decode {
                path: sample.image_path.clone(),
                source,
            })?;
        if let Some(transform) = &self.transform {
            image = transform
                .apply(image)
                .map_err(|source| DatasetError::Transform { index, source })?;
        }

        let mut target = sample.class_index;
        if let Some(target_transform) = &self.target_transform {
            target = target_transform
                .apply(target)
                .map_err(|source| DatasetError::Transform { index, source })?;
        }

        Ok((image, target))
    }

    /// Reads and parses the JSON sidecar of sample `index`.
    pub fn read_metadata(&self, index: usize) -> Result<serde_json::Value> {
        let path = &self.sample(index)?.metadata_path;
        let parse = || -> anyhow::Result<serde_json::Value> {
            let raw = fs::read(path).context("read sidecar")?;
            serde_json::from_slice(&raw).context("parse sidecar as JSON")
        };
        parse().map_err(|source| DatasetError::Metadata {
            path: path.clone(),
            source,
        })
    }

    /// The index entry for `index`, without touching the files.
    pub fn sample(&self, index: usize) -> Result<&PairedSample> {
        self.index.get(index).ok_or(DatasetError::IndexOutOfRange {
            index,
            len: self.index.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn root(&self) -> &Path {
        self.index.root()
    }

    pub fn index(&self) -> &PairedIndex {
        &self.index
    }

    pub fn samples(&self) -> &[PairedSample] {
        self.index.samples()
    }

    /// Class index of every sample, in sample order.
    pub fn targets(&self) -> &[usize] {
        self.index.targets()
    }

    pub fn classes(&self) -> &[String] {
        self.index.classes()
    }

    pub fn class_to_idx(&self) -> &HashMap<String, usize> {
        self.index.class_map().class_to_idx()
    }

    /// Number of files dropped during the scan for lack of a counterpart.
    pub fn missing_count(&self) -> usize {
        self.index.missing().len()
    }

    /// Multi-line summary: size, root and configured transforms.
    pub fn describe(&self) -> String {
        let transform = self.transform.as_ref().map(|t| t.describe());
        let target_transform = self.target_transform.as_ref().map(|t| t.describe());

        let mut out = format!("Dataset {}\n", short_type_name::<Self>());
        out.push_str(&format!("    Number of datapoints: {}\n", self.len()));
        out.push_str(&format!("    Root Location: {}\n", self.root().display()));
        out.push_str(&labelled("    Transforms (if any): ", transform.as_deref()));
        out.push('\n');
        out.push_str(&labelled(
            "    Target Transforms (if any): ",
            target_transform.as_deref(),
        ));
        out
    }
}

/// `label` followed by `value`, with continuation lines indented to line up
/// under the first character of `value`.
fn labelled(label: &str, value: Option<&str>) -> String {
    let value = value.unwrap_or("None");
    let indent = format!("\n{}", " ".repeat(label.len()));
    format!("{}{}", label, value.replace('\n', &indent))
}

impl fmt::Display for PairedImageFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl fmt::Debug for PairedImageFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PairedImageFolder")
            .field("root", &self.root())
            .field("len", &self.len())
            .field("classes", &self.classes())
            .field("backend", &self.loader.backend())
            .finish_non_exhaustive()
    }
}
