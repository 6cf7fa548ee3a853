use crate::discovery::{find_classes, ClassMap, DirectoryListing, FsListing};
use crate::error::{DatasetError, Result};
use std::collections::BTreeSet;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One image and its metadata sidecar, labelled with the class folder they live under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairedSample {
    pub image_path: PathBuf,
    pub metadata_path: PathBuf,
    pub class_index: usize,
}

/// Which half of a pair was absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterpartKind {
    Image,
    Metadata,
}

impl fmt::Display for CounterpartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CounterpartKind::Image => write!(f, "img"),
            CounterpartKind::Metadata => write!(f, "meta"),
        }
    }
}

/// A file that was found without its partner. The base name is left out of
/// the index; this record keeps the path that was expected but not found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingCounterpart {
    pub path: PathBuf,
    pub kind: CounterpartKind,
}

/// Immutable index over a folder-per-class tree of paired files.
///
/// ```text
/// root/cat/0001.jpg
/// root/cat/0001.json
/// root/dog/walk/0042.jpg
/// root/dog/walk/0042.json
/// ```
///
/// Samples are ordered by class, then by directory path, then by base name.
/// Cloning only bumps the `Arc` counters.
#[derive(Debug, Clone)]
pub struct PairedIndex {
    root: PathBuf,
    image_extension: String,
    metadata_extension: String,
    classes: ClassMap,
    samples: Arc<[PairedSample]>,
    targets: Arc<[usize]>,
    missing: Arc<[MissingCounterpart]>,
}

impl PairedIndex {
    /// Scans `root` on the local filesystem.
    ///
    /// Extensions may be given with or without the leading dot (`"jpg"` or `".jpg"`).
    pub fn build(
        root: impl AsRef<Path>,
        image_extension: &str,
        metadata_extension: &str,
    ) -> Result<Self> {
        Self::build_with(&FsListing, root, image_extension, metadata_extension)
    }

    /// Scans `root` through an arbitrary [`DirectoryListing`].
    pub fn build_with(
        listing: &dyn DirectoryListing,
        root: impl AsRef<Path>,
        image_extension: &str,
        metadata_extension: &str,
    ) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let image_extension = normalize_extension(image_extension)?;
        let metadata_extension = normalize_extension(metadata_extension)?;
        if image_extension == metadata_extension {
            return Err(DatasetError::Config(format!(
                "Image and metadata extensions must differ (both are '.{}')",
                image_extension
            )));
        }

        let classes = find_classes(listing, &root)?;
        let mut samples = Vec::new();
        let mut missing = Vec::new();

        for (class_index, label) in classes.iter() {
            let class_dir = root.join(label);
            if !listing.is_dir(&class_dir) {
                continue;
            }
            let before = samples.len();

            for (dir, file_names) in listing.walk(&class_dir)? {
                let base_names: BTreeSet<&OsStr> = file_names
                    .iter()
                    .filter_map(|name| {
                        let path = Path::new(name);
                        let ext = path.extension()?;
                        if ext == image_extension.as_str() || ext == metadata_extension.as_str() {
                            path.file_stem()
                        } else {
                            None
                        }
                    })
                    .collect();

                for base in base_names {
                    let image_path = dir.join(with_extension(base, &image_extension));
                    let metadata_path = dir.join(with_extension(base, &metadata_extension));
                    let has_image = listing.exists(&image_path);
                    let has_metadata = listing.exists(&metadata_path);

                    if has_image && has_metadata {
                        samples.push(PairedSample {
                            image_path,
                            metadata_path,
                            class_index,
                        });
                        continue;
                    }
                    if !has_image {
                        tracing::warn!("Couldn't find img {}", image_path.display());
                        missing.push(MissingCounterpart {
                            path: image_path,
                            kind: CounterpartKind::Image,
                        });
                    }
                    if !has_metadata {
                        tracing::warn!("Couldn't find meta {}", metadata_path.display());
                        missing.push(MissingCounterpart {
                            path: metadata_path,
                            kind: CounterpartKind::Metadata,
                        });
                    }
                }
            }

            tracing::debug!(
                class = label,
                class_index,
                samples = samples.len() - before,
                "Scanned class folder"
            );
        }

        if samples.is_empty() {
            return Err(DatasetError::NoSamples {
                root,
                extensions: vec![
                    format!(".{}", image_extension),
                    format!(".{}", metadata_extension),
                ],
            });
        }

        tracing::info!(
            root = %root.display(),
            samples = samples.len(),
            classes = classes.len(),
            missing = missing.len(),
            "Built paired index"
        );

        let targets: Vec<usize> = samples.iter().map(|s| s.class_index).collect();
        Ok(Self {
            root,
            image_extension,
            metadata_extension,
            classes,
            samples: samples.into(),
            targets: targets.into(),
            missing: missing.into(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Image and metadata extensions, without the leading dot.
    pub fn extensions(&self) -> (&str, &str) {
        (&self.image_extension, &self.metadata_extension)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always `false` for a successfully built index; kept for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PairedSample> {
        self.samples.get(index)
    }

    pub fn samples(&self) -> &[PairedSample] {
        &self.samples
    }

    /// Class index of every sample, aligned with [`PairedIndex::samples`].
    pub fn targets(&self) -> &[usize] {
        &self.targets
    }

    pub fn class_map(&self) -> &ClassMap {
        &self.classes
    }

    pub fn classes(&self) -> &[String] {
        self.classes.classes()
    }

    /// Files dropped because their counterpart was missing.
    pub fn missing(&self) -> &[MissingCounterpart] {
        &self.missing
    }

    /// Number of samples per class, in class-index order.
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.classes.len()];
        for &t in self.targets.iter() {
            counts[t] += 1;
        }
        counts
    }
}

fn normalize_extension(ext: &str) -> Result<String> {
    let trimmed = ext.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        return Err(DatasetError::Config(format!(
            "File extension must not be empty (got '{}')",
            ext
        )));
    }
    Ok(trimmed.to_string())
}

/// `base.ext`, kept as raw OS bytes so names that are not UTF-8 survive.
fn with_extension(base: &OsStr, ext: &str) -> OsString {
    let mut name = base.to_os_string();
    name.push(".");
    name.push(ext);
    name
}
