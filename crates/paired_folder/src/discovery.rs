//! Class discovery for folder-per-class datasets.
//!
//! Discovery runs in two steps so each can be tested without real fixtures:
//! 1. [`list_subdirectories`] asks a [`DirectoryListing`] for the immediate
//!    subdirectories of the root and returns their names sorted and deduplicated.
//! 2. [`assign_indices`] turns that sorted list into a [`ClassMap`].

use crate::error::{DatasetError, Result};
use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Read-only view of a directory tree.
///
/// [`FsListing`] is the real filesystem; tests supply in-memory trees.
pub trait DirectoryListing: Send + Sync {
    /// Names of the immediate children of `dir` that are directories.
    fn subdirectories(&self, dir: &Path) -> Result<Vec<String>>;

    /// Every directory in the subtree rooted at `dir` (including `dir`), each
    /// paired with the names of the non-directory entries directly inside it.
    /// Directories are returned sorted by their full path string. Linked
    /// directories below `dir` are not descended.
    fn walk(&self, dir: &Path) -> Result<Vec<(PathBuf, Vec<OsString>)>>;

    fn exists(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;
}

/// [`DirectoryListing`] backed by `std::fs` and `walkdir`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsListing;

impl DirectoryListing for FsListing {
    fn subdirectories(&self, dir: &Path) -> Result<Vec<String>> {
        let entries = fs::read_dir(dir).map_err(|e| DatasetError::io(dir, e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| DatasetError::io(dir, e))?;
            // follows symlinks, so a linked class folder still counts
            if entry.path().is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(names)
    }

    fn walk(&self, dir: &Path) -> Result<Vec<(PathBuf, Vec<OsString>)>> {
        // keyed by the raw path so directories sort as whole strings:
        // `a`, `a-b`, `a/sub` rather than component by component
        let mut tree: BTreeMap<OsString, Vec<OsString>> = BTreeMap::new();
        let walker = WalkDir::new(dir)
            .follow_root_links(true)
            .follow_links(false)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(
                        path = %e.path().unwrap_or(dir).display(),
                        "Skipping unreadable entry: {}",
                        e
                    );
                    continue;
                }
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                tree.entry(entry.path().as_os_str().to_os_string())
                    .or_default();
                continue;
            }
            // a linked directory is not descended; any other link, dangling
            // or not, is listed by name and left to `exists`
            if file_type.is_symlink() && fs::metadata(entry.path()).is_ok_and(|m| m.is_dir()) {
                continue;
            }
            let parent = entry.path().parent().unwrap_or(dir);
            tree.entry(parent.as_os_str().to_os_string())
                .or_default()
                .push(entry.file_name().to_os_string());
        }

        Ok(tree
            .into_iter()
            .map(|(dir, names)| (PathBuf::from(dir), names))
            .collect())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}

/// Sorted, deduplicated names of the class folders directly under `root`.
pub fn list_subdirectories(listing: &dyn DirectoryListing, root: &Path) -> Result<Vec<String>> {
    let mut names = listing.subdirectories(root)?;
    names.sort();
    names.dedup();
    Ok(names)
}

/// Bidirectional mapping between class labels and 0-based class indices.
///
/// Indices follow the order of the label list, which [`assign_indices`]
/// expects to be sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassMap {
    classes: Vec<String>,
    class_to_idx: HashMap<String, usize>,
}

impl ClassMap {
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn class_to_idx(&self) -> &HashMap<String, usize> {
        &self.class_to_idx
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.class_to_idx.get(label).copied()
    }

    pub fn label_of(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Labels in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.classes.iter().enumerate().map(|(i, c)| (i, c.as_str()))
    }
}

/// Assigns each name its position in `names`.
pub fn assign_indices(names: Vec<String>) -> ClassMap {
    let class_to_idx = names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), i))
        .collect();
    ClassMap {
        classes: names,
        class_to_idx,
    }
}

/// Discovers the classes under `root`: list, sort, index.
pub fn find_classes(listing: &dyn DirectoryListing, root: &Path) -> Result<ClassMap> {
    Ok(assign_indices(list_subdirectories(listing, root)?))
}
