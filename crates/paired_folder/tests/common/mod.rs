#![allow(dead_code)]

use anyhow::Result;
use image::{Rgb, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Builds a throwaway `root/<class>/**/<base>.<ext>` tree on disk.
pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Writes a `width` x `height` JPEG filled with `colour` at `rel`.
    pub fn image(&self, rel: &str, width: u32, height: u32, colour: [u8; 3]) -> Result<PathBuf> {
        let path = self.prepare(rel)?;
        RgbImage::from_pixel(width, height, Rgb(colour)).save(&path)?;
        Ok(path)
    }

    /// Writes a JSON sidecar at `rel`.
    pub fn metadata(&self, rel: &str, json: &str) -> Result<PathBuf> {
        let path = self.prepare(rel)?;
        fs::write(&path, json)?;
        Ok(path)
    }

    /// Writes `bytes` verbatim at `rel`.
    pub fn raw(&self, rel: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.prepare(rel)?;
        fs::write(&path, bytes)?;
        Ok(path)
    }

    /// An 8x6 image plus a `{"pano_id": ...}` sidecar under `class/base`.
    pub fn pair(&self, class: &str, base: &str) -> Result<()> {
        self.image(&format!("{class}/{base}.jpg"), 8, 6, [200, 40, 40])?;
        self.metadata(
            &format!("{class}/{base}.json"),
            &format!(r#"{{"pano_id": "{base}", "label": "{class}"}}"#),
        )?;
        Ok(())
    }

    fn prepare(&self, rel: &str) -> Result<PathBuf> {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(path)
    }
}
