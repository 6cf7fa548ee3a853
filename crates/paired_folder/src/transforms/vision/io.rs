use crate::error::DatasetError;
use crate::transforms::Transform;
use anyhow::{Context, Result};
use image::{DynamicImage, ImageReader};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;

// ============================================================================
// ImageBackend
// ============================================================================

/// Decoder used to turn image files into pixels.
///
/// The backend is chosen once, when the loader is built, and never changes
/// afterwards. There is no process-wide default to flip at runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageBackend {
    /// Pure-Rust decoders from the `image` crate. Handles every format it knows.
    #[default]
    Image,
    /// libjpeg-turbo for JPEG files (requires the `turbojpeg` feature).
    /// Other formats, and JPEGs libjpeg-turbo rejects, go through `Image`.
    TurboJpeg,
}

impl ImageBackend {
    pub fn is_available(&self) -> bool {
        match self {
            ImageBackend::Image => true,
            ImageBackend::TurboJpeg => cfg!(feature = "turbojpeg"),
        }
    }
}

impl fmt::Display for ImageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageBackend::Image => write!(f, "image"),
            ImageBackend::TurboJpeg => write!(f, "turbojpeg"),
        }
    }
}

impl FromStr for ImageBackend {
    type Err = DatasetError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "image" | "pil" => Ok(ImageBackend::Image),
            "turbojpeg" | "turbo" => Ok(ImageBackend::TurboJpeg),
            other => Err(DatasetError::Config(format!(
                "Unknown image backend '{}' (expected 'image' or 'turbojpeg')",
                other
            ))),
        }
    }
}

// ============================================================================
// LoadImage
// ============================================================================

/// Loads an image file and converts it to 8-bit RGB.
///
/// # Input/Output
/// - **Input**: `PathBuf` - File path to image
/// - **Output**: `DynamicImage::ImageRgb8`, whatever the colour model on disk
///
/// # Example
/// ```ignore
/// let loader = LoadImage::new(ImageBackend::Image)?;
/// let image = loader.apply(PathBuf::from("photo.jpg"))?;
/// println!("Image size: {:?}", image.dimensions());
/// ```
#[derive(Debug, Clone)]
pub struct LoadImage {
    backend: ImageBackend,
    buffer_size: usize,
}

impl LoadImage {
    /// Creates a loader with an 8KB read buffer.
    ///
    /// Fails if the backend was not compiled into this build.
    pub fn new(backend: ImageBackend) -> std::result::Result<Self, DatasetError> {
        if !backend.is_available() {
            return Err(DatasetError::Config(format!(
                "Image backend '{}' is not available; rebuild with the `turbojpeg` feature",
                backend
            )));
        }
        Ok(Self {
            backend,
            buffer_size: 8192,
        })
    }

    pub fn backend(&self) -> ImageBackend {
        self.backend
    }

    /// Decodes `path` with the configured backend.
    pub fn load(&self, path: &Path) -> Result<DynamicImage> {
        let image = match self.backend {
            ImageBackend::TurboJpeg if Self::is_jpeg_file(path) => {
                self.load_jpeg_turbo(path).or_else(|turbo_error| {
                    tracing::warn!(
                        path = %path.display(),
                        error = %turbo_error,
                        "TurboJPEG failed, falling back to standard decoder"
                    );
                    self.load_standard_format(path)
                })?
            }
            _ => self.load_standard_format(path)?,
        };

        Ok(match image {
            DynamicImage::ImageRgb8(_) => image,
            other => DynamicImage::ImageRgb8(other.to_rgb8()),
        })
    }

    /// Loads any format supported by the `image` crate.
    fn load_standard_format(&self, path: &Path) -> Result<DynamicImage> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open image: {}", path.display()))?;

        let file_size = file.metadata()?.len() as usize;
        let mut reader = BufReader::with_capacity(self.buffer_size, file);
        let mut buffer = Vec::with_capacity(file_size);
        reader
            .read_to_end(&mut buffer)
            .with_context(|| format!("Failed to read image: {}", path.display()))?;

        let image = ImageReader::new(Cursor::new(buffer))
            .with_guessed_format()?
            .decode()
            .with_context(|| format!("Failed to decode image: {}", path.display()))?;

        Ok(image)
    }

    #[cfg(feature = "turbojpeg")]
    fn load_jpeg_turbo(&self, path: &Path) -> Result<DynamicImage> {
        use image::RgbImage;
        use turbojpeg::{Decompressor, Image, PixelFormat};

        let mut file =
            File::open(path).with_context(|| format!("Failed to open JPEG: {}", path.display()))?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)
            .with_context(|| format!("Failed to read JPEG: {}", path.display()))?;

        let mut decompressor =
            Decompressor::new().with_context(|| "Failed to create TurboJPEG decompressor")?;
        let header = decompressor
            .read_header(&buffer)
            .with_context(|| format!("Failed to read JPEG header: {}", path.display()))?;

        let (width, height) = (header.width, header.height);
        let mut rgb_data = vec![0u8; width * height * 3];
        let output_image = Image {
            pixels: rgb_data.as_mut_slice(),
            width,
            height,
            format: PixelFormat::RGB,
            pitch: width * 3,
        };
        decompressor
            .decompress(&buffer, output_image)
            .with_context(|| format!("Failed to decompress JPEG: {}", path.display()))?;

        let rgb_image = RgbImage::from_raw(width as u32, height as u32, rgb_data)
            .ok_or_else(|| anyhow::anyhow!("Failed to create RGB image from TurboJPEG data"))?;
        Ok(DynamicImage::ImageRgb8(rgb_image))
    }

    #[cfg(not(feature = "turbojpeg"))]
    fn load_jpeg_turbo(&self, path: &Path) -> Result<DynamicImage> {
        anyhow::bail!(
            "TurboJPEG support is not compiled in, cannot decode {}",
            path.display()
        )
    }

    fn is_jpeg_file(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |extension| {
                matches!(extension.to_lowercase().as_str(), "jpg" | "jpeg")
            })
    }
}

impl Transform<PathBuf, DynamicImage> for LoadImage {
    fn apply(&self, path: PathBuf) -> Result<DynamicImage> {
        self.load(&path)
    }

    fn describe(&self) -> String {
        format!("LoadImage(backend={})", self.backend)
    }
}
