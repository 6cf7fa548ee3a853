use crate::transforms::Transform;
use anyhow::{ensure, Result};
use image::{imageops::FilterType, DynamicImage, GenericImageView};

// ============================================================================
// EnsureRgb
// ============================================================================
/// Ensures that the image is indeed 3-channel RGB
#[derive(Debug, Clone)]
pub struct EnsureRgb;

impl Transform<DynamicImage, DynamicImage> for EnsureRgb {
    fn apply(&self, img: DynamicImage) -> Result<DynamicImage> {
        Ok(match img {
            DynamicImage::ImageRgb8(_) => img,
            _ => DynamicImage::ImageRgb8(img.to_rgb8()),
        })
    }
}

// ============================================================================
// Resize
// ============================================================================

/// Resizes an image to exactly `width` x `height`, ignoring the aspect ratio.
///
/// # Filter Types
/// - `Nearest`: Nearest neighbour, fastest
/// - `Triangle`: Bilinear filter, good all-round default
/// - `CatmullRom`: Bicubic sharpening
/// - `Gaussian`: Blurring/smoothing
/// - `Lanczos3`: Lanczos with window 3, highest quality re-sampling but slowest.
///
/// # Examples
/// ``` ignore
/// # use image::imageops::FilterType;
/// let resize = Resize::new(224, 224, FilterType::Triangle)?;
/// let resized = resize.apply(img)?;
/// ```
#[derive(Debug)]
pub struct Resize {
    width: u32,
    height: u32,
    filter: FilterType,
}

impl Resize {
    pub fn new(width: u32, height: u32, filter: FilterType) -> Result<Self> {
        ensure!(
            width > 0 && height > 0,
            "Image dimensions must be positive after resizing (got {}x{})",
            width,
            height
        );
        Ok(Self {
            width,
            height,
            filter,
        })
    }

    /// Square resize with bilinear filtering.
    pub fn square(size: u32) -> Result<Self> {
        Self::new(size, size, FilterType::Triangle)
    }
}

impl Transform<DynamicImage, DynamicImage> for Resize {
    fn apply(&self, img: DynamicImage) -> Result<DynamicImage> {
        if img.dimensions() == (self.width, self.height) {
            return Ok(img);
        }
        Ok(img.resize_exact(self.width, self.height, self.filter))
    }

    fn describe(&self) -> String {
        format!(
            "Resize(size=({}, {}), filter={:?})",
            self.width, self.height, self.filter
        )
    }
}

// ============================================================================
// CenterCrop
// ============================================================================

/// Crops a `width` x `height` window from the centre of the image.
///
/// Odd margins put the extra pixel on the right/bottom. Images smaller than
/// the window are rejected rather than padded.
#[derive(Debug, Clone)]
pub struct CenterCrop {
    width: u32,
    height: u32,
}

impl CenterCrop {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        ensure!(
            width > 0 && height > 0,
            "Crop size must be positive (got {}x{})",
            width,
            height
        );
        Ok(Self { width, height })
    }
}

impl Transform<DynamicImage, DynamicImage> for CenterCrop {
    fn apply(&self, img: DynamicImage) -> Result<DynamicImage> {
        let (w, h) = img.dimensions();
        ensure!(
            self.width <= w && self.height <= h,
            "Crop size {}x{} exceeds image size {}x{}",
            self.width,
            self.height,
            w,
            h
        );
        let left = (w - self.width) / 2;
        let top = (h - self.height) / 2;
        Ok(img.crop_imm(left, top, self.width, self.height))
    }

    fn describe(&self) -> String {
        format!("CenterCrop(size=({}, {}))", self.width, self.height)
    }
}
