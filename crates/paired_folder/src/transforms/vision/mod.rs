//! src/transforms/vision/mod.rs
//!
//! Image decoding and the geometric transforms applied to decoded samples.
//!
//! ```text
//! transforms/vision/
//! ├── geometric.rs     → Spatial transformations (RGB conversion, resize, center crop)
//! └── io.rs            → Image loading with an explicit decoder backend
//! ```
//!
//! ```ignore
//! use paired_folder::transforms::Transform;
//! use paired_folder::transforms::vision::{CenterCrop, Resize};
//! use image::imageops::FilterType;
//!
//! let pipeline = Resize::new(256, 256, FilterType::Triangle)?.then(CenterCrop::new(224, 224)?);
//! ```

pub mod geometric;
pub mod io;

pub use geometric::{CenterCrop, EnsureRgb, Resize};
pub use io::{ImageBackend, LoadImage};
