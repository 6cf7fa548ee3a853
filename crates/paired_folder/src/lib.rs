pub mod config;
pub mod dataset;
pub mod discovery;
pub mod error;
pub mod index;
pub mod sampler;
pub mod transforms;

pub use config::PairedFolderConfig;
pub use dataset::PairedImageFolder;
pub use discovery::{ClassMap, DirectoryListing, FsListing};
pub use error::{DatasetError, Result};
pub use index::{CounterpartKind, MissingCounterpart, PairedIndex, PairedSample};
pub use sampler::{RandomSampler, Sampler, SequentialSampler};
pub use transforms::vision::{ImageBackend, LoadImage};
