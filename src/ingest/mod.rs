//! Frame ingestion sources.
//!
//! - Stub source (`stub://...`): deterministic synthetic frames for demos and tests
//! - Image directory (feature: ingest-images): one frame per image file, in name order
//!
//! Sources only read local paths. Every frame they produce has the configured
//! size, so the monitored-area mask built from the first frame fits them all.

pub mod file;
#[cfg(feature = "ingest-images")]
pub(crate) mod images;

pub use file::{FileSource, FileStats};
