pub mod background;
pub mod blobs;
pub mod jet;

pub use background::ForegroundSegmenter;
pub use blobs::BlobExtractor;
pub use jet::JetGauge;
