pub mod annotate;
pub mod crops;
pub mod display;
pub mod table;

pub use annotate::AnnotatedVideo;
pub use crops::CropWriter;
pub use display::{Control, DebugDisplay};
pub use table::{Record, TableWriter};
