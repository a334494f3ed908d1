pub mod roi;
pub mod video;

pub use roi::Roi;
pub use video::{Source, VideoInput};
