pub mod contourarea;

pub use contourarea::ContourArea;
