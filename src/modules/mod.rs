pub mod input;
pub mod threshold;
pub mod filter;
pub mod output;
pub mod tracker;
pub mod units;

use opencv::core::{Mat, Point, Rect, Vector};

use crate::error::Result;
use crate::modules::output::Record;
use crate::modules::tracker::{Centroid, Crossing};

/// Best-fit ellipse of a blob, in ROI pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EllipseFit {
	pub center: (f32, f32),
	pub major: f32,
	pub minor: f32,
	/// Rotation in degrees as reported by the fitter.
	pub angle: f32,
}

/// One connected foreground component of the current frame.
///
/// Blobs never outlive their frame; only their centroids are carried over.
pub struct Blob {
	pub cnt: Vector<Point>,
	pub area: f64,
	pub centroid: Centroid,
	pub bounding: Rect,
	pub ellipse: Option<EllipseFit>,
}

impl Blob {
	/// Radius of the circle with the same area, in pixels.
	pub fn radius_px(&self) -> f64 {
		units::radius_from_area(self.area)
	}
}

/// Everything an output needs to know about one processed frame.
pub struct FrameView<'a> {
	pub frame_no: u64,
	pub time: f64,
	pub frame: &'a Mat,
	pub roi: &'a Mat,
	pub mask: &'a Mat,
	pub blobs: &'a [Blob],
	pub crossings: &'a [Crossing],
	pub records: &'a [Record],
	pub drop_count: usize,
	pub line_position: i32,
}

pub trait InputModule {
	/// Next frame, or `None` once the source is exhausted.
	fn run(&mut self) -> Result<Option<Mat>>;
	fn width(&self) -> i32;
	fn height(&self) -> i32;
	fn fps(&self) -> f64;
	fn release(&mut self) -> Result<()>;
}

pub trait ThresholdModule {
	fn run(&mut self, frame: &Mat) -> Result<Mat>;
}

pub trait FilterModule {
	fn run(&self, object: &Blob) -> bool;
}

pub trait OutputModule {
	fn run(&mut self, view: &FrameView) -> Result<()>;
	/// Called once after the last frame, also after an early stop.
	fn finish(&mut self) -> Result<()>;
}
