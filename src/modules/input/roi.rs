use opencv::core::{Mat, Rect};
use opencv::prelude::*;

use crate::config::RoiSettings;
use crate::error::{DropError, Result};

/// Fixed fractional sub-rectangle of every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Roi {
	x: f64,
	y: f64,
	width: f64,
	height: f64,
}

impl Roi {
	pub fn new(settings: &RoiSettings) -> Self {
		Self {
			x: settings.x,
			y: settings.y,
			width: settings.width,
			height: settings.height,
		}
	}

	/// Pixel rectangle for a `width`x`height` frame, clipped to the frame.
	pub fn resolve(&self, width: i32, height: i32) -> Result<Rect> {
		let x = (self.x * width as f64) as i32;
		let y = (self.y * height as f64) as i32;
		let w = (self.width * width as f64) as i32;
		let h = (self.height * height as f64) as i32;

		let x0 = x.clamp(0, width);
		let y0 = y.clamp(0, height);
		let x1 = (x + w).clamp(x0, width);
		let y1 = (y + h).clamp(y0, height);
		if x1 == x0 || y1 == y0 {
			return Err(DropError::EmptyRoi { width, height });
		}
		Ok(Rect::new(x0, y0, x1 - x0, y1 - y0))
	}

	/// Owned copy of the region so later drawing never touches the frame.
	pub fn crop(&self, frame: &Mat) -> Result<Mat> {
		let rect = self.resolve(frame.cols(), frame.rows())?;
		Ok(Mat::roi(frame, rect)?.try_clone()?)
	}
}
