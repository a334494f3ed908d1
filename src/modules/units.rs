use std::f64::consts::PI;

use crate::error::{DropError, Result};

/// Radius of the circle whose area is `area`.
pub fn radius_from_area(area: f64) -> f64 {
	(area / PI).sqrt()
}

pub fn area_from_radius(radius: f64) -> f64 {
	PI * radius * radius
}

pub fn volume_from_radius(radius: f64) -> f64 {
	4. / 3. * PI * radius.powi(3)
}

/// Millimetres per pixel, fixed for a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
	ratio: f64,
}

impl Calibration {
	/// `scale_mm` is the physical width covered by `pixel_width` pixels.
	pub fn from_frame_width(scale_mm: f64, pixel_width: i32) -> Result<Self> {
		if pixel_width <= 0 {
			return Err(DropError::ZeroPixelWidth);
		}
		Ok(Self {
			ratio: scale_mm / pixel_width as f64,
		})
	}

	pub fn ratio(&self) -> f64 {
		self.ratio
	}

	pub fn to_mm(&self, px: f64) -> f64 {
		px * self.ratio
	}

	#[cfg(test)]
	pub fn to_px(&self, mm: f64) -> f64 {
		mm / self.ratio
	}
}
