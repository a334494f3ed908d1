use crate::config::FilterSettings;
use crate::modules::FilterModule;
use crate::modules::Blob;

/// Keeps blobs whose contour area lies strictly inside `(min, max)`.
pub struct ContourArea {
	min: f64,
	max: f64,
}

impl FilterModule for ContourArea {
	fn run(&self, object: &Blob) -> bool {
		self.accepts(object.area)
	}
}

impl ContourArea {
	pub fn new(min: f64, max: f64) -> Self {
		Self { min, max }
	}

	pub fn from_settings(settings: &FilterSettings) -> Self {
		Self::new(settings.min_area, settings.max_area)
	}

	pub fn accepts(&self, area: f64) -> bool {
		area > self.min && area < self.max
	}
}
