use crate::config::JetSettings;
use crate::error::Result;
use crate::modules::input::Roi;

use opencv::core::{self, Mat, Point, Size};
use opencv::imgproc;
use opencv::prelude::*;

/// Measures how far the liquid thread reaches down from the top of its ROI.
///
/// Dark liquid on a bright back light: pixels darker than the threshold are
/// liquid. The jet length is the first ROI row without any liquid pixel.
pub struct JetGauge {
	threshold: f64,
	roi: Roi,
	kernel: Mat,
	iterations: i32,
}

impl JetGauge {
	pub fn new(settings: &JetSettings) -> Result<Self> {
		let kernel = imgproc::get_structuring_element(
			imgproc::MORPH_RECT,
			Size::new(settings.kernel_size, settings.kernel_size),
			Point::new(-1, -1),
		)?;
		Ok(Self {
			threshold: settings.threshold,
			roi: Roi::new(&settings.roi),
			kernel,
			iterations: settings.iterations,
		})
	}

	/// Filled binary ROI of the jet.
	pub fn mask(&self, frame: &Mat) -> Result<Mat> {
		let gray = if frame.channels() == 1 {
			frame.try_clone()?
		} else {
			let mut gray = Mat::default();
			imgproc::cvt_color(frame, &mut gray, imgproc::COLOR_BGR2GRAY, 0)?;
			gray
		};

		let mut binary = Mat::default();
		imgproc::threshold(&gray, &mut binary, self.threshold, 255., imgproc::THRESH_BINARY_INV)?;

		let roi = self.roi.crop(&binary)?;
		let mut filled = Mat::default();
		imgproc::morphology_ex(
			&roi,
			&mut filled,
			imgproc::MORPH_CLOSE,
			&self.kernel,
			Point::new(-1, -1),
			self.iterations,
			core::BORDER_CONSTANT,
			imgproc::morphology_default_border_value()?,
		)?;
		Ok(filled)
	}

	/// Jet length in ROI rows, `-1` when the jet fills the whole ROI.
	pub fn run(&self, frame: &Mat) -> Result<i32> {
		let filled = self.mask(frame)?;
		let filled = if filled.is_continuous() { filled } else { filled.try_clone()? };
		Ok(first_empty_row(filled.data_bytes()?, filled.cols() as usize))
	}
}

/// Index of the first row of a row-major 8-bit image whose pixels are all zero.
pub fn first_empty_row(data: &[u8], cols: usize) -> i32 {
	if cols == 0 {
		return -1;
	}
	data.chunks_exact(cols)
		.position(|row| row.iter().all(|&px| px == 0))
		.map_or(-1, |row| row as i32)
}
