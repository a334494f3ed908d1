use crate::config::ThresholdSettings;
use crate::error::Result;
use crate::modules::ThresholdModule;

use opencv::core::{self, Mat, Point, Ptr, Size};
use opencv::imgproc;
use opencv::prelude::*;
use opencv::video::{self, BackgroundSubtractorMOG2, BackgroundSubtractorTrait};

/// Adaptive MOG2 background model plus mask cleanup.
///
/// The model learns from every frame it is given, so frames must arrive in
/// capture order and one segmenter serves exactly one run.
pub struct ForegroundSegmenter {
	mog2: Ptr<BackgroundSubtractorMOG2>,
	kernel: Mat,
	fg_mask: Mat,
}

impl ForegroundSegmenter {
	pub fn new(settings: &ThresholdSettings) -> Result<Self> {
		let mog2 = video::create_background_subtractor_mog2(
			settings.history,
			settings.var_threshold,
			settings.detect_shadows,
		)?;
		let kernel = imgproc::get_structuring_element(
			imgproc::MORPH_RECT,
			Size::new(settings.kernel_size, settings.kernel_size),
			Point::new(-1, -1),
		)?;

		Ok(Self {
			mog2,
			kernel,
			fg_mask: Mat::default(),
		})
	}

	/// Strict 0/255 binarisation, closing, then opening.
	///
	/// Shadow pixels (127) end up as foreground.
	pub fn clean_mask(&self, raw: &Mat) -> Result<Mat> {
		let mut binary = Mat::default();
		imgproc::threshold(raw, &mut binary, 0., 255., imgproc::THRESH_BINARY)?;

		let mut closed = Mat::default();
		imgproc::morphology_ex(
			&binary,
			&mut closed,
			imgproc::MORPH_CLOSE,
			&self.kernel,
			Point::new(-1, -1),
			1,
			core::BORDER_CONSTANT,
			imgproc::morphology_default_border_value()?,
		)?;
		let mut opened = Mat::default();
		imgproc::morphology_ex(
			&closed,
			&mut opened,
			imgproc::MORPH_OPEN,
			&self.kernel,
			Point::new(-1, -1),
			1,
			core::BORDER_CONSTANT,
			imgproc::morphology_default_border_value()?,
		)?;
		Ok(opened)
	}
}

impl ThresholdModule for ForegroundSegmenter {
	fn run(&mut self, frame: &Mat) -> Result<Mat> {
		BackgroundSubtractorTrait::apply(&mut self.mog2, frame, &mut self.fg_mask, -1.)?;
		self.clean_mask(&self.fg_mask)
	}
}
