use std::path::Path;

use opencv::core::{self, Mat};
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture};

use crate::config::InputSettings;
use crate::error::{DropError, Result};
use crate::modules::InputModule;

/// Where frames come from.
#[derive(Debug, Clone)]
pub enum Source {
	File(String),
	Camera(i32),
}

impl Source {
	pub fn file(path: &Path) -> Self {
		Source::File(path.to_string_lossy().into_owned())
	}

	pub fn describe(&self) -> String {
		match self {
			Source::File(path) => path.clone(),
			Source::Camera(index) => format!("camera {}", index),
		}
	}
}

/// Frames from a stored video or a live camera, optionally rotated.
pub struct VideoInput {
	cap: VideoCapture,
	width: i32,
	height: i32,
	fps: f64,
	rotate: bool,
	remaining: Option<u64>,
}

impl VideoInput {
	pub fn open(source: &Source, settings: &InputSettings) -> Result<Self> {
		let mut cap = match source {
			Source::File(path) => VideoCapture::from_file(path, videoio::CAP_ANY)?,
			Source::Camera(index) => VideoCapture::new(*index, videoio::CAP_ANY)?,
		};
		if !cap.is_opened()? {
			return Err(DropError::SourceUnavailable(source.describe()));
		}

		if settings.start_frame > 0 {
			cap.set(videoio::CAP_PROP_POS_FRAMES, settings.start_frame as f64)?;
		}

		let width = cap.get(videoio::CAP_PROP_FRAME_WIDTH)? as i32;
		let height = cap.get(videoio::CAP_PROP_FRAME_HEIGHT)? as i32;
		let fps = cap.get(videoio::CAP_PROP_FPS)?;
		let remaining = settings.frame_limit();

		log::info!(
			"Opened {} ({}x{}, reported {:.1} fps)",
			source.describe(),
			width,
			height,
			fps
		);

		Ok(Self {
			cap,
			width,
			height,
			fps,
			rotate: settings.rotate,
			remaining,
		})
	}
}

impl InputModule for VideoInput {
	fn run(&mut self) -> Result<Option<Mat>> {
		if let Some(remaining) = self.remaining.as_mut() {
			if *remaining == 0 {
				return Ok(None);
			}
			*remaining -= 1;
		}

		let mut frame = Mat::default();
		if !self.cap.read(&mut frame)? || frame.empty() {
			return Ok(None);
		}
		if self.rotate {
			let mut rotated = Mat::default();
			core::rotate(&frame, &mut rotated, core::ROTATE_90_CLOCKWISE)?;
			return Ok(Some(rotated));
		}
		Ok(Some(frame))
	}

	fn width(&self) -> i32 {
		self.width
	}

	fn height(&self) -> i32 {
		self.height
	}

	fn fps(&self) -> f64 {
		self.fps
	}

	fn release(&mut self) -> Result<()> {
		if self.cap.is_opened()? {
			self.cap.release()?;
		}
		Ok(())
	}
}

impl Drop for VideoInput {
	fn drop(&mut self) {
		if let Err(e) = self.release() {
			log::warn!("Failed to release video source: {}", e);
		}
	}
}
