use std::fs;
use std::path::PathBuf;

use opencv::core::Size;
use opencv::prelude::*;
use opencv::videoio::VideoWriter;

use crate::error::{DropError, Result};
use crate::modules::output::display::draw_overlay;
use crate::modules::{FrameView, OutputModule};

/// Writes the annotated ROI of every frame to an MJPG video.
///
/// The writer opens on the first frame, once the ROI size is known.
pub struct AnnotatedVideo {
	path: PathBuf,
	fps: f64,
	writer: Option<VideoWriter>,
	frames: u64,
}

impl AnnotatedVideo {
	pub fn new(path: PathBuf, fps: f64) -> Self {
		Self {
			path,
			fps,
			writer: None,
			frames: 0,
		}
	}

	fn open(&self, size: Size) -> Result<VideoWriter> {
		if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent)?;
		}
		let fourcc = VideoWriter::fourcc('M', 'J', 'P', 'G')?;
		let writer = VideoWriter::new(&self.path.to_string_lossy(), fourcc, self.fps, size, true)?;
		if !writer.is_opened()? {
			return Err(DropError::SourceUnavailable(self.path.display().to_string()));
		}
		Ok(writer)
	}
}

impl OutputModule for AnnotatedVideo {
	fn run(&mut self, view: &FrameView) -> Result<()> {
		let overlay = draw_overlay(view)?;
		if self.writer.is_none() {
			self.writer = Some(self.open(overlay.size()?)?);
		}
		if let Some(writer) = self.writer.as_mut() {
			writer.write(&overlay)?;
			self.frames += 1;
		}
		Ok(())
	}

	fn finish(&mut self) -> Result<()> {
		if let Some(mut writer) = self.writer.take() {
			writer.release()?;
			log::info!("Wrote {} annotated frames to {}", self.frames, self.path.display());
		}
		Ok(())
	}
}
