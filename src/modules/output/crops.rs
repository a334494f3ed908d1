use std::fs;
use std::path::PathBuf;

use opencv::core::{Mat, Rect, Vector};
use opencv::imgcodecs;
use opencv::prelude::*;

use crate::error::Result;
use crate::modules::{FrameView, OutputModule};

/// Saves the ROI patch under every fitted drop as `drop_frame{N}.png`.
pub struct CropWriter {
	dir: PathBuf,
	written: usize,
}

impl CropWriter {
	pub fn new(dir: PathBuf) -> Result<Self> {
		fs::create_dir_all(&dir)?;
		Ok(Self { dir, written: 0 })
	}
}

/// `bounding` limited to a `cols`x`rows` image; `None` if nothing is left.
pub fn clamp_rect(bounding: Rect, cols: i32, rows: i32) -> Option<Rect> {
	let x = bounding.x.max(0);
	let y = bounding.y.max(0);
	let w = bounding.width.min(cols - x);
	let h = bounding.height.min(rows - y);
	if w <= 0 || h <= 0 {
		return None;
	}
	Some(Rect::new(x, y, w, h))
}

impl OutputModule for CropWriter {
	fn run(&mut self, view: &FrameView) -> Result<()> {
		for blob in view.blobs.iter().filter(|b| b.ellipse.is_some()) {
			let rect = match clamp_rect(blob.bounding, view.roi.cols(), view.roi.rows()) {
				Some(rect) => rect,
				None => continue,
			};
			let crop: Mat = Mat::roi(view.roi, rect)?.try_clone()?;
			// Later blobs of the same frame overwrite earlier ones.
			let path = self.dir.join(format!("drop_frame{}.png", view.frame_no));
			imgcodecs::imwrite(&path.to_string_lossy(), &crop, &Vector::new())?;
			self.written += 1;
		}
		Ok(())
	}

	fn finish(&mut self) -> Result<()> {
		log::info!("Saved {} drop crops to {}", self.written, self.dir.display());
		Ok(())
	}
}
