use opencv::core::{Mat, Point, Scalar, Size, Vector};
use opencv::highgui;
use opencv::imgproc;
use opencv::prelude::*;

use crate::error::Result;
use crate::modules::FrameView;

const KEY_PAUSE: i32 = 'p' as i32;
const KEY_QUIT: [i32; 2] = ['c' as i32, 'q' as i32];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
	Continue,
	Quit,
}

/// Copy of the ROI with drops, fitted ellipses, and the counting line drawn in.
pub fn draw_overlay(view: &FrameView) -> Result<Mat> {
	let mut roi = if view.roi.channels() == 1 {
		let mut bgr = Mat::default();
		imgproc::cvt_color(view.roi, &mut bgr, imgproc::COLOR_GRAY2BGR, 0)?;
		bgr
	} else {
		view.roi.try_clone()?
	};

	let mut cnts: Vector<Vector<Point>> = Vector::new();
	for blob in view.blobs.iter() {
		cnts.push(Vector::<Point>::from_iter(blob.cnt.iter()));
	}
	if !cnts.is_empty() {
		imgproc::fill_poly(&mut roi, &cnts, Scalar::new(8., 255., 0., 0.), imgproc::LINE_8, 0, Point::new(0, 0))?;
	}

	for blob in view.blobs.iter() {
		if let Some(ellipse) = blob.ellipse {
			imgproc::ellipse(
				&mut roi,
				Point::new(ellipse.center.0 as i32, ellipse.center.1 as i32),
				Size::new((ellipse.major / 2.) as i32, (ellipse.minor / 2.) as i32),
				ellipse.angle as f64,
				0.,
				360.,
				Scalar::new(255., 0., 0., 0.),
				2,
				imgproc::LINE_8,
				0,
			)?;
		}
	}

	for crossing in view.crossings.iter() {
		imgproc::circle(
			&mut roi,
			Point::new(crossing.centroid.x, crossing.centroid.y),
			4,
			Scalar::new(255., 0., 255., 0.),
			-1,
			imgproc::LINE_8,
			0,
		)?;
	}

	let cols = roi.cols();
	imgproc::line(
		&mut roi,
		Point::new(0, view.line_position),
		Point::new(cols, view.line_position),
		Scalar::new(0., 0., 255., 0.),
		2,
		imgproc::LINE_8,
		0,
	)?;
	Ok(roi)
}

fn put_status(frame: &mut Mat, lines: &[String]) -> Result<()> {
	for (i, text) in lines.iter().enumerate() {
		imgproc::put_text(
			frame,
			text,
			Point::new(10, 30 * (i as i32 + 1)),
			imgproc::FONT_HERSHEY_SIMPLEX,
			1.,
			Scalar::new(0., 255., 0., 0.),
			2,
			imgproc::LINE_8,
			false,
		)?;
	}
	Ok(())
}

/// Debug windows: the half-size frame with status text, the mask, and the ROI.
///
/// `p` pauses and resumes, `c` or `q` stops the run.
pub struct DebugDisplay {
	paused: bool,
}

impl DebugDisplay {
	pub fn new() -> Self {
		Self { paused: false }
	}

	pub fn show(&mut self, view: &FrameView) -> Result<Control> {
		let roi = draw_overlay(view)?;

		let mut frame = view.frame.try_clone()?;
		put_status(
			&mut frame,
			&[
				format!("Drop Count: {}", view.drop_count),
				format!("Frame no.: {}", view.frame_no),
				format!("Drops in ROI: {}", view.blobs.len()),
			],
		)?;
		let mut small = Mat::default();
		imgproc::resize(&frame, &mut small, Size::new(0, 0), 0.5, 0.5, imgproc::INTER_LINEAR)?;

		highgui::imshow("Frame", &small)?;
		highgui::imshow("Mask", view.mask)?;
		highgui::imshow("ROI", &roi)?;

		let mut key = highgui::wait_key(1)? & 0xFF;
		loop {
			if KEY_QUIT.contains(&key) {
				return Ok(Control::Quit);
			}
			if key == KEY_PAUSE {
				self.paused = !self.paused;
				log::info!("{} at frame {}", if self.paused { "Paused" } else { "Resumed" }, view.frame_no);
			}
			if !self.paused {
				return Ok(Control::Continue);
			}
			key = highgui::wait_key(50)? & 0xFF;
		}
	}

	pub fn close(&self) -> Result<()> {
		highgui::destroy_all_windows()?;
		Ok(())
	}
}

impl Default for DebugDisplay {
	fn default() -> Self {
		Self::new()
	}
}
