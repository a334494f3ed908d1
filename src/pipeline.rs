//! The drop counting and measuring engine.
//!
//! One [`Pipeline`] serves one run of one source: the background model and the
//! previous-frame centroids it owns only make sense for frames of that source
//! in capture order.

use std::path::{Path, PathBuf};

use itertools::Itertools;
use opencv::core::{Mat, Size};
use opencv::prelude::*;
use serde::Serialize;

use crate::analysis::histogram::{linspace, Histogram};
use crate::analysis::table;
use crate::config::{OutputSettings, RecordKind, Settings};
use crate::error::{DropError, Result};
use crate::modules::filter::ContourArea;
use crate::modules::input::Roi;
use crate::modules::output::{Control, DebugDisplay, Record};
use crate::modules::threshold::{BlobExtractor, ForegroundSegmenter, JetGauge};
use crate::modules::tracker::{Crossing, CrossingTracker};
use crate::modules::units::Calibration;
use crate::modules::{Blob, FilterModule, FrameView, InputModule, OutputModule, ThresholdModule};

/// Result of one frame.
pub struct FrameReport {
	pub frame_no: u64,
	pub time: f64,
	pub blobs: Vec<Blob>,
	pub crossings: Vec<Crossing>,
	pub records: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
	pub frames: u64,
	pub drop_count: usize,
	pub crossing_times: Vec<f64>,
	/// Time between consecutive crossings.
	pub intervals: Vec<f64>,
	/// Equivalent radius of every retained blob, in frame order.
	pub radii_mm: Vec<f64>,
	/// Mean of `radii_mm`, if there was a blob.
	pub mean_radius_mm: Option<f64>,
	pub records: usize,
	pub stopped_early: bool,
}

impl RunSummary {
	pub fn log(&self) {
		match self.mean_radius_mm {
			Some(radius) => log::info!("Final Mean Radius: {:.2} mm", radius),
			None => log::info!("Final Mean Radius: no drops measured"),
		}
		log::info!("Total Drop Count: {}", self.drop_count);
		log::info!("Frames processed: {}", self.frames);
		log::info!("Crossing times: {:?}", self.crossing_times);
		log::info!("Time difference between consecutive drops: {:?}", self.intervals);
		if self.stopped_early {
			log::info!("Run was stopped before the end of the source");
		}
	}

	/// Density histogram of the blob radii, over the configured range when
	/// there is one. `None` when no radius falls inside it.
	pub fn radius_histogram(&self, settings: &OutputSettings) -> Result<Option<Histogram>> {
		let hist = match (settings.radius_min, settings.radius_max) {
			(Some(lo), Some(hi)) => Histogram::with_edges(&self.radii_mm, linspace(lo, hi, settings.histogram_bins + 1))?,
			_ if self.radii_mm.is_empty() => return Ok(None),
			_ => Histogram::new(&self.radii_mm, settings.histogram_bins)?,
		};
		Ok((hist.total() > 0.).then_some(hist))
	}

	/// Count histogram of the times between consecutive crossings.
	pub fn interval_histogram(&self, settings: &OutputSettings) -> Result<Option<Histogram>> {
		if self.intervals.is_empty() {
			return Ok(None);
		}
		Histogram::new(&self.intervals, settings.histogram_bins).map(Some)
	}

	/// Writes `<stem>_radius_histogram.csv` and `<stem>_intervals.csv` into
	/// `dir`, skipping a histogram with nothing in it.
	pub fn write_histograms(&self, dir: &Path, stem: &str, settings: &OutputSettings) -> Result<Vec<PathBuf>> {
		let mut written = Vec::new();
		match self.radius_histogram(settings)? {
			Some(hist) => {
				let path = dir.join(format!("{}_radius_histogram.csv", stem));
				table::write_rows(&path, &hist.rows(hist.density()))?;
				written.push(path);
			}
			None => log::info!("No radii to histogram for {}", stem),
		}
		match self.interval_histogram(settings)? {
			Some(hist) => {
				let path = dir.join(format!("{}_intervals.csv", stem));
				table::write_rows(&path, &hist.rows(hist.counts.clone()))?;
				written.push(path);
			}
			None => log::info!("Fewer than two crossings in {}, no interval histogram", stem),
		}
		Ok(written)
	}
}

pub struct Pipeline {
	roi: Roi,
	segmenter: ForegroundSegmenter,
	extractor: BlobExtractor,
	tracker: CrossingTracker,
	calibration: Calibration,
	record: RecordKind,
	fps: f64,
	first_frame_no: u64,
	frame_size: Option<Size>,
	frames: u64,
	records: usize,
	radii_px: Vec<f64>,
}

impl Pipeline {
	/// `pixel_width` is the width reported by the source, used for calibration.
	pub fn new(settings: &Settings, pixel_width: i32) -> Result<Self> {
		let calibration = Calibration::from_frame_width(settings.input.scale_mm, pixel_width)?;
		log::info!("Calibration: {:.5} mm/px", calibration.ratio());

		let filters: Vec<Box<dyn FilterModule>> = vec![Box::new(ContourArea::from_settings(&settings.filter))];

		Ok(Self {
			roi: Roi::new(&settings.roi),
			segmenter: ForegroundSegmenter::new(&settings.threshold)?,
			extractor: BlobExtractor::new(filters),
			tracker: CrossingTracker::new(settings.tracker.line_position, settings.input.fps),
			calibration,
			record: settings.output.record,
			fps: settings.input.fps,
			first_frame_no: settings.input.first_frame_no(),
			frame_size: None,
			frames: 0,
			records: 0,
			radii_px: Vec::new(),
		})
	}

	pub fn drop_count(&self) -> usize {
		self.tracker.drop_count()
	}

	/// Blob extraction, crossing test, and record building for a binary ROI mask.
	pub fn process_mask(&mut self, frame_no: u64, mask: &Mat) -> Result<FrameReport> {
		let time = frame_no as f64 / self.fps;
		let blobs = self.extractor.run(mask)?;

		let centroids = blobs.iter().map(|b| b.centroid).collect();
		let crossings = self.tracker.update(frame_no, centroids);
		for crossing in crossings.iter() {
			log::debug!(
				"Drop {} crossed at frame {} ({:.4} s)",
				self.tracker.drop_count(),
				crossing.frame_no,
				crossing.time
			);
		}

		self.radii_px.extend(blobs.iter().map(Blob::radius_px));

		let records = self.build_records(frame_no, time, &blobs, &crossings);
		self.records += records.len();
		self.frames += 1;

		Ok(FrameReport {
			frame_no,
			time,
			blobs,
			crossings,
			records,
		})
	}

	fn build_records(&self, frame_no: u64, time: f64, blobs: &[Blob], crossings: &[Crossing]) -> Vec<Record> {
		let mm = |px: f64| self.calibration.to_mm(px);
		match self.record {
			RecordKind::Trajectory => blobs
				.iter()
				.map(|b| Record::Trajectory {
					y_mm: mm(b.centroid.y as f64),
					time,
				})
				.collect(),
			RecordKind::TrajectoryRadius => blobs
				.iter()
				.map(|b| Record::TrajectoryRadius {
					y_mm: mm(b.centroid.y as f64),
					time,
					radius_mm: mm(b.radius_px()),
				})
				.collect(),
			RecordKind::Crossing => crossings
				.iter()
				.map(|c| Record::Crossing {
					x_mm: mm(c.centroid.x as f64),
					y_mm: mm(c.centroid.y as f64),
					time: c.time,
					radius_mm: mm(blobs[c.index].radius_px()),
				})
				.collect(),
			RecordKind::Ellipse => blobs
				.iter()
				.filter_map(|b| b.ellipse)
				.map(|e| Record::Ellipse {
					frame: frame_no,
					time,
					x_mm: mm(e.center.0 as f64),
					y_mm: mm(e.center.1 as f64),
					major_mm: mm(e.major as f64),
					minor_mm: mm(e.minor as f64),
					angle_deg: e.angle as f64,
				})
				.collect(),
		}
	}

	/// Full per-frame chain: size check, ROI, segmentation, then [`Self::process_mask`].
	pub fn process_frame(&mut self, frame_no: u64, frame: &Mat) -> Result<(Mat, Mat, FrameReport)> {
		let size = frame.size()?;
		match self.frame_size {
			None => self.frame_size = Some(size),
			Some(expected) if expected != size => {
				return Err(DropError::DimensionChanged {
					frame_no,
					width: expected.width,
					height: expected.height,
					found_width: size.width,
					found_height: size.height,
				});
			}
			Some(_) => {}
		}

		let roi = self.roi.crop(frame)?;
		let mask = self.segmenter.run(&roi)?;
		let report = self.process_mask(frame_no, &mask)?;
		Ok((roi, mask, report))
	}

	/// Reads `input` to the end, or until the display asks to stop.
	///
	/// Outputs are finished after a normal end and after a stop key; a fatal
	/// error skips them so no partial table is mistaken for a result. The
	/// source is released and the display closed either way.
	pub fn run(
		&mut self,
		input: &mut dyn InputModule,
		outputs: &mut [Box<dyn OutputModule>],
		mut display: Option<&mut DebugDisplay>,
	) -> Result<RunSummary> {
		log::debug!(
			"Source is {}x{} at a reported {:.1} fps, timing at {} fps",
			input.width(),
			input.height(),
			input.fps(),
			self.fps
		);

		let read = self.read_frames(input, outputs, display.as_deref_mut());
		let released = input.release();
		let closed = display.map_or(Ok(()), |display| display.close());
		let stopped_early = read?;
		released?;
		closed?;

		for output in outputs.iter_mut() {
			output.finish()?;
		}

		let mut summary = self.summary();
		summary.stopped_early = stopped_early;
		Ok(summary)
	}

	/// The frame loop of [`Self::run`]; true when the display stopped it.
	fn read_frames(
		&mut self,
		input: &mut dyn InputModule,
		outputs: &mut [Box<dyn OutputModule>],
		mut display: Option<&mut DebugDisplay>,
	) -> Result<bool> {
		let mut frame_no = self.first_frame_no;
		while let Some(frame) = input.run()? {
			let (roi, mask, report) = self.process_frame(frame_no, &frame)?;

			let view = FrameView {
				frame_no,
				time: report.time,
				frame: &frame,
				roi: &roi,
				mask: &mask,
				blobs: &report.blobs,
				crossings: &report.crossings,
				records: &report.records,
				drop_count: self.tracker.drop_count(),
				line_position: self.tracker.line_position(),
			};
			for output in outputs.iter_mut() {
				output.run(&view)?;
			}
			if let Some(display) = display.as_deref_mut() {
				if display.show(&view)? == Control::Quit {
					log::info!("Stopped at frame {}", frame_no);
					return Ok(true);
				}
			}
			frame_no += 1;
		}
		Ok(false)
	}

	pub fn summary(&self) -> RunSummary {
		let crossing_times = self.tracker.crossing_times().to_vec();
		let intervals = crossing_times.iter().tuple_windows().map(|(a, b)| b - a).collect();
		let radii_mm: Vec<f64> = self.radii_px.iter().map(|&px| self.calibration.to_mm(px)).collect();
		let mean_radius_mm = if radii_mm.is_empty() {
			None
		} else {
			Some(radii_mm.iter().sum::<f64>() / radii_mm.len() as f64)
		};
		RunSummary {
			frames: self.frames,
			drop_count: self.tracker.drop_count(),
			crossing_times,
			intervals,
			radii_mm,
			mean_radius_mm,
			records: self.records,
			stopped_early: false,
		}
	}
}

/// Jet length of one frame, frames counted from zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JetSample {
	#[serde(rename = "Frame")]
	pub frame: u64,
	#[serde(rename = "Jet Length (pixels)")]
	pub length_px: i32,
}

/// Measures the jet length in every frame of `input`.
pub fn measure_jet(input: &mut dyn InputModule, gauge: &JetGauge, calibration: Calibration) -> Result<Vec<JetSample>> {
	let mut samples = Vec::new();
	let mut frame_no = 0;
	while let Some(frame) = input.run()? {
		let length_px = gauge.run(&frame)?;
		log::debug!(
			"Frame {}: Jet Length = {} px = {:.3} mm",
			frame_no,
			length_px,
			calibration.to_mm(length_px as f64)
		);
		samples.push(JetSample { frame: frame_no, length_px });
		frame_no += 1;
	}
	input.release()?;
	log::info!("Measured the jet in {} frames", samples.len());
	Ok(samples)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::RoiSettings;
	use crate::modules::output::TableWriter;
	use approx::assert_relative_eq;
	use opencv::core::{Point, Rect, Scalar, CV_8UC1, CV_8UC3};
	use opencv::imgproc;
	use std::collections::VecDeque;

	const FPS: f64 = 500.;

	fn settings(record: RecordKind) -> Settings {
		let mut settings = Settings::default();
		settings.input.fps = FPS;
		settings.filter.min_area = 100.;
		settings.filter.max_area = 500.;
		settings.tracker.line_position = 60;
		settings.output.record = record;
		settings.roi = RoiSettings {
			x: 0.,
			y: 0.,
			width: 1.,
			height: 1.,
		};
		settings
	}

	fn blank(typ: i32) -> Mat {
		Mat::new_rows_cols_with_default(120, 120, typ, Scalar::all(0.)).unwrap()
	}

	/// 11x16 pixel block, contour area 150, centroid row `top + 7`.
	fn drop_at(mut image: Mat, top: i32) -> Mat {
		imgproc::rectangle(&mut image, Rect::new(20, top, 11, 16), Scalar::all(255.), imgproc::FILLED, imgproc::LINE_8, 0).unwrap();
		image
	}

	#[test]
	fn three_frame_sequence_counts_one_drop() {
		let mut pipeline = Pipeline::new(&settings(RecordKind::Trajectory), 120).unwrap();

		let first = pipeline.process_mask(1, &drop_at(blank(CV_8UC1), 33)).unwrap();
		assert_eq!(first.blobs[0].centroid.y, 40);
		assert!(first.crossings.is_empty());
		assert_eq!(pipeline.drop_count(), 0);

		let second = pipeline.process_mask(2, &drop_at(blank(CV_8UC1), 63)).unwrap();
		assert_eq!(second.blobs[0].centroid.y, 70);
		assert_eq!(pipeline.drop_count(), 1);
		assert_relative_eq!(second.crossings[0].time, 2. / FPS);

		let third = pipeline.process_mask(3, &blank(CV_8UC1)).unwrap();
		assert!(third.crossings.is_empty());
		assert!(third.records.is_empty());
		assert_eq!(pipeline.drop_count(), 1);

		let summary = pipeline.summary();
		assert_eq!(summary.frames, 3);
		assert_eq!(summary.crossing_times, vec![2. / FPS]);
		assert_eq!(summary.records, 2);
	}

	#[test]
	fn drop_first_seen_below_line_is_not_counted() {
		let mut pipeline = Pipeline::new(&settings(RecordKind::Trajectory), 120).unwrap();
		pipeline.process_mask(1, &drop_at(blank(CV_8UC1), 63)).unwrap();
		pipeline.process_mask(2, &drop_at(blank(CV_8UC1), 80)).unwrap();
		assert_eq!(pipeline.drop_count(), 0);
	}

	#[test]
	fn trajectory_rows_are_in_millimetres() {
		let mut pipeline = Pipeline::new(&settings(RecordKind::TrajectoryRadius), 960).unwrap();
		let report = pipeline.process_mask(4, &drop_at(blank(CV_8UC1), 33)).unwrap();
		let ratio = 96. / 960.;
		match report.records[0] {
			Record::TrajectoryRadius { y_mm, time, radius_mm } => {
				assert_relative_eq!(y_mm, 40. * ratio);
				assert_relative_eq!(time, 4. / FPS);
				assert_relative_eq!(radius_mm, (150f64 / std::f64::consts::PI).sqrt() * ratio);
			}
			other => panic!("unexpected record {:?}", other),
		}
	}

	#[test]
	fn crossing_rows_only_on_crossings() {
		let mut pipeline = Pipeline::new(&settings(RecordKind::Crossing), 120).unwrap();
		let first = pipeline.process_mask(1, &drop_at(blank(CV_8UC1), 33)).unwrap();
		assert!(first.records.is_empty());
		let second = pipeline.process_mask(2, &drop_at(blank(CV_8UC1), 63)).unwrap();
		assert_eq!(second.records.len(), 1);
		assert!(matches!(second.records[0], Record::Crossing { .. }));
	}

	#[test]
	fn ellipse_rows_need_five_points() {
		let mut pipeline = Pipeline::new(&settings(RecordKind::Ellipse), 120).unwrap();
		let square = pipeline.process_mask(1, &drop_at(blank(CV_8UC1), 33)).unwrap();
		assert_eq!(square.blobs.len(), 1);
		assert!(square.records.is_empty());

		let mut round = blank(CV_8UC1);
		imgproc::circle(&mut round, Point::new(60, 60), 9, Scalar::all(255.), imgproc::FILLED, imgproc::LINE_8, 0).unwrap();
		let report = pipeline.process_mask(2, &round).unwrap();
		assert_eq!(report.records.len(), 1);
		match report.records[0] {
			Record::Ellipse { frame, angle_deg, .. } => {
				assert_eq!(frame, 2);
				assert!((0.0..=180.0).contains(&angle_deg));
			}
			other => panic!("unexpected record {:?}", other),
		}
	}

	#[test]
	fn zero_width_source_is_fatal() {
		assert!(matches!(
			Pipeline::new(&settings(RecordKind::Trajectory), 0),
			Err(DropError::ZeroPixelWidth)
		));
	}

	#[test]
	fn resized_frame_is_fatal() {
		let mut pipeline = Pipeline::new(&settings(RecordKind::Trajectory), 120).unwrap();
		pipeline.process_frame(1, &blank(CV_8UC3)).unwrap();
		let bigger = Mat::new_rows_cols_with_default(240, 120, CV_8UC3, Scalar::all(0.)).unwrap();
		assert!(matches!(
			pipeline.process_frame(2, &bigger),
			Err(DropError::DimensionChanged { frame_no: 2, .. })
		));
	}

	struct FrameList {
		frames: VecDeque<Mat>,
		released: bool,
	}

	impl InputModule for FrameList {
		fn run(&mut self) -> Result<Option<Mat>> {
			Ok(self.frames.pop_front())
		}

		fn width(&self) -> i32 {
			120
		}

		fn height(&self) -> i32 {
			120
		}

		fn fps(&self) -> f64 {
			FPS
		}

		fn release(&mut self) -> Result<()> {
			self.released = true;
			Ok(())
		}
	}

	#[test]
	fn jet_frames_are_numbered_from_zero() {
		let mut frames = VecDeque::new();
		for depth in [37, 50] {
			let mut frame = Mat::new_rows_cols_with_default(120, 120, CV_8UC3, Scalar::all(255.)).unwrap();
			imgproc::rectangle(&mut frame, Rect::new(50, 0, 20, depth), Scalar::all(0.), imgproc::FILLED, imgproc::LINE_8, 0).unwrap();
			frames.push_back(frame);
		}
		let mut input = FrameList { frames, released: false };
		let gauge = JetGauge::new(&Settings::default().jet).unwrap();
		let calibration = Calibration::from_frame_width(96., 120).unwrap();

		let samples = measure_jet(&mut input, &gauge, calibration).unwrap();
		assert!(input.released);
		assert_eq!(
			samples,
			vec![
				JetSample { frame: 0, length_px: 37 },
				JetSample { frame: 1, length_px: 50 }
			]
		);
	}

	#[test]
	fn video_run_counts_falling_drop_and_writes_table() {
		let mut frames: VecDeque<Mat> = (0..20).map(|_| blank(CV_8UC3)).collect();
		frames.push_back(drop_at(blank(CV_8UC3), 33));
		frames.push_back(drop_at(blank(CV_8UC3), 63));
		frames.push_back(blank(CV_8UC3));
		let mut input = FrameList { frames, released: false };

		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("run.csv");
		let mut outputs: Vec<Box<dyn OutputModule>> = vec![Box::new(TableWriter::new(RecordKind::Crossing, 4, path.clone()))];

		let mut pipeline = Pipeline::new(&settings(RecordKind::Crossing), input.width()).unwrap();
		let summary = pipeline.run(&mut input, &mut outputs, None).unwrap();

		assert!(input.released);
		assert_eq!(summary.frames, 23);
		assert_eq!(summary.drop_count, 1);
		assert_relative_eq!(summary.crossing_times[0], 22. / FPS);
		assert!(!summary.stopped_early);

		let written = std::fs::read_to_string(path).unwrap();
		let lines: Vec<&str> = written.lines().collect();
		assert_eq!(lines.len(), 2);
		assert_eq!(lines[0], "X-coordinate(mm),Y-coordinate(mm),Time(Sec),Radius(mm)");
		assert!(lines[1].ends_with(",0.0440,5.5279"));
	}

	fn falling_drop() -> FrameList {
		let mut frames: VecDeque<Mat> = (0..20).map(|_| blank(CV_8UC3)).collect();
		frames.push_back(drop_at(blank(CV_8UC3), 33));
		frames.push_back(drop_at(blank(CV_8UC3), 63));
		FrameList { frames, released: false }
	}

	#[test]
	fn frames_can_be_numbered_from_start_frame() {
		let mut settings = settings(RecordKind::Crossing);
		settings.input.label_from_start = true;
		let mut input = falling_drop();
		let mut outputs: Vec<Box<dyn OutputModule>> = Vec::new();
		let mut pipeline = Pipeline::new(&settings, input.width()).unwrap();
		let summary = pipeline.run(&mut input, &mut outputs, None).unwrap();
		assert_relative_eq!(summary.crossing_times[0], 21. / FPS);
	}

	#[test]
	fn fatal_frame_still_releases_the_source() {
		let mut input = falling_drop();
		input.frames.push_back(Mat::new_rows_cols_with_default(240, 120, CV_8UC3, Scalar::all(0.)).unwrap());

		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("run.csv");
		let mut outputs: Vec<Box<dyn OutputModule>> = vec![Box::new(TableWriter::new(RecordKind::Crossing, 4, path.clone()))];

		let mut pipeline = Pipeline::new(&settings(RecordKind::Crossing), input.width()).unwrap();
		let err = pipeline.run(&mut input, &mut outputs, None).unwrap_err();
		assert!(matches!(err, DropError::DimensionChanged { frame_no: 23, .. }));
		assert!(input.released);
		assert!(!path.exists());
	}

	#[test]
	fn summary_keeps_every_radius_and_interval() {
		let mut pipeline = Pipeline::new(&settings(RecordKind::Trajectory), 120).unwrap();
		for (frame_no, top) in [(1, Some(33)), (2, Some(63)), (3, None), (4, Some(33)), (5, Some(63))] {
			let mask = match top {
				Some(top) => drop_at(blank(CV_8UC1), top),
				None => blank(CV_8UC1),
			};
			pipeline.process_mask(frame_no, &mask).unwrap();
		}

		let summary = pipeline.summary();
		let radius = (150f64 / std::f64::consts::PI).sqrt() * 96. / 120.;
		assert_eq!(summary.radii_mm.len(), 4);
		assert_relative_eq!(summary.radii_mm[3], radius);
		assert_relative_eq!(summary.mean_radius_mm.unwrap(), radius);
		assert_eq!(summary.drop_count, 2);
		assert_eq!(summary.intervals.len(), 1);
		assert_relative_eq!(summary.intervals[0], 3. / FPS);

		let dir = tempfile::tempdir().unwrap();
		let written = summary.write_histograms(dir.path(), "run", &OutputSettings::default()).unwrap();
		assert_eq!(
			written,
			vec![dir.path().join("run_radius_histogram.csv"), dir.path().join("run_intervals.csv")]
		);
		let radii = crate::analysis::table::Table::read(&written[0]).unwrap();
		assert_eq!(radii.rows().len(), 100);
		let counts = crate::analysis::table::Table::read(&written[1]).unwrap().numbers("Value").unwrap();
		assert_eq!(counts.iter().sum::<f64>(), 1.);
	}

	#[test]
	fn radius_histogram_follows_the_configured_range() {
		let mut pipeline = Pipeline::new(&settings(RecordKind::Trajectory), 120).unwrap();
		pipeline.process_mask(1, &drop_at(blank(CV_8UC1), 33)).unwrap();
		let summary = pipeline.summary();

		let mut output = OutputSettings {
			radius_min: Some(0.8),
			radius_max: Some(1.8),
			..OutputSettings::default()
		};
		assert!(summary.radius_histogram(&output).unwrap().is_none());
		assert!(summary.interval_histogram(&output).unwrap().is_none());

		output.radius_min = Some(5.);
		output.radius_max = Some(6.);
		let hist = summary.radius_histogram(&output).unwrap().unwrap();
		assert_relative_eq!(hist.edges[0], 5.);
		assert_eq!(hist.total(), 1.);

		let dir = tempfile::tempdir().unwrap();
		let written = summary.write_histograms(dir.path(), "run", &OutputSettings::default()).unwrap();
		assert_eq!(written, vec![dir.path().join("run_radius_histogram.csv")]);
	}
}
