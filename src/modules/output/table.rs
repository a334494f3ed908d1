use std::fs;
use std::path::{Path, PathBuf};

use crate::config::RecordKind;
use crate::error::Result;
use crate::modules::{FrameView, OutputModule};

/// One measurement row, already in millimetres and seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Record {
	Trajectory {
		y_mm: f64,
		time: f64,
	},
	TrajectoryRadius {
		y_mm: f64,
		time: f64,
		radius_mm: f64,
	},
	Crossing {
		x_mm: f64,
		y_mm: f64,
		time: f64,
		radius_mm: f64,
	},
	Ellipse {
		frame: u64,
		time: f64,
		x_mm: f64,
		y_mm: f64,
		major_mm: f64,
		minor_mm: f64,
		angle_deg: f64,
	},
}

pub fn header(kind: RecordKind) -> &'static [&'static str] {
	match kind {
		RecordKind::Trajectory => &["Y-coordinate(mm)", "Time(Sec)"],
		RecordKind::TrajectoryRadius => &["Y-coordinate(mm)", "Time(Sec)", "Radius(mm)"],
		RecordKind::Crossing => &["X-coordinate(mm)", "Y-coordinate(mm)", "Time(Sec)", "Radius(mm)"],
		RecordKind::Ellipse => &[
			"Frame",
			"Time(s)",
			"X (mm)",
			"Y (mm)",
			"Major Axis (mm)",
			"Minor Axis (mm)",
			"Angle (deg)",
		],
	}
}

impl Record {
	pub fn kind(&self) -> RecordKind {
		match self {
			Record::Trajectory { .. } => RecordKind::Trajectory,
			Record::TrajectoryRadius { .. } => RecordKind::TrajectoryRadius,
			Record::Crossing { .. } => RecordKind::Crossing,
			Record::Ellipse { .. } => RecordKind::Ellipse,
		}
	}

	pub fn cells(&self, precision: usize) -> Vec<String> {
		let f = |v: f64| format!("{:.*}", precision, v);
		match *self {
			Record::Trajectory { y_mm, time } => vec![f(y_mm), f(time)],
			Record::TrajectoryRadius { y_mm, time, radius_mm } => vec![f(y_mm), f(time), f(radius_mm)],
			Record::Crossing {
				x_mm,
				y_mm,
				time,
				radius_mm,
			} => vec![f(x_mm), f(y_mm), f(time), f(radius_mm)],
			Record::Ellipse {
				frame,
				time,
				x_mm,
				y_mm,
				major_mm,
				minor_mm,
				angle_deg,
			} => vec![
				frame.to_string(),
				f(time),
				f(x_mm),
				f(y_mm),
				f(major_mm),
				f(minor_mm),
				f(angle_deg),
			],
		}
	}
}

/// Collects every record of a run and writes them as one CSV at the end.
pub struct TableWriter {
	kind: RecordKind,
	precision: usize,
	path: PathBuf,
	rows: Vec<Record>,
}

impl TableWriter {
	pub fn new(kind: RecordKind, precision: usize, path: PathBuf) -> Self {
		Self {
			kind,
			precision,
			path,
			rows: Vec::new(),
		}
	}

	/// `<stem>_<suffix>.csv` next to the video.
	pub fn default_path(video: &Path, kind: RecordKind) -> PathBuf {
		let stem = video.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
		video.with_file_name(format!("{}_{}.csv", stem, kind.file_suffix()))
	}

	#[cfg(test)]
	pub fn push(&mut self, record: Record) {
		self.rows.push(record);
	}
}

impl OutputModule for TableWriter {
	fn run(&mut self, view: &FrameView) -> Result<()> {
		let kind = self.kind;
		self.rows.extend(view.records.iter().filter(|r| r.kind() == kind));
		Ok(())
	}

	fn finish(&mut self) -> Result<()> {
		if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent)?;
		}
		let mut wtr = csv::Writer::from_path(&self.path)?;
		wtr.write_record(header(self.kind))?;
		for row in self.rows.iter() {
			wtr.write_record(row.cells(self.precision))?;
		}
		wtr.flush()?;
		log::info!("Wrote {} rows to {}", self.rows.len(), self.path.display());
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn floats_use_fixed_precision() {
		let record = Record::TrajectoryRadius {
			y_mm: 3.,
			time: 0.004,
			radius_mm: 1.234567,
		};
		assert_eq!(record.cells(4), vec!["3.0000", "0.0040", "1.2346"]);
	}

	#[test]
	fn frame_column_stays_integer() {
		let record = Record::Ellipse {
			frame: 12,
			time: 0.024,
			x_mm: 1.,
			y_mm: 2.,
			major_mm: 3.,
			minor_mm: 2.5,
			angle_deg: 91.25,
		};
		assert_eq!(record.cells(4)[0], "12");
		assert_eq!(record.cells(4)[6], "91.2500");
	}

	#[test]
	fn default_path_sits_next_to_video() {
		let path = TableWriter::default_path(Path::new("/data/run/0_mlpmin.avi"), RecordKind::Crossing);
		assert_eq!(path, PathBuf::from("/data/run/0_mlpmin_time.csv"));
	}

	#[test]
	fn finish_writes_header_and_rows() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("nested").join("out.csv");
		let mut writer = TableWriter::new(RecordKind::Trajectory, 4, path.clone());
		writer.push(Record::Trajectory { y_mm: 4.5, time: 0.002 });
		writer.push(Record::Trajectory { y_mm: 5.25, time: 0.004 });
		writer.finish().unwrap();

		let written = fs::read_to_string(path).unwrap();
		assert_eq!(written, "Y-coordinate(mm),Time(Sec)\n4.5000,0.0020\n5.2500,0.0040\n");
	}

	#[test]
	fn empty_run_still_writes_header() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("empty.csv");
		TableWriter::new(RecordKind::Ellipse, 4, path.clone()).finish().unwrap();
		let written = fs::read_to_string(path).unwrap();
		assert!(written.starts_with("Frame,Time(s),X (mm)"));
	}
}
