use std::path::{Path, PathBuf};

use itertools::Itertools;
use serde::Serialize;

use crate::analysis::histogram::{self, Histogram};
use crate::analysis::table::{self, Table};
use crate::analysis::csv_files;
use crate::error::{DropError, Result};
use crate::modules::units::Calibration;
use crate::pipeline::JetSample;

pub const JET_COLUMN: &str = "Jet Length (pixels)";
pub const JET_BINS: usize = 40;
/// Bins of the per video length histogram.
pub const SERIES_BINS: usize = 30;
const FLOW_RATE_UNIT: &str = "mlpmin";

/// Flow rate in ml/min from a name such as `water_2.5mlpmin_jet_length.csv`.
pub fn parse_flow_rate(name: &str) -> Option<f64> {
	let lower = name.to_ascii_lowercase();
	lower.match_indices(FLOW_RATE_UNIT).find_map(|(at, _)| {
		let prefix = &lower[..at];
		let run_start = prefix
			.char_indices()
			.rev()
			.take_while(|(_, c)| c.is_ascii_digit() || *c == '.')
			.last()
			.map(|(i, _)| i)?;
		// Longest tail of the run that reads as `digits` or `digits.digits`.
		(run_start..at)
			.filter(|i| prefix.is_char_boundary(*i))
			.map(|i| &prefix[i..])
			.find(|tail| is_decimal(tail))
			.and_then(|tail| tail.parse().ok())
	})
}

fn is_decimal(text: &str) -> bool {
	let mut parts = text.splitn(2, '.');
	let whole = parts.next().unwrap_or("");
	let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
	match parts.next() {
		None => digits(whole),
		Some(frac) => digits(whole) && digits(frac),
	}
}

/// Normal fit of one jet length file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JetStats {
	#[serde(rename = "Flow Rate (ml/min)")]
	pub flow_rate: f64,
	#[serde(rename = "Mean (μ)")]
	pub mean: f64,
	#[serde(rename = "Std Dev (σ)")]
	pub std: f64,
	#[serde(rename = "Count")]
	pub count: usize,
}

impl JetStats {
	fn rounded(&self) -> Self {
		let round = |v: f64| (v * 100.).round() / 100.;
		Self {
			mean: round(self.mean),
			std: round(self.std),
			..*self
		}
	}
}

#[derive(Serialize)]
struct JetHistogramRow {
	#[serde(rename = "Bin Center")]
	center: f64,
	#[serde(rename = "Density")]
	density: f64,
	#[serde(rename = "Normal PDF")]
	fit: f64,
}

fn normal_pdf(x: f64, mean: f64, std: f64) -> f64 {
	(-0.5 * ((x - mean) / std).powi(2)).exp() / (std * (2. * std::f64::consts::PI).sqrt())
}

/// Jet lengths minus `offset`, keeping only what is still positive.
pub fn adjusted_lengths(lengths: &[f64], offset: f64) -> Vec<f64> {
	lengths.iter().map(|l| l - offset).filter(|l| *l > 0.).collect()
}

/// Fits one file and writes its histogram table beside it.
pub fn analyse_file(path: &Path, offset: f64) -> Result<JetStats> {
	let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
	let flow_rate = parse_flow_rate(&name).ok_or_else(|| DropError::NoFlowRate(name.clone()))?;

	let table = Table::read(path)?;
	let lengths = adjusted_lengths(&table.numbers(JET_COLUMN)?, offset);
	if lengths.is_empty() {
		return Err(DropError::NoValidSamples(path.to_path_buf()));
	}

	let stats = JetStats {
		flow_rate,
		mean: histogram::mean(&lengths),
		std: histogram::std_dev(&lengths, 0),
		count: lengths.len(),
	};

	let hist = Histogram::new(&lengths, JET_BINS)?;
	let rows: Vec<JetHistogramRow> = hist
		.centers()
		.into_iter()
		.zip(hist.density())
		.map(|(center, density)| JetHistogramRow {
			center,
			density,
			fit: normal_pdf(center, stats.mean, stats.std),
		})
		.collect();
	let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
	table::write_rows(&path.with_file_name(format!("{}_histogram.csv", stem)), &rows)?;

	Ok(stats)
}

/// Jet length of one frame in millimetres against time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JetTimeRow {
	#[serde(rename = "Frame")]
	pub frame: u64,
	#[serde(rename = "Time(Sec)")]
	pub time: f64,
	/// Empty when the frame had no jet end.
	#[serde(rename = "Jet Length (mm)")]
	pub length_mm: Option<f64>,
}

pub fn time_series(samples: &[JetSample], calibration: Calibration, fps: f64) -> Vec<JetTimeRow> {
	samples
		.iter()
		.map(|s| JetTimeRow {
			frame: s.frame,
			time: s.frame as f64 / fps,
			length_mm: (s.length_px >= 0).then(|| calibration.to_mm(s.length_px as f64)),
		})
		.collect()
}

/// Density histogram of the lengths that were found, `None` if there are none.
pub fn series_histogram(rows: &[JetTimeRow]) -> Result<Option<Histogram>> {
	let lengths: Vec<f64> = rows.iter().filter_map(|r| r.length_mm).collect();
	if lengths.is_empty() {
		return Ok(None);
	}
	Histogram::new(&lengths, SERIES_BINS).map(Some)
}

/// Writes the tables of one measured video into `dir`:
/// `<stem>_jet_length_data.csv` in pixels, `<stem>_jet_time_series.csv` in
/// millimetres and, when a jet was found, `<stem>_jet_length_histogram.csv`.
pub fn write_video_tables(dir: &Path, stem: &str, samples: &[JetSample], calibration: Calibration, fps: f64) -> Result<Vec<PathBuf>> {
	let mut written = Vec::new();
	let data = dir.join(format!("{}_jet_length_data.csv", stem));
	table::write_rows(&data, samples)?;
	written.push(data);

	let series = time_series(samples, calibration, fps);
	let path = dir.join(format!("{}_jet_time_series.csv", stem));
	table::write_rows(&path, &series)?;
	written.push(path);

	match series_histogram(&series)? {
		Some(hist) => {
			let path = dir.join(format!("{}_jet_length_histogram.csv", stem));
			table::write_rows(&path, &hist.rows(hist.density()))?;
			written.push(path);
		}
		None => log::warn!("No jet end found in any frame of {}", stem),
	}
	Ok(written)
}

pub fn is_jet_table(path: &Path) -> bool {
	path.file_name()
		.map(|n| {
			let n = n.to_string_lossy().to_ascii_lowercase();
			n.contains("jet_length") && !n.ends_with("_histogram.csv")
		})
		.unwrap_or(false)
}

/// Fits every jet length table under `folder` and writes
/// `summary_stats_by_flowrate.csv` there, sorted by flow rate.
pub fn summarize_jets(folder: &Path, offset: f64) -> Result<Vec<JetStats>> {
	let files: Vec<PathBuf> = csv_files(folder).into_iter().filter(|p| is_jet_table(p)).collect();

	let mut summary = Vec::new();
	for path in files.iter() {
		match analyse_file(path, offset) {
			Ok(stats) => {
				log::info!(
					"Processed {} (flow rate {} ml/min): mu = {:.2}, sigma = {:.2}",
					path.display(),
					stats.flow_rate,
					stats.mean,
					stats.std
				);
				summary.push(stats.rounded());
			}
			Err(e) if e.is_skippable() => log::warn!("Skipping {}: {}", path.display(), e),
			Err(e) => return Err(e),
		}
	}

	if summary.is_empty() {
		log::warn!("No valid jet length data under {}", folder.display());
		return Ok(summary);
	}
	let summary: Vec<JetStats> = summary.into_iter().sorted_by(|a, b| a.flow_rate.total_cmp(&b.flow_rate)).collect();
	let target = folder.join("summary_stats_by_flowrate.csv");
	table::write_rows(&target, &summary)?;
	log::info!("Summary saved to {}", target.display());
	Ok(summary)
}
