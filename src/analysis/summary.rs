use std::path::{Path, PathBuf};

use itertools::Itertools;
use serde::Serialize;

use crate::analysis::histogram::{self, gaussian_filter1d, find_peaks, split_two_peaks, Histogram, PeakSplit};
use crate::analysis::table::{self, Table};
use crate::analysis::{csv_files, mirror_dir, RADIUS_COLUMN};
use crate::error::{DropError, Result};
use crate::modules::units::area_from_radius;

pub const RADIUS_BINS: usize = 100;
pub const AREA_EDGES: usize = 150;
pub const SMOOTHING_SIGMA: f64 = 2.;

/// What the summary histograms are built over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SummaryMode {
	/// Raw radii, counts in per-file bins.
	Radius,
	/// Projected areas, densities over bins shared by every file.
	Area,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryRow {
	#[serde(rename = "File")]
	pub file: String,
	#[serde(rename = "Mean Radius")]
	pub mean: f64,
	#[serde(rename = "Prominent Peak")]
	pub prominent_peak: f64,
	#[serde(rename = "Mean Deviation from Peak")]
	pub mean_deviation: f64,
	#[serde(rename = "Detected Peaks")]
	pub detected_peaks: String,
}

#[derive(Serialize)]
struct HistogramRow {
	#[serde(rename = "Bin Center")]
	center: f64,
	#[serde(rename = "Value")]
	value: f64,
	#[serde(rename = "Smoothed")]
	smoothed: f64,
}

/// Peak analysis of one file's smoothed histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct PeakReport {
	pub smoothed: Vec<f64>,
	pub peaks: Vec<f64>,
	/// Centre of the highest peak, NaN when there is none.
	pub prominent: f64,
}

pub fn analyse_peaks(centers: &[f64], values: &[f64]) -> PeakReport {
	let smoothed = gaussian_filter1d(values, SMOOTHING_SIGMA);
	let threshold = histogram::mean(&smoothed);
	let indices = find_peaks(&smoothed, Some(threshold));
	// First of equally high peaks wins.
	let prominent = indices
		.iter()
		.copied()
		.fold(None, |best: Option<usize>, i| match best {
			Some(b) if smoothed[b] >= smoothed[i] => Some(b),
			_ => Some(i),
		})
		.map_or(f64::NAN, |i| centers[i]);
	PeakReport {
		peaks: indices.iter().map(|&i| centers[i]).collect(),
		prominent,
		smoothed,
	}
}

fn format_peaks(peaks: &[f64]) -> String {
	format!("[{}]", peaks.iter().map(|p| p.to_string()).join(", "))
}

/// Mean absolute distance to `peak`, NaN when the peak is.
pub fn mean_deviation(values: &[f64], peak: f64) -> f64 {
	let deviations: Vec<f64> = values.iter().map(|v| (v - peak).abs()).collect();
	histogram::mean(&deviations)
}

/// Walks `input` for CSVs with a radius column and writes per-file tables into
/// the mirrored tree under `output`, then `summary.csv` at its root.
pub fn summarize_folder(input: &Path, output: &Path, mode: SummaryMode) -> Result<Vec<SummaryRow>> {
	let files = csv_files(input);
	let edges = match mode {
		SummaryMode::Radius => None,
		SummaryMode::Area => Some(global_area_edges(input, &files)?),
	};

	let mut summary = Vec::new();
	for path in files.iter() {
		let out_dir = mirror_dir(input, path, output);
		match summarize_file(path, &out_dir, edges.as_deref()) {
			Ok(row) => {
				log::info!("Processed {} (peak {:.4})", path.display(), row.prominent_peak);
				summary.push(row);
			}
			Err(e) if e.is_skippable() => log::warn!("Skipping {}: {}", path.display(), e),
			Err(e) => return Err(e),
		}
	}

	table::write_rows(&output.join("summary.csv"), &summary)?;
	log::info!("Summarized {} of {} files into {}", summary.len(), files.len(), output.display());
	Ok(summary)
}

/// Shared bin edges over the areas of every readable file.
fn global_area_edges(input: &Path, files: &[PathBuf]) -> Result<Vec<f64>> {
	let mut areas = Vec::new();
	for path in files.iter() {
		let Ok(table) = Table::read(path) else { continue };
		if let Ok(radii) = table.numbers(RADIUS_COLUMN) {
			areas.extend(radii.into_iter().map(area_from_radius));
		}
	}
	let (lo, hi) = histogram::min_max(&areas).ok_or_else(|| DropError::NoValidSamples(input.to_path_buf()))?;
	log::info!("Global data range: {:.4} to {:.4}", lo, hi);
	Ok(histogram::linspace(lo, hi, AREA_EDGES))
}

/// One file. Without `edges` this is the radius analysis and also writes the
/// `_processed` copy; with them the values are areas and densities.
pub fn summarize_file(path: &Path, out_dir: &Path, edges: Option<&[f64]>) -> Result<SummaryRow> {
	let table = Table::read(path)?;
	let column = table.column(RADIUS_COLUMN)?;
	let radii: Vec<f64> = table.cells(column).flatten().collect();
	if radii.is_empty() {
		return Err(DropError::NoValidSamples(path.to_path_buf()));
	}

	let (values, hist) = match edges {
		None => {
			let hist = Histogram::new(&radii, RADIUS_BINS)?;
			(radii, hist)
		}
		Some(edges) => {
			let areas: Vec<f64> = radii.iter().copied().map(area_from_radius).collect();
			let hist = Histogram::with_edges(&areas, edges.to_vec())?;
			(areas, hist)
		}
	};
	let heights = match edges {
		None => hist.counts.clone(),
		Some(_) => hist.density(),
	};
	let centers = hist.centers();
	let report = analyse_peaks(&centers, &heights);

	let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
	let rows: Vec<HistogramRow> = centers
		.iter()
		.zip(heights.iter())
		.zip(report.smoothed.iter())
		.map(|((&center, &value), &smoothed)| HistogramRow { center, value, smoothed })
		.collect();
	table::write_rows(&out_dir.join(format!("{}_histogram.csv", stem)), &rows)?;

	if edges.is_none() {
		write_processed(&table, column, report.prominent, &out_dir.join(format!("{}_processed.csv", stem)))?;
	}

	Ok(SummaryRow {
		file: path.display().to_string(),
		mean: histogram::mean(&values),
		prominent_peak: report.prominent,
		mean_deviation: mean_deviation(&values, report.prominent),
		detected_peaks: format_peaks(&report.peaks),
	})
}

/// Two-population split of the radius column of one file.
pub fn split_file(path: &Path) -> Result<PeakSplit> {
	let radii = Table::read(path)?.numbers(RADIUS_COLUMN)?;
	if radii.is_empty() {
		return Err(DropError::NoValidSamples(path.to_path_buf()));
	}
	split_two_peaks(&radii)
}

/// The input table with a `Deviation_from_Peak` column appended.
fn write_processed(table: &Table, column: usize, peak: f64, path: &Path) -> Result<()> {
	table::create_parent(path)?;
	let mut writer = csv::WriterBuilder::new().flexible(true).from_path(path)?;
	let mut header = table.headers().clone();
	header.push_field("Deviation_from_Peak");
	writer.write_record(&header)?;
	for row in table.rows() {
		let deviation = table::parse_cell(row.get(column))
			.map(|r| r - peak)
			.filter(|d| !d.is_nan())
			.map(|d| d.to_string())
			.unwrap_or_default();
		let mut out = row.clone();
		out.push_field(&deviation);
		writer.write_record(&out)?;
	}
	writer.flush()?;
	Ok(())
}
