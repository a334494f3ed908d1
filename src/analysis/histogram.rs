//! Histograms, smoothing and peak picking for measurement columns.

use itertools::{Itertools, MinMaxResult};
use serde::Serialize;

use crate::error::{DropError, Result};

/// `n` evenly spaced values from `start` to `end`, both included.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
	match n {
		0 => Vec::new(),
		1 => vec![start],
		_ => {
			let step = (end - start) / (n - 1) as f64;
			(0..n).map(|i| if i == n - 1 { end } else { start + step * i as f64 }).collect()
		}
	}
}

pub fn mean(values: &[f64]) -> f64 {
	if values.is_empty() {
		return f64::NAN;
	}
	values.iter().sum::<f64>() / values.len() as f64
}

/// Standard deviation with `ddof` degrees of freedom removed.
pub fn std_dev(values: &[f64], ddof: usize) -> f64 {
	if values.len() <= ddof {
		return f64::NAN;
	}
	let m = mean(values);
	let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
	(ss / (values.len() - ddof) as f64).sqrt()
}

pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
	match values.iter().copied().minmax_by(|a, b| a.total_cmp(b)) {
		MinMaxResult::NoElements => None,
		MinMaxResult::OneElement(v) => Some((v, v)),
		MinMaxResult::MinMax(lo, hi) => Some((lo, hi)),
	}
}

/// One bin of a histogram table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BinRow {
	#[serde(rename = "Bin Center")]
	pub center: f64,
	#[serde(rename = "Value")]
	pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
	pub edges: Vec<f64>,
	pub counts: Vec<f64>,
}

impl Histogram {
	/// `bins` equal bins spanning the data. A constant column gets a unit wide
	/// range around its value, an empty one `[0, 1]`.
	pub fn new(values: &[f64], bins: usize) -> Result<Self> {
		let (mut lo, mut hi) = min_max(values).unwrap_or((0., 1.));
		if lo == hi {
			lo -= 0.5;
			hi += 0.5;
		}
		Self::with_edges(values, linspace(lo, hi, bins + 1))
	}

	/// Counts into the given ascending edges. Every bin is half open except the
	/// last, and values outside the edges are ignored.
	pub fn with_edges(values: &[f64], edges: Vec<f64>) -> Result<Self> {
		if edges.len() < 2 {
			return Err(DropError::Config(format!("a histogram needs at least two edges, got {}", edges.len())));
		}
		let (first, last) = (edges[0], edges[edges.len() - 1]);
		let mut counts = vec![0.; edges.len() - 1];
		for &v in values.iter().filter(|v| (first..=last).contains(*v)) {
			let bin = edges.partition_point(|e| *e <= v).saturating_sub(1).min(counts.len() - 1);
			counts[bin] += 1.;
		}
		Ok(Self { edges, counts })
	}

	pub fn centers(&self) -> Vec<f64> {
		self.edges.iter().tuple_windows().map(|(a, b)| (a + b) / 2.).collect()
	}

	pub fn bin_width(&self) -> f64 {
		self.edges[1] - self.edges[0]
	}

	pub fn total(&self) -> f64 {
		self.counts.iter().sum()
	}

	/// Counts scaled so the histogram integrates to one.
	pub fn density(&self) -> Vec<f64> {
		let norm = self.total() * self.bin_width();
		self.counts.iter().map(|c| c / norm).collect()
	}

	/// Bin centers paired with `values`, one per bin.
	pub fn rows(&self, values: Vec<f64>) -> Vec<BinRow> {
		self.centers()
			.into_iter()
			.zip(values)
			.map(|(center, value)| BinRow { center, value })
			.collect()
	}
}

/// Maps an out of range index back into `0..n` by mirroring about the edges,
/// the edge sample included (`d c b a | a b c d | d c b a`).
fn reflect(i: isize, n: usize) -> usize {
	let period = 2 * n as isize;
	let m = i.rem_euclid(period);
	if m < n as isize {
		m as usize
	} else {
		(period - 1 - m) as usize
	}
}

/// Gaussian smoothing with a kernel cut off at `4 sigma`.
pub fn gaussian_filter1d(input: &[f64], sigma: f64) -> Vec<f64> {
	let n = input.len();
	if n == 0 || sigma <= 0. {
		return input.to_vec();
	}
	let radius = (4. * sigma + 0.5) as isize;
	let mut weights: Vec<f64> = (-radius..=radius).map(|x| (-0.5 * (x as f64 / sigma).powi(2)).exp()).collect();
	let sum: f64 = weights.iter().sum();
	weights.iter_mut().for_each(|w| *w /= sum);

	(0..n as isize)
		.map(|i| {
			weights
				.iter()
				.zip(-radius..=radius)
				.map(|(w, k)| w * input[reflect(i + k, n)])
				.sum()
		})
		.collect()
}

/// Indices of local maxima. A flat top counts once, at its middle sample
/// (rounding down), and only if both sides fall away from it. Samples at the
/// ends are never peaks.
pub fn find_peaks(data: &[f64], min_height: Option<f64>) -> Vec<usize> {
	let mut peaks = Vec::new();
	if data.len() < 3 {
		return peaks;
	}
	let last = data.len() - 1;
	let mut i = 1;
	while i < last {
		if data[i - 1] < data[i] {
			let mut ahead = i + 1;
			while ahead < last && data[ahead] == data[i] {
				ahead += 1;
			}
			if data[ahead] < data[i] {
				peaks.push((i + ahead - 1) / 2);
				i = ahead;
			}
		}
		i += 1;
	}
	if let Some(height) = min_height {
		peaks.retain(|&p| data[p] >= height);
	}
	peaks
}

/// Gaussian kernel density estimate with Scott's bandwidth rule.
pub struct Kde<'a> {
	samples: &'a [f64],
	bandwidth: f64,
}

impl<'a> Kde<'a> {
	pub fn new(samples: &'a [f64]) -> Option<Self> {
		let spread = std_dev(samples, 1);
		if !(spread > 0.) {
			return None;
		}
		let factor = (samples.len() as f64).powf(-1. / 5.);
		Some(Self {
			samples,
			bandwidth: spread * factor,
		})
	}

	pub fn evaluate(&self, x: f64) -> f64 {
		let norm = 1. / ((2. * std::f64::consts::PI).sqrt() * self.bandwidth * self.samples.len() as f64);
		self.samples.iter().map(|s| (-0.5 * ((x - s) / self.bandwidth).powi(2)).exp()).sum::<f64>() * norm
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct PeakSplit {
	/// The two dominant peak positions, ascending.
	pub peaks: [f64; 2],
	pub cut: f64,
	pub lower: Vec<f64>,
	pub upper: Vec<f64>,
	pub lower_std: f64,
	pub upper_std: f64,
}

pub const KDE_POINTS: usize = 1000;

/// Splits a bimodal sample at the midpoint of its two highest density peaks.
/// Samples equal to the cut go to the lower subset.
pub fn split_two_peaks(samples: &[f64]) -> Result<PeakSplit> {
	let (lo, hi) = min_max(samples).ok_or(DropError::TooFewPeaks(0))?;
	let kde = Kde::new(samples).ok_or(DropError::TooFewPeaks(0))?;
	let xs = linspace(lo, hi, KDE_POINTS);
	let density: Vec<f64> = xs.iter().map(|&x| kde.evaluate(x)).collect();

	let peaks = find_peaks(&density, Some(0.));
	if peaks.len() < 2 {
		return Err(DropError::TooFewPeaks(peaks.len()));
	}
	let top: Vec<f64> = peaks
		.iter()
		.sorted_by(|a, b| density[**b].total_cmp(&density[**a]))
		.take(2)
		.map(|&p| xs[p])
		.sorted_by(|a, b| a.total_cmp(b))
		.collect();
	let cut = (top[0] + top[1]) / 2.;

	let (lower, upper): (Vec<f64>, Vec<f64>) = samples.iter().partition(|&&v| v <= cut);
	Ok(PeakSplit {
		peaks: [top[0], top[1]],
		cut,
		lower_std: std_dev(&lower, 0),
		upper_std: std_dev(&upper, 0),
		lower,
		upper,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use approx::assert_relative_eq;

	#[test]
	fn last_bin_is_closed() {
		let hist = Histogram::new(&[0., 1., 2., 3., 4.], 4).unwrap();
		assert_eq!(hist.edges, vec![0., 1., 2., 3., 4.]);
		assert_eq!(hist.counts, vec![1., 1., 1., 2.]);
		assert_eq!(hist.centers(), vec![0.5, 1.5, 2.5, 3.5]);
	}

	#[test]
	fn constant_column_spans_one_unit() {
		let hist = Histogram::new(&[2., 2., 2.], 2).unwrap();
		assert_eq!(hist.edges, vec![1.5, 2., 2.5]);
		assert_eq!(hist.counts, vec![0., 3.]);
	}

	#[test]
	fn fixed_edges_ignore_outliers() {
		let hist = Histogram::with_edges(&[-1., 0.5, 1.5, 9.], vec![0., 1., 2.]).unwrap();
		assert_eq!(hist.counts, vec![1., 1.]);
	}

	#[test]
	fn density_integrates_to_one() {
		let hist = Histogram::new(&[0.1, 0.2, 0.2, 0.9, 1.3, 1.4], 7).unwrap();
		let area: f64 = hist.density().iter().map(|d| d * hist.bin_width()).sum();
		assert_relative_eq!(area, 1., epsilon = 1e-12);
	}

	#[test]
	fn smoothing_a_constant_changes_nothing() {
		let flat = vec![3.; 12];
		let smoothed = gaussian_filter1d(&flat, 2.);
		for v in smoothed.iter() {
			assert_relative_eq!(*v, 3., epsilon = 1e-12);
		}
		assert_relative_eq!(smoothed.iter().sum::<f64>(), 36., epsilon = 1e-9);
	}

	#[test]
	fn reflection_repeats_the_edge_sample() {
		assert_eq!(reflect(-1, 4), 0);
		assert_eq!(reflect(-2, 4), 1);
		assert_eq!(reflect(4, 4), 3);
		assert_eq!(reflect(5, 4), 2);
		assert_eq!(reflect(9, 4), 1);
	}

	#[test]
	fn impulse_spreads_symmetrically() {
		let mut impulse = vec![0.; 21];
		impulse[10] = 1.;
		let smoothed = gaussian_filter1d(&impulse, 2.);
		assert_relative_eq!(smoothed[8], smoothed[12], epsilon = 1e-15);
		assert_relative_eq!(smoothed.iter().sum::<f64>(), 1., epsilon = 1e-12);
		assert_eq!(find_peaks(&smoothed, None), vec![10]);
	}

	#[test]
	fn plateau_peak_sits_in_its_middle() {
		let data = [0., 1., 3., 3., 3., 3., 1., 0., 2., 0.];
		assert_eq!(find_peaks(&data, None), vec![3, 8]);
		assert_eq!(find_peaks(&data, Some(2.5)), vec![3]);
	}

	#[test]
	fn edges_and_shoulders_are_not_peaks() {
		assert!(find_peaks(&[5., 4., 3., 2.], None).is_empty());
		assert!(find_peaks(&[1., 2., 2., 2.], None).is_empty());
		assert_eq!(find_peaks(&[1., 2., 2., 1.], Some(2.)), vec![1]);
	}

	#[test]
	fn bimodal_sample_is_split_between_its_modes() {
		let mut samples = Vec::new();
		for i in 0..200 {
			let jitter = (i % 20) as f64 * 0.005 - 0.05;
			samples.push(if i % 2 == 0 { 1.0 + jitter } else { 2.0 + jitter });
		}
		let split = split_two_peaks(&samples).unwrap();
		assert!((split.peaks[0] - 1.0).abs() < 0.1);
		assert!((split.peaks[1] - 2.0).abs() < 0.1);
		assert!(split.cut > 1.05 && split.cut < 1.95);
		assert_eq!(split.lower.len() + split.upper.len(), samples.len());
		assert_eq!(split.lower.len(), 100);
		assert!(split.lower.iter().all(|v| *v <= split.cut));
		assert!(split.upper.iter().all(|v| *v > split.cut));
		assert_relative_eq!(split.lower_std, std_dev(&split.lower, 0));
	}

	#[test]
	fn unimodal_sample_has_too_few_peaks() {
		let samples: Vec<f64> = (0..50).map(|i| 1. + (i as f64 - 25.).powi(3) * 1e-5).collect();
		assert!(matches!(split_two_peaks(&samples), Err(DropError::TooFewPeaks(1))));
		assert!(matches!(split_two_peaks(&[1., 1., 1.]), Err(DropError::TooFewPeaks(0))));
	}
}
