use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::analysis::histogram::Histogram;
use crate::analysis::table::{self, Table};
use crate::error::{DropError, Result};

pub const DROP_COLUMN: &str = "Drop number";
pub const ANGLE_COLUMN: &str = "Angle (deg)";
pub const COMBINED_BINS: usize = 60;
pub const PER_DROP_BINS: usize = 30;

/// Ellipse angles grouped by drop, for drops in `first..=last`.
pub fn angles_by_drop(table: &Table, first: i64, last: i64) -> Result<BTreeMap<i64, Vec<f64>>> {
	let columns = table.require(&[DROP_COLUMN, ANGLE_COLUMN])?;
	let mut drops: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
	for (drop, angle) in table.cells(columns[0]).zip(table.cells(columns[1])) {
		let (Some(drop), Some(angle)) = (drop, angle) else { continue };
		if drop < first as f64 || drop > last as f64 {
			continue;
		}
		drops.entry(drop as i64).or_default().push(angle);
	}
	Ok(drops)
}

/// Writes the combined density histogram and one count histogram per drop
/// into `out_dir`. Returns the files written, combined first.
pub fn angle_histograms(path: &Path, out_dir: &Path, first: i64, last: i64) -> Result<Vec<PathBuf>> {
	let table = Table::read(path)?;
	let drops = angles_by_drop(&table, first, last)?;
	let combined: Vec<f64> = drops.values().flatten().copied().collect();
	if combined.is_empty() {
		return Err(DropError::NoValidSamples(path.to_path_buf()));
	}

	let mut written = Vec::new();
	let hist = Histogram::new(&combined, COMBINED_BINS)?;
	let target = out_dir.join("combined_angle_histogram.csv");
	table::write_rows(&target, &hist.rows(hist.density()))?;
	written.push(target);

	for (drop, angles) in drops.iter() {
		let hist = Histogram::new(angles, PER_DROP_BINS)?;
		let target = out_dir.join(format!("drop_{}_angle_histogram.csv", drop));
		table::write_rows(&target, &hist.rows(hist.counts.clone()))?;
		written.push(target);
	}
	log::info!(
		"Angle histograms of {} drops ({} angles) written to {}",
		drops.len(),
		combined.len(),
		out_dir.display()
	);
	Ok(written)
}
