use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::analysis::table::{self, Table};
use crate::analysis::{csv_files, mirror_dir, RADIUS_COLUMN, TIME_COLUMN};
use crate::error::Result;
use crate::modules::units::volume_from_radius;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VolumeRow {
	#[serde(rename = "Time(Sec)")]
	pub time: f64,
	#[serde(rename = "Volume(mm^3)")]
	pub volume: f64,
}

/// Sphere volume of every row that has both a time and a radius.
pub fn volume_series(table: &Table) -> Result<Vec<VolumeRow>> {
	let columns = table.require(&[TIME_COLUMN, RADIUS_COLUMN])?;
	let (time, radius) = (columns[0], columns[1]);
	Ok(table
		.cells(time)
		.zip(table.cells(radius))
		.filter_map(|(t, r)| Some(VolumeRow {
			time: t?,
			volume: volume_from_radius(r?),
		}))
		.collect())
}

/// Writes `<stem>_volume.csv` for every CSV under `input` into the mirrored
/// tree under `output`. Returns the files written.
pub fn convert_folder(input: &Path, output: &Path) -> Result<Vec<PathBuf>> {
	let mut written = Vec::new();
	for path in csv_files(input).iter() {
		let rows = match Table::read(path).and_then(|t| volume_series(&t)) {
			Ok(rows) => rows,
			Err(e) if e.is_skippable() => {
				log::warn!("Skipping {}: {}", path.display(), e);
				continue;
			}
			Err(e) => return Err(e),
		};
		let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
		let target = mirror_dir(input, path, output).join(format!("{}_volume.csv", stem));
		table::write_rows(&target, &rows)?;
		log::info!("Saved {} volumes to {}", rows.len(), target.display());
		written.push(target);
	}
	Ok(written)
}
