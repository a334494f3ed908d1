//! Post-processing of the measurement tables a run leaves behind.

pub mod angles;
pub mod histogram;
pub mod jet;
pub mod summary;
pub mod table;
pub mod volume;

use std::path::{Path, PathBuf};

use itertools::Itertools;
use walkdir::WalkDir;

pub const RADIUS_COLUMN: &str = "Radius(mm)";
pub const TIME_COLUMN: &str = "Time(Sec)";

/// Files under `root` with one of `extensions` (case-insensitive), sorted.
pub fn files_with_extension(root: &Path, extensions: &[&str]) -> Vec<PathBuf> {
	WalkDir::new(root)
		.into_iter()
		.filter_map(|entry| match entry {
			Ok(entry) => Some(entry),
			Err(e) => {
				log::warn!("Unable to read directory entry: {}", e);
				None
			}
		})
		.filter(|entry| entry.file_type().is_file())
		.map(|entry| entry.into_path())
		.filter(|path| {
			path.extension()
				.map(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
				.unwrap_or(false)
		})
		.sorted()
		.collect()
}

pub fn csv_files(root: &Path) -> Vec<PathBuf> {
	files_with_extension(root, &["csv"])
}

/// Directory under `output` that holds results for `file`, keeping the
/// file's position relative to `input`.
pub fn mirror_dir(input: &Path, file: &Path, output: &Path) -> PathBuf {
	let parent = file.parent().unwrap_or(input);
	match parent.strip_prefix(input) {
		Ok(relative) => output.join(relative),
		Err(_) => output.to_path_buf(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;

	#[test]
	fn mirror_keeps_relative_folders() {
		let input = Path::new("/data/water");
		assert_eq!(
			mirror_dir(input, Path::new("/data/water/0.8mm/run1.avi"), Path::new("/data/water_results")),
			PathBuf::from("/data/water_results/0.8mm")
		);
		assert_eq!(
			mirror_dir(input, Path::new("/data/water/run1.avi"), Path::new("/out")),
			PathBuf::from("/out")
		);
	}

	#[test]
	fn extension_match_ignores_case() {
		let dir = tempfile::tempdir().unwrap();
		fs::create_dir_all(dir.path().join("sub")).unwrap();
		fs::write(dir.path().join("b.AVI"), b"").unwrap();
		fs::write(dir.path().join("sub/a.mp4"), b"").unwrap();
		fs::write(dir.path().join("notes.txt"), b"").unwrap();
		let found = files_with_extension(dir.path(), &["avi", "mp4"]);
		assert_eq!(found, vec![dir.path().join("b.AVI"), dir.path().join("sub/a.mp4")]);
	}
}
