use std::fs;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use serde::Serialize;

use crate::error::{DropError, Result};

/// A measurement CSV held in memory, header first.
pub struct Table {
	path: PathBuf,
	headers: StringRecord,
	rows: Vec<StringRecord>,
}

impl Table {
	pub fn read(path: &Path) -> Result<Self> {
		let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
		let headers = reader.headers()?.clone();
		let rows = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
		Ok(Self {
			path: path.to_path_buf(),
			headers,
			rows,
		})
	}

	pub fn headers(&self) -> &StringRecord {
		&self.headers
	}

	pub fn rows(&self) -> &[StringRecord] {
		&self.rows
	}

	/// Index of `column`, or the error listing what the file does have.
	pub fn column(&self, column: &str) -> Result<usize> {
		self.headers.iter().position(|h| h.trim() == column).ok_or_else(|| DropError::MissingColumn {
			path: self.path.clone(),
			column: column.to_string(),
			available: self.headers.iter().map(str::to_string).collect(),
		})
	}

	/// Checks every column a tool needs before any row is looked at.
	pub fn require(&self, columns: &[&str]) -> Result<Vec<usize>> {
		columns.iter().map(|c| self.column(c)).collect()
	}

	/// Cell `index` of every row as a number; empty, missing or non-numeric
	/// cells give `None`.
	pub fn cells(&self, index: usize) -> impl Iterator<Item = Option<f64>> + '_ {
		self.rows.iter().map(move |row| parse_cell(row.get(index)))
	}

	/// The numeric values of one column with blanks dropped.
	pub fn numbers(&self, column: &str) -> Result<Vec<f64>> {
		let index = self.column(column)?;
		Ok(self.cells(index).flatten().collect())
	}
}

pub fn parse_cell(cell: Option<&str>) -> Option<f64> {
	let value = cell?.trim().parse::<f64>().ok()?;
	if value.is_nan() {
		None
	} else {
		Some(value)
	}
}

pub fn create_parent(path: &Path) -> Result<()> {
	if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
		fs::create_dir_all(parent)?;
	}
	Ok(())
}

/// Writes serde rows under their field names.
pub fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
	create_parent(path)?;
	let mut writer = csv::Writer::from_path(path)?;
	for row in rows {
		writer.serialize(row)?;
	}
	writer.flush()?;
	Ok(())
}
