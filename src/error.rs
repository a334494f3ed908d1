use std::path::PathBuf;

use thiserror::Error;

/// Everything that can stop a run or a single file of a batch.
#[derive(Debug, Error)]
pub enum DropError {
	#[error("Unable to open video source '{0}'")]
	SourceUnavailable(String),

	#[error("Video source reports a pixel width of zero, calibration is impossible")]
	ZeroPixelWidth,

	#[error("Frame {frame_no} is {found_width}x{found_height}, source started at {width}x{height}")]
	DimensionChanged {
		frame_no: u64,
		width: i32,
		height: i32,
		found_width: i32,
		found_height: i32,
	},

	#[error("Region of interest is empty for a {width}x{height} frame")]
	EmptyRoi { width: i32, height: i32 },

	#[error("Invalid configuration: {0}")]
	Config(String),

	#[error("Column '{column}' not found in '{path}'. Available columns: {available:?}")]
	MissingColumn {
		path: PathBuf,
		column: String,
		available: Vec<String>,
	},

	#[error("Could not extract flow rate from '{0}'")]
	NoFlowRate(String),

	#[error("No valid samples in '{0}'")]
	NoValidSamples(PathBuf),

	#[error("Less than two peaks detected ({0} found)")]
	TooFewPeaks(usize),

	#[error(transparent)]
	OpenCv(#[from] opencv::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Csv(#[from] csv::Error),
}

impl DropError {
	/// Errors a batch tool reports and moves past instead of aborting.
	pub fn is_skippable(&self) -> bool {
		matches!(
			self,
			DropError::MissingColumn { .. }
				| DropError::NoFlowRate(_)
				| DropError::NoValidSamples(_)
				| DropError::TooFewPeaks(_)
				| DropError::Csv(_)
		)
	}
}

pub type Result<T> = std::result::Result<T, DropError>;
