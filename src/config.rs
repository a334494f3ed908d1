use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{DropError, Result};

/// Complete settings file, one table per pipeline stage.
///
/// Every field has a default so a settings file only needs to name what it
/// changes. The defaults are the realtime counter's constants.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
	pub input: InputSettings,
	pub roi: RoiSettings,
	pub threshold: ThresholdSettings,
	pub filter: FilterSettings,
	pub tracker: TrackerSettings,
	pub output: OutputSettings,
	pub jet: JetSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputSettings {
	/// Physical width of the full frame in millimetres.
	pub scale_mm: f64,
	pub fps: f64,
	/// Rotate every frame 90 degrees clockwise before cropping.
	pub rotate: bool,
	pub start_frame: u64,
	/// Last frame number to process, inclusive.
	pub end_frame: Option<u64>,
	/// Number the first frame read `start_frame` instead of `start_frame + 1`,
	/// so frame numbers equal positions in the file.
	pub label_from_start: bool,
}

impl InputSettings {
	/// Number given to the first frame read.
	pub fn first_frame_no(&self) -> u64 {
		if self.label_from_start {
			self.start_frame
		} else {
			self.start_frame + 1
		}
	}

	/// How many frames to read when `end_frame` is set.
	pub fn frame_limit(&self) -> Option<u64> {
		self.end_frame.map(|end| (end + 1).saturating_sub(self.first_frame_no()))
	}
}

impl Default for InputSettings {
	fn default() -> Self {
		Self {
			scale_mm: 96.,
			fps: 500.,
			rotate: false,
			start_frame: 0,
			end_frame: None,
			label_from_start: false,
		}
	}
}

/// Fractions of the frame width/height.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct RoiSettings {
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

impl RoiSettings {
	fn validate(&self, table: &str) -> Result<()> {
		for (name, value) in [("x", self.x), ("y", self.y), ("width", self.width), ("height", self.height)] {
			if !(0.0..=1.0).contains(&value) {
				return Err(DropError::Config(format!(
					"{}.{} must be a fraction of the frame between 0 and 1, got {}",
					table, name, value
				)));
			}
		}
		Ok(())
	}
}

impl Default for RoiSettings {
	fn default() -> Self {
		Self {
			x: 0.30,
			y: 0.33,
			width: 0.38,
			height: 0.08,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThresholdSettings {
	pub history: i32,
	pub var_threshold: f64,
	pub detect_shadows: bool,
	pub kernel_size: i32,
}

impl Default for ThresholdSettings {
	fn default() -> Self {
		Self {
			history: 500,
			var_threshold: 16.,
			detect_shadows: true,
			kernel_size: 3,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
	pub min_area: f64,
	pub max_area: f64,
}

impl Default for FilterSettings {
	fn default() -> Self {
		Self {
			min_area: 1100.,
			max_area: 2500.,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackerSettings {
	/// Counting line, in ROI pixel rows.
	pub line_position: i32,
}

impl Default for TrackerSettings {
	fn default() -> Self {
		Self { line_position: 60 }
	}
}

/// Which measurement rows a run emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordKind {
	/// Every retained blob: vertical position and time.
	Trajectory,
	/// Every retained blob: vertical position, time and radius.
	TrajectoryRadius,
	/// Only blobs that crossed the counting line.
	Crossing,
	/// Every retained blob with a fitted ellipse.
	Ellipse,
}

impl RecordKind {
	pub fn file_suffix(&self) -> &'static str {
		match self {
			RecordKind::Trajectory => "trajectory",
			RecordKind::TrajectoryRadius => "results",
			RecordKind::Crossing => "time",
			RecordKind::Ellipse => "ellipses",
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
	pub record: RecordKind,
	/// Decimal places for float columns.
	pub precision: usize,
	/// Bins of the run's radius and interval histograms.
	pub histogram_bins: usize,
	/// Radius histogram range in mm, set both or neither; the measured span
	/// when unset.
	pub radius_min: Option<f64>,
	pub radius_max: Option<f64>,
}

impl Default for OutputSettings {
	fn default() -> Self {
		Self {
			record: RecordKind::Trajectory,
			precision: 4,
			histogram_bins: 100,
			radius_min: None,
			radius_max: None,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JetSettings {
	pub threshold: f64,
	pub kernel_size: i32,
	pub iterations: i32,
	pub roi: RoiSettings,
	/// Rows subtracted from every jet length before statistics.
	pub offset_px: f64,
}

impl Default for JetSettings {
	fn default() -> Self {
		Self {
			threshold: 150.,
			kernel_size: 5,
			iterations: 2,
			roi: RoiSettings {
				x: 0.47,
				y: 0.,
				width: 0.1,
				height: 1.,
			},
			offset_px: 11.,
		}
	}
}

impl Settings {
	pub fn from_toml(content: &str) -> Result<Self> {
		let settings: Settings = toml::from_str(content).map_err(|e| DropError::Config(e.to_string()))?;
		settings.validate()?;
		Ok(settings)
	}

	/// Loads `path`, falling back to the defaults when the file does not exist.
	pub fn load(path: &Path) -> Result<Self> {
		if !path.is_file() {
			log::info!("No settings file at {}, using defaults", path.display());
			return Ok(Self::default());
		}
		let content = fs::read_to_string(path)?;
		let settings = Self::from_toml(&content)?;
		log::info!("Loaded settings from {}", path.display());
		Ok(settings)
	}

	fn validate(&self) -> Result<()> {
		if self.input.fps <= 0. {
			return Err(DropError::Config(format!("fps must be positive, got {}", self.input.fps)));
		}
		if self.input.scale_mm <= 0. {
			return Err(DropError::Config(format!("scale_mm must be positive, got {}", self.input.scale_mm)));
		}
		if self.filter.min_area >= self.filter.max_area {
			return Err(DropError::Config(format!(
				"min_area ({}) must be below max_area ({})",
				self.filter.min_area, self.filter.max_area
			)));
		}
		self.roi.validate("roi")?;
		self.jet.roi.validate("jet.roi")?;
		if self.output.histogram_bins == 0 {
			return Err(DropError::Config("histogram_bins must be at least 1".to_string()));
		}
		match (self.output.radius_min, self.output.radius_max) {
			(Some(min), Some(max)) if min >= max => {
				return Err(DropError::Config(format!(
					"radius_min ({}) must be below radius_max ({})",
					min, max
				)));
			}
			(Some(_), None) | (None, Some(_)) => {
				return Err(DropError::Config("radius_min and radius_max must be set together".to_string()));
			}
			_ => {}
		}
		if self.threshold.kernel_size < 1 || self.jet.kernel_size < 1 {
			return Err(DropError::Config("kernel sizes must be at least 1".to_string()));
		}
		if let Some(end) = self.input.end_frame {
			if end < self.input.start_frame {
				return Err(DropError::Config(format!(
					"end_frame ({}) is before start_frame ({})",
					end, self.input.start_frame
				)));
			}
		}
		Ok(())
	}
}
