use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

mod analysis;
mod config;
mod error;
mod modules;
mod pipeline;

use crate::analysis::summary::SummaryMode;
use crate::config::Settings;
use crate::modules::input::{Source, VideoInput};
use crate::modules::output::{AnnotatedVideo, CropWriter, DebugDisplay, TableWriter};
use crate::modules::threshold::JetGauge;
use crate::modules::units::Calibration;
use crate::modules::{InputModule, OutputModule};
use crate::pipeline::{Pipeline, RunSummary};

#[derive(Parser)]
#[command(name = "dropvision", version, about = "Counts and measures drops in high-speed video")]
struct Cli {
	/// Settings file, defaults apply when it does not exist
	#[arg(short, long, global = true, default_value = "dropvision.toml")]
	config: PathBuf,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand)]
enum Command {
	/// Count and measure drops in one video or camera stream
	Count {
		#[arg(long, required_unless_present = "camera", conflicts_with = "camera")]
		video: Option<PathBuf>,
		#[arg(long)]
		camera: Option<i32>,
		/// Measurement table, `<video stem>_<kind>.csv` by default
		#[arg(short, long)]
		output: Option<PathBuf>,
		/// Show the debug windows (p pauses, c or q stops)
		#[arg(long)]
		display: bool,
		/// Save a crop of every fitted drop into this folder
		#[arg(long)]
		crops: Option<PathBuf>,
		/// Write the annotated ROI as an MJPG video
		#[arg(long)]
		annotate: Option<PathBuf>,
	},
	/// Measure every video in a folder tree into `<input>_results`
	Batch {
		input: PathBuf,
		#[arg(long, value_delimiter = ',', default_values = ["avi", "mp4"])]
		extensions: Vec<String>,
	},
	/// Jet length per frame of one video, or of every video in a folder tree
	Jet {
		input: PathBuf,
		/// Folder for the tables, beside the video or `<input>_results` by default
		#[arg(short, long)]
		output: Option<PathBuf>,
		#[arg(long, value_delimiter = ',', default_values = ["avi"])]
		extensions: Vec<String>,
	},
	/// Radius or area histograms and peaks for a folder tree of tables
	Summary {
		input: PathBuf,
		output: PathBuf,
		#[arg(long, value_enum, default_value_t = SummaryMode::Radius)]
		mode: SummaryMode,
	},
	/// Split the radii of one table into two populations
	Peaks { file: PathBuf },
	/// Drop volume over time for a folder tree of tables
	Volume { input: PathBuf, output: PathBuf },
	/// Jet length statistics per flow rate
	JetSummary {
		folder: PathBuf,
		/// Rows subtracted from every length, `[jet] offset_px` by default
		#[arg(long)]
		offset: Option<f64>,
	},
	/// Ellipse angle histograms for a range of drops
	Angles {
		file: PathBuf,
		output: PathBuf,
		#[arg(long, default_value_t = 1)]
		first: i64,
		#[arg(long, default_value_t = 37)]
		last: i64,
	},
}

struct CountOptions {
	output: Option<PathBuf>,
	display: bool,
	crops: Option<PathBuf>,
	annotate: Option<PathBuf>,
}

/// Name the tables of a source start with.
fn source_stem(source: &Source) -> String {
	match source {
		Source::File(path) => Path::new(path).file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default(),
		Source::Camera(index) => format!("camera{}", index),
	}
}

/// `<input>_results` beside a folder of videos.
fn results_dir(input: &Path) -> PathBuf {
	let name = input.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
	input.with_file_name(format!("{}_results", name))
}

fn count(settings: &Settings, source: &Source, options: CountOptions) -> anyhow::Result<RunSummary> {
	let kind = settings.output.record;
	let stem = source_stem(source);
	let table_path = match (options.output, source) {
		(Some(path), _) => path,
		(None, Source::File(video)) => TableWriter::default_path(Path::new(video), kind),
		(None, Source::Camera(_)) => PathBuf::from(format!("{}_{}.csv", stem, kind.file_suffix())),
	};

	//Input Module
	let mut input = VideoInput::open(source, &settings.input).with_context(|| format!("Opening {}", source.describe()))?;

	//Output Modules
	let mut outputs: Vec<Box<dyn OutputModule>> = vec![Box::new(TableWriter::new(kind, settings.output.precision, table_path.clone()))];
	if let Some(dir) = options.crops {
		outputs.push(Box::new(CropWriter::new(dir)?));
	}
	if let Some(path) = options.annotate {
		outputs.push(Box::new(AnnotatedVideo::new(path, settings.input.fps)));
	}
	let mut display = options.display.then(DebugDisplay::new);

	let mut pipeline = Pipeline::new(settings, input.width())?;
	let summary = pipeline
		.run(&mut input, &mut outputs, display.as_mut())
		.with_context(|| format!("Processing {}", source.describe()))?;
	log::info!("Data saved to {}", table_path.display());
	summary.log();

	let dir = table_path.parent().unwrap_or(Path::new(""));
	for path in summary.write_histograms(dir, &stem, &settings.output)? {
		log::info!("Histogram saved to {}", path.display());
	}
	Ok(summary)
}

/// Measures every video under `input`; returns the ones that failed.
fn batch(settings: &Settings, input: &Path, extensions: &[String]) -> anyhow::Result<Vec<PathBuf>> {
	let output = results_dir(input);
	let extensions: Vec<&str> = extensions.iter().map(String::as_str).collect();
	let videos = analysis::files_with_extension(input, &extensions);
	if videos.is_empty() {
		log::warn!("No videos with extensions {:?} under {}", extensions, input.display());
	}

	let kind = settings.output.record;
	let mut failed = Vec::new();
	for video in videos.iter() {
		let stem = source_stem(&Source::file(video));
		let table = analysis::mirror_dir(input, video, &output).join(format!("{}_{}.csv", stem, kind.file_suffix()));
		let options = CountOptions {
			output: Some(table),
			display: false,
			crops: None,
			annotate: None,
		};
		log::info!("Processing {}", video.display());
		if let Err(e) = count(settings, &Source::file(video), options) {
			log::warn!("Skipping {}: {:#}", video.display(), e);
			failed.push(video.clone());
		}
	}
	log::info!(
		"Processed {} of {} videos into {}",
		videos.len() - failed.len(),
		videos.len(),
		output.display()
	);
	Ok(failed)
}

fn jet_video(settings: &Settings, video: &Path, dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
	let source = Source::file(video);
	let mut input = VideoInput::open(&source, &settings.input).with_context(|| format!("Opening {}", video.display()))?;
	let calibration = Calibration::from_frame_width(settings.input.scale_mm, input.width())?;
	let gauge = JetGauge::new(&settings.jet)?;

	let samples = pipeline::measure_jet(&mut input, &gauge, calibration)?;
	let written = analysis::jet::write_video_tables(dir, &source_stem(&source), &samples, calibration, settings.input.fps)?;
	log::info!("Jet tables for {} saved to {}", video.display(), dir.display());
	Ok(written)
}

/// Measures the jet in one video, or in every video of a folder tree with
/// the tables mirrored under the output folder. Returns the videos that failed.
fn jet(settings: &Settings, input: &Path, output: Option<PathBuf>, extensions: &[String]) -> anyhow::Result<Vec<PathBuf>> {
	if !input.is_dir() {
		let dir = output.unwrap_or_else(|| input.parent().map(Path::to_path_buf).unwrap_or_default());
		jet_video(settings, input, &dir)?;
		return Ok(Vec::new());
	}

	let output = output.unwrap_or_else(|| results_dir(input));
	let extensions: Vec<&str> = extensions.iter().map(String::as_str).collect();
	let videos = analysis::files_with_extension(input, &extensions);
	if videos.is_empty() {
		log::warn!("No videos with extensions {:?} under {}", extensions, input.display());
	}

	let mut failed = Vec::new();
	for video in videos.iter() {
		log::info!("Processing {}", video.display());
		if let Err(e) = jet_video(settings, video, &analysis::mirror_dir(input, video, &output)) {
			log::warn!("Skipping {}: {:#}", video.display(), e);
			failed.push(video.clone());
		}
	}
	log::info!(
		"Measured the jet in {} of {} videos into {}",
		videos.len() - failed.len(),
		videos.len(),
		output.display()
	);
	Ok(failed)
}

fn main() -> anyhow::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let cli = Cli::parse();
	let settings = Settings::load(&cli.config).with_context(|| format!("Loading {}", cli.config.display()))?;

	match cli.command {
		Command::Count {
			video,
			camera,
			output,
			display,
			crops,
			annotate,
		} => {
			let source = match (video, camera) {
				(Some(video), _) => Source::file(&video),
				(None, Some(index)) => Source::Camera(index),
				(None, None) => bail!("Either --video or --camera is required"),
			};
			let options = CountOptions {
				output,
				display,
				crops,
				annotate,
			};
			count(&settings, &source, options)?;
		}
		Command::Batch { input, extensions } => {
			batch(&settings, &input, &extensions)?;
		}
		Command::Jet {
			input,
			output,
			extensions,
		} => {
			jet(&settings, &input, output, &extensions)?;
		}
		Command::Summary { input, output, mode } => {
			fs::create_dir_all(&output)?;
			analysis::summary::summarize_folder(&input, &output, mode)?;
		}
		Command::Peaks { file } => {
			let split = analysis::summary::split_file(&file).with_context(|| format!("Splitting {}", file.display()))?;
			log::info!("Cutting point: {:.4} mm", split.cut);
			log::info!(
				"First Peak: {:.4} mm, Standard Deviation: {:.4} ({} drops)",
				split.peaks[0],
				split.lower_std,
				split.lower.len()
			);
			log::info!(
				"Second Peak: {:.4} mm, Standard Deviation: {:.4} ({} drops)",
				split.peaks[1],
				split.upper_std,
				split.upper.len()
			);
		}
		Command::Volume { input, output } => {
			let written = analysis::volume::convert_folder(&input, &output)?;
			log::info!("Wrote {} volume tables", written.len());
		}
		Command::JetSummary { folder, offset } => {
			analysis::jet::summarize_jets(&folder, offset.unwrap_or(settings.jet.offset_px))?;
		}
		Command::Angles {
			file,
			output,
			first,
			last,
		} => {
			analysis::angles::angle_histograms(&file, &output, first, last)?;
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::modules::input::video::clips;

	#[test]
	fn batch_skips_unreadable_video_and_continues() {
		let dir = tempfile::tempdir().unwrap();
		let input = dir.path().join("runs");
		fs::create_dir_all(input.join("a")).unwrap();
		fs::create_dir_all(input.join("b")).unwrap();
		fs::write(input.join("a").join("broken.avi"), "not a video").unwrap();
		clips::write(&input.join("b").join("good.avi"), 64, 48, 4);

		let failed = batch(&Settings::default(), &input, &["avi".to_string()]).unwrap();
		assert_eq!(failed, vec![input.join("a").join("broken.avi")]);

		let table = dir.path().join("runs_results").join("b").join("good_trajectory.csv");
		assert_eq!(fs::read_to_string(table).unwrap(), "Y-coordinate(mm),Time(Sec)\n");
	}

	#[test]
	fn jet_folder_mode_mirrors_every_video() {
		let dir = tempfile::tempdir().unwrap();
		let input = dir.path().join("jets");
		fs::create_dir_all(input.join("water")).unwrap();
		clips::write(&input.join("water").join("w_5mlpmin.avi"), 64, 48, 3);
		fs::write(input.join("broken.avi"), "not a video").unwrap();

		let failed = jet(&Settings::default(), &input, None, &["avi".to_string()]).unwrap();
		assert_eq!(failed, vec![input.join("broken.avi")]);

		let out = dir.path().join("jets_results").join("water");
		let data = analysis::table::Table::read(&out.join("w_5mlpmin_jet_length_data.csv")).unwrap();
		assert_eq!(data.rows().len(), 3);
		assert!(out.join("w_5mlpmin_jet_time_series.csv").is_file());
		// Dark frames never show a jet end, so there is nothing to histogram.
		assert!(!out.join("w_5mlpmin_jet_length_histogram.csv").exists());
	}

	#[test]
	fn camera_tables_are_named_after_the_index() {
		assert_eq!(source_stem(&Source::Camera(2)), "camera2");
		assert_eq!(source_stem(&Source::file(Path::new("/data/0_mlpmin.avi"))), "0_mlpmin");
		assert_eq!(results_dir(Path::new("/data/runs")), PathBuf::from("/data/runs_results"));
	}
}
