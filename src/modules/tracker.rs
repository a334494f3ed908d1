//! Counting-line crossing detection.
//!
//! There are no track IDs. The only state carried between frames is the list
//! of centroids seen in the previous frame, so two drops that happen to sit
//! near each other across a frame boundary are not told apart, and a drop
//! first seen below the line is never counted.

/// Blob centroid truncated to whole ROI pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Centroid {
	pub x: i32,
	pub y: i32,
}

impl Centroid {
	pub fn new(x: i32, y: i32) -> Self {
		Self { x, y }
	}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
	/// Position of the crossing centroid in the frame's centroid list.
	pub index: usize,
	pub frame_no: u64,
	pub time: f64,
	pub centroid: Centroid,
}

pub struct CrossingTracker {
	line_position: i32,
	fps: f64,
	previous: Vec<Centroid>,
	drop_count: usize,
	crossing_times: Vec<f64>,
}

impl CrossingTracker {
	pub fn new(line_position: i32, fps: f64) -> Self {
		Self {
			line_position,
			fps,
			previous: Vec::new(),
			drop_count: 0,
			crossing_times: Vec::new(),
		}
	}

	/// Whether `current` moved from above the line to on or below it since a
	/// centroid of the previous frame. Scanning stops at the first match.
	fn crossed(&self, current: &Centroid) -> bool {
		self.previous
			.iter()
			.any(|prev| prev.y < self.line_position && self.line_position <= current.y)
	}

	/// Runs the crossing test for every centroid of a frame, in order, then
	/// makes them the previous frame.
	pub fn update(&mut self, frame_no: u64, current: Vec<Centroid>) -> Vec<Crossing> {
		let time = frame_no as f64 / self.fps;
		let mut crossings = Vec::new();
		for (index, centroid) in current.iter().enumerate() {
			if self.crossed(centroid) {
				self.drop_count += 1;
				self.crossing_times.push(time);
				crossings.push(Crossing {
					index,
					frame_no,
					time,
					centroid: *centroid,
				});
			}
		}
		self.previous = current;
		crossings
	}

	pub fn drop_count(&self) -> usize {
		self.drop_count
	}

	pub fn crossing_times(&self) -> &[f64] {
		&self.crossing_times
	}

	#[cfg(test)]
	pub fn previous(&self) -> &[Centroid] {
		&self.previous
	}

	pub fn line_position(&self) -> i32 {
		self.line_position
	}
}
